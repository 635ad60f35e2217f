use serde::Serialize;

use mysqlz_transport::TransportError;

use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};

/// One frame found in a captured byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    /// Byte offset of the header within the stream.
    pub offset: usize,
    #[serde(flatten)]
    pub header: FrameHeader,
    pub compressed: bool,
}

/// Walk the frames of a captured stream without decompressing or checking sequence ids.
pub fn inspect_frames(src: &[u8]) -> FrameIter<'_> {
    FrameIter {
        src,
        offset: 0,
        done: false,
    }
}

/// Iterator returned by [`inspect_frames`].
///
/// Yields one error and stops if the stream ends inside a frame.
#[derive(Debug, Clone)]
pub struct FrameIter<'a> {
    src: &'a [u8],
    offset: usize,
    done: bool,
}

impl FrameIter<'_> {
    /// Bytes consumed by the frames yielded so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for FrameIter<'_> {
    type Item = Result<FrameInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.src.len() {
            return None;
        }

        let rest = &self.src[self.offset..];
        let peeked = FrameHeader::peek(rest);
        let expected = peeked.map_or(HEADER_SIZE, |h| h.wire_size());
        let header = match peeked {
            Some(header) if rest.len() >= header.wire_size() => header,
            _ => {
                self.done = true;
                return Some(Err(FrameError::Transport(TransportError::UnexpectedEof {
                    expected,
                    received: rest.len(),
                })));
            }
        };

        let info = FrameInfo {
            offset: self.offset,
            header,
            compressed: header.is_compressed(),
        };
        self.offset += header.wire_size();
        Some(Ok(info))
    }
}
