use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// The minimal byte-stream contract consumed by the packet framer.
///
/// Every `Read + Write` type is a transport. Reads block until the buffer is
/// full or the stream ends; there is no retry beyond `Interrupted`, so a
/// timed-out or shut-down stream surfaces as an error and the caller must
/// discard the connection.
pub trait Transport {
    /// Fill `buf` completely from the stream.
    ///
    /// Returns [`TransportError::UnexpectedEof`] when the stream ends first.
    fn read_exactly(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write all of `bytes` and flush the stream.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T: Read + Write> Transport for T {
    fn read_exactly(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TransportError::UnexpectedEof {
                        expected: buf.len(),
                        received: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.write(&bytes[offset..]) {
                Ok(0) => {
                    return Err(TransportError::WriteZero {
                        written: offset,
                        total: bytes.len(),
                    })
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn read_exactly_fills_buffer() {
        let mut stream = Cursor::new(b"abcdef".to_vec());
        let mut buf = [0u8; 4];
        stream.read_exactly(&mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn read_exactly_reports_short_read() {
        let mut stream = Cursor::new(b"ab".to_vec());
        let mut buf = [0u8; 4];
        let err = stream.read_exactly(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            TransportError::UnexpectedEof {
                expected: 4,
                received: 2
            }
        ));
    }

    #[test]
    fn read_exactly_empty_buffer_is_noop() {
        let mut stream = Cursor::new(Vec::<u8>::new());
        stream.read_exactly(&mut []).unwrap();
    }

    #[test]
    fn read_exactly_byte_by_byte() {
        let mut stream = Trickle {
            bytes: b"slow stream".to_vec(),
            pos: 0,
            interrupted: false,
        };
        let mut buf = [0u8; 11];
        stream.read_exactly(&mut buf).unwrap();
        assert_eq!(&buf, b"slow stream");
    }

    #[test]
    fn read_exactly_propagates_would_block() {
        let mut stream = Blocked;
        let mut buf = [0u8; 1];
        let err = stream.read_exactly(&mut buf).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn write_bytes_retries_interrupted_and_flushes() {
        let mut sink = Trickle {
            bytes: Vec::new(),
            pos: 0,
            interrupted: false,
        };
        sink.write_bytes(b"payload").unwrap();
        assert_eq!(sink.bytes, b"payload");
    }

    #[test]
    fn write_bytes_zero_write_is_error() {
        let err = ZeroWriter.write_bytes(b"x").unwrap_err();
        assert!(matches!(
            err,
            TransportError::WriteZero {
                written: 0,
                total: 1
            }
        ));
    }

    /// Reads one byte per call and interrupts the first read and write.
    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(2);
            self.bytes.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Blocked;

    impl Read for Blocked {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }

    impl Write for Blocked {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Read for ZeroWriter {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
