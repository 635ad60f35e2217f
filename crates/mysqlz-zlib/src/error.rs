use std::fmt;

/// zlib status codes, as reported in compression errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZlibCode {
    /// `Z_STREAM_ERROR`: invalid parameters or inconsistent stream state.
    StreamError,
    /// `Z_DATA_ERROR`: input is corrupted or not a zlib stream.
    DataError,
    /// `Z_MEM_ERROR`: not enough memory.
    MemError,
    /// `Z_BUF_ERROR`: the output buffer is too small (or empty).
    BufError,
}

impl ZlibCode {
    /// The numeric zlib return code.
    pub fn as_i32(self) -> i32 {
        match self {
            ZlibCode::StreamError => -2,
            ZlibCode::DataError => -3,
            ZlibCode::MemError => -4,
            ZlibCode::BufError => -5,
        }
    }

    /// The message zlib's `zError` gives for this code.
    pub fn message(self) -> &'static str {
        match self {
            ZlibCode::StreamError => "stream error",
            ZlibCode::DataError => "data error",
            ZlibCode::MemError => "insufficient memory",
            ZlibCode::BufError => "buffer error",
        }
    }
}

impl fmt::Display for ZlibCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zlib error[{}]: {}", self.as_i32(), self.message())
    }
}

/// Errors from the compression engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZlibError {
    /// The compression level is outside `0..=9`.
    #[error("invalid compression level {level} (expected 0..=9)")]
    InvalidLevel { level: u32 },

    /// Compressing failed.
    #[error("compression failed, {code}: {message}")]
    Compression { code: ZlibCode, message: String },

    /// Decompressing failed or produced the wrong number of bytes.
    #[error("decompression failed, {code}: {message}")]
    Decompression { code: ZlibCode, message: String },
}

impl ZlibError {
    /// The zlib code carried by compression and decompression errors.
    pub fn code(&self) -> Option<ZlibCode> {
        match self {
            ZlibError::InvalidLevel { .. } => None,
            ZlibError::Compression { code, .. } | ZlibError::Decompression { code, .. } => {
                Some(*code)
            }
        }
    }

    pub(crate) fn compression(code: ZlibCode, message: impl Into<String>) -> Self {
        ZlibError::Compression {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn decompression(code: ZlibCode, message: impl Into<String>) -> Self {
        ZlibError::Decompression {
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZlibError>;
