use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::{Result, ZlibCode, ZlibError};

/// A validated zlib compression level.
///
/// `0` stores data without compressing it; `9` is smallest and slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u32);

impl Level {
    /// Store only.
    pub const NONE: Level = Level(0);
    /// Fastest compression.
    pub const FASTEST: Level = Level(1);
    /// zlib's default trade-off.
    pub const DEFAULT: Level = Level(6);
    /// Smallest output.
    pub const BEST: Level = Level(9);

    /// Validate a numeric level.
    pub fn new(level: u32) -> Result<Self> {
        if level > Self::BEST.0 {
            return Err(ZlibError::InvalidLevel { level });
        }
        Ok(Level(level))
    }

    /// The numeric level.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Level {
    type Error = ZlibError;

    fn try_from(level: u32) -> Result<Self> {
        Level::new(level)
    }
}

impl From<Level> for Compression {
    fn from(level: Level) -> Self {
        Compression::new(level.0)
    }
}

/// Upper bound on the compressed size of `len` input bytes.
///
/// This is the bound published by miniz (`mz_compressBound`), the deflate
/// implementation behind flate2's default backend. It covers stored blocks at
/// level 0 and literal-heavy Huffman blocks that miniz cannot demote to stored
/// blocks once they outgrow its 32 KiB window.
pub fn compress_bound(len: usize) -> usize {
    let proportional = 128usize.saturating_add(len.saturating_mul(110) / 100);
    let per_block = 128usize
        .saturating_add(len)
        .saturating_add((len / (31 * 1024) + 1) * 5);
    proportional.max(per_block)
}

/// Compress `src` into `dst` as one complete zlib stream.
///
/// `dst` must be at least [`compress_bound`]`(src.len())` bytes. Returns the
/// number of bytes written at the start of `dst`; nothing past that is touched.
pub fn compress(dst: &mut [u8], src: &[u8], level: Level) -> Result<usize> {
    deflate_into(&mut Compress::new(level.into(), true), dst, src)
}

/// Decompress the zlib stream `src` into `dst`, which must be exactly the
/// uncompressed length.
pub fn decompress(dst: &mut [u8], src: &[u8]) -> Result<()> {
    inflate_exact(&mut Decompress::new(true), dst, src)
}

/// Per-connection compressor and decompressor state.
///
/// The deflate and inflate states are allocated once and reset before every
/// call, so steady-state traffic does not reallocate them.
pub struct ZlibEngine {
    level: Level,
    deflate: Compress,
    inflate: Decompress,
}

impl ZlibEngine {
    /// Create an engine compressing at `level`.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            deflate: Compress::new(level.into(), true),
            inflate: Decompress::new(true),
        }
    }

    /// The level used by [`ZlibEngine::compress`].
    pub fn level(&self) -> Level {
        self.level
    }

    /// Compress `src` into the start of `dst`.
    ///
    /// Fails with [`ZlibError::Compression`] when `dst` is empty, shorter than
    /// [`compress_bound`]`(src.len())`, or the compressor reports an error.
    pub fn compress(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        deflate_into(&mut self.deflate, dst, src)
    }

    /// Decompress `src` so that it fills `dst` exactly.
    ///
    /// Fails with [`ZlibError::Decompression`] when `dst` is empty, the input
    /// is malformed or truncated, the stream is longer than `dst`, or bytes
    /// follow the end of the stream.
    pub fn decompress(&mut self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        inflate_exact(&mut self.inflate, dst, src)
    }
}

impl std::fmt::Debug for ZlibEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZlibEngine")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

fn deflate_into(deflate: &mut Compress, dst: &mut [u8], src: &[u8]) -> Result<usize> {
    if dst.is_empty() {
        return Err(ZlibError::compression(
            ZlibCode::BufError,
            "destination buffer is empty",
        ));
    }
    let bound = compress_bound(src.len());
    if dst.len() < bound {
        return Err(ZlibError::compression(
            ZlibCode::BufError,
            format!(
                "destination holds {} bytes, {} input bytes need up to {bound}",
                dst.len(),
                src.len()
            ),
        ));
    }

    deflate.reset();
    let before = deflate.total_out();
    let status = deflate
        .compress(src, dst, FlushCompress::Finish)
        .map_err(|err| ZlibError::compression(ZlibCode::StreamError, err.to_string()))?;
    let written = (deflate.total_out() - before) as usize;

    match status {
        Status::StreamEnd => Ok(written),
        Status::Ok | Status::BufError => Err(ZlibError::compression(
            ZlibCode::BufError,
            format!("stream did not finish within {} bytes", dst.len()),
        )),
    }
}

fn inflate_exact(inflate: &mut Decompress, dst: &mut [u8], src: &[u8]) -> Result<()> {
    if dst.is_empty() {
        return Err(ZlibError::decompression(
            ZlibCode::BufError,
            "destination buffer is empty",
        ));
    }

    inflate.reset(true);
    let before_in = inflate.total_in();
    let before_out = inflate.total_out();
    let status = inflate
        .decompress(src, dst, FlushDecompress::Finish)
        .map_err(|err| ZlibError::decompression(ZlibCode::DataError, err.to_string()))?;
    let consumed = (inflate.total_in() - before_in) as usize;
    let written = (inflate.total_out() - before_out) as usize;

    match status {
        Status::StreamEnd if written != dst.len() => Err(ZlibError::decompression(
            ZlibCode::DataError,
            format!(
                "stream ended after {written} bytes, expected {}",
                dst.len()
            ),
        )),
        Status::StreamEnd if consumed != src.len() => Err(ZlibError::decompression(
            ZlibCode::DataError,
            format!("{} trailing bytes after end of stream", src.len() - consumed),
        )),
        Status::StreamEnd => Ok(()),
        Status::Ok | Status::BufError if written == dst.len() => {
            Err(ZlibError::decompression(
                ZlibCode::BufError,
                format!("stream does not fit in {} bytes", dst.len()),
            ))
        }
        Status::Ok | Status::BufError => Err(ZlibError::decompression(
            ZlibCode::DataError,
            format!(
                "stream truncated after {written} of {} bytes",
                dst.len()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress_to_vec(src: &[u8], level: Level) -> Vec<u8> {
        let mut dst = vec![0u8; compress_bound(src.len())];
        let written = compress(&mut dst, src, level).unwrap();
        dst.truncate(written);
        dst
    }

    /// Deterministic pseudo-random bytes (xorshift), incompressible in practice.
    fn noise(len: usize, mut seed: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                (seed >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn level_validation() {
        for level in 0..=9 {
            assert_eq!(Level::new(level).unwrap().get(), level);
        }
        assert_eq!(Level::new(10), Err(ZlibError::InvalidLevel { level: 10 }));
        assert_eq!(Level::try_from(6).unwrap(), Level::DEFAULT);
        assert_eq!(Level::default(), Level::DEFAULT);
    }

    #[test]
    fn bound_never_below_input() {
        for len in [0usize, 1, 7, 100, 16 * 1024, 31 * 1024, 65_535, 1 << 20, 0xFF_FF_FF] {
            assert!(compress_bound(len) >= len, "bound({len}) < {len}");
        }
        assert_eq!(compress_bound(usize::MAX), usize::MAX);
    }

    #[test]
    fn roundtrip_every_level() {
        let mut text = Vec::new();
        for i in 0..2_000 {
            text.extend_from_slice(format!("row {i}: SELECT id, name FROM users;\n").as_bytes());
        }
        for level in 0..=9 {
            let level = Level::new(level).unwrap();
            let compressed = compress_to_vec(&text, level);
            let mut restored = vec![0u8; text.len()];
            decompress(&mut restored, &compressed).unwrap();
            assert_eq!(restored, text, "level {level:?}");
        }
    }

    #[test]
    fn incompressible_input_fits_bound_at_every_level() {
        for len in [1usize, 50, 4096, 40 * 1024, 200 * 1024] {
            let data = noise(len, 0x9E37_79B9_7F4A_7C15 ^ len as u64);
            for level in [Level::NONE, Level::FASTEST, Level::DEFAULT, Level::BEST] {
                let compressed = compress_to_vec(&data, level);
                assert!(compressed.len() <= compress_bound(len));
                let mut restored = vec![0u8; len];
                decompress(&mut restored, &compressed).unwrap();
                assert_eq!(restored, data);
            }
        }
    }

    #[test]
    fn repetitive_100k_shrinks_and_restores() {
        let original = vec![b'x'; 100 * 1024];
        let compressed = compress_to_vec(&original, Level::DEFAULT);
        assert!(compressed.len() < original.len());

        let mut restored = vec![0u8; 102_400];
        decompress(&mut restored, &compressed).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn compress_writes_only_reported_prefix() {
        let src = vec![7u8; 4096];
        let mut dst = vec![0xEEu8; compress_bound(src.len())];
        let written = compress(&mut dst, &src, Level::BEST).unwrap();
        assert!(written < dst.len());
        assert!(dst[written..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn compress_rejects_empty_and_undersized_destination() {
        let err = compress(&mut [], b"data", Level::DEFAULT).unwrap_err();
        assert_eq!(err.code(), Some(ZlibCode::BufError));
        assert!(matches!(err, ZlibError::Compression { .. }));

        let src = vec![1u8; 1000];
        let mut dst = vec![0u8; compress_bound(src.len()) - 1];
        let err = compress(&mut dst, &src, Level::DEFAULT).unwrap_err();
        assert!(matches!(
            err,
            ZlibError::Compression {
                code: ZlibCode::BufError,
                ..
            }
        ));
    }

    #[test]
    fn decompress_empty_destination_fails() {
        let compressed = compress_to_vec(b"SELECT 1", Level::DEFAULT);
        let err = decompress(&mut [], &compressed).unwrap_err();
        assert!(matches!(
            err,
            ZlibError::Decompression {
                code: ZlibCode::BufError,
                ..
            }
        ));
    }

    #[test]
    fn decompress_size_mismatch_fails() {
        let original = vec![b'a'; 1000];
        let compressed = compress_to_vec(&original, Level::DEFAULT);

        let mut too_big = vec![0u8; 1001];
        let err = decompress(&mut too_big, &compressed).unwrap_err();
        assert!(matches!(err, ZlibError::Decompression { .. }));

        let mut too_small = vec![0u8; 999];
        let err = decompress(&mut too_small, &compressed).unwrap_err();
        assert!(matches!(
            err,
            ZlibError::Decompression {
                code: ZlibCode::BufError,
                ..
            }
        ));
    }

    #[test]
    fn decompress_rejects_garbage_and_truncation() {
        let mut dst = vec![0u8; 16];
        let err = decompress(&mut dst, b"definitely not zlib").unwrap_err();
        assert!(matches!(err, ZlibError::Decompression { .. }));

        let original = noise(2048, 42);
        let compressed = compress_to_vec(&original, Level::DEFAULT);
        let mut dst = vec![0u8; original.len()];
        let err = decompress(&mut dst, &compressed[..compressed.len() / 2]).unwrap_err();
        assert!(matches!(err, ZlibError::Decompression { .. }));
    }

    #[test]
    fn decompress_rejects_trailing_bytes() {
        let original = vec![b'q'; 512];
        let mut compressed = compress_to_vec(&original, Level::DEFAULT);
        compressed.extend_from_slice(b"junk");
        let mut dst = vec![0u8; original.len()];
        let err = decompress(&mut dst, &compressed).unwrap_err();
        assert!(matches!(
            err,
            ZlibError::Decompression {
                code: ZlibCode::DataError,
                ..
            }
        ));
    }

    #[test]
    fn engine_reuses_state_across_calls() {
        let mut engine = ZlibEngine::new(Level::FASTEST);
        assert_eq!(engine.level(), Level::FASTEST);

        for round in 0..8u8 {
            let src = vec![round; 3000 + usize::from(round) * 100];
            let mut compressed = vec![0u8; compress_bound(src.len())];
            let written = engine.compress(&mut compressed, &src).unwrap();

            let mut restored = vec![0u8; src.len()];
            engine.decompress(&mut restored, &compressed[..written]).unwrap();
            assert_eq!(restored, src);
        }
    }

    #[test]
    fn engine_recovers_after_failed_decompress() {
        let mut engine = ZlibEngine::new(Level::DEFAULT);
        let mut dst = vec![0u8; 8];
        assert!(engine.decompress(&mut dst, b"garbage!").is_err());

        let src = b"after the failure, state is reset".to_vec();
        let mut compressed = vec![0u8; compress_bound(src.len())];
        let written = engine.compress(&mut compressed, &src).unwrap();
        let mut restored = vec![0u8; src.len()];
        engine.decompress(&mut restored, &compressed[..written]).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn free_functions_agree_with_engine() {
        let src = b"SELECT id, name FROM users WHERE id = 1; ".repeat(40);
        let mut engine = ZlibEngine::new(Level::BEST);

        let mut from_engine = vec![0u8; compress_bound(src.len())];
        let written = engine.compress(&mut from_engine, &src).unwrap();
        from_engine.truncate(written);
        assert_eq!(compress_to_vec(&src, Level::BEST), from_engine);

        let mut out = vec![0u8; src.len()];
        decompress(&mut out, &from_engine).unwrap();
        assert_eq!(out, src);

        let mut short = vec![0u8; src.len() - 1];
        let err = decompress(&mut short, &from_engine).unwrap_err();
        assert_eq!(err.code(), Some(ZlibCode::BufError));
    }
}
