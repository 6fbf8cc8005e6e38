//! Compressed variants of the index document.
//!
//! Each encoding is an independent re-encoding of the whole document. Byte
//! output is not guaranteed stable across compressor versions; only the
//! decompressed content is.

use rayon::prelude::*;
use std::io::{self, Read, Write};

/// zstd level used for `Packages.zst`.
const ZSTD_LEVEL: i32 = 3;
/// xz preset used for `Packages.xz`.
const XZ_PRESET: u32 = 6;

/// A compressed encoding of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// DEFLATE in a gzip container (`.gz`).
    Gzip,
    /// Block-sorting bzip2 (`.bz2`).
    Bzip2,
    /// LZMA2 in an xz container (`.xz`).
    Xz,
    /// Zstandard (`.zst`).
    Zstd,
}

impl Encoding {
    /// All encodings in artifact order.
    pub const ALL: [Self; 4] = [Self::Gzip, Self::Bzip2, Self::Xz, Self::Zstd];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
            Self::Zstd => "zst",
        }
    }

    /// `base` plus this encoding's extension, e.g. `Packages.gz`.
    pub fn file_name(self, base: &str) -> String {
        format!("{base}.{}", self.extension())
    }

    /// Compress `data`.
    ///
    /// # Errors
    ///
    /// Propagates compressor errors.
    pub fn encode(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut enc =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
                enc.write_all(data)?;
                enc.finish()
            }
            Self::Bzip2 => {
                let mut enc =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
                enc.write_all(data)?;
                enc.finish()
            }
            Self::Xz => {
                let mut enc = xz2::write::XzEncoder::new(Vec::new(), XZ_PRESET);
                enc.write_all(data)?;
                enc.finish()
            }
            Self::Zstd => zstd::encode_all(data, ZSTD_LEVEL),
        }
    }

    /// Decompress `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not valid for this encoding.
    pub fn decode(self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => {
                flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Bzip2 => {
                bzip2::read::BzDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Xz => {
                xz2::read::XzDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Zstd => out = zstd::decode_all(data)?,
        }
        Ok(out)
    }
}

/// Encode `data` with every encoding, in parallel. Results follow
/// [`Encoding::ALL`] order.
///
/// # Errors
///
/// Returns the first compressor error.
pub fn fan_out(data: &[u8]) -> io::Result<Vec<(Encoding, Vec<u8>)>> {
    Encoding::ALL
        .par_iter()
        .map(|&enc| enc.encode(data).map(|bytes| (enc, bytes)))
        .collect()
}
