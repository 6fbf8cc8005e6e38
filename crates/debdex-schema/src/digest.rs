//! The four digests describing archives and artifacts.
//!
//! `Packages` stanzas and `Release` blocks both carry MD5, SHA-1, SHA-256 and
//! SHA-512 values. [`MultiHasher`] feeds all four from one pass over the
//! input.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// A digest algorithm, in the fixed order used by every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestKind {
    /// MD5, the fast 128-bit digest.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl DigestKind {
    /// All kinds in emission order.
    pub const ALL: [Self; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Field name used inside a `Packages` stanza.
    pub fn package_field(self) -> &'static str {
        match self {
            Self::Md5 => "MD5sum",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Block header used inside a `Release` document (without the colon).
    pub fn release_header(self) -> &'static str {
        match self {
            Self::Md5 => "MD5Sum",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

/// Byte size and hex digests of one file or buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigests {
    /// Number of bytes hashed.
    pub size: u64,
    /// Lowercase hex MD5.
    pub md5: String,
    /// Lowercase hex SHA-1.
    pub sha1: String,
    /// Lowercase hex SHA-256.
    pub sha256: String,
    /// Lowercase hex SHA-512.
    pub sha512: String,
}

impl FileDigests {
    /// Hash an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = MultiHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash everything a reader yields, in 64 KiB chunks.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = MultiHasher::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }
        Ok(hasher.finalize())
    }

    /// Hash a file on disk without loading it into memory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read.
    pub fn compute_file(path: &Path) -> io::Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// The hex digest for `kind`.
    pub fn get(&self, kind: DigestKind) -> &str {
        match kind {
            DigestKind::Md5 => &self.md5,
            DigestKind::Sha1 => &self.sha1,
            DigestKind::Sha256 => &self.sha256,
            DigestKind::Sha512 => &self.sha512,
        }
    }
}

/// Incremental hasher computing all four digests at once.
#[derive(Clone, Default)]
pub struct MultiHasher {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
    sha512: Sha512,
    size: u64,
}

impl std::fmt::Debug for MultiHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiHasher")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl MultiHasher {
    /// Create a fresh hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of input.
    pub fn update(&mut self, data: &[u8]) {
        self.md5.update(data);
        self.sha1.update(data);
        self.sha256.update(data);
        self.sha512.update(data);
        self.size += data.len() as u64;
    }

    /// Finish and hex-encode all four digests.
    pub fn finalize(self) -> FileDigests {
        FileDigests {
            size: self.size,
            md5: hex::encode(self.md5.finalize()),
            sha1: hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
            sha512: hex::encode(self.sha512.finalize()),
        }
    }
}
