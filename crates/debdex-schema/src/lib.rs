//! Wire format for debdex repositories.
//!
//! This crate owns the flat-text `Packages` document: stanzas of `Key: Value`
//! lines, the identity key used to deduplicate them, and the four digests
//! every archive and artifact is described by. It performs no archive or
//! network I/O; `debdex-core` builds on it.

pub mod digest;
pub mod document;
pub mod identity;
pub mod stanza;

// Re-exports
pub use digest::{DigestKind, FileDigests, MultiHasher};
pub use document::{DocumentError, IndexDocument, IndexEntry, ParseOutcome};
pub use identity::{IdentityError, IdentityKey};
pub use stanza::{Field, Stanza};

/// Archive extension accepted in a repository's archive directory.
pub const ARCHIVE_EXTENSION: &str = "deb";

/// Base name of the uncompressed index document.
pub const PACKAGES_FILE: &str = "Packages";

/// Base name of the digest summary document.
pub const RELEASE_FILE: &str = "Release";
