//! Composite identity of a package stanza.

use crate::stanza::Stanza;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field holding the package name.
pub const PACKAGE_FIELD: &str = "Package";
/// Field holding the package version.
pub const VERSION_FIELD: &str = "Version";
/// Field holding the package architecture.
pub const ARCHITECTURE_FIELD: &str = "Architecture";

/// Errors raised when a stanza lacks an identity field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// One of `Package`, `Version` or `Architecture` is absent or blank.
    #[error("missing identity field: {0}")]
    MissingField(&'static str),
}

/// `(name, version, architecture)`: the deduplication key of the index.
///
/// Keys order by their composite `name_version_architecture` string, compared
/// byte-wise. The version is an opaque token here; no Debian version
/// comparison takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    // Must stay the first field: the derived `Ord` compares it first.
    composite: String,
    name: String,
    version: String,
    architecture: String,
}

impl IdentityKey {
    /// Build a key from its three parts.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let architecture = architecture.into();
        let composite = format!("{name}_{version}_{architecture}");
        Self {
            composite,
            name,
            version,
            architecture,
        }
    }

    /// Extract the key from a stanza's `Package`, `Version` and
    /// `Architecture` fields.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingField`] naming the first absent field.
    pub fn from_stanza(stanza: &Stanza) -> Result<Self, IdentityError> {
        let field = |name: &'static str| {
            stanza
                .get(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or(IdentityError::MissingField(name))
        };

        Ok(Self::new(
            field(PACKAGE_FIELD)?,
            field(VERSION_FIELD)?,
            field(ARCHITECTURE_FIELD)?,
        ))
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Package architecture.
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// The `name_version_architecture` string keys are ordered by.
    pub fn as_str(&self) -> &str {
        &self.composite
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.composite)
    }
}
