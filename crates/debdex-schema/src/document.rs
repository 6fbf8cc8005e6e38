//! The `Packages` index document.
//!
//! A document is a sequence of stanzas separated by exactly one blank line
//! and terminated by a trailing blank line. Each [`IndexEntry`] keeps the raw
//! text it was parsed from, so re-serializing a parsed document reproduces it
//! byte for byte.

use crate::identity::{IdentityError, IdentityKey};
use crate::stanza::Stanza;
use std::borrow::Cow;

/// Field naming the archive a stanza was built from. Used as the
/// invalidation key during incremental merges.
pub const FILENAME_FIELD: &str = "Filename";

/// A stanza of a previous index that cannot take part in a merge.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The stanza at `position` (0-based, counting non-empty stanzas) lacks
    /// an identity field.
    #[error("stanza {position} is missing identity field {field}")]
    MissingIdentity {
        /// Position of the stanza within the document.
        position: usize,
        /// The absent field.
        field: &'static str,
    },
}

/// One keyed stanza of an index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Identity of the package described.
    pub key: IdentityKey,
    /// Stanza text without surrounding blank lines.
    pub raw: String,
    /// Parsed fields of `raw`.
    pub fields: Stanza,
}

impl IndexEntry {
    /// Build an entry from a stanza, rendering its raw text.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the stanza lacks an identity field.
    pub fn from_stanza(fields: Stanza) -> Result<Self, IdentityError> {
        let key = IdentityKey::from_stanza(&fields)?;
        Ok(Self::keyed(key, fields))
    }

    /// Build an entry whose identity is already known.
    pub fn keyed(key: IdentityKey, fields: Stanza) -> Self {
        let raw = fields.to_text().trim_end_matches('\n').to_string();
        Self { key, raw, fields }
    }

    /// The `Filename` field, if present.
    pub fn filename(&self) -> Option<&str> {
        self.fields.get(FILENAME_FIELD)
    }
}

/// Result of parsing a document: the keyed entries and the stanzas that were
/// dropped for lacking identity fields.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Entries in document order.
    pub document: IndexDocument,
    /// Stanzas dropped during parsing.
    pub rejected: Vec<DocumentError>,
}

/// An ordered collection of index entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    entries: Vec<IndexEntry>,
}

impl IndexDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text.
    ///
    /// CRLF line endings are read as LF. Stanzas are split on blank lines;
    /// empty regions are skipped and stanzas lacking `Package`, `Version` or
    /// `Architecture` are reported in [`ParseOutcome::rejected`] rather than
    /// failing the parse.
    pub fn parse(text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let text: Cow<'_, str> = if text.contains('\r') {
            Cow::Owned(text.replace("\r\n", "\n"))
        } else {
            Cow::Borrowed(text)
        };
        let stanzas = text
            .split("\n\n")
            .map(|s| s.trim_matches(|c| c == '\n' || c == '\r'))
            .filter(|s| !s.trim().is_empty());

        for (position, raw) in stanzas.enumerate() {
            let fields = Stanza::parse(raw);
            match IdentityKey::from_stanza(&fields) {
                Ok(key) => outcome.document.entries.push(IndexEntry {
                    key,
                    raw: raw.to_string(),
                    fields,
                }),
                Err(IdentityError::MissingField(field)) => {
                    outcome
                        .rejected
                        .push(DocumentError::MissingIdentity { position, field });
                }
            }
        }

        outcome
    }

    /// Serialize entries in their current order.
    ///
    /// Every stanza is followed by exactly one blank line, so a non-empty
    /// document ends with `"\n\n"`.
    pub fn serialize(&self) -> String {
        let capacity = self.entries.iter().map(|e| e.raw.len() + 2).sum();
        let mut out = String::with_capacity(capacity);
        for entry in &self.entries {
            out.push_str(entry.raw.trim_end_matches('\n'));
            out.push_str("\n\n");
        }
        out
    }

    /// Append an entry.
    pub fn push(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    /// Entries in order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Consume the document, yielding its entries.
    pub fn into_entries(self) -> Vec<IndexEntry> {
        self.entries
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by identity.
    pub fn find(&self, key: &IdentityKey) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }
}

impl FromIterator<IndexEntry> for IndexDocument {
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for IndexDocument {
    type Item = IndexEntry;
    type IntoIter = std::vec::IntoIter<IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
