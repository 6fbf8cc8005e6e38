//! Ordered `Key: Value` records.
//!
//! A [`Stanza`] keeps its fields in the order they were read or appended.
//! Downstream clients read the index line by line, so two documents that
//! describe the same package must emit the same fields in the same order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `Key: Value` line (plus any continuation lines folded into `value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, e.g. `Package`.
    pub name: String,
    /// Field value. Continuation lines are kept verbatim, joined with `\n`.
    pub value: String,
}

impl Field {
    /// Create a field from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered list of fields describing one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stanza {
    fields: Vec<Field>,
}

impl Stanza {
    /// Create an empty stanza.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `Key: Value` lines of a single stanza.
    ///
    /// The first `": "` on a line splits name from value; a bare `Key:` is a
    /// field with an empty value. Lines starting with a space or tab continue
    /// the previous field. Anything else is ignored.
    pub fn parse(text: &str) -> Self {
        let mut fields: Vec<Field> = Vec::new();

        for line in text.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(last) = fields.last_mut() {
                    last.value.push('\n');
                    last.value.push_str(line);
                }
                continue;
            }

            let split = line
                .split_once(": ")
                .or_else(|| line.strip_suffix(':').map(|name| (name, "")));

            if let Some((name, value)) = split {
                if is_field_name(name) {
                    fields.push(Field::new(name, value));
                }
            }
        }

        Self { fields }
    }

    /// Look up a field value by name (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// Whether a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a field at the end.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(name, value));
    }

    /// Replace the value of an existing field in place.
    ///
    /// Returns `false` (and leaves the stanza untouched) if no field with
    /// that name exists.
    pub fn replace(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(name))
        {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Iterate over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the stanza has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the stanza as `Key: Value` lines, each terminated by `\n`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            if field.value.is_empty() || field.value.starts_with('\n') {
                writeln!(f, "{}:{}", field.name, field.value)?;
            } else {
                writeln!(f, "{}: {}", field.name, field.value)?;
            }
        }
        Ok(())
    }
}

impl FromIterator<Field> for Stanza {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Stanza {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('#') && !name.contains(char::is_whitespace)
}
