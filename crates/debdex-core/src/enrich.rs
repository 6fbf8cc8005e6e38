//! Display enrichment.
//!
//! Applies the static mapping tables to an extracted archive and appends the
//! derived fields. Appended fields always follow the control fields in this
//! order:
//!
//! `Depiction`, `SileoDepiction`, `Icon`, `Filename`, `Size`, `MD5sum`,
//! `SHA1`, `SHA256`, `SHA512`.
//!
//! Clients read the index line by line, so the order must not change.

use crate::config::MappingTables;
use crate::extract::ArchiveRecord;
use debdex_schema::document::FILENAME_FIELD;
use debdex_schema::{DigestKind, IdentityKey, IndexEntry, Stanza};
use tracing::debug;

/// Field rewritten by title overrides.
pub const TITLE_FIELD: &str = "Name";

/// A record ready to be written to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// Identity of the package.
    pub key: IdentityKey,
    /// Control fields followed by the derived fields.
    pub stanza: Stanza,
    /// The `Filename` value.
    pub filename: String,
}

impl PackageRecord {
    /// Convert into an index entry.
    pub fn into_entry(self) -> IndexEntry {
        IndexEntry::keyed(self.key, self.stanza)
    }
}

/// Result of enriching one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// The record goes into the index.
    Visible(PackageRecord),
    /// The package name is in the hidden set; the archive is suppressed.
    Hidden {
        /// Identity of the suppressed package.
        key: IdentityKey,
        /// The archive's `Filename` value.
        filename: String,
    },
}

/// Enrich an extracted archive.
pub fn enrich(record: ArchiveRecord, tables: &MappingTables) -> Enrichment {
    let ArchiveRecord {
        key,
        mut control,
        filename,
        digests,
    } = record;
    let name = key.name();

    if tables.hidden.contains(name) {
        debug!(package = name, filename = %filename, "hidden");
        return Enrichment::Hidden { key, filename };
    }

    if let Some(title) = tables.title_overrides.get(name) {
        control.replace(TITLE_FIELD, title.as_str());
    }

    if let Some(id) = tables.depiction_ids.get(name) {
        debug!(package = name, depiction = %id, "depiction");
        control.push("Depiction", tables.templates.depiction_url(id));
        control.push("SileoDepiction", tables.templates.sileo_depiction_url(id));

        if let (Some(base_url), Some(icon)) = (&tables.base_url, tables.icons.get(name)) {
            control.push("Icon", tables.templates.icon_url(base_url, icon));
        }
    }

    control.push(FILENAME_FIELD, filename.as_str());
    control.push("Size", digests.size.to_string());
    for kind in DigestKind::ALL {
        control.push(kind.package_field(), digests.get(kind));
    }

    Enrichment::Visible(PackageRecord {
        key,
        stanza: control,
        filename,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use debdex_schema::FileDigests;

    fn record(control: &str) -> ArchiveRecord {
        let control = Stanza::parse(control);
        ArchiveRecord {
            key: IdentityKey::from_stanza(&control).unwrap(),
            control,
            filename: "downloads/pkg_1.0_arm64.deb".to_string(),
            digests: FileDigests::compute(b"abc"),
        }
    }

    fn field_names(stanza: &Stanza) -> Vec<&str> {
        stanza.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn plain_record_gets_file_fields() {
        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &MappingTables::default(),
        ) else {
            panic!("expected visible record");
        };

        assert_eq!(
            field_names(&rec.stanza),
            [
                "Package",
                "Version",
                "Architecture",
                "Filename",
                "Size",
                "MD5sum",
                "SHA1",
                "SHA256",
                "SHA512"
            ]
        );
        assert_eq!(rec.stanza.get("Size"), Some("3"));
        assert_eq!(rec.stanza.get("Filename"), Some("downloads/pkg_1.0_arm64.deb"));
    }

    #[test]
    fn hidden_packages_are_suppressed() {
        let mut tables = MappingTables::default();
        tables.hidden.insert("pkg".to_string());

        let result = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        );
        assert!(matches!(result, Enrichment::Hidden { ref filename, .. } if filename == "downloads/pkg_1.0_arm64.deb"));
    }

    #[test]
    fn depiction_and_icon_fields_precede_file_fields() {
        let mut tables = MappingTables::default();
        tables.depiction_ids.insert("pkg".into(), "42".into());
        tables.icons.insert("pkg".into(), "pkg.png".into());
        tables.base_url = Some("https://repo.example.com".into());

        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        ) else {
            panic!("expected visible record");
        };

        assert_eq!(&field_names(&rec.stanza)[3..7], ["Depiction", "SileoDepiction", "Icon", "Filename"]);
        assert_eq!(rec.stanza.get("Depiction"), Some("https://havoc.app/depiction/42"));
        assert_eq!(
            rec.stanza.get("Icon"),
            Some("https://repo.example.com/icons/pkg.png")
        );
    }

    #[test]
    fn icon_requires_depiction_and_base_url() {
        let mut tables = MappingTables::default();
        tables.icons.insert("pkg".into(), "pkg.png".into());
        tables.base_url = Some("https://repo.example.com".into());

        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        ) else {
            panic!("expected visible record");
        };
        assert!(!rec.stanza.contains("Icon"));

        tables.depiction_ids.insert("pkg".into(), "42".into());
        tables.base_url = None;
        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        ) else {
            panic!("expected visible record");
        };
        assert!(rec.stanza.contains("Depiction"));
        assert!(!rec.stanza.contains("Icon"));
    }

    #[test]
    fn title_override_rewrites_existing_name_only() {
        let mut tables = MappingTables::default();
        tables.title_overrides.insert("pkg".into(), "Pretty Package".into());

        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nName: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        ) else {
            panic!("expected visible record");
        };
        assert_eq!(rec.stanza.get("Name"), Some("Pretty Package"));
        assert_eq!(field_names(&rec.stanza)[1], "Name");

        let Enrichment::Visible(rec) = enrich(
            record("Package: pkg\nVersion: 1.0\nArchitecture: arm64\n"),
            &tables,
        ) else {
            panic!("expected visible record");
        };
        assert!(!rec.stanza.contains("Name"));
    }
}
