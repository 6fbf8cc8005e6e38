//! Fixtures shared by the integration tests: real `.deb` files built in a
//! temporary repository layout.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary repository root with a `downloads/` archive directory.
pub struct Repo {
    pub temp_dir: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("downloads")).expect("failed to create downloads");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn downloads(&self) -> PathBuf {
        self.root().join("downloads")
    }

    /// Write a `.deb` whose control file is `control`.
    pub fn add_deb(&self, name: &str, control: &str) -> PathBuf {
        let path = self.downloads().join(name);
        fs::write(&path, build_deb(control)).expect("failed to write deb");
        path
    }

    /// Write a file with the archive extension that is not an archive.
    pub fn add_garbage(&self, name: &str) -> PathBuf {
        let path = self.downloads().join(name);
        fs::write(&path, b"definitely not an ar archive").expect("failed to write file");
        path
    }

    /// Write a well-formed `ar` container whose `control.tar.gz` member is
    /// not gzip data.
    pub fn add_corrupt_control(&self, name: &str) -> PathBuf {
        let mut out = b"!<arch>\n".to_vec();
        ar_member(&mut out, "debian-binary", b"2.0\n");
        ar_member(&mut out, "control.tar.gz", b"this is not gzip data at all");
        ar_member(&mut out, "data.tar.gz", b"payload");
        let path = self.downloads().join(name);
        fs::write(&path, out).expect("failed to write deb");
        path
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("failed to read file")
    }
}

pub fn control(name: &str, version: &str, arch: &str) -> String {
    format!("Package: {name}\nVersion: {version}\nArchitecture: {arch}\n")
}

/// Minimal `.deb`: `debian-binary`, a gzip control tarball and a stub data
/// member.
pub fn build_deb(control: &str) -> Vec<u8> {
    let mut tar = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(control.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, "./control", control.as_bytes())
        .expect("failed to append control");
    let tarball = tar.into_inner().expect("failed to finish tar");

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&tarball).expect("failed to compress control");
    let member = gz.finish().expect("failed to finish gzip");

    let mut out = b"!<arch>\n".to_vec();
    ar_member(&mut out, "debian-binary", b"2.0\n");
    ar_member(&mut out, "control.tar.gz", &member);
    ar_member(&mut out, "data.tar.gz", b"payload");
    out
}

fn ar_member(out: &mut Vec<u8>, name: &str, data: &[u8]) {
    let header = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        name,
        0,
        0,
        0,
        "100644",
        data.len()
    );
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(b'\n');
    }
}
