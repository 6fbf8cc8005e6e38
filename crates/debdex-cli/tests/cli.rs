use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temporary repository root with `index.yaml` and `downloads/`.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("downloads")).expect("failed to create downloads");
        fs::write(
            temp_dir.path().join("index.yaml"),
            "base-url: https://repo.example.com\nrelease:\n  origin: Example\n",
        )
        .expect("failed to write config");
        Self { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn debdex(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_debdex"));
        cmd.current_dir(self.root());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.debdex().args(args).output().expect("failed to run debdex")
    }

    fn add_deb(&self, name: &str, package: &str, version: &str) -> PathBuf {
        let control = format!("Package: {package}\nVersion: {version}\nArchitecture: iphoneos-arm64\n");
        let path = self.root().join("downloads").join(name);
        fs::write(&path, build_deb(&control)).expect("failed to write deb");
        path
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.root().join(name)).expect("failed to read output")
    }
}

fn build_deb(control: &str) -> Vec<u8> {
    let mut tar = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(control.len() as u64);
    header.set_mode(0o644);
    tar.append_data(&mut header, "./control", control.as_bytes())
        .expect("failed to append control");
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&tar.into_inner().expect("failed to finish tar"))
        .expect("failed to compress");
    let member = gz.finish().expect("failed to finish gzip");

    let mut out = b"!<arch>\n".to_vec();
    for (name, data) in [
        ("debian-binary", &b"2.0\n"[..]),
        ("control.tar.gz", &member[..]),
        ("data.tar.gz", &b"payload"[..]),
    ] {
        let header = format!("{name:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", 0, 0, 0, "100644", data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 == 1 {
            out.push(b'\n');
        }
    }
    out
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("build"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_hash_prints_stanza_fields() {
    let ctx = TestContext::new();
    fs::write(ctx.root().join("abc.txt"), b"abc").unwrap();

    let output = ctx.run(&["hash", "abc.txt"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  Size: 3"));
    assert!(stdout.contains("  MD5sum: 900150983cd24fb0d6963f7d28e17f72"));
    assert!(stdout.contains(
        "  SHA256: ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    ));
}

#[test]
fn test_hash_json() {
    let ctx = TestContext::new();
    fs::write(ctx.root().join("empty"), b"").unwrap();

    let output = ctx.run(&["hash", "--json", "empty"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["digests"]["size"], 0);
    assert_eq!(
        value[0]["digests"]["sha1"],
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
}

#[test]
fn test_build_then_verify() {
    let ctx = TestContext::new();
    ctx.add_deb("a_1.0_iphoneos-arm64.deb", "com.example.a", "1.0");
    ctx.add_deb("b_1.0_iphoneos-arm64.deb", "com.example.b", "1.0");

    let output = ctx.run(&["build", "--reader", "native", "--report", "report.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  wrote Packages.zst"));

    for name in ["Packages", "Packages.gz", "Packages.bz2", "Packages.xz", "Packages.zst", "Release"] {
        assert!(ctx.root().join(name).is_file(), "{name} missing");
    }
    let packages = ctx.read("Packages");
    assert!(packages.contains("Filename: downloads/a_1.0_iphoneos-arm64.deb\n"));
    assert!(ctx.read("Release").starts_with("Origin: Example\n"));

    let report: serde_json::Value = serde_json::from_str(&ctx.read("report.json")).unwrap();
    assert_eq!(report["mode"], "full");
    assert_eq!(report["summary"]["written"], 2);

    assert!(ctx.run(&["verify"]).status.success());

    fs::write(ctx.root().join("Packages.bz2"), b"tampered").unwrap();
    let output = ctx.run(&["verify"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("mismatch Packages.bz2"));
}

#[test]
fn test_incremental_build_with_changed_archive() {
    let ctx = TestContext::new();
    ctx.add_deb("a.deb", "com.example.a", "1.0");
    ctx.add_deb("b.deb", "com.example.b", "1.0");
    assert!(ctx.run(&["build", "--reader", "native"]).status.success());

    ctx.add_deb("b.deb", "com.example.b", "2.0");
    let output = ctx.run(&["build", "--reader", "native", "--changed", "downloads/b.deb"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("incremental build"));

    let packages = ctx.read("Packages");
    assert!(packages.contains("Package: com.example.b\nVersion: 2.0"));
    assert!(!packages.contains("Version: 1.0\nArchitecture: iphoneos-arm64\nFilename: downloads/b.deb"));
    assert!(packages.contains("Package: com.example.a"));
}

#[test]
fn test_packages_then_release() {
    let ctx = TestContext::new();
    ctx.add_deb("a.deb", "com.example.a", "1.0");

    assert!(ctx.run(&["packages", "--reader", "native"]).status.success());
    assert!(!ctx.root().join("Release").exists());

    assert!(ctx.run(&["release"]).status.success());
    assert!(ctx.run(&["verify"]).status.success());
}

#[test]
fn test_skipped_archive_is_reported_by_default() {
    let ctx = TestContext::new();
    ctx.add_deb("a.deb", "com.example.a", "1.0");
    fs::write(ctx.root().join("downloads/broken.deb"), b"not an archive").unwrap();

    let output = ctx.run(&["build", "--reader", "native"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipping"), "{stderr}");
    assert!(stderr.contains("broken.deb"), "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 skipped"));
}

#[test]
fn test_missing_config_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["build", "--config", "absent.yaml", "--reader", "native"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.yaml"));
}
