//! End-to-end tests driving the `pour` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A temporary POUR_HOME plus a scratch directory for descriptors.
struct TestContext {
    temp_dir: TempDir,
    pour_home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let pour_home = temp_dir.path().join(".pour");
        Self {
            temp_dir,
            pour_home,
        }
    }

    fn pour(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pour"))
            .args(args)
            .env("HOME", self.temp_dir.path())
            .env("POUR_HOME", &self.pour_home)
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run pour")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("failed to write file");
        path
    }
}

fn shipped_descriptor() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../descriptors/td.toml")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn tar_gz(path: &str, contents: &[u8]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o755);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    builder.append_data(&mut header, path, contents).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

fn sha256_hex(data: &[u8]) -> String {
    pour_schema::Sha256Digest::compute(data).to_string()
}

fn descriptor_for(base: &str, sha256: &str) -> String {
    format!(
        r#"
[package]
name = "td"
version = "1.2.3"

[variants.linux-amd64]
url = "{base}/v{{version}}/td_{{version}}_linux_amd64.tar.gz"
sha256 = "{sha256}"

[variants.darwin-arm64]
url = "{base}/v{{version}}/td_{{version}}_darwin_arm64.tar.gz"
sha256 = "{sha256}"

[test]
args = ["-version"]

[hints]
post_install = "Installed {{name}} {{version}} to {{bin}}"
"#
    )
}

#[test]
fn help_lists_commands() {
    let ctx = TestContext::new();
    let output = ctx.pour(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["install", "test", "resolve", "check", "caveats", "bump", "hash"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn check_accepts_shipped_descriptor() {
    let ctx = TestContext::new();
    let output = ctx.pour(&["check", shipped_descriptor().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("td"));
    assert!(text.contains("darwin-arm64"));
    assert!(text.contains("linux-amd64"));
}

#[test]
fn check_rejects_invalid_descriptor() {
    let ctx = TestContext::new();
    let path = ctx.write(
        "bad.toml",
        "[package]\nname = \"td\"\nversion = \"1.0.0\"\n[variants.linux-amd64]\nurl = \"https://example.com/td.tar.gz\"\nsha256 = \"PLACEHOLDER\"\n",
    );
    let output = ctx.pour(&["check", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn resolve_json_reports_variant_for_platform() {
    let ctx = TestContext::new();
    let output = ctx.pour(&[
        "resolve",
        shipped_descriptor().to_str().unwrap(),
        "--platform",
        "linux-arm64",
        "--json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["platform"], "linux-arm64");
    assert_eq!(value["format"], "tar.gz");
    let url = value["url"].as_str().unwrap();
    let version = value["version"].as_str().unwrap();
    assert!(url.ends_with(&format!("td_{version}_linux_arm64.tar.gz")), "{url}");
    assert_eq!(value["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn undeclared_platform_exits_with_unsupported_code() {
    let ctx = TestContext::new();
    let descriptor = shipped_descriptor();

    let output = ctx.pour(&[
        "resolve",
        descriptor.to_str().unwrap(),
        "--platform",
        "windows-amd64",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("windows-amd64"));

    let output = ctx.pour(&[
        "install",
        descriptor.to_str().unwrap(),
        "--platform",
        "windows-amd64",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!ctx.pour_home.join("bin").exists());
}

#[test]
fn hash_prints_digest_and_path() {
    let ctx = TestContext::new();
    let path = ctx.write("hello.txt", "hello world");
    let output = ctx.pour(&["hash", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!(
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9  {}",
            path.display()
        )
    );
}

#[test]
fn caveats_render_install_location() {
    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for("https://example.com", &"0".repeat(64)));
    let output = ctx.pour(&["caveats", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    let expected = ctx.pour_home.join("bin").join("td");
    assert!(
        stdout(&output).contains(&format!("Installed td 1.2.3 to {}", expected.display())),
        "{}",
        stdout(&output)
    );
}

#[test]
fn bump_with_given_checksums_rewrites_descriptor() {
    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for("https://example.com", &"0".repeat(64)));
    let a = "a".repeat(64);
    let b = "b".repeat(64);

    let output = ctx.pour(&[
        "bump",
        path.to_str().unwrap(),
        "--version",
        "1.3.0",
        "--sha256",
        &format!("linux-amd64={a}"),
        "--sha256",
        &format!("darwin-arm64={b}"),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = ctx.pour(&["resolve", path.to_str().unwrap(), "--platform", "linux-amd64", "--json"]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], "1.3.0");
    assert_eq!(value["sha256"], a.as_str());
    let url = value["url"].as_str().unwrap();
    assert!(url.contains("/v1.3.0/td_1.3.0_linux_amd64"), "{url}");
    assert!(!url.contains("1.2.3"), "{url}");
}

#[test]
fn bump_fetches_missing_checksums() {
    let mut server = mockito::Server::new();
    let linux = b"linux release".to_vec();
    let darwin = b"darwin release".to_vec();
    let _l = server
        .mock("GET", "/v2.0.0/td_2.0.0_linux_amd64.tar.gz")
        .with_body(&linux)
        .create();
    let _d = server
        .mock("GET", "/v2.0.0/td_2.0.0_darwin_arm64.tar.gz")
        .with_body(&darwin)
        .create();

    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for(&server.url(), &"0".repeat(64)));
    let output = ctx.pour(&["bump", path.to_str().unwrap(), "--version", "2.0.0"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = ctx.pour(&["resolve", path.to_str().unwrap(), "--platform", "darwin-arm64", "--json"]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sha256"], sha256_hex(&darwin).as_str());
}

#[cfg(unix)]
#[test]
fn install_then_test_end_to_end() {
    let script = b"#!/bin/sh\necho \"td version 1.2.3, commit abc, date today\"\n";
    let body = tar_gz("td_1.2.3/td", script);
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/v1.2.3/td_1.2.3_linux_amd64.tar.gz")
        .with_body(&body)
        .create();

    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for(&server.url(), &sha256_hex(&body)));

    let output = ctx.pour(&["install", path.to_str().unwrap(), "--platform", "linux-amd64"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let installed = ctx.pour_home.join("bin").join("td");
    assert_eq!(std::fs::read(&installed).unwrap(), script);
    assert!(stdout(&output).contains("Installed td 1.2.3"));

    let output = ctx.pour(&["test", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("td version 1.2.3"));
}

#[cfg(unix)]
#[test]
fn failed_smoke_test_exits_with_verification_code_and_keeps_prior() {
    let body = tar_gz("td_1.2.3/td", b"#!/bin/sh\nexit 139\n");
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/v1.2.3/td_1.2.3_linux_amd64.tar.gz")
        .with_body(&body)
        .create();

    let ctx = TestContext::new();
    let bin_dir = ctx.pour_home.join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    std::fs::write(bin_dir.join("td"), b"old working td").unwrap();
    let path = ctx.write("td.toml", &descriptor_for(&server.url(), &sha256_hex(&body)));

    let output = ctx.pour(&["install", path.to_str().unwrap(), "--platform", "linux-amd64"]);
    assert_eq!(output.status.code(), Some(6), "{}", stderr(&output));
    assert_eq!(std::fs::read(bin_dir.join("td")).unwrap(), b"old working td");
    assert_eq!(std::fs::read_dir(&bin_dir).unwrap().count(), 1);
}

#[test]
fn integrity_failure_exits_with_integrity_code() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/v1.2.3/td_1.2.3_linux_amd64.tar.gz")
        .with_body("tampered")
        .create();

    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for(&server.url(), &"0".repeat(64)));

    let output = ctx.pour(&["install", path.to_str().unwrap(), "--platform", "linux-amd64"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Checksum mismatch"));
    assert!(!ctx.pour_home.join("bin").join("td").exists());
}

#[test]
fn missing_artifact_exits_with_network_code() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/v1.2.3/td_1.2.3_linux_amd64.tar.gz")
        .with_status(404)
        .create();

    let ctx = TestContext::new();
    let path = ctx.write("td.toml", &descriptor_for(&server.url(), &"0".repeat(64)));

    let output = ctx.pour(&["install", path.to_str().unwrap(), "--platform", "linux-amd64"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_without_install_exits_with_verification_code() {
    let ctx = TestContext::new();
    let output = ctx.pour(&["test", shipped_descriptor().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(6));
}
