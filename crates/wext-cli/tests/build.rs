//! End-to-end runs of the `wext` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn wext() -> Command {
    let mut cmd = cargo_bin_cmd!("wext");
    cmd.env_remove("RUST_LOG")
        .env_remove("WEXT_BROWSER")
        .env("NO_COLOR", "1");
    cmd
}

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "package.json", r#"{ "name": "cli-ext", "version": "2.1.0" }"#);
    write(root, "entrypoints/background.ts", "export default defineBackground(() => {});\n");
    write(
        root,
        "entrypoints/popup.html",
        "<html><head><title>CLI Popup</title></head><body></body></html>",
    );
    write(
        root,
        "entrypoints/overlay.content.ts",
        "export default defineContentScript({ matches: ['<all_urls>'], main() {} });\n",
    );
    dir
}

fn manifest(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn build_writes_chrome_mv3_by_default() {
    let dir = project();

    wext()
        .arg("build")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Build Summary"))
        .stderr(predicate::str::contains("manifest.json"));

    let manifest = manifest(&dir.path().join(".output/chrome-mv3/manifest.json"));
    assert_eq!(manifest["manifest_version"], 3);
    assert_eq!(manifest["name"], "cli-ext");
    assert_eq!(manifest["background"]["service_worker"], "background.js");
    assert_eq!(manifest["action"]["default_title"], "CLI Popup");
}

#[test]
fn browser_flag_selects_target() {
    let dir = project();

    wext()
        .args(["build", "-b", "firefox"])
        .arg(dir.path())
        .assert()
        .success();

    let manifest = manifest(&dir.path().join(".output/firefox-mv2/manifest.json"));
    assert_eq!(manifest["manifest_version"], 2);
    assert_eq!(manifest["browser_action"]["default_popup"], "popup.html");
}

#[test]
fn environment_selects_browser_and_flags_win() {
    let dir = project();

    wext()
        .arg("build")
        .arg(dir.path())
        .env("WEXT_BROWSER", "edge")
        .assert()
        .success();
    assert!(dir.path().join(".output/edge-mv3/manifest.json").exists());

    wext()
        .args(["build", "--browser", "firefox", "--mv3"])
        .arg(dir.path())
        .env("WEXT_BROWSER", "edge")
        .assert()
        .success();
    assert!(dir.path().join(".output/firefox-mv3/manifest.json").exists());
}

#[test]
fn config_file_is_respected() {
    let dir = project();
    write(
        dir.path(),
        "wext.toml",
        "out_dir = \"dist\"\n[manifest]\npermissions = [\"storage\"]\n",
    );

    wext().arg("build").arg(dir.path()).assert().success();

    let manifest = manifest(&dir.path().join("dist/chrome-mv3/manifest.json"));
    assert_eq!(manifest["permissions"], serde_json::json!(["storage"]));
}

#[test]
fn filtered_build_only_emits_selected_entrypoints() {
    let dir = project();

    wext()
        .args(["build", "-e", "popup"])
        .arg(dir.path())
        .assert()
        .success();

    let out = dir.path().join(".output/chrome-mv3");
    assert!(out.join("popup.html").exists());
    assert!(!out.join("content-scripts/overlay.js").exists());
}

#[test]
fn empty_project_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();

    wext()
        .arg("build")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entrypoints found"));
}

#[test]
fn missing_root_fails() {
    let dir = TempDir::new().unwrap();

    wext()
        .arg("build")
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn conflicting_manifest_versions_are_rejected() {
    wext()
        .args(["build", "--mv2", "--mv3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
