//! CLI tests for the bridge-media binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn bridge_media() -> Command {
    Command::cargo_bin("bridge-media").unwrap()
}

#[test]
fn test_parse_reply_from_stdin() {
    bridge_media()
        .args(["parse", "app"])
        .write_stdin("<msg><appmsg><title>Hello</title><type>57</type><refermsg><svrid>12345</svrid><chatusr>alice</chatusr></refermsg></appmsg></msg>")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"reply\""))
        .stdout(predicate::str::contains("12345"))
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn test_parse_location_with_mentions() {
    let temp = TempDir::new().unwrap();
    let message = temp.path().join("msg.xml");
    let extra = temp.path().join("extra.xml");
    fs::write(&message, r#"<msg><location x="31.2304" y="121.4737" poiname="People's Square"/></msg>"#).unwrap();
    fs::write(&extra, "<msgsource><atuserlist>wxid_a,wxid_b</atuserlist></msgsource>").unwrap();

    bridge_media()
        .args(["parse", "location", "--file"])
        .arg(&message)
        .arg("--extra-info")
        .arg(&extra)
        .assert()
        .success()
        .stdout(predicate::str::contains("31.2304"))
        .stdout(predicate::str::contains("wxid_b"));
}

#[test]
fn test_parse_unknown_kind_fails() {
    bridge_media()
        .args(["parse", "carrier-pigeon"])
        .write_stdin("<msg/>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown message kind"));
}

#[test]
fn test_fetch_existing_file() {
    let temp = TempDir::new().unwrap();
    let docdir = temp.path().join("docs");
    let out = temp.path().join("out");
    fs::create_dir_all(docdir.join("wxid_self/FileStorage/File")).unwrap();
    fs::write(docdir.join("wxid_self/FileStorage/File/report.pdf"), b"%PDF-1.7").unwrap();

    bridge_media()
        .args(["fetch", "file", "--sender", "wxid_self", "--file-path", "wxid_self/FileStorage/File/report.pdf", "--output"])
        .arg(&out)
        .arg("--docdir")
        .arg(&docdir)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("report.pdf"));

    assert_eq!(fs::read(out.join("report.pdf")).unwrap(), b"%PDF-1.7");
}

#[test]
fn test_fetch_unavailable_exits_nonzero() {
    let temp = TempDir::new().unwrap();

    bridge_media()
        .args(["fetch", "file", "--file-path", "missing.pdf", "--timeout-secs", "1", "--output"])
        .arg(temp.path().join("out"))
        .arg("--docdir")
        .arg(temp.path())
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Media not available"));
}

#[test]
fn test_save_unnamed_blob() {
    let temp = TempDir::new().unwrap();
    let blob = temp.path().join("blob.json");
    fs::write(&blob, r#"{"name":"","binary":"aGVsbG8="}"#).unwrap();

    bridge_media()
        .arg("save")
        .arg(&blob)
        .args(["--sender", "wxid_self", "--workdir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5d41402abc4b2a76b9719d911017c592"));

    assert_eq!(
        fs::read(temp.path().join("wxid_self/5d41402abc4b2a76b9719d911017c592")).unwrap(),
        b"hello"
    );
}
