use assert_cmd::Command;
use predicates::prelude::*;

const ROOM_ID: &str =
    "Y2lzY29zcGFyazovL3VzL1JPT00vYmJjZWIxYWQtNDNmMS0zYjU4LTkxNDctZjE0YmIwYzRkMTU0";
const ROOM_UUID: &str = "bbceb1ad-43f1-3b58-9147-f14bb0c4d154";
const MEMBERSHIP_ID: &str = "Y2lzY29zcGFyazovL3VzL01FTUJFUlNISVAvMGQwYzkxYjYtY2U2MC00NzI1LWI2ZDAtMzQ1NWQ1ZDExZWYzOmNkZTFkZDQwLTJmMGQtMTFlNS1iYTljLTdiNjU1NmQyMjA3Yg";

fn sparkly() -> Command {
    let mut cmd = Command::cargo_bin("sparkly").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("SPARK_TOKEN");
    cmd
}

#[test]
fn test_decode_room() {
    sparkly()
        .arg("decode")
        .arg(ROOM_ID)
        .assert()
        .success()
        .stdout(predicate::str::contains("rooms"))
        .stdout(predicate::str::contains("ROOM"))
        .stdout(predicate::str::contains(ROOM_UUID));
}

#[test]
fn test_decode_membership_shows_both_halves() {
    sparkly()
        .arg("decode")
        .arg(MEMBERSHIP_ID)
        .assert()
        .success()
        .stdout(predicate::str::contains("0d0c91b6-ce60-4725-b6d0-3455d5d11ef3"))
        .stdout(predicate::str::contains("cde1dd40-2f0d-11e5-ba9c-7b6556d2207b"));
}

#[test]
fn test_decode_garbage_fails() {
    sparkly()
        .arg("decode")
        .arg("not-an-id")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_encode_room() {
    sparkly()
        .arg("encode")
        .arg("rooms")
        .arg(ROOM_UUID)
        .assert()
        .success()
        .stdout(format!("{}\n", ROOM_ID));
}

#[test]
fn test_encode_accepts_wire_tokens() {
    sparkly()
        .args(["encode", "ROOM", ROOM_UUID])
        .assert()
        .success()
        .stdout(format!("{}\n", ROOM_ID));
}

#[test]
fn test_encode_membership_needs_both_halves() {
    sparkly()
        .args([
            "encode",
            "memberships",
            "0d0c91b6-ce60-4725-b6d0-3455d5d11ef3:cde1dd40-2f0d-11e5-ba9c-7b6556d2207b",
        ])
        .assert()
        .success()
        .stdout(format!("{}\n", MEMBERSHIP_ID));

    sparkly()
        .args(["encode", "memberships", "cde1dd40-2f0d-11e5-ba9c-7b6556d2207b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_encode_unknown_type_fails() {
    sparkly()
        .args(["encode", "widgets", ROOM_UUID])
        .assert()
        .failure()
        .stderr(predicate::str::contains("widgets"));
}

#[test]
fn test_remote_commands_need_a_token() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = temp_dir.path().join("sparkly.toml");
    std::fs::write(&config, "region = \"us\"\n").unwrap();

    sparkly()
        .arg("--config")
        .arg(&config)
        .arg("rooms")
        .assert()
        .failure()
        .stderr(predicate::str::contains("token"));
}
