use assert_cmd::Command;
use predicates::prelude::*;

fn racex() -> Command {
    Command::cargo_bin("racex").expect("racex binary should be built")
}

#[test]
fn test_pow_finds_easy_nonce() {
    racex()
        .args(["pow", "--data", "my dummy data", "--bits", "8", "-j", "2", "--stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hash: 00"))
        .stdout(predicate::str::contains("Status: won"));
}

#[test]
fn test_pow_rejects_zero_bits() {
    racex()
        .args(["pow", "--data", "x", "--bits", "0", "-j", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("difficulty"));
}

#[test]
fn test_pow_times_out() {
    racex()
        .args(["pow", "--data", "x", "--bits", "200", "-j", "1", "--timeout", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("deadline"));
}

#[test]
fn test_verify_rejects_bad_nonce() {
    // No real hash has 255 leading zero bits.
    racex()
        .args([
            "verify",
            "--data",
            "x",
            "--nonce",
            "1",
            "--timestamp",
            "2",
            "--bits",
            "255",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Leading zero bits"));
}

#[test]
fn test_requires_subcommand() {
    racex().assert().failure();
}
