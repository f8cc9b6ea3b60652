//! Integration tests for the PassVault CLI.
//!
//! These run the binary end-to-end with `assert_cmd`. The master
//! password comes from `PASSVAULT_PASSWORD` and every test writes a
//! `passvault.toml` with the cheapest Argon2 settings so runs stay fast.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "correct-horse";

/// Helper: get a Command pointing at the passvault binary.
fn passvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("passvault").expect("binary should exist")
}

/// A temp dir holding a fast config; commands run inside it.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("passvault.toml")
        .write_str(
            "argon2_memory_kib = 8192\n\
             argon2_iterations = 1\n\
             argon2_parallelism = 1\n",
        )
        .unwrap();
    tmp
}

fn run_in(tmp: &TempDir) -> Command {
    let mut cmd = passvault();
    cmd.current_dir(tmp.path())
        .env("PASSVAULT_PASSWORD", MASTER)
        .env_remove("PASSVAULT_VAULT");
    cmd
}

fn init(tmp: &TempDir) {
    run_in(tmp).arg("init").assert().success();
}

fn add(tmp: &TempDir, title: &str, password: &str) {
    run_in(tmp)
        .args(["add", title, "--username", "me@example.com"])
        .write_stdin(format!("{password}\n"))
        .assert()
        .success();
}

#[test]
fn help_lists_commands() {
    passvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local encrypted password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("generate"));
}

#[test]
fn no_args_shows_usage() {
    passvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_vault_file() {
    let tmp = workspace();
    init(&tmp);
    tmp.child("vault.pvlt").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let tmp = workspace();
    init(&tmp);
    run_in(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_password() {
    let tmp = workspace();
    run_in(&tmp)
        .env("PASSVAULT_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure();
    tmp.child("vault.pvlt").assert(predicate::path::missing());
}

#[test]
fn add_list_show_delete_flow() {
    let tmp = workspace();
    init(&tmp);
    add(&tmp, "Mail", "s3cret!");
    add(&tmp, "Bank", "hunter22");

    run_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mail"))
        .stdout(predicate::str::contains("Bank"))
        .stdout(predicate::str::contains("s3cret!").not());

    run_in(&tmp)
        .args(["show", "mail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("me@example.com"))
        .stdout(predicate::str::contains("s3cret!").not());

    run_in(&tmp)
        .args(["show", "Mail", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret!"));

    run_in(&tmp)
        .args(["delete", "Mail", "--force"])
        .assert()
        .success();

    run_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mail").not())
        .stdout(predicate::str::contains("Bank"));
}

#[test]
fn edit_changes_username() {
    let tmp = workspace();
    init(&tmp);
    add(&tmp, "Mail", "s3cret!");

    run_in(&tmp)
        .args(["edit", "Mail", "--username", "new@example.com"])
        .assert()
        .success();

    run_in(&tmp)
        .args(["show", "Mail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new@example.com"));
}

#[test]
fn edit_without_changes_fails() {
    let tmp = workspace();
    init(&tmp);
    add(&tmp, "Mail", "s3cret!");

    run_in(&tmp).args(["edit", "Mail"]).assert().failure();
}

#[test]
fn wrong_password_is_rejected() {
    let tmp = workspace();
    init(&tmp);

    run_in(&tmp)
        .env("PASSVAULT_PASSWORD", "not-the-password")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wrong master password"));
}

#[test]
fn missing_vault_is_reported() {
    let tmp = workspace();
    run_in(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn unknown_entry_fails() {
    let tmp = workspace();
    init(&tmp);
    run_in(&tmp)
        .args(["show", "Nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry matches"));
}

#[test]
fn generate_needs_no_vault() {
    let tmp = workspace();
    let out = run_in(&tmp)
        .args(["generate", "--preset", "pin", "-n", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        assert_eq!(line.len(), 6);
        assert!(line.chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn generate_custom_length() {
    let tmp = workspace();
    run_in(&tmp)
        .args(["generate", "--length", "24", "--no-symbols", "--require-each"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[A-Za-z0-9]{24}\n$").unwrap());
}

#[test]
fn generate_unknown_preset_fails() {
    let tmp = workspace();
    run_in(&tmp)
        .args(["generate", "--preset", "ultra"])
        .assert()
        .failure();
}

#[test]
fn vault_flag_overrides_config() {
    let tmp = workspace();
    let custom = tmp.child("nested/other.pvlt");

    run_in(&tmp)
        .args(["init", "--vault", custom.path().to_str().unwrap()])
        .assert()
        .success();

    custom.assert(predicate::path::exists());
    tmp.child("vault.pvlt").assert(predicate::path::missing());
}

#[test]
fn bad_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    tmp.child("passvault.toml")
        .write_str("argon2_iterations = 0\n")
        .unwrap();

    passvault()
        .current_dir(tmp.path())
        .args(["generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file error"));
}

#[test]
fn version_prints_name() {
    passvault()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("passvault"));
}
