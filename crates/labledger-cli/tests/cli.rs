use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const BIN_NAME: &str = "labledger";

const JANE: &str = "\
INVOICE FOR: Dr. John Smith
DESCRIPTION QUANTITY UNIT PRICE COST
Crown 1 $200.00 $200.00
Rebate 1 $20.00 ($20.00)
Total $180.00
Patient: Jane Doe, Due 3/15/2024
";

const BOB: &str = "\
INVOICE FOR: Dr. John Smith
DESCRIPTION QUANTITY UNIT PRICE COST
Bridge 1 $1,250.00 $1,250.00
Total $1,250.00
Patient: Bob Stone, Due 3/2/2024
";

const OVERFLOW: &str = "\
INVOICE FOR: Dr. John Smith
DESCRIPTION QUANTITY UNIT PRICE COST
Crown 1 $200.00 $200.00
Extra 1 79228162514264337593543950335 79228162514264337593543950335
Extra 1 79228162514264337593543950335 79228162514264337593543950335
Total
Patient: Bob Stone, Due 3/2/2024
";

/// Command with the user's config directory pointed into `home`.
fn labledger(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

fn inbox(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn import(home: &TempDir, inbox: &Path, out: &Path) {
    labledger(home)
        .arg("import")
        .arg(inbox.join("*.txt").to_str().unwrap())
        .arg("--output-dir")
        .arg(out)
        .assert()
        .success();
}

#[test]
fn cli_process_prints_invoice_json() {
    let home = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE)]);

    labledger(&home)
        .arg("process")
        .arg(docs.path().join("jane.txt"))
        .assert()
        .success()
        .stdout(
            contains("\"patient_name\": \"Jane Doe\"")
                .and(contains("\"dentist_name\": \"Dr. John Smith\""))
                .and(contains("\"bucket\": \"2024-03\"")),
        );
}

#[test]
fn cli_process_text_format() {
    let home = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE)]);

    labledger(&home)
        .args(["process", "--format", "text"])
        .arg(docs.path().join("jane.txt"))
        .assert()
        .success()
        .stdout(contains("Alloys/Extras: -$20.00").and(contains("Total:         $180.00")));
}

#[test]
fn cli_import_writes_month_folder() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE), ("bob.txt", BOB)]);

    labledger(&home)
        .arg("import")
        .arg(docs.path().join("*.txt").to_str().unwrap())
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(contains("Found 2 files to process").and(contains("2024-03")));

    let month = out.path().join("2024-03");
    assert!(month.join("2024-03_Ledger.csv").exists());
    assert!(month.join("2024-03_Statement.pdf").exists());
}

#[test]
fn cli_import_lists_failed_files() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE), ("garbage.txt", "nothing to see here")]);

    labledger(&home)
        .arg("import")
        .arg(docs.path().join("*.txt").to_str().unwrap())
        .arg("--output-dir")
        .arg(out.path())
        .arg("--no-report")
        .assert()
        .success()
        .stdout(contains("Failed files:").and(contains("garbage.txt")));

    assert!(out.path().join("2024-03").join("2024-03_Ledger.csv").exists());
    assert!(!out.path().join("2024-03").join("2024-03_Statement.pdf").exists());
}

#[test]
fn cli_import_keeps_going_after_out_of_range_amounts() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let docs = inbox(&[("a_good.txt", JANE), ("b_bad.txt", OVERFLOW)]);

    labledger(&home)
        .args(["import", "-j", "2"])
        .arg(docs.path().join("*.txt").to_str().unwrap())
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(
            contains("Imported 1 of 2 files")
                .and(contains("Failed files:"))
                .and(contains("b_bad.txt"))
                .and(contains("amount out of range")),
        );

    let ledger = fs::read_to_string(out.path().join("2024-03").join("2024-03_Ledger.csv")).unwrap();
    assert!(ledger.contains("Jane Doe"));
    assert!(!ledger.contains("Bob Stone"));
}

#[test]
fn cli_import_without_matches_fails() {
    let home = tempfile::tempdir().unwrap();
    let docs = inbox(&[]);

    labledger(&home)
        .arg("import")
        .arg(docs.path().join("*.pdf").to_str().unwrap())
        .assert()
        .failure()
        .stderr(contains("No matching files found"));
}

#[test]
fn cli_ledger_and_report_read_the_month() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE), ("bob.txt", BOB)]);
    import(&home, docs.path(), out.path());

    labledger(&home)
        .args(["ledger", "2024-03", "--output-dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(
            contains("Bob Stone")
                .and(contains("Jane Doe"))
                .and(contains("$1,430.00")),
        );

    labledger(&home)
        .args(["report", "2024-03", "--format", "text", "--dentist", "DR. ROE"])
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(
            contains("Statement for period ending 3/31/2024 for DR. ROE")
                .and(contains("Payment due by: 4/25/2024")),
        );
}

#[test]
fn cli_ledger_missing_month_fails() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    labledger(&home)
        .args(["ledger", "2024-07", "--output-dir"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(contains("No ledger for 2024-07"));
}

#[test]
fn cli_reset_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let docs = inbox(&[("jane.txt", JANE)]);
    import(&home, docs.path(), out.path());

    labledger(&home)
        .args(["reset", "2024-03", "--output-dir"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(contains("--yes"));
    assert!(out.path().join("2024-03").exists());

    labledger(&home)
        .args(["reset", "2024-03", "--yes", "--output-dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(contains("Deleted"));
    assert!(!out.path().join("2024-03").exists());
}

#[test]
fn cli_invalid_month_is_rejected() {
    let home = tempfile::tempdir().unwrap();

    labledger(&home)
        .args(["reset", "March", "--yes"])
        .assert()
        .failure()
        .stderr(contains("expected YYYY-MM"));
}

#[test]
fn cli_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("labledger.json");

    labledger(&home)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    labledger(&home)
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "lab.phone", "555-0100"])
        .assert()
        .success();

    labledger(&home)
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "lab.phone"])
        .assert()
        .success()
        .stdout(contains("\"555-0100\""));

    labledger(&home)
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "lab.fax", "1"])
        .assert()
        .failure()
        .stderr(contains("Configuration key not found"));
}
