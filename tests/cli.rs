use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const BIN_NAME: &str = "tally";

fn tally(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("TALLY_DATA_DIR", dir.path()).env_remove("TALLY_LOG");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    tally(&dir).arg("init").assert().success();
    dir
}

#[test]
fn init_seeds_default_categories() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Default categories have been created"));

    tally(&dir)
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(contains("Food").and(contains("└── Coffee")));

    tally(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Already initialized"));
}

#[test]
fn expense_add_then_list() {
    let dir = initialized();
    tally(&dir)
        .args([
            "expense", "add", "12.50", "-d", "2025-03-04", "-D", "Lunch", "-c", "Food", "-s",
            "Dining Out", "-t", "work",
        ])
        .assert()
        .success()
        .stdout(contains("Recorded expense: $12.50 on 2025-03-04"));

    tally(&dir)
        .args(["income", "add", "2000", "-d", "2025-03-01", "--source", "Employer"])
        .assert()
        .success();

    tally(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(
            contains("Lunch")
                .and(contains("Food / Dining Out"))
                .and(contains("#work"))
                .and(contains("-$12.50"))
                .and(contains("Employer"))
                .and(contains("net $1987.50")),
        );

    tally(&dir)
        .args(["txn", "list", "--kind", "income"])
        .assert()
        .success()
        .stdout(contains("Employer").and(contains("Lunch").not()));

    tally(&dir)
        .args(["txn", "list", "--search", "nothing-like-this"])
        .assert()
        .success()
        .stdout(contains("No transactions found."));
}

#[test]
fn invalid_amount_is_rejected() {
    let dir = initialized();
    tally(&dir)
        .args(["expense", "add", "twelve"])
        .assert()
        .failure()
        .stderr(contains("Invalid amount"));
}

#[test]
fn unknown_category_is_reported() {
    let dir = initialized();
    tally(&dir)
        .args(["expense", "add", "5", "-c", "Spaceships"])
        .assert()
        .failure()
        .stderr(contains("Category not found: Spaceships"));
}

#[test]
fn import_skips_bad_rows_and_duplicates() {
    let dir = initialized();
    let csv_path = dir.path().join("bank.csv");
    fs::write(
        &csv_path,
        "Date,Payee,Amount,Category\n\
         03/04/2025,Corner Shop,-8.20,Food\n\
         2025-03-05,Bus pass,-30.00,Transport\n\
         not a date,Broken,-1.00,\n",
    )
    .unwrap();

    tally(&dir)
        .args(["import"])
        .arg(&csv_path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("2 new, 0 duplicate, 1 with errors").and(contains("Dry run")));

    tally(&dir)
        .arg("import")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(
            contains("Imported 2 transactions")
                .and(contains("1 row with errors"))
                .and(contains("unrecognized date 'not a date'")),
        );

    tally(&dir)
        .arg("import")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(contains("Imported 0 transactions, skipped 2 duplicates"));

    tally(&dir)
        .args(["txn", "list", "-c", "Transport"])
        .assert()
        .success()
        .stdout(contains("Bus pass").and(contains("Corner Shop").not()));
}

#[test]
fn budget_progress_counts_month_spending() {
    let dir = initialized();
    tally(&dir)
        .args(["budget", "set", "Food", "100", "--month", "2025-05"])
        .assert()
        .success()
        .stdout(contains("Budget for Food in May 2025: $100.00"));

    for (amount, date) in [("30", "2025-05-10"), ("99", "2025-06-01")] {
        tally(&dir)
            .args(["expense", "add", amount, "-d", date, "-c", "Food"])
            .assert()
            .success();
    }

    tally(&dir)
        .args(["budget", "progress", "--month", "2025-05"])
        .assert()
        .success()
        .stdout(
            contains("Budget progress for May 2025")
                .and(contains("$30.00"))
                .and(contains("$70.00")),
        );

    tally(&dir)
        .args(["budget", "copy", "2025-05", "2025-06"])
        .assert()
        .success()
        .stdout(contains("Copied 1 budgets"));
}

#[test]
fn export_and_reports_write_files() {
    let dir = initialized();
    tally(&dir)
        .args(["expense", "add", "42", "-d", "2025-02-02", "-D", "Shoes", "-c", "Shopping"])
        .assert()
        .success();

    let csv_path = dir.path().join("out").join("transactions.csv");
    tally(&dir)
        .args(["export", "transactions"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(contains("Exported 1 transactions"));
    let text = fs::read_to_string(&csv_path).unwrap();
    assert!(text.starts_with("ID,Date,Type,Description,Category,Subcategory,Source,Tags,Amount,Notes"));
    assert!(text.contains("Shoes,Shopping"));

    let json_path = dir.path().join("all.json");
    tally(&dir)
        .args(["export", "all"])
        .arg(&json_path)
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["transactions"].as_array().unwrap().len(), 1);

    let pdf_path = dir.path().join("spending.pdf");
    tally(&dir)
        .args(["report", "spending", "--month", "2025-02", "--pdf"])
        .arg(&pdf_path)
        .assert()
        .success()
        .stdout(contains("Shopping"));
    let bytes = fs::read(&pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn tag_rename_and_delete() {
    let dir = initialized();
    tally(&dir)
        .args(["expense", "add", "3", "-t", "coffee,treat"])
        .assert()
        .success();

    tally(&dir)
        .args(["tag", "rename", "treat", "snack"])
        .assert()
        .success()
        .stdout(contains("Renamed tag #treat to #snack"));

    tally(&dir)
        .args(["tag", "delete", "coffee"])
        .assert()
        .success()
        .stdout(contains("Removed from 1 transactions"));

    tally(&dir)
        .args(["tag", "list"])
        .assert()
        .success()
        .stdout(contains("#snack").and(contains("#coffee").not()));
}
