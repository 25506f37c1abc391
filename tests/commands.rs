//! E2E tests for the costing and ledger commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::str::FromStr;

fn acctc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_acctc"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json(args: &[&str]) -> Value {
    let output = acctc(args);
    assert!(output.status.success(), "Command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

/// Decimals are serialised as strings; formatted columns are plain text.
fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("not a decimal"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("not a decimal"),
        other => panic!("expected a decimal, got {}", other),
    }
}

const JOURNAL: &str = "tests/data/journal.csv";
const ACCOUNTS: &str = "tests/data/accounts.csv";
const ITEMS: &str = "tests/data/items.csv";

fn cost_json(method: &str) -> Value {
    json(&["cost", "-j", JOURNAL, "-i", ITEMS, "-m", method, "--json"])
}

/// Opening 10 @ 10, receipt 5 for 60, issue 8: each method's textbook answer
#[test]
fn cost_worked_example_per_method() {
    let cases = [
        ("FIFO", dec!(80)),
        ("LIFO", dec!(90)),
        ("MOVING", dec!(85.33)),
        ("PERIODIC", dec!(85.33)),
    ];
    for (method, expected) in cases {
        let output = cost_json(method);
        let issues = output["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 1, "{}", method);
        assert_eq!(decimal(&issues[0]["value"]), expected, "{}", method);
        assert_eq!(issues[0]["item"], "VT01");
        assert_eq!(issues[0]["source"], "journal.csv:5");
        assert_eq!(output["method"], method);
    }
}

#[test]
fn cost_reports_closing_stock() {
    let output = cost_json("FIFO");
    let closing = &output["closing"][0];
    assert_eq!(decimal(&closing["quantity"]), dec!(7));
    assert_eq!(decimal(&closing["value"]), dec!(80));
    assert!(output["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn cost_accepts_method_aliases() {
    let output = cost_json("ntxt");
    assert_eq!(output["method"], "FIFO");

    let output = acctc(&["cost", "-j", JOURNAL, "-m", "average"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown costing method"));
}

/// Journals are merged across files; the February issue costs from January's closing
#[test]
fn cost_merges_csv_and_json_journals() {
    let output = json(&[
        "cost",
        "-j",
        JOURNAL,
        "tests/data/journal_feb.json",
        "-i",
        ITEMS,
        "-m",
        "FIFO",
        "--json",
    ]);
    let issues = output["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[1]["source"], "journal_feb.json:2");
    assert_eq!(decimal(&issues[1]["value"]), dec!(20));
    assert_eq!(decimal(&output["total_issued_value"]), dec!(100));
}

#[test]
fn cost_csv_output() {
    let output = acctc(&["cost", "-j", JOURNAL, "-i", ITEMS, "--csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("source,date,warehouse,item,quantity,unit_cost,value,note")
    );
    assert!(lines.next().unwrap().starts_with("journal.csv:5,2024-01-20,K1,VT01,8,"));
}

#[test]
fn cost_writes_priced_journal() {
    let dir: PathBuf = std::env::temp_dir().join(format!("acctc-writeback-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let output = acctc(&[
        "cost",
        "-j",
        JOURNAL,
        "-i",
        ITEMS,
        "-m",
        "FIFO",
        "--out-dir",
        dir.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let mut rdr = csv::Reader::from_path(dir.join("journal.csv")).unwrap();
    let headers = rdr.headers().unwrap().clone();
    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 5);

    let issue = records
        .iter()
        .find(|r| &r[column("voucher_no")] == "PX01")
        .unwrap();
    assert_eq!(Decimal::from_str(&issue[column("amount")]).unwrap(), dec!(80));
    assert_eq!(Decimal::from_str(&issue[column("unit_price")]).unwrap(), dec!(10));

    let purchase = records
        .iter()
        .find(|r| &r[column("voucher_no")] == "PN01")
        .unwrap();
    assert_eq!(&purchase[column("amount")], "60");

    std::fs::remove_dir_all(&dir).unwrap();
}

fn trial_balance(extra: &[&str]) -> Value {
    let mut args = vec![
        "trial-balance",
        "-j",
        JOURNAL,
        "-a",
        ACCOUNTS,
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--json",
    ];
    args.extend_from_slice(extra);
    json(&args)
}

fn row<'a>(output: &'a Value, code: &str) -> &'a Value {
    output["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["code"] == code)
        .unwrap_or_else(|| panic!("no row for {}", code))
}

/// Parents carry their children; the transfer between 1111 and 1112 nets out of 111
#[test]
fn trial_balance_rolls_up_children() {
    let output = trial_balance(&[]);

    let cash = row(&output, "111");
    assert_eq!(cash["summary"], true);
    assert_eq!(decimal(&cash["opening_debit"]), dec!(1500));
    assert_eq!(decimal(&cash["period_debit"]), dec!(1000));
    assert_eq!(decimal(&cash["period_credit"]), dec!(0));
    assert_eq!(decimal(&cash["closing_debit"]), dec!(2500));

    let on_hand = row(&output, "1111");
    assert_eq!(on_hand["summary"], false);
    assert_eq!(decimal(&on_hand["period_credit"]), dec!(200));
    assert_eq!(decimal(&on_hand["closing_debit"]), dec!(2300));

    let capital = row(&output, "411");
    assert_eq!(decimal(&capital["closing_credit"]), dec!(1600));

    assert!(output["rows"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["code"] != "632" && r["code"] != "333"));
}

#[test]
fn trial_balance_totals_balance() {
    let output = trial_balance(&[]);
    let totals = &output["totals"];
    assert_eq!(decimal(&totals["opening"]["debit"]), dec!(1600));
    assert_eq!(decimal(&totals["opening"]["credit"]), dec!(1600));
    assert_eq!(decimal(&totals["period_debit"]), dec!(1060));
    assert_eq!(decimal(&totals["period_credit"]), dec!(1060));
    assert_eq!(decimal(&totals["closing"]["debit"]), dec!(2660));
    assert_eq!(decimal(&totals["closing"]["credit"]), dec!(2660));
}

#[test]
fn trial_balance_with_vat() {
    let output = trial_balance(&["--with-vat"]);
    assert_eq!(decimal(&row(&output, "111")["closing_debit"]), dec!(2600));
    assert_eq!(decimal(&row(&output, "33311")["closing_credit"]), dec!(100));
    assert_eq!(decimal(&row(&output, "333")["closing_credit"]), dec!(100));
    assert_eq!(decimal(&row(&output, "1331")["closing_debit"]), dec!(6));
    assert_eq!(decimal(&row(&output, "331")["closing_credit"]), dec!(66));

    let totals = &output["totals"];
    assert_eq!(decimal(&totals["period_debit"]), dec!(1166));
    assert_eq!(decimal(&totals["period_credit"]), dec!(1166));
}

/// VAT accounts absent from the chart are created and still roll up
#[test]
fn trial_balance_with_vat_creates_missing_accounts() {
    let output = json(&[
        "trial-balance",
        "-j",
        JOURNAL,
        "-a",
        "tests/data/accounts_no_vat.csv",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--with-vat",
        "--json",
    ]);
    assert_eq!(output["created_accounts"], serde_json::json!(["33311", "1331"]));

    let input_vat = row(&output, "1331");
    assert_eq!(input_vat["name"], "Account 1331");
    assert_eq!(decimal(&input_vat["closing_debit"]), dec!(6));
    assert_eq!(decimal(&row(&output, "133")["closing_debit"]), dec!(6));
    assert_eq!(decimal(&row(&output, "333")["closing_credit"]), dec!(100));

    let totals = &output["totals"];
    assert_eq!(decimal(&totals["period_debit"]), dec!(1166));
    assert_eq!(decimal(&totals["period_credit"]), dec!(1166));
}

#[test]
fn trial_balance_account_filter() {
    let output = trial_balance(&["--account", "15"]);
    let codes: Vec<&str> = output["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["156", "1561"]);
}

#[test]
fn trial_balance_rejects_inverted_period() {
    let output = acctc(&[
        "trial-balance",
        "-j",
        JOURNAL,
        "-a",
        ACCOUNTS,
        "--from",
        "2024-02-01",
        "--to",
        "2024-01-01",
    ]);
    assert!(!output.status.success());
}

#[test]
fn trial_balance_table_output() {
    let output = acctc(&[
        "trial-balance",
        "-j",
        JOURNAL,
        "-a",
        ACCOUNTS,
        "--from",
        "01/01/2024",
        "--to",
        "31/01/2024",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TRIAL BALANCE (01/01/2024 to 31/01/2024)"));
    assert!(stdout.contains("CASH"));
    assert!(stdout.contains("TOTAL"));
    assert!(stdout.contains("2660.00"));
}

#[test]
fn ledger_lists_postings_with_vat() {
    let output = json(&[
        "ledger",
        "-j",
        JOURNAL,
        "-a",
        ACCOUNTS,
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--account",
        "111",
        "--json",
    ]);
    let book = &output[0];
    assert_eq!(book["code"], "111");
    assert_eq!(book["children"], serde_json::json!(["1111", "1112"]));
    assert_eq!(decimal(&book["opening"]["debit"]), dec!(1500));

    let lines = book["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["counter_account"], "5111");
    assert_eq!(lines[0]["description"], "Cash sale");
    assert_eq!(lines[1]["counter_account"], "33311");
    assert_eq!(decimal(&lines[1]["debit"]), dec!(100));
    assert_eq!(decimal(&lines[1]["balance"]["debit"]), dec!(2600));

    assert_eq!(decimal(&book["closing"]["debit"]), dec!(2600));
}

#[test]
fn ledger_books_vat_to_accounts_missing_from_chart() {
    let output = json(&[
        "ledger",
        "-j",
        JOURNAL,
        "-a",
        "tests/data/accounts_no_vat.csv",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--account",
        "133",
        "--json",
    ]);
    let book = &output[0];
    assert_eq!(book["children"], serde_json::json!(["1331"]));
    let lines = book["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["counter_account"], "331");
    assert_eq!(decimal(&book["closing"]["debit"]), dec!(6));
}

#[test]
fn ledger_text_output() {
    let output = acctc(&[
        "ledger",
        "-j",
        JOURNAL,
        "-a",
        ACCOUNTS,
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--account",
        "1111",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ACCOUNT LEDGER: 1111 - Cash on hand"));
    assert!(stdout.contains("Deposit to bank"));
    assert!(stdout.contains("Closing balance"));
}

#[test]
fn stock_summary_for_january() {
    let output = json(&[
        "stock",
        "-j",
        JOURNAL,
        "-i",
        ITEMS,
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-31",
        "--json",
    ]);
    let line = &output[0];
    assert_eq!(line["item"], "VT01");
    assert_eq!(line["name"], "Steel bar");
    assert_eq!(decimal(&line["opening_quantity"]), dec!(10));
    assert_eq!(decimal(&line["receipt_quantity"]), dec!(5));
    assert_eq!(decimal(&line["receipt_value"]), dec!(60));
    assert_eq!(decimal(&line["issue_quantity"]), dec!(8));
    assert_eq!(decimal(&line["closing_quantity"]), dec!(7));
}

#[test]
fn validate_clean_inputs() {
    let output = acctc(&["validate", "-j", JOURNAL, "-a", ACCOUNTS, "-i", ITEMS]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("VALIDATION RESULTS"));
    assert!(stdout.contains("No issues found"));
}

#[test]
fn validate_reports_bad_rows_and_short_stock() {
    let output = acctc(&[
        "validate",
        "-j",
        "tests/data/journal_bad.csv",
        "-a",
        ACCOUNTS,
        "-i",
        ITEMS,
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "SkippedRow").count(), 2);
    assert!(kinds.contains(&"InsufficientStock"));
    assert_eq!(report["rows_read"], 4);
}

#[test]
fn schema_formats() {
    let output = acctc(&["schema", "csv-header"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("date,debit_account,credit_account,amount"));

    let output = acctc(&["schema", "csv-fields", "--table", "accounts"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("code"));
    assert!(stdout.contains("required"));

    let schema = json(&["schema", "json-schema"]);
    assert!(schema["properties"]["transactions"].is_object());
}

#[test]
fn missing_required_column_fails() {
    let output = acctc(&["cost", "-j", ITEMS]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("required column"));
}
