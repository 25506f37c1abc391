//! Validate command - surface data quality issues without generating full reports

use crate::cmd::{read_accounts, read_items, JournalArgs};
use crate::core::{collect_stock_items, Warning};
use crate::inventory::{cost_items, CostingMethod};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    input: JournalArgs,

    /// Chart of accounts CSV; enables unknown and duplicate account checks
    #[arg(short, long)]
    accounts: Option<PathBuf>,

    /// Item master CSV with opening quantities and values
    #[arg(short, long)]
    items: Option<PathBuf>,

    /// Costing method used for the stock availability check
    #[arg(short, long, default_value = "PERIODIC")]
    method: CostingMethod,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    location: String,
    message: String,
}

impl ValidationIssue {
    fn from_warning(location: impl Into<String>, warning: &Warning) -> Self {
        ValidationIssue {
            issue_type: warning.kind().to_string(),
            location: location.into(),
            message: warning.to_string(),
        }
    }
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    rows_read: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let settings = self.input.settings()?;
        let journal = self.input.read()?;
        let mut issues: Vec<ValidationIssue> = journal
            .warnings
            .iter()
            .map(|w| ValidationIssue::from_warning("journal", w))
            .collect();

        if let Some(path) = &self.accounts {
            let mut ledger = read_accounts(path)?;
            ledger.ensure_accounts(&journal.transactions);
            issues.extend(
                ledger
                    .warnings()
                    .iter()
                    .map(|w| ValidationIssue::from_warning("accounts", w)),
            );
        }

        let master = read_items(self.items.as_deref())?;
        let mut stock_warnings = master.warnings.clone();
        let items = collect_stock_items(&master, &journal.transactions, &mut stock_warnings);
        issues.extend(
            stock_warnings
                .iter()
                .map(|w| ValidationIssue::from_warning("items", w)),
        );

        let report = cost_items(&items, self.method, settings.lot_tolerance);
        issues.extend(report.warnings().map(|(issue, w)| {
            ValidationIssue::from_warning(format!("{} {}", issue.source, issue.item), w)
        }));

        if self.json {
            let output = ValidationOutput {
                rows_read: journal.rows_read,
                issue_count: issues.len(),
                issues: issues.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues, journal.rows_read);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(issues: &[ValidationIssue], rows_read: usize) {
    println!();
    println!("VALIDATION RESULTS ({} journal rows)", rows_read);
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, issue.issue_type, issue.location);
        println!("     {}", issue.message);
        println!();
    }
}
