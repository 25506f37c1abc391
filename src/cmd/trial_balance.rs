//! Trial balance command - opening, movement and closing per account

use crate::cmd::{read_accounts, JournalArgs, PeriodArgs};
use crate::ledger::{build_trial_balance, expand_vat, AccountBalance, Totals};
use crate::utils::{format_side, render_table, write_csv};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct TrialBalanceCommand {
    #[command(flatten)]
    input: JournalArgs,

    /// Chart of accounts CSV
    #[arg(short, long)]
    accounts: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Only report accounts starting with these codes, repeatable
    #[arg(long = "account")]
    filter: Vec<String>,

    /// Add generated VAT postings before aggregating
    #[arg(long)]
    with_vat: bool,

    /// Output rows as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

/// A trial balance line as exported.
#[derive(Debug, Serialize)]
struct BalanceRow {
    code: String,
    name: String,
    level: u32,
    /// Level-1 accounts are summary lines.
    summary: bool,
    opening_debit: Decimal,
    opening_credit: Decimal,
    period_debit: Decimal,
    period_credit: Decimal,
    closing_debit: Decimal,
    closing_credit: Decimal,
}

impl From<&AccountBalance> for BalanceRow {
    fn from(b: &AccountBalance) -> Self {
        BalanceRow {
            code: b.code.clone(),
            name: b.name.clone(),
            level: b.level,
            summary: b.level == 1,
            opening_debit: b.opening.debit,
            opening_credit: b.opening.credit,
            period_debit: b.period_debit,
            period_credit: b.period_credit,
            closing_debit: b.closing.debit,
            closing_credit: b.closing.credit,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrialBalanceOutput {
    from: String,
    to: String,
    rows: Vec<BalanceRow>,
    totals: Totals,
    created_accounts: Vec<String>,
}

#[derive(Debug, Tabled)]
struct BalanceDisplay {
    #[tabled(rename = "Account")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Opening Dr")]
    opening_debit: String,
    #[tabled(rename = "Opening Cr")]
    opening_credit: String,
    #[tabled(rename = "Period Dr")]
    period_debit: String,
    #[tabled(rename = "Period Cr")]
    period_credit: String,
    #[tabled(rename = "Closing Dr")]
    closing_debit: String,
    #[tabled(rename = "Closing Cr")]
    closing_credit: String,
}

impl TrialBalanceCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let settings = self.input.settings()?;
        let period = self.period.period()?;
        let journal = self.input.read()?;
        let transactions = if self.with_vat {
            expand_vat(&journal.transactions, &settings.vat)
        } else {
            journal.transactions
        };
        let mut ledger = read_accounts(&self.accounts)?;
        // generated VAT postings may hit accounts the chart lacks
        let created = ledger.ensure_accounts(&transactions);
        let tb = build_trial_balance(&ledger, &transactions, period, &self.filter);
        let totals = tb.totals();

        if self.json {
            let output = TrialBalanceOutput {
                from: period.start().format("%Y-%m-%d").to_string(),
                to: period.end().format("%Y-%m-%d").to_string(),
                rows: tb.rows.iter().map(BalanceRow::from).collect(),
                totals,
                created_accounts: created,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }
        if self.csv {
            write_csv(tb.rows.iter().map(BalanceRow::from), std::io::stdout())?;
            return Ok(());
        }

        println!();
        println!("TRIAL BALANCE ({})", period);
        println!();
        if tb.rows.is_empty() {
            println!("No accounts with balances or movements.");
            return Ok(());
        }

        let mut rows: Vec<BalanceDisplay> = tb.rows.iter().map(display_row).collect();
        rows.push(BalanceDisplay {
            code: "TOTAL".to_string(),
            name: String::new(),
            opening_debit: format_side(totals.opening.debit),
            opening_credit: format_side(totals.opening.credit),
            period_debit: format_side(totals.period_debit),
            period_credit: format_side(totals.period_credit),
            closing_debit: format_side(totals.closing.debit),
            closing_credit: format_side(totals.closing.credit),
        });
        println!("{}", render_table(rows));

        if !created.is_empty() {
            println!();
            println!(
                "\u{26A0} accounts not in the chart: {}",
                created.join(", ")
            );
        }
        Ok(())
    }
}

fn display_row(b: &AccountBalance) -> BalanceDisplay {
    let indent = "  ".repeat(b.level.saturating_sub(1) as usize);
    let name = if b.level == 1 {
        b.name.to_uppercase()
    } else {
        format!("{}{}", indent, b.name)
    };
    BalanceDisplay {
        code: b.code.clone(),
        name,
        opening_debit: format_side(b.opening.debit),
        opening_credit: format_side(b.opening.credit),
        period_debit: format_side(b.period_debit),
        period_credit: format_side(b.period_credit),
        closing_debit: format_side(b.closing.debit),
        closing_credit: format_side(b.closing.credit),
    }
}
