//! Ledger command - account books with running balances

use crate::cmd::{read_accounts, JournalArgs, PeriodArgs};
use crate::ledger::{expand_vat, ledger_detail, AccountBook, BalancePair};
use crate::utils::{format_side, render_table, write_csv};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct LedgerCommand {
    #[command(flatten)]
    input: JournalArgs,

    /// Chart of accounts CSV
    #[arg(short, long)]
    accounts: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Account codes to print, repeatable
    #[arg(long = "account", required = true)]
    codes: Vec<String>,

    /// Output ledger lines as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

/// One exported ledger line, flattened across accounts.
#[derive(Debug, Serialize)]
struct LineRow<'a> {
    account: &'a str,
    date: String,
    voucher_no: &'a str,
    voucher_date: String,
    description: &'a str,
    counter_account: &'a str,
    debit: Decimal,
    credit: Decimal,
    balance_debit: Decimal,
    balance_credit: Decimal,
}

#[derive(Debug, Tabled)]
struct LineDisplay {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Voucher")]
    voucher: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Contra")]
    counter: String,
    #[tabled(rename = "Debit")]
    debit: String,
    #[tabled(rename = "Credit")]
    credit: String,
    #[tabled(rename = "Balance Dr")]
    balance_debit: String,
    #[tabled(rename = "Balance Cr")]
    balance_credit: String,
}

impl LineDisplay {
    fn summary(label: &str, debit: Decimal, credit: Decimal, balance: Option<BalancePair>) -> Self {
        let balance = balance.unwrap_or_default();
        LineDisplay {
            date: String::new(),
            voucher: String::new(),
            description: label.to_string(),
            counter: String::new(),
            debit: format_side(debit),
            credit: format_side(credit),
            balance_debit: format_side(balance.debit),
            balance_credit: format_side(balance.credit),
        }
    }
}

impl LedgerCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let settings = self.input.settings()?;
        let period = self.period.period()?;
        let journal = self.input.read()?;
        let transactions = expand_vat(&journal.transactions, &settings.vat);
        let mut ledger = read_accounts(&self.accounts)?;
        ledger.ensure_accounts(&transactions);

        let books = ledger_detail(&ledger, &transactions, period, &self.codes)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&books)?);
        } else if self.csv {
            write_csv(books.iter().flat_map(line_rows), std::io::stdout())?;
        } else {
            println!();
            println!("ACCOUNT LEDGERS ({})", period);
            for book in &books {
                print_book(book);
            }
            if books.is_empty() {
                println!();
                println!("None of the requested accounts are in the chart.");
            }
        }
        Ok(())
    }
}

fn line_rows(book: &AccountBook) -> impl Iterator<Item = LineRow<'_>> {
    book.lines.iter().map(move |line| LineRow {
        account: &book.code,
        date: line.date.format("%Y-%m-%d").to_string(),
        voucher_no: line.voucher_no.as_deref().unwrap_or_default(),
        voucher_date: line
            .voucher_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        description: &line.description,
        counter_account: &line.counter_account,
        debit: line.debit,
        credit: line.credit,
        balance_debit: line.balance.debit,
        balance_credit: line.balance.credit,
    })
}

fn print_book(book: &AccountBook) {
    println!();
    println!("{}", book.title());
    println!();

    let mut rows = vec![LineDisplay::summary(
        "Opening balance",
        Decimal::ZERO,
        Decimal::ZERO,
        Some(book.opening),
    )];
    rows.extend(book.lines.iter().map(|line| LineDisplay {
        date: line.date.format("%d/%m/%Y").to_string(),
        voucher: line.voucher_no.clone().unwrap_or_default(),
        description: line.description.clone(),
        counter: line.counter_account.clone(),
        debit: format_side(line.debit),
        credit: format_side(line.credit),
        balance_debit: format_side(line.balance.debit),
        balance_credit: format_side(line.balance.credit),
    }));
    rows.push(LineDisplay::summary(
        "Period total",
        book.period_debit,
        book.period_credit,
        None,
    ));
    rows.push(LineDisplay::summary(
        "Closing balance",
        Decimal::ZERO,
        Decimal::ZERO,
        Some(book.closing),
    ));
    println!("{}", render_table(rows));
}
