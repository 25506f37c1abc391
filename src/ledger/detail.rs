//! Account books: one section per requested account listing every posting
//! that moved it, with a running balance.

use super::accounts::AccountLedger;
use super::balance::{BalanceAggregator, BalancePair};
use super::hierarchy::GroupLeg;
use crate::core::{Period, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DetailError {
    #[error("no accounts requested")]
    NoAccounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerLine {
    pub date: NaiveDate,
    pub voucher_no: Option<String>,
    pub voucher_date: Option<NaiveDate>,
    pub description: String,
    pub counter_account: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: BalancePair,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountBook {
    pub code: String,
    pub name: String,
    /// Descendant codes whose postings are included.
    pub children: Vec<String>,
    pub opening: BalancePair,
    pub lines: Vec<LedgerLine>,
    pub period_debit: Decimal,
    pub period_credit: Decimal,
    pub closing: BalancePair,
}

impl AccountBook {
    pub fn title(&self) -> String {
        let mut title = format!("ACCOUNT LEDGER: {} - {}", self.code, self.name);
        if !self.children.is_empty() {
            title.push_str(&format!(" (aggregated from: {})", self.children.join(", ")));
        }
        title
    }
}

/// Build account books for `codes` over `period`.
///
/// `transactions` is the posted stream with VAT postings already generated
/// (see [`expand_vat`](super::vat::expand_vat)) and every account it uses
/// present in `ledger`. Postings between two members of the same account
/// group are left out. Codes missing from the chart are skipped with a
/// warning.
pub fn ledger_detail(
    ledger: &AccountLedger,
    transactions: &[Transaction],
    period: Period,
    codes: &[String],
) -> Result<Vec<AccountBook>, DetailError> {
    if codes.is_empty() {
        return Err(DetailError::NoAccounts);
    }

    let aggregator = BalanceAggregator::new(ledger, transactions, period);
    let mut books = Vec::new();

    for code in codes {
        let Some(account) = ledger.get(code) else {
            log::warn!("account {} is not in the chart, skipped", code);
            continue;
        };
        let group = ledger.group(code);
        let opening = aggregator.opening(&group);

        let mut running = opening;
        let mut lines = Vec::new();
        let mut period_debit = Decimal::ZERO;
        let mut period_credit = Decimal::ZERO;

        for tx in aggregator.postings(&group) {
            if !period.contains(tx.date) || tx.amount.is_zero() {
                continue;
            }
            let (debit, credit, counter) = match group.leg(tx) {
                GroupLeg::Debit => (tx.amount, Decimal::ZERO, &tx.credit_account),
                GroupLeg::Credit => (Decimal::ZERO, tx.amount, &tx.debit_account),
                GroupLeg::Internal | GroupLeg::Outside => continue,
            };
            period_debit += debit;
            period_credit += credit;
            running = running.moved(account.nature, debit, credit);
            lines.push(LedgerLine {
                date: tx.date,
                voucher_no: tx.voucher_no.clone(),
                voucher_date: tx.voucher_date,
                description: tx.full_description(),
                counter_account: counter.clone(),
                debit,
                credit,
                balance: running,
            });
        }

        log::debug!("{}: {} ledger lines", code, lines.len());
        books.push(AccountBook {
            code: account.code.clone(),
            name: account.name.clone(),
            children: group.descendants().to_vec(),
            opening,
            lines,
            period_debit,
            period_credit,
            closing: opening.moved(account.nature, period_debit, period_credit),
        });
    }

    Ok(books)
}
