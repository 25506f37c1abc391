use super::accounts::AccountLedger;
use super::balance::{AccountBalance, BalanceAggregator, BalancePair};
use crate::core::{Period, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;

/// Column totals of a trial balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub opening: BalancePair,
    pub period_debit: Decimal,
    pub period_credit: Decimal,
    pub closing: BalancePair,
}

#[derive(Debug, Clone)]
pub struct TrialBalance {
    pub period: Period,
    pub rows: Vec<AccountBalance>,
}

impl TrialBalance {
    /// Totals over the top-most rows (rows with no ancestor in the report),
    /// so rolled-up children are not counted twice.
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for row in &self.rows {
            let has_parent_row = self
                .rows
                .iter()
                .any(|other| other.code.len() < row.code.len() && row.code.starts_with(&other.code));
            if has_parent_row {
                continue;
            }
            totals.opening.debit += row.opening.debit;
            totals.opening.credit += row.opening.credit;
            totals.period_debit += row.period_debit;
            totals.period_credit += row.period_credit;
            totals.closing.debit += row.closing.debit;
            totals.closing.credit += row.closing.credit;
        }
        totals
    }
}

/// Period trial balance with every parent carrying its descendants.
///
/// An account is reported when its code starts with one of `filter`
/// (any code when the filter is empty) and it has a non-zero opening or
/// movement in the period. Rows come out in code order.
pub fn build_trial_balance(
    ledger: &AccountLedger,
    transactions: &[Transaction],
    period: Period,
    filter: &[String],
) -> TrialBalance {
    let aggregator = BalanceAggregator::new(ledger, transactions, period);
    let rows: Vec<AccountBalance> = ledger
        .iter()
        .filter(|account| filter.is_empty() || filter.iter().any(|p| account.code.starts_with(p)))
        .filter_map(|account| aggregator.balance(&account.code))
        .filter(|balance| balance.has_movement() || !balance.opening.is_zero())
        .collect();

    log::info!(
        "trial balance {}: {} of {} accounts reported",
        period,
        rows.len(),
        ledger.len()
    );
    TrialBalance { period, rows }
}
