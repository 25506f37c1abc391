use super::accounts::{AccountLedger, AccountNature};
use super::hierarchy::{AccountGroup, GroupLeg};
use crate::core::{Period, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// A debit/credit pair. After netting at most one side is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BalancePair {
    pub debit: Decimal,
    pub credit: Decimal,
}

impl BalancePair {
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        BalancePair { debit, credit }
    }

    /// Net raw debit and credit totals onto the side the nature expects,
    /// flipping to the other side when the result is negative.
    pub fn netted(nature: AccountNature, debit: Decimal, credit: Decimal) -> Self {
        let one_sided = |net: Decimal, debit_side: bool| {
            if (net >= Decimal::ZERO) == debit_side {
                BalancePair::new(net.abs(), Decimal::ZERO)
            } else {
                BalancePair::new(Decimal::ZERO, net.abs())
            }
        };
        match nature {
            AccountNature::Asset | AccountNature::Expense => one_sided(debit - credit, true),
            AccountNature::LiabilityEquity | AccountNature::Revenue => {
                one_sided(credit - debit, false)
            }
            AccountNature::Other => {
                if debit >= credit {
                    BalancePair::new(debit - credit, Decimal::ZERO)
                } else {
                    BalancePair::new(Decimal::ZERO, credit - debit)
                }
            }
        }
    }

    /// Add movements and net the result again.
    pub fn moved(self, nature: AccountNature, debit: Decimal, credit: Decimal) -> Self {
        BalancePair::netted(nature, self.debit + debit, self.credit + credit)
    }

    pub fn is_zero(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }
}

/// Opening, movement and closing of an account (with its descendants) over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub code: String,
    pub name: String,
    pub level: u32,
    pub nature: AccountNature,
    pub opening: BalancePair,
    pub period_debit: Decimal,
    pub period_credit: Decimal,
    pub closing: BalancePair,
}

impl AccountBalance {
    pub fn has_movement(&self) -> bool {
        !self.period_debit.is_zero() || !self.period_credit.is_zero()
    }
}

/// Transaction positions by account code, so a group only visits the
/// postings of its own members.
pub struct PostingIndex<'a> {
    transactions: &'a [Transaction],
    by_account: HashMap<&'a str, Vec<usize>>,
}

impl<'a> PostingIndex<'a> {
    pub fn new(transactions: &'a [Transaction]) -> Self {
        let mut by_account: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (pos, tx) in transactions.iter().enumerate() {
            by_account.entry(tx.debit_account.as_str()).or_default().push(pos);
            if tx.credit_account != tx.debit_account {
                by_account.entry(tx.credit_account.as_str()).or_default().push(pos);
            }
        }
        PostingIndex {
            transactions,
            by_account,
        }
    }

    /// Postings touching any member of `group`, in stream order, each once.
    pub fn postings(&self, group: &AccountGroup) -> Vec<&'a Transaction> {
        let mut positions: Vec<usize> = group
            .members()
            .filter_map(|code| self.by_account.get(code))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().map(|p| &self.transactions[p]).collect()
    }
}

/// Computes period balances for accounts, rolling descendants into parents.
pub struct BalanceAggregator<'a> {
    ledger: &'a AccountLedger,
    index: PostingIndex<'a>,
    period: Period,
}

impl<'a> BalanceAggregator<'a> {
    pub fn new(ledger: &'a AccountLedger, transactions: &'a [Transaction], period: Period) -> Self {
        BalanceAggregator {
            ledger,
            index: PostingIndex::new(transactions),
            period,
        }
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn ledger(&self) -> &'a AccountLedger {
        self.ledger
    }

    pub fn postings(&self, group: &AccountGroup) -> Vec<&'a Transaction> {
        self.index.postings(group)
    }

    /// Opening balance of the group at the start of the period: recorded
    /// openings of the account and its descendants plus every earlier posting.
    pub fn opening(&self, group: &AccountGroup) -> BalancePair {
        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;
        for code in group.members() {
            if let Some(account) = self.ledger.get(code) {
                debit += account.opening_debit;
                credit += account.opening_credit;
            }
        }
        for tx in self.postings(group) {
            if !self.period.is_before(tx.date) {
                continue;
            }
            if group.contains(&tx.debit_account) {
                debit += tx.amount;
            }
            if group.contains(&tx.credit_account) {
                credit += tx.amount;
            }
        }
        BalancePair::netted(AccountNature::from_code(group.code()), debit, credit)
    }

    /// Balance for `code`, or `None` when the account is not in the chart.
    pub fn balance(&self, code: &str) -> Option<AccountBalance> {
        let account = self.ledger.get(code)?;
        let group = self.ledger.group(code);
        let opening = self.opening(&group);

        let mut period_debit = Decimal::ZERO;
        let mut period_credit = Decimal::ZERO;
        for tx in self.postings(&group) {
            if !self.period.contains(tx.date) {
                continue;
            }
            match group.leg(tx) {
                GroupLeg::Debit => period_debit += tx.amount,
                GroupLeg::Credit => period_credit += tx.amount,
                GroupLeg::Internal | GroupLeg::Outside => {}
            }
        }

        let closing = opening.moved(account.nature, period_debit, period_credit);
        Some(AccountBalance {
            code: account.code.clone(),
            name: account.name.clone(),
            level: account.level,
            nature: account.nature,
            opening,
            period_debit,
            period_credit,
            closing,
        })
    }
}

/// Balance of one account over a period; see [`BalanceAggregator`].
pub fn aggregate_account(
    ledger: &AccountLedger,
    code: &str,
    transactions: &[Transaction],
    period: Period,
) -> Option<AccountBalance> {
    BalanceAggregator::new(ledger, transactions, period).balance(code)
}
