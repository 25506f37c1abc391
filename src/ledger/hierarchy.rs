//! Parent/child relations between account codes.
//!
//! An account is a descendant of another when its code is strictly longer
//! and starts with the other's code. Depth is not limited: 11121 is a
//! descendant of both 1112 and 111.

use super::accounts::{Account, AccountLedger};
use crate::core::Transaction;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Every code registered under each of its own prefixes, so the accounts
/// starting with a given code come out of one lookup.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    by_prefix: HashMap<String, BTreeSet<String>>,
}

impl PrefixIndex {
    pub fn register(&mut self, code: &str) {
        for (end, _) in code.char_indices().skip(1).chain([(code.len(), ' ')]) {
            self.by_prefix
                .entry(code[..end].to_string())
                .or_default()
                .insert(code.to_string());
        }
    }

    /// Codes starting with `prefix`, the prefix itself included if registered.
    pub fn starting_with(&self, prefix: &str) -> impl Iterator<Item = &str> {
        self.by_prefix
            .get(prefix)
            .into_iter()
            .flat_map(|codes| codes.iter().map(String::as_str))
    }
}

impl AccountLedger {
    /// All accounts below `code`, at any depth, in code order.
    pub fn find_descendants(&self, code: &str) -> Vec<&Account> {
        self.index
            .starting_with(code)
            .filter(|c| c.len() > code.len())
            .filter_map(|c| self.get(c))
            .collect()
    }

    /// Descendants with no other descendant of `code` between them and
    /// `code`. In a complete chart these are the codes one character longer;
    /// when an intermediate level is missing the next listed level is used.
    pub fn find_immediate_children(&self, code: &str) -> Vec<&Account> {
        let descendants = self.find_descendants(code);
        descendants
            .iter()
            .filter(|child| {
                !descendants.iter().any(|other| {
                    other.code.len() < child.code.len() && child.code.starts_with(&other.code)
                })
            })
            .copied()
            .collect()
    }

    /// The account together with all of its descendants.
    pub fn group(&self, code: &str) -> AccountGroup {
        let descendants: Vec<String> = self
            .find_descendants(code)
            .into_iter()
            .map(|a| a.code.clone())
            .collect();
        AccountGroup::new(code, descendants)
    }
}

/// Which side of a transaction falls inside an account group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLeg {
    Debit,
    Credit,
    /// Both legs inside the group; the posting nets out.
    Internal,
    Outside,
}

/// An account plus its descendants, used to decide which postings move
/// the group's balance.
#[derive(Debug, Clone)]
pub struct AccountGroup {
    code: String,
    descendants: Vec<String>,
    members: HashSet<String>,
}

impl AccountGroup {
    pub fn new(code: &str, descendants: Vec<String>) -> Self {
        let mut members: HashSet<String> = descendants.iter().cloned().collect();
        members.insert(code.to_string());
        AccountGroup {
            code: code.to_string(),
            descendants,
            members,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn descendants(&self) -> &[String] {
        &self.descendants
    }

    pub fn has_descendants(&self) -> bool {
        !self.descendants.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.members.contains(code)
    }

    /// Codes in the group, the account first.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.code.as_str()).chain(self.descendants.iter().map(String::as_str))
    }

    pub fn leg(&self, tx: &Transaction) -> GroupLeg {
        match (self.contains(&tx.debit_account), self.contains(&tx.credit_account)) {
            (true, true) => GroupLeg::Internal,
            (true, false) => GroupLeg::Debit,
            (false, true) => GroupLeg::Credit,
            (false, false) => GroupLeg::Outside,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(codes: &[&str]) -> AccountLedger {
        codes
            .iter()
            .map(|code| Account::new(code, code, None))
            .collect()
    }

    fn codes(accounts: Vec<&Account>) -> Vec<&str> {
        accounts.into_iter().map(|a| a.code.as_str()).collect()
    }

    #[test]
    fn descendants_at_every_depth() {
        let ledger = chart(&["111", "1111", "1112", "11111", "11121", "112"]);
        assert_eq!(
            codes(ledger.find_descendants("111")),
            vec!["1111", "11111", "1112", "11121"]
        );
        assert!(ledger.find_descendants("11111").is_empty());
        assert!(ledger.find_descendants("999").is_empty());
    }

    #[test]
    fn descendants_of_unlisted_prefix() {
        let ledger = chart(&["111", "1111", "112"]);
        assert_eq!(codes(ledger.find_descendants("11")), vec!["111", "1111", "112"]);
    }

    #[test]
    fn immediate_children_skip_grandchildren() {
        let ledger = chart(&["111", "1111", "1112", "11111", "11121"]);
        assert_eq!(
            codes(ledger.find_immediate_children("111")),
            vec!["1111", "1112"]
        );
    }

    #[test]
    fn immediate_children_bridge_missing_level() {
        let ledger = chart(&["333", "33311", "33312", "3334"]);
        assert_eq!(
            codes(ledger.find_immediate_children("333")),
            vec!["33311", "33312", "3334"]
        );
    }

    #[test]
    fn group_legs() {
        let ledger = chart(&["111", "1111", "1112", "511"]);
        let group = ledger.group("111");
        let posting = |debit: &str, credit: &str| {
            Transaction::posting("2024-01-01", debit, credit, rust_decimal::Decimal::ONE)
        };

        assert_eq!(group.leg(&posting("1111", "1112")), GroupLeg::Internal);
        assert_eq!(group.leg(&posting("1111", "511")), GroupLeg::Debit);
        assert_eq!(group.leg(&posting("511", "111")), GroupLeg::Credit);
        assert_eq!(group.leg(&posting("511", "331")), GroupLeg::Outside);
        assert_eq!(
            group.members().collect::<Vec<_>>(),
            vec!["111", "1111", "1112"]
        );
    }
}
