use super::hierarchy::PrefixIndex;
use crate::core::input::{csv_reader, text, RowContext};
use crate::core::{CsvField, LoadError, Transaction, Warning};
use acctc_derive::CsvSchema;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Accounting nature, decided by the first digit of the account code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccountNature {
    Asset,
    LiabilityEquity,
    Revenue,
    Expense,
    Other,
}

impl AccountNature {
    pub fn from_code(code: &str) -> Self {
        match code.chars().next() {
            Some('1' | '2') => AccountNature::Asset,
            Some('3' | '4') => AccountNature::LiabilityEquity,
            Some('5' | '7') => AccountNature::Revenue,
            Some('6' | '8') => AccountNature::Expense,
            _ => AccountNature::Other,
        }
    }

    /// Debit-normal natures carry their balance on the debit side.
    pub fn is_debit_normal(self) -> bool {
        matches!(self, AccountNature::Asset | AccountNature::Expense)
    }
}

/// Level implied by code length: three characters is level 1, each extra
/// character one level deeper. Shorter codes are treated as level 1.
pub fn level_from_code(code: &str) -> u32 {
    let len = code.chars().count() as u32;
    if len >= 3 {
        len - 2
    } else {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub level: u32,
    pub nature: AccountNature,
    pub opening_debit: Decimal,
    pub opening_credit: Decimal,
    /// Created because transactions used a code the chart did not list.
    pub placeholder: bool,
}

impl Account {
    /// An explicit level wins when positive; otherwise the code length decides.
    pub fn new(code: &str, name: &str, level: Option<u32>) -> Self {
        Account {
            code: code.to_string(),
            name: name.to_string(),
            level: level.filter(|l| *l > 0).unwrap_or_else(|| level_from_code(code)),
            nature: AccountNature::from_code(code),
            opening_debit: Decimal::ZERO,
            opening_credit: Decimal::ZERO,
            placeholder: false,
        }
    }

    pub fn with_opening(mut self, debit: Decimal, credit: Decimal) -> Self {
        self.opening_debit = debit;
        self.opening_credit = credit;
        self
    }

    fn placeholder(code: &str) -> Self {
        Account {
            placeholder: true,
            ..Account::new(code, &format!("Account {}", code), None)
        }
    }
}

/// Chart of accounts input row
#[derive(Debug, Clone, Deserialize, CsvSchema)]
pub struct AccountRecord {
    /// Account code (111, 1111, 33311, ...)
    pub code: String,
    /// Account name
    #[serde(default)]
    pub name: Option<String>,
    /// Level in the hierarchy; derived from code length when blank or 0
    #[serde(default)]
    pub level: Option<String>,
    /// Opening debit balance
    #[serde(default)]
    pub opening_debit: Option<String>,
    /// Opening credit balance
    #[serde(default)]
    pub opening_credit: Option<String>,
}

pub fn account_columns() -> &'static [CsvField] {
    AccountRecord::csv_schema()
}

/// The chart of accounts, keyed by code, with a prefix index for
/// hierarchy lookups.
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: BTreeMap<String, Account>,
    pub(super) index: PrefixIndex,
    warnings: Vec<Warning>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. A repeated code replaces the earlier entry and is
    /// reported as a duplicate.
    pub fn insert(&mut self, account: Account) {
        let code = account.code.clone();
        if code.chars().count() < 3 {
            self.warnings.push(Warning::NonStandardAccountCode { code: code.clone() });
        }
        self.index.register(&code);
        if self.accounts.insert(code.clone(), account).is_some() {
            log::warn!("duplicate account {}, last entry kept", code);
            self.warnings.push(Warning::DuplicateAccount { code });
        }
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.accounts.contains_key(code)
    }

    /// Accounts in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Create placeholder accounts for codes used by `transactions` but
    /// missing from the chart. Returns the codes that were added.
    pub fn ensure_accounts(&mut self, transactions: &[Transaction]) -> Vec<String> {
        let mut added = Vec::new();
        for tx in transactions {
            for code in [&tx.debit_account, &tx.credit_account] {
                if !self.contains(code) {
                    log::debug!("creating placeholder account {}", code);
                    self.insert(Account::placeholder(code));
                    self.warnings.push(Warning::UnknownAccount { code: code.clone() });
                    added.push(code.clone());
                }
            }
        }
        if !added.is_empty() {
            log::info!("{} accounts not in the chart were created", added.len());
        }
        added
    }
}

impl FromIterator<Account> for AccountLedger {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut ledger = AccountLedger::new();
        for account in iter {
            ledger.insert(account);
        }
        ledger
    }
}

/// Read the chart of accounts from CSV.
pub fn read_accounts_csv<R: Read>(reader: R, source: &str) -> Result<AccountLedger, LoadError> {
    let mut rdr = csv_reader(reader, source, &AccountRecord::required_columns())?;
    let mut ledger = AccountLedger::new();

    for (i, result) in rdr.deserialize::<AccountRecord>().enumerate() {
        let mut ctx = RowContext {
            source,
            row: i + 2,
            warnings: &mut ledger.warnings,
        };
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                ctx.skip(e.to_string());
                continue;
            }
        };
        let code = record.code.trim().to_string();
        if code.is_empty() {
            ctx.skip("missing account code");
            continue;
        }

        let level = match text(record.level) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(level) => Some(level),
                Err(_) => {
                    ctx.invalid("level", &raw);
                    None
                }
            },
        };
        let debit = ctx.decimal_or_zero("opening_debit", record.opening_debit.as_deref());
        let credit = ctx.decimal_or_zero("opening_credit", record.opening_credit.as_deref());
        let name = text(record.name).unwrap_or_else(|| format!("Account {}", code));

        ledger.insert(Account::new(&code, &name, level).with_opening(debit, credit));
    }

    log::info!("{}: {} accounts loaded", source, ledger.len());
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn nature_by_leading_digit() {
        assert_eq!(AccountNature::from_code("111"), AccountNature::Asset);
        assert_eq!(AccountNature::from_code("211"), AccountNature::Asset);
        assert_eq!(AccountNature::from_code("331"), AccountNature::LiabilityEquity);
        assert_eq!(AccountNature::from_code("411"), AccountNature::LiabilityEquity);
        assert_eq!(AccountNature::from_code("511"), AccountNature::Revenue);
        assert_eq!(AccountNature::from_code("711"), AccountNature::Revenue);
        assert_eq!(AccountNature::from_code("632"), AccountNature::Expense);
        assert_eq!(AccountNature::from_code("911"), AccountNature::Other);
        assert_eq!(AccountNature::from_code(""), AccountNature::Other);
    }

    #[test]
    fn level_prefers_explicit_value() {
        assert_eq!(Account::new("111", "Cash", None).level, 1);
        assert_eq!(Account::new("1111", "Cash VND", None).level, 2);
        assert_eq!(Account::new("11111", "Cash VND HQ", None).level, 3);
        assert_eq!(Account::new("33311", "Output VAT", Some(2)).level, 2);
        assert_eq!(Account::new("1111", "Cash VND", Some(0)).level, 2);
        assert_eq!(Account::new("11", "Short", None).level, 1);
    }

    #[test]
    fn duplicate_codes_keep_last_entry() {
        let ledger: AccountLedger = vec![
            Account::new("111", "Cash", None),
            Account::new("111", "Cash on hand", None),
        ]
        .into_iter()
        .collect();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("111").unwrap().name, "Cash on hand");
        assert_eq!(
            ledger.warnings(),
            &[Warning::DuplicateAccount {
                code: "111".to_string()
            }]
        );
    }

    #[test]
    fn reads_chart_with_openings() {
        let data = "Code,Name,Level,Opening_Debit,Opening_Credit\n\
                    111,Cash,1,100,\n\
                    1111,Cash VND,,60,\n\
                    ,Nameless,,,\n\
                    331,Payables,x,,250\n";
        let ledger = read_accounts_csv(data.as_bytes(), "accounts.csv").unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get("111").unwrap().opening_debit, dec!(100));
        assert_eq!(ledger.get("1111").unwrap().level, 2);
        assert_eq!(ledger.get("331").unwrap().opening_credit, dec!(250));
        assert_eq!(ledger.get("331").unwrap().level, 1);
        assert_eq!(ledger.warnings().len(), 2);
    }

    #[test]
    fn unknown_codes_become_placeholders() {
        let mut ledger: AccountLedger = vec![Account::new("111", "Cash", None)]
            .into_iter()
            .collect();
        let data = "date,debit_account,credit_account,amount\n2024-01-01,111,5111,10\n";
        let journal = crate::core::read_journal_csv(data.as_bytes(), "j.csv").unwrap();

        let added = ledger.ensure_accounts(&journal.transactions);
        assert_eq!(added, vec!["5111".to_string()]);
        let account = ledger.get("5111").unwrap();
        assert!(account.placeholder);
        assert_eq!(account.name, "Account 5111");
        assert_eq!(account.level, 2);
        assert_eq!(account.nature, AccountNature::Revenue);
    }
}
