pub mod accounts;
pub mod balance;
pub mod detail;
pub mod hierarchy;
pub mod trial_balance;
pub mod vat;

pub use accounts::{
    account_columns, level_from_code, read_accounts_csv, Account, AccountLedger, AccountNature,
};
pub use balance::{aggregate_account, AccountBalance, BalanceAggregator, BalancePair};
pub use detail::{ledger_detail, AccountBook, DetailError, LedgerLine};
pub use hierarchy::{AccountGroup, GroupLeg};
pub use trial_balance::{build_trial_balance, Totals, TrialBalance};
pub use vat::{expand_vat, vat_posting};
