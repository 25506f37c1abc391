pub mod input;
pub mod items;
pub mod journal;
pub mod period;
pub mod settings;
pub mod warnings;

// Flat public surface for domain types and loaders.
pub use input::{parse_date, CsvField, LoadError};
pub use items::{
    collect_stock_items, item_columns, read_items_csv, ItemEntry, ItemInfo, ItemKey, ItemMaster,
    StockItem,
};
pub use journal::{
    classify_movement, journal_columns, read_journal_csv, read_journal_json, write_journal_csv,
    Journal, JournalInput, Movement, SourceRef, Transaction,
};
pub use period::{Period, PeriodError};
pub use settings::{Settings, VatAccounts};
pub use warnings::Warning;
