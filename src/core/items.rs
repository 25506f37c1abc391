use super::input::{csv_reader, text, CsvField, LoadError, RowContext};
use super::journal::Transaction;
use super::warnings::Warning;
use acctc_derive::CsvSchema;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Stock key: an item is tracked separately in every warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemKey {
    pub warehouse: String,
    pub item: String,
}

impl ItemKey {
    pub fn new(warehouse: impl Into<String>, item: impl Into<String>) -> Self {
        ItemKey {
            warehouse: warehouse.into(),
            item: item.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.warehouse, self.item)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("item key '{0}' must look like WAREHOUSE|ITEM")]
pub struct ItemKeyError(String);

impl FromStr for ItemKey {
    type Err = ItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('|') {
            Some((w, i)) if !w.trim().is_empty() && !i.trim().is_empty() => {
                Ok(ItemKey::new(w.trim(), i.trim()))
            }
            _ => Err(ItemKeyError(s.to_string())),
        }
    }
}

/// Descriptive fields from the item master.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemInfo {
    pub name: Option<String>,
    pub spec: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemEntry {
    pub info: ItemInfo,
    pub opening_quantity: Decimal,
    pub opening_value: Decimal,
}

/// Item master input row
#[derive(Debug, Clone, Deserialize, CsvSchema)]
pub struct ItemRecord {
    /// Warehouse code
    pub warehouse: String,
    /// Item code
    pub item: String,
    /// Item name
    #[serde(default)]
    pub name: Option<String>,
    /// Specification
    #[serde(default)]
    pub spec: Option<String>,
    /// Unit of measure
    #[serde(default)]
    pub unit: Option<String>,
    /// Quantity on hand at the start of the books
    #[serde(default)]
    pub opening_quantity: Option<String>,
    /// Value on hand at the start of the books
    #[serde(default)]
    pub opening_value: Option<String>,
}

/// Opening balances and descriptions per stock key.
#[derive(Debug, Default)]
pub struct ItemMaster {
    pub items: BTreeMap<ItemKey, ItemEntry>,
    pub warnings: Vec<Warning>,
}

impl ItemMaster {
    pub fn get(&self, key: &ItemKey) -> Option<&ItemEntry> {
        self.items.get(key)
    }

    pub fn insert(&mut self, key: ItemKey, entry: ItemEntry) {
        if self.items.insert(key.clone(), entry).is_some() {
            log::warn!("item {} listed more than once, last entry kept", key);
        }
    }
}

/// Read the item master CSV.
pub fn read_items_csv<R: Read>(reader: R, source: &str) -> Result<ItemMaster, LoadError> {
    let mut rdr = csv_reader(reader, source, &ItemRecord::required_columns())?;
    let mut master = ItemMaster::default();

    for (i, result) in rdr.deserialize::<ItemRecord>().enumerate() {
        let mut warnings = Vec::new();
        let mut ctx = RowContext {
            source,
            row: i + 2,
            warnings: &mut warnings,
        };
        match result {
            Ok(record) => {
                let warehouse = record.warehouse.trim();
                let item = record.item.trim();
                if warehouse.is_empty() || item.is_empty() {
                    ctx.skip("missing warehouse or item code");
                } else {
                    let entry = ItemEntry {
                        opening_quantity: ctx
                            .decimal_or_zero("opening_quantity", record.opening_quantity.as_deref()),
                        opening_value: ctx
                            .decimal_or_zero("opening_value", record.opening_value.as_deref()),
                        info: ItemInfo {
                            name: text(record.name),
                            spec: text(record.spec),
                            unit: text(record.unit),
                        },
                    };
                    master.insert(ItemKey::new(warehouse, item), entry);
                }
            }
            Err(e) => ctx.skip(e.to_string()),
        }
        master.warnings.extend(warnings);
    }

    log::info!("{}: {} items loaded", source, master.items.len());
    Ok(master)
}

pub fn item_columns() -> &'static [CsvField] {
    ItemRecord::csv_schema()
}

/// One item's opening position and its stock postings, in date order.
#[derive(Debug, Clone)]
pub struct StockItem {
    pub key: ItemKey,
    pub opening_quantity: Decimal,
    pub opening_value: Decimal,
    pub transactions: Vec<Transaction>,
}

impl StockItem {
    pub fn new(key: ItemKey, opening_quantity: Decimal, opening_value: Decimal) -> Self {
        StockItem {
            key,
            opening_quantity,
            opening_value,
            transactions: Vec::new(),
        }
    }
}

/// Group stock postings by item for costing.
///
/// Only rows with an item key and a stock direction take part. Issues need a
/// positive quantity, receipts a positive quantity and a non-negative value;
/// anything else is left out with a warning.
pub fn collect_stock_items(
    master: &ItemMaster,
    transactions: &[Transaction],
    warnings: &mut Vec<Warning>,
) -> Vec<StockItem> {
    let mut items: BTreeMap<ItemKey, StockItem> = master
        .items
        .iter()
        .map(|(key, entry)| {
            let item = StockItem::new(key.clone(), entry.opening_quantity, entry.opening_value);
            (key.clone(), item)
        })
        .collect();

    for tx in transactions {
        let (Some(key), Some(movement)) = (tx.item_key(), tx.movement()) else {
            continue;
        };
        let problem = if tx.quantity <= Decimal::ZERO {
            Some("stock quantity must be positive")
        } else if !movement.is_issue() && tx.amount < Decimal::ZERO {
            Some("receipt value must not be negative")
        } else {
            None
        };
        if let Some(reason) = problem {
            let mut ctx = RowContext {
                source: &tx.source.source,
                row: tx.source.row,
                warnings: &mut *warnings,
            };
            ctx.skip(reason);
            continue;
        }

        items
            .entry(key.clone())
            .or_insert_with(|| StockItem::new(key, Decimal::ZERO, Decimal::ZERO))
            .transactions
            .push(tx.clone());
    }

    items.into_values().collect()
}
