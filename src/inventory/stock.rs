//! Stock movement summary: opening, receipts, issues and closing per item.

use super::Holding;
use crate::core::{ItemInfo, ItemKey, ItemMaster, Movement, Period, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockLine {
    pub item: ItemKey,
    pub info: ItemInfo,
    pub opening: Holding,
    pub receipts: Holding,
    pub issues: Holding,
    /// Issues into work in progress.
    pub production: Holding,
    pub closing: Holding,
}

impl StockLine {
    fn new(item: ItemKey, info: ItemInfo, opening: Holding) -> Self {
        StockLine {
            item,
            info,
            opening,
            ..Default::default()
        }
    }

    fn has_data(&self) -> bool {
        !(self.opening.is_zero()
            && self.receipts.is_zero()
            && self.issues.is_zero()
            && self.production.is_zero())
    }

    fn finish(&mut self) {
        self.closing = Holding::new(
            self.opening.quantity + self.receipts.quantity
                - self.issues.quantity
                - self.production.quantity,
            self.opening.value + self.receipts.value - self.issues.value - self.production.value,
        );
    }
}

/// Summarise stock movements per item using the recorded row amounts.
///
/// Rows dated before the period roll into the opening position. An empty
/// `filter` takes every item; items with nothing to show are left out.
pub fn stock_summary(
    master: &ItemMaster,
    transactions: &[Transaction],
    period: &Period,
    filter: &[ItemKey],
) -> Vec<StockLine> {
    let wanted = |key: &ItemKey| filter.is_empty() || filter.contains(key);

    let mut lines: BTreeMap<ItemKey, StockLine> = master
        .items
        .iter()
        .filter(|(key, _)| wanted(key))
        .map(|(key, entry)| {
            let opening = Holding::new(entry.opening_quantity, entry.opening_value);
            (
                key.clone(),
                StockLine::new(key.clone(), entry.info.clone(), opening),
            )
        })
        .collect();

    for tx in transactions {
        if tx.quantity.is_zero() || tx.date > period.end() {
            continue;
        }
        let (Some(key), Some(movement)) = (tx.item_key(), tx.movement()) else {
            continue;
        };
        if !wanted(&key) {
            continue;
        }

        let line = lines.entry(key.clone()).or_insert_with(|| {
            let info = ItemInfo {
                name: tx.item_name.clone(),
                spec: tx.item_spec.clone(),
                unit: None,
            };
            StockLine::new(key, info, Holding::default())
        });

        if period.is_before(tx.date) {
            let sign = if movement == Movement::Receipt {
                Decimal::ONE
            } else {
                -Decimal::ONE
            };
            line.opening.add(sign * tx.quantity, sign * tx.amount);
        } else {
            let bucket = match movement {
                Movement::Receipt => &mut line.receipts,
                Movement::Issue => &mut line.issues,
                Movement::ProductionIssue => &mut line.production,
            };
            bucket.add(tx.quantity, tx.amount);
        }
    }

    lines
        .into_values()
        .filter(StockLine::has_data)
        .map(|mut line| {
            line.finish();
            line
        })
        .collect()
}
