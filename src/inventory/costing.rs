use super::Holding;
use crate::core::{ItemKey, SourceRef, StockItem, Transaction, Warning};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// How issues are valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CostingMethod {
    /// One unit cost per calendar month from opening stock plus the month's receipts.
    PeriodicWeightedAverage,
    /// Unit cost recomputed after every receipt.
    MovingAverage,
    /// Oldest lots are issued first.
    Fifo,
    /// Newest lots are issued first.
    Lifo,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown costing method '{0}' (expected PERIODIC, MOVING, FIFO or LIFO)")]
pub struct CostingMethodError(String);

impl FromStr for CostingMethod {
    type Err = CostingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase().replace(['-', ' '], "_");
        match token.as_str() {
            "PERIODIC" | "PERIODIC_WEIGHTED_AVERAGE" | "WEIGHTED_AVERAGE" | "BQGQ_THANG" => {
                Ok(Self::PeriodicWeightedAverage)
            }
            "MOVING" | "MOVING_AVERAGE" | "BQDD" => Ok(Self::MovingAverage),
            "FIFO" | "NTXT" => Ok(Self::Fifo),
            "LIFO" | "NSXT" => Ok(Self::Lifo),
            _ => Err(CostingMethodError(s.to_string())),
        }
    }
}

impl fmt::Display for CostingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeriodicWeightedAverage => write!(f, "PERIODIC"),
            Self::MovingAverage => write!(f, "MOVING"),
            Self::Fifo => write!(f, "FIFO"),
            Self::Lifo => write!(f, "LIFO"),
        }
    }
}

impl CostingMethod {
    pub fn description(&self) -> &'static str {
        match self {
            Self::PeriodicWeightedAverage => "Periodic weighted average (monthly)",
            Self::MovingAverage => "Moving average",
            Self::Fifo => "First in, first out",
            Self::Lifo => "Last in, first out",
        }
    }
}

/// Valuation of one issue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCost {
    pub source: SourceRef,
    pub id: Option<String>,
    pub item: ItemKey,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub extended_value: Decimal,
    pub warnings: Vec<Warning>,
}

impl IssueCost {
    fn new(tx: &Transaction, item: &ItemKey, extended_value: Decimal) -> Self {
        let unit_cost = if tx.quantity > Decimal::ZERO {
            extended_value / tx.quantity
        } else {
            Decimal::ZERO
        };
        IssueCost {
            source: tx.source.clone(),
            id: tx.id.clone(),
            item: item.clone(),
            date: tx.date,
            quantity: tx.quantity,
            unit_cost,
            extended_value,
            warnings: Vec::new(),
        }
    }

    fn short(mut self, available: Decimal) -> Self {
        let available = available.max(Decimal::ZERO);
        log::warn!(
            "{} {}: issue of {} with only {} on hand",
            self.source,
            self.item,
            self.quantity,
            available
        );
        self.warnings.push(Warning::InsufficientStock {
            available,
            required: self.quantity,
        });
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Result for a single item.
#[derive(Debug, Clone, Default)]
pub struct ItemCosting {
    pub issues: Vec<IssueCost>,
    pub closing: Holding,
}

/// Stock movement as the engine sees it.
enum Step {
    Receipt { quantity: Decimal, value: Decimal },
    Issue { quantity: Decimal },
}

impl Step {
    fn of(tx: &Transaction) -> Option<Step> {
        let movement = tx.movement()?;
        Some(if movement.is_issue() {
            Step::Issue {
                quantity: tx.quantity,
            }
        } else {
            Step::Receipt {
                quantity: tx.quantity,
                value: tx.amount,
            }
        })
    }
}

/// Value every issue of one item.
///
/// Records come back in the order the issues appear in `item.transactions`.
/// Receipts are not reported but move the running state. Quantities are
/// expected to be positive; rows with a negative issue quantity have no
/// defined valuation and are filtered out by the loader.
pub fn compute_issue_costs(
    item: &StockItem,
    method: CostingMethod,
    tolerance: Decimal,
) -> ItemCosting {
    match method {
        CostingMethod::PeriodicWeightedAverage => periodic_weighted_average(item),
        CostingMethod::MovingAverage => moving_average(item),
        CostingMethod::Fifo => lot_based(item, tolerance, Take::Oldest),
        CostingMethod::Lifo => lot_based(item, tolerance, Take::Newest),
    }
}

fn periodic_weighted_average(item: &StockItem) -> ItemCosting {
    let mut months: BTreeMap<(i32, u32), Vec<(usize, &Transaction)>> = BTreeMap::new();
    for (pos, tx) in item.transactions.iter().enumerate() {
        months
            .entry((tx.date.year(), tx.date.month()))
            .or_default()
            .push((pos, tx));
    }

    let mut carried = Holding::new(item.opening_quantity, item.opening_value);
    let mut issues = Vec::new();

    for ((year, month), rows) in months {
        let mut total = carried;
        for (_, tx) in &rows {
            if let Some(Step::Receipt { quantity, value }) = Step::of(tx) {
                total.add(quantity, value);
            }
        }
        let unit_cost = total.unit_cost();
        log::debug!(
            "{} {}-{:02}: available qty={}, value={}, unit cost={}",
            item.key,
            year,
            month,
            total.quantity,
            total.value,
            unit_cost
        );

        let mut issued = Decimal::ZERO;
        for (pos, tx) in rows {
            if let Some(Step::Issue { quantity }) = Step::of(tx) {
                let available = total.quantity - issued;
                issued += quantity;
                let mut cost = IssueCost::new(tx, &item.key, quantity * unit_cost);
                if quantity > available {
                    cost = cost.short(available);
                }
                issues.push((pos, cost));
            }
        }

        carried = Holding::new(total.quantity - issued, total.value - issued * unit_cost);
    }

    issues.sort_by_key(|(pos, _)| *pos);
    ItemCosting {
        issues: issues.into_iter().map(|(_, cost)| cost).collect(),
        closing: carried,
    }
}

fn moving_average(item: &StockItem) -> ItemCosting {
    let mut on_hand = Holding::new(item.opening_quantity, item.opening_value);
    let mut unit_cost = on_hand.unit_cost();
    let mut issues = Vec::new();

    for tx in &item.transactions {
        match Step::of(tx) {
            Some(Step::Receipt { quantity, value }) => {
                on_hand.add(quantity, value);
                unit_cost = on_hand.unit_cost();
                log::debug!(
                    "{} receipt qty={}, value={}: on hand qty={}, value={}, unit cost={}",
                    item.key,
                    quantity,
                    value,
                    on_hand.quantity,
                    on_hand.value,
                    unit_cost
                );
            }
            Some(Step::Issue { quantity }) => {
                // the last receipt's cost stays in force after stock runs out
                let available = on_hand.quantity;
                let extended = quantity * unit_cost;
                let mut cost = IssueCost::new(tx, &item.key, extended);
                if quantity > available {
                    cost = cost.short(available);
                }
                issues.push(cost);

                on_hand.quantity -= quantity;
                on_hand.value -= extended;
                if on_hand.quantity <= Decimal::ZERO {
                    on_hand.value = Decimal::ZERO;
                }
            }
            None => {}
        }
    }

    ItemCosting {
        issues,
        closing: on_hand,
    }
}

#[derive(Debug, Clone, Copy)]
enum Take {
    Oldest,
    Newest,
}

#[derive(Debug, Clone)]
struct Lot {
    quantity: Decimal,
    unit_cost: Decimal,
}

/// Receipt layers for FIFO/LIFO. Opening stock is the first (bottom) lot.
struct LotQueue<'a> {
    item: &'a ItemKey,
    lots: VecDeque<Lot>,
    tolerance: Decimal,
}

impl<'a> LotQueue<'a> {
    fn new(item: &'a ItemKey, tolerance: Decimal) -> Self {
        LotQueue {
            item,
            lots: VecDeque::new(),
            tolerance,
        }
    }

    fn push(&mut self, quantity: Decimal, value: Decimal) {
        let unit_cost = if quantity > Decimal::ZERO {
            value / quantity
        } else {
            Decimal::ZERO
        };
        self.lots.push_back(Lot {
            quantity,
            unit_cost,
        });
        log::debug!(
            "{} LOT IN: qty={}, unit cost={}. Lots: {}",
            self.item,
            quantity,
            unit_cost,
            self.lots.len()
        );
    }

    /// Consume up to `quantity`, returning (cost, quantity actually taken).
    fn take(&mut self, quantity: Decimal, from: Take) -> (Decimal, Decimal) {
        let mut remaining = quantity;
        let mut cost = Decimal::ZERO;

        while remaining > Decimal::ZERO {
            let lot = match from {
                Take::Oldest => self.lots.front_mut(),
                Take::Newest => self.lots.back_mut(),
            };
            let Some(lot) = lot else {
                break;
            };

            let used = remaining.min(lot.quantity);
            cost += used * lot.unit_cost;
            lot.quantity -= used;
            remaining -= used;

            // a zero tolerance still has to retire empty lots
            if lot.quantity.is_zero() || lot.quantity < self.tolerance {
                match from {
                    Take::Oldest => self.lots.pop_front(),
                    Take::Newest => self.lots.pop_back(),
                };
            }
        }

        let taken = quantity - remaining;
        log::debug!(
            "{} LOT OUT ({:?}): qty={}, taken={}, cost={}. Lots left: {}",
            self.item,
            from,
            quantity,
            taken,
            cost,
            self.lots.len()
        );
        (cost, taken)
    }

    fn holding(&self) -> Holding {
        self.lots.iter().fold(Holding::default(), |mut acc, lot| {
            acc.add(lot.quantity, lot.quantity * lot.unit_cost);
            acc
        })
    }
}

fn lot_based(item: &StockItem, tolerance: Decimal, from: Take) -> ItemCosting {
    let mut queue = LotQueue::new(&item.key, tolerance);
    if item.opening_quantity > Decimal::ZERO {
        queue.push(item.opening_quantity, item.opening_value);
    }

    let mut issues = Vec::new();
    for tx in &item.transactions {
        match Step::of(tx) {
            Some(Step::Receipt { quantity, value }) => queue.push(quantity, value),
            Some(Step::Issue { quantity }) => {
                let (cost, taken) = queue.take(quantity, from);
                let mut record = IssueCost::new(tx, &item.key, cost);
                if taken < quantity {
                    record = record.short(taken);
                }
                issues.push(record);
            }
            None => {}
        }
    }

    ItemCosting {
        issues,
        closing: queue.holding(),
    }
}

/// Closing position of one item after costing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingStock {
    pub item: ItemKey,
    pub quantity: Decimal,
    pub value: Decimal,
}

/// Issue valuations across all items.
#[derive(Debug, Clone)]
pub struct CostingReport {
    pub method: CostingMethod,
    pub issues: Vec<IssueCost>,
    pub closing: Vec<ClosingStock>,
}

impl CostingReport {
    pub fn total_issued_value(&self) -> Decimal {
        self.issues.iter().map(|i| i.extended_value).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&IssueCost, &Warning)> {
        self.issues
            .iter()
            .flat_map(|issue| issue.warnings.iter().map(move |w| (issue, w)))
    }

    /// Copy of `transactions` with costed issue rows carrying the computed
    /// unit price (6 dp) and amount (2 dp).
    pub fn apply_to(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let by_source: HashMap<&SourceRef, &IssueCost> =
            self.issues.iter().map(|i| (&i.source, i)).collect();
        transactions
            .iter()
            .map(|tx| {
                let mut tx = tx.clone();
                if let Some(cost) = by_source.get(&tx.source) {
                    tx.unit_price = Some(cost.unit_cost.round_dp(6));
                    tx.amount = cost.extended_value.round_dp(2);
                }
                tx
            })
            .collect()
    }
}

/// Cost every item, in item-key order.
pub fn cost_items(items: &[StockItem], method: CostingMethod, tolerance: Decimal) -> CostingReport {
    let mut issues = Vec::new();
    let mut closing = Vec::new();

    for item in items {
        let costing = compute_issue_costs(item, method, tolerance);
        log::debug!(
            "{}: {} issues costed, closing qty={}, value={}",
            item.key,
            costing.issues.len(),
            costing.closing.quantity,
            costing.closing.value
        );
        issues.extend(costing.issues);
        closing.push(ClosingStock {
            item: item.key.clone(),
            quantity: costing.closing.quantity,
            value: costing.closing.value,
        });
    }

    log::info!("{} issues costed with {}", issues.len(), method.description());
    CostingReport {
        method,
        issues,
        closing,
    }
}
