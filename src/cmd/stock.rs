//! Stock command - quantity and value movements per item over a period

use crate::cmd::{read_items, JournalArgs, PeriodArgs};
use crate::core::ItemKey;
use crate::inventory::{stock_summary, StockLine};
use crate::utils::{format_amount, format_quantity, render_table, write_csv};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct StockCommand {
    #[command(flatten)]
    input: JournalArgs,

    /// Item master CSV with opening quantities and values
    #[arg(short, long)]
    items: Option<PathBuf>,

    #[command(flatten)]
    period: PeriodArgs,

    /// Only show these items (WAREHOUSE|ITEM), repeatable
    #[arg(long = "item")]
    item_filter: Vec<ItemKey>,

    /// Output rows as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StockRow<'a> {
    warehouse: &'a str,
    item: &'a str,
    name: &'a str,
    unit: &'a str,
    opening_quantity: Decimal,
    opening_value: Decimal,
    receipt_quantity: Decimal,
    receipt_value: Decimal,
    issue_quantity: Decimal,
    issue_value: Decimal,
    production_quantity: Decimal,
    production_value: Decimal,
    closing_quantity: Decimal,
    closing_value: Decimal,
}

impl<'a> From<&'a StockLine> for StockRow<'a> {
    fn from(line: &'a StockLine) -> Self {
        StockRow {
            warehouse: &line.item.warehouse,
            item: &line.item.item,
            name: line.info.name.as_deref().unwrap_or_default(),
            unit: line.info.unit.as_deref().unwrap_or_default(),
            opening_quantity: line.opening.quantity,
            opening_value: line.opening.value,
            receipt_quantity: line.receipts.quantity,
            receipt_value: line.receipts.value,
            issue_quantity: line.issues.quantity,
            issue_value: line.issues.value,
            production_quantity: line.production.quantity,
            production_value: line.production.value,
            closing_quantity: line.closing.quantity,
            closing_value: line.closing.value,
        }
    }
}

#[derive(Debug, Tabled)]
struct StockDisplay {
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Opening")]
    opening: String,
    #[tabled(rename = "Received")]
    receipts: String,
    #[tabled(rename = "Issued")]
    issues: String,
    #[tabled(rename = "To Production")]
    production: String,
    #[tabled(rename = "Closing")]
    closing: String,
    #[tabled(rename = "Closing Value")]
    closing_value: String,
}

impl StockCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let period = self.period.period()?;
        let journal = self.input.read()?;
        let master = read_items(self.items.as_deref())?;
        let lines = stock_summary(&master, &journal.transactions, &period, &self.item_filter);

        if self.json {
            let rows: Vec<StockRow> = lines.iter().map(StockRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if self.csv {
            write_csv(lines.iter().map(StockRow::from), std::io::stdout())?;
            return Ok(());
        }

        println!();
        println!("STOCK MOVEMENTS ({})", period);
        println!();
        if lines.is_empty() {
            println!("No stock movements found matching filters.");
            return Ok(());
        }

        let rows: Vec<StockDisplay> = lines
            .iter()
            .map(|line| StockDisplay {
                warehouse: line.item.warehouse.clone(),
                item: line.item.item.clone(),
                name: line.info.name.clone().unwrap_or_default(),
                opening: format_quantity(line.opening.quantity),
                receipts: format_quantity(line.receipts.quantity),
                issues: format_quantity(line.issues.quantity),
                production: format_quantity(line.production.quantity),
                closing: format_quantity(line.closing.quantity),
                closing_value: format_amount(line.closing.value),
            })
            .collect();
        println!("{}", render_table(rows));
        Ok(())
    }
}
