//! Cost command - value stock issues and optionally write costed journals back

use crate::cmd::{read_items, source_name, JournalArgs};
use crate::core::{collect_stock_items, write_journal_csv, ItemKey, Transaction};
use crate::inventory::{cost_items, ClosingStock, CostingMethod, CostingReport, IssueCost};
use crate::utils::{format_amount, format_quantity, format_unit_cost, render_table, write_csv};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct CostCommand {
    #[command(flatten)]
    input: JournalArgs,

    /// Item master CSV with opening quantities and values
    #[arg(short, long)]
    items: Option<PathBuf>,

    /// Costing method: PERIODIC, MOVING, FIFO or LIFO
    #[arg(short, long, default_value = "PERIODIC")]
    method: CostingMethod,

    /// Quantity below which a FIFO/LIFO lot counts as used up
    #[arg(long)]
    tolerance: Option<Decimal>,

    /// Only cost these items (WAREHOUSE|ITEM), repeatable
    #[arg(long = "item")]
    item_filter: Vec<ItemKey>,

    /// Write each journal file, with issue rows priced, into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output issue rows as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CostOutput<'a> {
    method: String,
    total_issued_value: Decimal,
    issues: Vec<IssueRow>,
    closing: &'a [ClosingStock],
    warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct IssueRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Debug, Tabled)]
struct ClosingRow {
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
}

impl CostCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let settings = self.input.settings()?;
        let tolerance = self.tolerance.unwrap_or(settings.lot_tolerance);
        if tolerance < Decimal::ZERO {
            anyhow::bail!("tolerance must not be negative");
        }

        let journal = self.input.read()?;
        let master = read_items(self.items.as_deref())?;
        let mut warnings = journal.warnings.clone();
        warnings.extend(master.warnings.iter().cloned());

        let mut items = collect_stock_items(&master, &journal.transactions, &mut warnings);
        if !self.item_filter.is_empty() {
            items.retain(|item| self.item_filter.contains(&item.key));
        }
        log::info!(
            "costing {} items with {} (tolerance {})",
            items.len(),
            self.method,
            tolerance
        );

        let report = cost_items(&items, self.method, tolerance);

        if let Some(dir) = &self.out_dir {
            self.write_back(dir, &report, &journal.transactions)?;
        }

        let rows: Vec<IssueRow> = report.issues.iter().map(issue_row).collect();
        let mut notes: Vec<String> = warnings.iter().map(|w| w.to_string()).collect();
        notes.extend(
            report
                .warnings()
                .map(|(issue, w)| format!("{} {}: {}", issue.source, issue.item, w)),
        );

        if self.json {
            let output = CostOutput {
                method: self.method.to_string(),
                total_issued_value: report.total_issued_value(),
                issues: rows,
                closing: &report.closing,
                warnings: notes,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if self.csv {
            write_csv(rows, std::io::stdout())?;
        } else {
            self.print_tables(&report, rows, &notes);
        }
        Ok(())
    }

    fn print_tables(&self, report: &CostingReport, rows: Vec<IssueRow>, notes: &[String]) {
        println!();
        println!("ISSUE COSTS ({})", self.method.description());
        println!();

        if rows.is_empty() {
            println!("No issues to cost.");
        } else {
            println!("{}", render_table(rows));
            println!();
            println!(
                "Total issued value: {}",
                format_amount(report.total_issued_value())
            );
        }

        if !report.closing.is_empty() {
            println!();
            println!("CLOSING STOCK");
            println!();
            let closing: Vec<ClosingRow> = report
                .closing
                .iter()
                .map(|c| ClosingRow {
                    warehouse: c.item.warehouse.clone(),
                    item: c.item.item.clone(),
                    quantity: format_quantity(c.quantity),
                    value: format_amount(c.value),
                    unit_cost: if c.quantity > Decimal::ZERO {
                        format_unit_cost(c.value / c.quantity)
                    } else {
                        "-".to_string()
                    },
                })
                .collect();
            println!("{}", render_table(closing));
        }

        if !notes.is_empty() {
            println!();
            println!("\u{26A0} {} warning(s):", notes.len());
            for note in notes {
                println!("  {}", note);
            }
        }
    }

    /// Every output is rendered before the first file is written, so a
    /// failure leaves the directory untouched.
    fn write_back(
        &self,
        dir: &Path,
        report: &CostingReport,
        transactions: &[Transaction],
    ) -> anyhow::Result<()> {
        let costed = report.apply_to(transactions);
        let mut by_source: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for tx in &costed {
            by_source.entry(tx.source.source.as_str()).or_default().push(tx);
        }

        let expected: Vec<String> = self.input.journal.iter().map(|p| source_name(p)).collect();
        let mut outputs = Vec::new();
        for name in &expected {
            if expected.iter().filter(|other| *other == name).count() > 1 {
                anyhow::bail!("two journal inputs are both named {}; cannot write back", name);
            }
            let mut rows = by_source.remove(name.as_str()).unwrap_or_default();
            rows.sort_by_key(|tx| tx.source.row);
            let mut buffer = Vec::new();
            write_journal_csv(rows, &mut buffer)?;
            let file_name = if name == "stdin" {
                "stdin.csv".to_string()
            } else {
                Path::new(name).with_extension("csv").display().to_string()
            };
            outputs.push((dir.join(file_name), buffer));
        }

        fs::create_dir_all(dir)?;
        for (path, buffer) in outputs {
            fs::write(&path, buffer)?;
            log::info!("wrote {}", path.display());
        }
        Ok(())
    }
}

fn issue_row(issue: &IssueCost) -> IssueRow {
    IssueRow {
        source: issue.source.to_string(),
        date: issue.date.format("%Y-%m-%d").to_string(),
        warehouse: issue.item.warehouse.clone(),
        item: issue.item.item.clone(),
        quantity: format_quantity(issue.quantity),
        unit_cost: format_unit_cost(issue.unit_cost),
        value: format_amount(issue.extended_value),
        note: issue
            .warnings
            .iter()
            .map(|w| w.kind())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
