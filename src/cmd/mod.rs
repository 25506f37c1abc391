pub mod cost;
pub mod ledger;
pub mod schema;
pub mod stock;
pub mod trial_balance;
pub mod validate;

use crate::core::{
    read_items_csv, read_journal_csv, read_journal_json, ItemMaster, Journal, Period, Settings,
};
use crate::ledger::{read_accounts_csv, AccountLedger};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// Journal inputs shared by the reporting commands
#[derive(Args, Debug)]
pub struct JournalArgs {
    /// Journal file(s), CSV or JSON, merged in the order given. "-" reads CSV from stdin.
    #[arg(short, long, required = true, num_args = 1..)]
    pub journal: Vec<PathBuf>,

    /// Settings file (JSON) overriding tolerances and VAT accounts
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl JournalArgs {
    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings::load(self.settings.as_deref())?)
    }

    pub fn read(&self) -> anyhow::Result<Journal> {
        read_journal(&self.journal)
    }
}

/// Reporting period
#[derive(Args, Debug)]
pub struct PeriodArgs {
    /// First day of the period (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub from: String,

    /// Last day of the period, inclusive
    #[arg(long)]
    pub to: String,
}

impl PeriodArgs {
    pub fn period(&self) -> anyhow::Result<Period> {
        Ok(Period::parse(&self.from, &self.to)?)
    }
}

/// Name used for a path in warnings and write-back: the file name, or "stdin".
pub fn source_name(path: &Path) -> String {
    if path.as_os_str() == "-" {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Open a path for reading, or stdin with "-".
fn open(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() != "-" {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
        return Ok(Box::new(BufReader::new(file)));
    }

    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;
    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }
    Ok(Box::new(Cursor::new(buffer)))
}

/// Read and merge journal files, then sort the whole stream by date.
pub fn read_journal(paths: &[PathBuf]) -> anyhow::Result<Journal> {
    let mut journal = Journal::default();
    for path in paths {
        let name = source_name(path);
        let reader = open(path)?;
        let part = if is_json(path) {
            read_journal_json(reader, &name)?
        } else {
            read_journal_csv(reader, &name)?
        };
        journal.extend(part);
    }
    journal.sort();
    if journal.skipped() > 0 {
        log::warn!(
            "{} of {} journal rows skipped",
            journal.skipped(),
            journal.rows_read
        );
    }
    Ok(journal)
}

pub fn read_accounts(path: &Path) -> anyhow::Result<AccountLedger> {
    Ok(read_accounts_csv(open(path)?, &source_name(path))?)
}

/// Item master, or an empty one when no file is given.
pub fn read_items(path: Option<&Path>) -> anyhow::Result<ItemMaster> {
    match path {
        Some(path) => Ok(read_items_csv(open(path)?, &source_name(path))?),
        None => Ok(ItemMaster::default()),
    }
}
