//! Schema command - print expected input formats

use crate::core::{item_columns, journal_columns, CsvField, JournalInput};
use crate::ledger::account_columns;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,

    /// Which input file to describe
    #[arg(short, long, value_enum, default_value = "journal")]
    table: InputTable,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the journal input
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputTable {
    Journal,
    Accounts,
    Items,
}

impl InputTable {
    fn columns(self) -> &'static [CsvField] {
        match self {
            InputTable::Journal => journal_columns(),
            InputTable::Accounts => account_columns(),
            InputTable::Items => item_columns(),
        }
    }

    fn title(self) -> &'static str {
        match self {
            InputTable::Journal => "Journal CSV Format",
            InputTable::Accounts => "Chart of Accounts CSV Format",
            InputTable::Items => "Item Master CSV Format",
        }
    }
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        if self.table != InputTable::Journal {
            anyhow::bail!("JSON input is only accepted for the journal; use csv-fields");
        }
        let schema = schema_for!(JournalInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        let names: Vec<&str> = self.table.columns().iter().map(|f| f.name).collect();
        println!("{}", names.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        let title = self.table.title();
        println!("{}", title);
        println!("{}", "=".repeat(title.len()));
        println!();
        for field in self.table.columns() {
            let req = if field.required { "required" } else { "optional" };
            println!("{:20} ({:8})  {}", field.name, req, field.description);
        }
        println!();
        println!("Dates: YYYY-MM-DD or DD/MM/YYYY. Blank numbers count as zero.");
        Ok(())
    }
}
