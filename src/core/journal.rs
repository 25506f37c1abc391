use super::input::{self, csv_reader, parse_date, text, CsvField, LoadError, RowContext};
use super::items::ItemKey;
use super::warnings::Warning;
use acctc_derive::CsvSchema;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{Read, Write};

/// Where a transaction came from: input name plus 1-based row number.
///
/// For CSV the row is the file line (the header is line 1, so the first
/// data row is line 2). For JSON it is the position in the `transactions`
/// array, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceRef {
    pub source: String,
    pub row: usize,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.row)
    }
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Movement {
    Receipt,
    Issue,
    /// Issue into work in progress (debit to 154).
    ProductionIssue,
}

impl Movement {
    pub fn is_issue(self) -> bool {
        matches!(self, Movement::Issue | Movement::ProductionIssue)
    }

    fn parse(token: &str) -> Option<Movement> {
        match token.trim().to_uppercase().as_str() {
            "IN" | "RECEIPT" | "NHAP" => Some(Movement::Receipt),
            "OUT" | "ISSUE" | "XUAT" => Some(Movement::Issue),
            "PRODUCTION" | "XUAT_SX" => Some(Movement::ProductionIssue),
            _ => None,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Movement::Receipt => "IN",
            Movement::Issue => "OUT",
            Movement::ProductionIssue => "PRODUCTION",
        }
    }
}

/// Classify a posting by its inventory accounts.
///
/// Work in progress (154) is checked first: charging materials to it is a
/// production issue, crediting it brings finished goods back into stock.
/// Other 15x accounts are receipts on the debit side and issues on the credit side.
pub fn classify_movement(debit_account: &str, credit_account: &str) -> Option<Movement> {
    if debit_account.starts_with("154") {
        Some(Movement::ProductionIssue)
    } else if credit_account.starts_with("154") {
        Some(Movement::Receipt)
    } else if debit_account.starts_with("15") {
        Some(Movement::Receipt)
    } else if credit_account.starts_with("15") {
        Some(Movement::Issue)
    } else {
        None
    }
}

/// A validated journal posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub source: SourceRef,
    pub id: Option<String>,
    pub date: NaiveDate,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: Decimal,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub warehouse: Option<String>,
    pub item: Option<String>,
    pub vat_amount: Decimal,
    pub voucher_type: Option<String>,
    pub voucher_no: Option<String>,
    pub voucher_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub item_name: Option<String>,
    pub item_spec: Option<String>,
    /// Explicit direction; when absent it is derived from the accounts.
    pub movement: Option<Movement>,
    /// Generated VAT posting rather than an input row.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl Transaction {
    /// Stock key, when both warehouse and item are set.
    pub fn item_key(&self) -> Option<ItemKey> {
        match (&self.warehouse, &self.item) {
            (Some(warehouse), Some(item)) => Some(ItemKey::new(warehouse, item)),
            _ => None,
        }
    }

    pub fn movement(&self) -> Option<Movement> {
        self.movement
            .or_else(|| classify_movement(&self.debit_account, &self.credit_account))
    }

    /// Description with item name and spec appended, as shown in account books.
    pub fn full_description(&self) -> String {
        let mut text = self.description.clone().unwrap_or_default();
        if let Some(name) = &self.item_name {
            if text.is_empty() {
                text.push_str(name);
            } else {
                text.push_str(" - ");
                text.push_str(name);
            }
        }
        if let Some(spec) = &self.item_spec {
            text.push_str(&format!(" ({})", spec));
        }
        text
    }
}

#[cfg(test)]
impl Transaction {
    /// Bare posting with no stock or voucher details.
    pub fn posting(date: &str, debit: &str, credit: &str, amount: Decimal) -> Self {
        Transaction {
            source: SourceRef {
                source: "test".to_string(),
                row: 0,
            },
            id: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            debit_account: debit.to_string(),
            credit_account: credit.to_string(),
            amount,
            quantity: Decimal::ZERO,
            unit_price: None,
            warehouse: None,
            item: None,
            vat_amount: Decimal::ZERO,
            voucher_type: None,
            voucher_no: None,
            voucher_date: None,
            description: None,
            item_name: None,
            item_spec: None,
            movement: None,
            synthetic: false,
        }
    }
}

/// Journal input row. Every field is text so that a bad cell only
/// costs its row, never the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, CsvSchema)]
pub struct JournalRecord {
    /// Optional identifier, echoed in costing output
    #[serde(default)]
    pub id: Option<String>,
    /// Posting date (YYYY-MM-DD or DD/MM/YYYY)
    pub date: String,
    /// Debited account code
    pub debit_account: String,
    /// Credited account code
    pub credit_account: String,
    /// Posting amount; blank means zero
    #[serde(default)]
    pub amount: Option<String>,
    /// Stock quantity
    #[serde(default)]
    pub quantity: Option<String>,
    /// Unit price
    #[serde(default)]
    pub unit_price: Option<String>,
    /// Warehouse code
    #[serde(default)]
    pub warehouse: Option<String>,
    /// Item code
    #[serde(default)]
    pub item: Option<String>,
    /// VAT amount carried by the posting
    #[serde(default)]
    pub vat_amount: Option<String>,
    /// Voucher type (TKHQ marks a customs declaration)
    #[serde(default)]
    pub voucher_type: Option<String>,
    /// Voucher number
    #[serde(default)]
    pub voucher_no: Option<String>,
    /// Voucher date
    #[serde(default)]
    pub voucher_date: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Item name, appended to the description in account books
    #[serde(default)]
    pub item_name: Option<String>,
    /// Item specification
    #[serde(default)]
    pub item_spec: Option<String>,
    /// IN or OUT; overrides the account-based stock classification
    #[serde(default)]
    pub movement: Option<String>,
}

/// Root of the JSON journal input.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JournalInput {
    pub transactions: Vec<JournalRecord>,
}

impl JournalRecord {
    fn into_transaction(self, ctx: &mut RowContext) -> Option<Transaction> {
        let Some(date) = parse_date(&self.date) else {
            if self.date.trim().is_empty() {
                ctx.skip("missing date");
            } else {
                ctx.skip(format!("unreadable date '{}'", self.date.trim()));
            }
            return None;
        };

        let debit_account = self.debit_account.trim().to_string();
        let credit_account = self.credit_account.trim().to_string();
        if debit_account.is_empty() || credit_account.is_empty() {
            ctx.skip("missing account code");
            return None;
        }

        let amount = match self.amount.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => match input::parse_decimal(raw) {
                Some(amount) => amount,
                None => {
                    ctx.skip(format!("non-numeric amount '{}'", raw));
                    return None;
                }
            },
        };

        let quantity = ctx.decimal_or_zero("quantity", self.quantity.as_deref());
        let vat_amount = ctx.decimal_or_zero("vat_amount", self.vat_amount.as_deref());
        let unit_price = match text(self.unit_price) {
            None => None,
            Some(raw) => Some(ctx.decimal_or_zero("unit_price", Some(&raw))),
        };

        let voucher_date = match text(self.voucher_date) {
            None => None,
            Some(raw) => {
                let parsed = parse_date(&raw);
                if parsed.is_none() {
                    ctx.invalid("voucher_date", &raw);
                }
                parsed
            }
        };

        let movement = match text(self.movement) {
            None => None,
            Some(raw) => {
                let parsed = Movement::parse(&raw);
                if parsed.is_none() {
                    ctx.invalid("movement", &raw);
                }
                parsed
            }
        };

        Some(Transaction {
            source: SourceRef {
                source: ctx.source.to_string(),
                row: ctx.row,
            },
            id: text(self.id),
            date,
            debit_account,
            credit_account,
            amount,
            quantity,
            unit_price,
            warehouse: text(self.warehouse),
            item: text(self.item),
            vat_amount,
            voucher_type: text(self.voucher_type),
            voucher_no: text(self.voucher_no),
            voucher_date,
            description: text(self.description),
            item_name: text(self.item_name),
            item_spec: text(self.item_spec),
            movement,
            synthetic: false,
        })
    }
}

impl From<&Transaction> for JournalRecord {
    fn from(tx: &Transaction) -> Self {
        JournalRecord {
            id: tx.id.clone(),
            date: tx.date.format("%Y-%m-%d").to_string(),
            debit_account: tx.debit_account.clone(),
            credit_account: tx.credit_account.clone(),
            amount: Some(tx.amount.to_string()),
            quantity: (!tx.quantity.is_zero()).then(|| tx.quantity.to_string()),
            unit_price: tx.unit_price.map(|p| p.to_string()),
            warehouse: tx.warehouse.clone(),
            item: tx.item.clone(),
            vat_amount: (!tx.vat_amount.is_zero()).then(|| tx.vat_amount.to_string()),
            voucher_type: tx.voucher_type.clone(),
            voucher_no: tx.voucher_no.clone(),
            voucher_date: tx.voucher_date.map(|d| d.format("%Y-%m-%d").to_string()),
            description: tx.description.clone(),
            item_name: tx.item_name.clone(),
            item_spec: tx.item_spec.clone(),
            movement: tx.movement.map(|m| m.token().to_string()),
        }
    }
}

/// Loaded transactions plus whatever was dropped or repaired on the way.
#[derive(Debug, Default)]
pub struct Journal {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<Warning>,
    pub rows_read: usize,
}

impl Journal {
    /// Append another source, keeping its rows after the current ones.
    pub fn extend(&mut self, other: Journal) {
        self.transactions.extend(other.transactions);
        self.warnings.extend(other.warnings);
        self.rows_read += other.rows_read;
    }

    /// Stable sort by date, so same-day rows keep their input order.
    pub fn sort(&mut self) {
        self.transactions.sort_by_key(|tx| tx.date);
    }

    pub fn skipped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::SkippedRow { .. }))
            .count()
    }

    fn from_records<I>(records: I, source: &str) -> Journal
    where
        I: IntoIterator<Item = (usize, Result<JournalRecord, String>)>,
    {
        let mut journal = Journal::default();
        for (row, record) in records {
            journal.rows_read += 1;
            let mut ctx = RowContext {
                source,
                row,
                warnings: &mut journal.warnings,
            };
            match record {
                Ok(record) => {
                    if let Some(tx) = record.into_transaction(&mut ctx) {
                        journal.transactions.push(tx);
                    }
                }
                Err(reason) => ctx.skip(reason),
            }
        }
        log::info!(
            "{}: {} rows read, {} transactions loaded",
            source,
            journal.rows_read,
            journal.transactions.len()
        );
        journal
    }
}

/// Read journal rows from CSV. Headers are matched case-insensitively.
pub fn read_journal_csv<R: Read>(reader: R, source: &str) -> Result<Journal, LoadError> {
    let mut rdr = csv_reader(reader, source, &JournalRecord::required_columns())?;
    let records: Vec<_> = rdr
        .deserialize::<JournalRecord>()
        .enumerate()
        .map(|(i, r)| (i + 2, r.map_err(|e| e.to_string())))
        .collect();
    let mut journal = Journal::from_records(records, source);
    journal.sort();
    Ok(journal)
}

/// Read journal rows from JSON (`{"transactions": [...]}`).
/// Numeric values may be given as JSON numbers or strings.
pub fn read_journal_json<R: Read>(reader: R, source: &str) -> Result<Journal, LoadError> {
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Object(mut root) = value else {
        return Err(LoadError::Malformed {
            source_name: source.to_string(),
            message: "expected an object with a 'transactions' array".to_string(),
        });
    };
    let Some(Value::Array(rows)) = root.remove("transactions") else {
        return Err(LoadError::MissingColumn {
            source_name: source.to_string(),
            column: "transactions".to_string(),
        });
    };

    let records: Vec<_> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let record = serde_json::from_value::<JournalRecord>(numbers_as_text(row))
                .map_err(|e| e.to_string());
            (i + 1, record)
        })
        .collect();
    let mut journal = Journal::from_records(records, source);
    journal.sort();
    Ok(journal)
}

fn numbers_as_text(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), numbers_as_text(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Write transactions back out in the journal CSV layout.
pub fn write_journal_csv<'a, I, W>(transactions: I, writer: W) -> Result<(), LoadError>
where
    I: IntoIterator<Item = &'a Transaction>,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transactions {
        wtr.serialize(JournalRecord::from(tx))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Column layout of the journal CSV.
pub fn journal_columns() -> &'static [CsvField] {
    JournalRecord::csv_schema()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "date,debit_account,credit_account,amount,quantity,warehouse,item,description\n";

    #[test]
    fn reads_rows_and_sorts_stably_by_date() {
        let data = format!(
            "{}{}{}{}",
            HEADER,
            "2024-01-05,1561,331,100,10,K1,A,second\n",
            "2024-01-01,1561,331,50,5,K1,A,first\n",
            "2024-01-05,632,1561,40,4,K1,A,third\n",
        );
        let journal = read_journal_csv(data.as_bytes(), "journal.csv").unwrap();

        assert_eq!(journal.rows_read, 3);
        let descriptions: Vec<_> = journal
            .transactions
            .iter()
            .map(|t| t.description.clone().unwrap())
            .collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
        assert_eq!(journal.transactions[0].source.row, 3);
        assert_eq!(journal.transactions[1].amount, dec!(100));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let data = "DATE,Debit_Account,CREDIT_ACCOUNT,Amount\n2024-02-01,111,511,10\n";
        let journal = read_journal_csv(data.as_bytes(), "journal.csv").unwrap();
        assert_eq!(journal.transactions.len(), 1);
        assert_eq!(journal.transactions[0].credit_account, "511");
    }

    #[test]
    fn bad_rows_are_skipped_and_recorded() {
        let data = format!(
            "{}{}{}{}{}",
            HEADER,
            "not-a-date,111,511,10,,,,\n",
            "2024-01-02,,511,10,,,,\n",
            "2024-01-03,111,511,ten,,,,\n",
            "2024-01-04,111,511,10,,,,ok\n",
        );
        let journal = read_journal_csv(data.as_bytes(), "journal.csv").unwrap();

        assert_eq!(journal.transactions.len(), 1);
        assert_eq!(journal.skipped(), 3);
        assert!(journal.warnings.contains(&Warning::SkippedRow {
            source: "journal.csv".to_string(),
            row: 4,
            reason: "non-numeric amount 'ten'".to_string(),
        }));
    }

    #[test]
    fn missing_column_is_fatal() {
        let data = "date,debit_account,amount\n2024-01-01,111,10\n";
        let err = read_journal_csv(data.as_bytes(), "journal.csv").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn { ref column, .. } if column == "credit_account"
        ));
    }

    #[test]
    fn reads_json_with_numeric_values() {
        let data = r#"{"transactions": [
            {"date": "2024-03-01", "debit_account": "632", "credit_account": "1561",
             "quantity": 8, "warehouse": "K1", "item": "A", "movement": "OUT"}
        ]}"#;
        let journal = read_journal_json(data.as_bytes(), "journal.json").unwrap();
        let tx = &journal.transactions[0];
        assert_eq!(tx.quantity, dec!(8));
        assert_eq!(tx.amount, Decimal::ZERO);
        assert_eq!(tx.movement, Some(Movement::Issue));
        assert_eq!(tx.item_key(), Some(ItemKey::new("K1", "A")));
        assert_eq!(tx.source.row, 1);
    }

    #[test]
    fn classification_by_accounts() {
        assert_eq!(classify_movement("1541", "1521"), Some(Movement::ProductionIssue));
        assert_eq!(classify_movement("155", "154"), Some(Movement::Receipt));
        assert_eq!(classify_movement("1561", "331"), Some(Movement::Receipt));
        assert_eq!(classify_movement("632", "1561"), Some(Movement::Issue));
        assert_eq!(classify_movement("111", "511"), None);
    }

    #[test]
    fn full_description_appends_item_details() {
        let data = "date,debit_account,credit_account,description,item_name,item_spec\n\
                    2024-01-01,1561,331,Purchase,Steel bar,D10\n";
        let journal = read_journal_csv(data.as_bytes(), "journal.csv").unwrap();
        assert_eq!(
            journal.transactions[0].full_description(),
            "Purchase - Steel bar (D10)"
        );
    }

    #[test]
    fn journal_layout_requires_date_and_accounts() {
        assert_eq!(
            JournalRecord::required_columns(),
            vec!["date", "debit_account", "credit_account"]
        );
    }
}
