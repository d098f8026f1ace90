//! Tabular export of receipts to CSV.
//!
//! Every item row repeats the receipt-level fields (company, date, tax, total)
//! next to the item's own name, quantity, price and capture time. Optional
//! trailer rows carry SUBTOTAL, TAX and TOTAL in the same layout.

use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ExportError, RcptError, Result};
use crate::models::receipt::{Receipt, TaxMode};

/// Column headers, in output order.
pub const HEADERS: [&str; 8] = [
    "Company", "Date", "Item", "Quantity", "Price", "Tax", "Total", "Captured",
];

const CAPTURED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Item label of the subtotal trailer row.
pub const SUBTOTAL_LABEL: &str = "SUBTOTAL";
/// Item label of the tax trailer row.
pub const TAX_LABEL: &str = "TAX";
/// Item label of the total trailer row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// One row of the exported table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRow {
    pub company: String,
    pub date: String,
    pub item: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
    /// Capture time of a scanned item, blank otherwise.
    pub captured: String,
}

impl TableRow {
    /// Whether this is a SUBTOTAL, TAX or TOTAL row.
    pub fn is_trailer(&self) -> bool {
        self.quantity.is_none()
            && self.price.is_none()
            && matches!(self.item.as_str(), SUBTOTAL_LABEL | TAX_LABEL | TOTAL_LABEL)
    }

    fn to_record(&self) -> [String; 8] {
        [
            self.company.clone(),
            self.date.clone(),
            self.item.clone(),
            self.quantity.map(|q| q.normalize().to_string()).unwrap_or_default(),
            format_amount(self.price),
            format_amount(self.tax),
            format_amount(self.total),
            self.captured.clone(),
        ]
    }
}

/// At least two decimals; finer amounts read from a prior table keep their digits.
fn format_amount(amount: Option<Decimal>) -> String {
    match amount {
        Some(a) if a.scale() > 2 => a.to_string(),
        Some(a) => format!("{:.2}", a),
        None => String::new(),
    }
}

/// Ordered rows ready for CSV export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiptTable {
    rows: Vec<TableRow>,
}

impl ReceiptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabulate a receipt, one row per valid item.
    ///
    /// Computed money is rounded to cents.
    pub fn from_receipt(receipt: &Receipt, include_trailers: bool) -> Result<Self> {
        let items: Vec<_> = receipt.valid_items().collect();
        if items.is_empty() {
            return Ok(Self::new());
        }

        let totals = receipt.totals()?;
        let total = match receipt.stated_total {
            Some(stated) => stated,
            None => totals.total.round_dp(2),
        };
        let receipt_date = receipt.date.format("%Y-%m-%d").to_string();

        let mut rows: Vec<TableRow> = items
            .iter()
            .map(|item| {
                let tax = match receipt.tax_mode {
                    TaxMode::Flat(amount) => amount,
                    TaxMode::Percentage(_) => totals.tax_share(items.len()).round_dp(2),
                    TaxMode::PerItem => item.tax,
                };

                TableRow {
                    company: receipt.company.clone(),
                    date: item
                        .date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| receipt_date.clone()),
                    item: item.name.clone(),
                    quantity: Some(item.quantity),
                    price: Some(item.price),
                    tax: Some(tax),
                    total: Some(total),
                    captured: item
                        .captured_at
                        .map(|t| t.format(CAPTURED_FORMAT).to_string())
                        .unwrap_or_default(),
                }
            })
            .collect();

        if include_trailers {
            for (label, amount) in [
                (SUBTOTAL_LABEL, totals.subtotal.round_dp(2)),
                (TAX_LABEL, totals.tax.round_dp(2)),
                (TOTAL_LABEL, total),
            ] {
                rows.push(TableRow {
                    company: receipt.company.clone(),
                    date: receipt_date.clone(),
                    item: label.to_string(),
                    quantity: None,
                    price: None,
                    tax: None,
                    total: Some(amount),
                    captured: String::new(),
                });
            }
        }

        debug!("Tabulated {} rows for {}", rows.len(), receipt.date);

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append rows after the existing ones, without de-duplication.
    pub fn append(&mut self, other: ReceiptTable) {
        self.rows.extend(other.rows);
    }

    /// Concatenate a previously exported table with new rows.
    pub fn merge(prior: ReceiptTable, new: ReceiptTable) -> ReceiptTable {
        let mut merged = prior;
        merged.append(new);
        merged
    }

    /// Read a previously exported table.
    ///
    /// Columns are matched by header name, case-insensitively, so tables from
    /// earlier layouts (`Tax Amount`, `timestamp`) still merge. Missing
    /// columns read as blank; only the `Item` column is required. Columns
    /// outside the export layout are dropped with a warning.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(rdr.headers()?)?;
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            rows.push(columns.row(&record, line)?);
        }

        debug!("Read {} rows from prior table", rows.len());

        Ok(Self { rows })
    }

    /// Read a previously exported table from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(file)
    }

    /// Write the header and all rows as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        if self.rows.is_empty() {
            return Err(ExportError::Empty.into());
        }

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADERS)?;
        for row in &self.rows {
            wtr.write_record(row.to_record())?;
        }
        wtr.flush()?;

        Ok(())
    }

    /// CSV bytes, UTF-8 encoded.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }

    /// CSV text.
    pub fn to_csv_string(&self) -> Result<String> {
        String::from_utf8(self.to_csv_bytes()?)
            .map_err(|e| RcptError::Export(ExportError::Utf8(e)))
    }

    /// Write the table to a file, replacing it.
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let bytes = self.to_csv_bytes()?;
        std::fs::write(path, bytes)?;
        info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// File name for a receipt export: `<prefix>_<YYYYMMDD>.csv`.
pub fn file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y%m%d"))
}

/// Header positions of a table being read back.
struct ColumnMap {
    company: Option<usize>,
    date: Option<usize>,
    item: usize,
    quantity: Option<usize>,
    price: Option<usize>,
    tax: Option<usize>,
    total: Option<usize>,
    captured: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        let item = find(&["item", "name"]).ok_or(ExportError::MissingColumn("Item"))?;

        let columns = Self {
            company: find(&["company"]),
            date: find(&["date"]),
            item,
            quantity: find(&["quantity", "qty"]),
            price: find(&["price"]),
            tax: find(&["tax", "tax amount"]),
            total: find(&["total"]),
            captured: find(&["captured", "timestamp"]),
        };

        let used = [
            columns.company,
            columns.date,
            Some(columns.item),
            columns.quantity,
            columns.price,
            columns.tax,
            columns.total,
            columns.captured,
        ];
        for (index, header) in headers.iter().enumerate() {
            if !used.contains(&Some(index)) {
                warn!("Ignoring column '{}' of merged table", header.trim());
            }
        }

        Ok(columns)
    }

    fn row(&self, record: &StringRecord, line: u64) -> Result<TableRow> {
        let text = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let amount = |index: Option<usize>, column: &'static str| -> Result<Option<Decimal>> {
            let value = text(index);
            if value.is_empty() {
                return Ok(None);
            }
            Decimal::from_str(&value)
                .map(Some)
                .map_err(|_| ExportError::Field { line, column, value }.into())
        };

        Ok(TableRow {
            company: text(self.company),
            date: text(self.date),
            item: text(Some(self.item)),
            quantity: amount(self.quantity, "Quantity")?,
            price: amount(self.price, "Price")?,
            tax: amount(self.tax, "Tax")?,
            total: amount(self.total, "Total")?,
            captured: text(self.captured),
        })
    }
}
