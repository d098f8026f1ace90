//! Core library for receipt capture.
//!
//! This crate provides:
//! - Line item extraction from OCR text and manual "name, price" entry
//! - Receipt totals with flat, percentage, and per-item tax modes
//! - A per-session receipt form for growing lists of item rows
//! - Tabular CSV export with optional trailer rows and merging
//! - An OCR seam with an optional pure Rust backend

pub mod error;
pub mod models;
pub mod ocr;
pub mod extract;
pub mod totals;
pub mod form;
pub mod export;

pub use error::{RcptError, Result};
pub use models::receipt::{LineItem, Receipt, TaxMode};
pub use models::config::RcptConfig;
pub use ocr::{OcrEngine, OcrOutput, ScanOutcome, scan_image};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use extract::{Extraction, ItemExtractor, LineError, ManualEntryParser, OcrTextExtractor};
pub use totals::{Totals, compute_totals};
pub use form::{ItemRow, ReceiptForm};
pub use export::{ReceiptTable, TableRow};
