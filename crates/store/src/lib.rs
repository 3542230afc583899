//! Workbook store for cotiza
//!
//! Wraps one Excel workbook file with the read/modify/write cycle the HTTP
//! surface needs: timestamped backups with a retention policy, fixed row
//! layouts for incoming product records, exports, and restores. Every
//! operation goes through [`WorkbookStore`], which holds an in-process lock
//! for its full duration so mutations against the single file never
//! interleave.

mod backup;
mod config;
mod error;
mod layout;
mod price;
mod store;

pub use backup::{BackupInfo, BackupManager};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use layout::{format_row, Product, RowFormat};
pub use price::{extract_numeric_price, PriceValue};
pub use store::{AddOutcome, ExportInfo, SaveOutcome, WorkbookReport, WorkbookStore};
