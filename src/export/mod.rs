//! Export and aggregation over a log snapshot
//!
//! Everything here is a pure function of its inputs:
//!
//! - [`to_document`]: results + events + export time, as JSON
//! - [`to_table`]: results as fixed-schema CSV
//! - [`summarize`]: per-arm counts and rounded means
//!
//! ## Usage
//!
//! ```rust
//! use study_tracker::export::{summarize, to_table};
//! use study_tracker::record::{TrialResult, UiVersion};
//!
//! let results = vec![
//!     TrialResult::builder("p1", UiVersion::A).reading_time_sec(100.0).build(),
//!     TrialResult::builder("p2", UiVersion::B).reading_time_sec(80.0).build(),
//! ];
//!
//! let summary = summarize(&results);
//! assert_eq!(summary.ui_a.avg_time_sec, 100);
//!
//! let csv = to_table(&results).unwrap().to_csv();
//! assert_eq!(csv.lines().count(), 3);
//! ```

mod document;
mod summary;
mod table;

pub use document::{document_filename, save_document, to_document, ExportDocument};
pub use summary::{summarize, GroupSummary, Summary};
pub use table::{escape_cell, header_line, save_table, table_filename, to_table, Column, Table};
