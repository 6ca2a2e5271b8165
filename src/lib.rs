//! # datatable
//!
//! `datatable` is an in-memory, column-oriented table engine fed by a
//! single-pass CSV parser running directly over a memory-mapped file. It
//! supports:
//!
//! - Memory-mapped CSV loading (cells stay byte ranges until materialized)
//! - Per-cell type inference (integer, real, string; timestamps on demand)
//! - Quote-aware tokenization with escaped-quote (`""`) handling
//! - Header-based column filtering and automatic rectangularization
//! - Parallel row erasure across columns with Rayon
//!
//! # Example
//!
//! ```no_run
//! use datatable::data::parser::{parse_csv_data, CsvParams};
//!
//! fn main() -> Result<(), datatable::data::TableError> {
//!     let table = parse_csv_data(
//!         CsvParams::new("data.csv")
//!             .header_row(0)
//!             .column_filter(|name| name != "secret"),
//!     )?;
//!
//!     let ids = table.column("id")?;
//!     println!("{} rows of {}", ids.len(), ids.header());
//!     Ok(())
//! }
//! ```

pub mod data;
