//! `mz-output` — simulation output writers for the rail_mutex framework.
//!
//! | Backend | Files created                                                |
//! |---------|--------------------------------------------------------------|
//! | CSV     | `enter_events.csv`, `conflicts.csv`, `tick_summaries.csv`    |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `mz_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mz_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer).hard_only();
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{ConflictRow, EnterRow, TickSummaryRow};
pub use writer::OutputWriter;
