//! The `OutputWriter` trait implemented by backend writers.

use crate::{ConflictRow, EnterRow, OutputResult, TickSummaryRow};

/// A sink for simulation output rows.
///
/// All methods are infallible from the observer's perspective; errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of enter attempts.
    fn write_enters(&mut self, rows: &[EnterRow]) -> OutputResult<()>;

    fn write_conflict(&mut self, row: &ConflictRow) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
