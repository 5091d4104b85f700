//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use mz_arbiter::{ConflictEvent, EnterResult};
use mz_core::Tick;
use mz_sim::{EnterEvent, SimObserver, TickSummary};

use crate::row::{ConflictRow, EnterRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::OutputError;

/// A [`SimObserver`] that writes enter events, conflicts and tick summaries
/// to any [`OutputWriter`] backend.
///
/// Enter events are buffered for the tick and written in one batch at its
/// end.  Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  After `sim.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    /// Skip soft `Success` rows, which dominate long runs.
    hard_only:  bool,
    pending:    Vec<EnterRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            hard_only:  false,
            pending:    Vec::new(),
            last_error: None,
        }
    }

    /// Record only hard enters and failed soft enters.
    pub fn hard_only(mut self) -> Self {
        self.hard_only = true;
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_enter(&mut self, tick: Tick, event: &EnterEvent) {
        if self.hard_only && !event.hard && event.result == EnterResult::Success {
            return;
        }
        self.pending.push(EnterRow::new(tick, event));
    }

    fn on_conflict(&mut self, _tick: Tick, event: &ConflictEvent) {
        let result = self.writer.write_conflict(&ConflictRow::from(event));
        self.store_err(result);
    }

    fn on_tick_end(&mut self, _tick: Tick, summary: &TickSummary) {
        if !self.pending.is_empty() {
            let result = self.writer.write_enters(&self.pending);
            self.pending.clear();
            self.store_err(result);
        }
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(summary));
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
