//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `enter_events.csv`
//! - `conflicts.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{ConflictRow, EnterRow, OutputResult, TickSummaryRow};

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    enters:    Writer<File>,
    conflicts: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut enters = Writer::from_path(dir.join("enter_events.csv"))?;
        enters.write_record(["tick", "train", "slot", "x", "y", "z", "mode", "hard", "distance", "result"])?;

        let mut conflicts = Writer::from_path(dir.join("conflicts.csv"))?;
        conflicts.write_record(["tick", "train", "crossed", "slot_name", "x", "y", "z"])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(["tick", "running", "moved", "waiting", "finished", "conflicts", "hard_sessions"])?;

        Ok(Self {
            enters,
            conflicts,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_enters(&mut self, rows: &[EnterRow]) -> OutputResult<()> {
        for row in rows {
            self.enters.write_record(&[
                row.tick.to_string(),
                row.train.to_string(),
                row.slot.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                row.z.to_string(),
                row.mode.to_owned(),
                (row.hard as u8).to_string(),
                row.distance.to_string(),
                row.result.to_owned(),
            ])?;
        }
        Ok(())
    }

    fn write_conflict(&mut self, row: &ConflictRow) -> OutputResult<()> {
        self.conflicts.write_record(&[
            row.tick.to_string(),
            row.train.to_string(),
            row.crossed.to_string(),
            row.slot_name.clone(),
            row.x.to_string(),
            row.y.to_string(),
            row.z.to_string(),
        ])?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.running.to_string(),
            row.moved.to_string(),
            row.waiting.to_string(),
            row.finished.to_string(),
            row.conflicts.to_string(),
            row.hard_sessions.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.enters.flush()?;
        self.conflicts.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
