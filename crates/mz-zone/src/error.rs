//! Zone-subsystem error type.

use thiserror::Error;

use mz_core::Segment;

/// Errors produced by `mz-zone`.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone bounds inverted: min {min} exceeds max {max}")]
    InvertedBounds { min: Segment, max: Segment },
}

pub type ZoneResult<T> = Result<T, ZoneError>;
