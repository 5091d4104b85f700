//! Framework error type.
//!
//! Sub-crates define their own error enums and convert `MzError` into them
//! via `From` impls where a core failure can surface.

use thiserror::Error;

/// Errors raised by `mz-core` validation.
#[derive(Debug, Error)]
pub enum MzError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `mz-*` crates.
pub type MzResult<T> = Result<T, MzError>;
