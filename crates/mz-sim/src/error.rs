use mz_arbiter::ArbiterError;
use mz_core::{AgentId, MzError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{0} has an empty route")]
    EmptyRoute(AgentId),

    #[error("{0} is declared more than once")]
    DuplicateTrain(AgentId),

    #[error("arbiter error: {0}")]
    Arbiter(#[from] ArbiterError),
}

impl From<MzError> for SimError {
    fn from(e: MzError) -> Self {
        SimError::Config(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
