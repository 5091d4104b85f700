use mz_core::{AgentId, MzError, SlotId, ZoneId};
use mz_zone::ZoneError;
use thiserror::Error;

/// Caller bugs.  Contention and conflicts are reported through
/// [`EnterResult`][crate::EnterResult], never through this type.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("{0} has no clock; it must exist to be tracked")]
    UnknownAgent(AgentId),

    #[error("session handle for {0} is stale (session was released)")]
    StaleSession(AgentId),

    #[error("session handle for {agent} belongs to {handle_slot}, not {slot}")]
    ForeignSession {
        agent:       AgentId,
        handle_slot: SlotId,
        slot:        SlotId,
    },

    #[error("{0} not found")]
    UnknownZone(ZoneId),

    #[error("{0} not found")]
    UnknownSlot(SlotId),

    #[error("invalid zone: {0}")]
    Zone(#[from] ZoneError),

    #[error("invalid arbiter configuration: {0}")]
    Config(#[from] MzError),
}

pub type ArbiterResult<T> = Result<T, ArbiterError>;
