//! `mz-arbiter` — the mutex zone arbitration engine.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`rail_slot`]   | `RailSlot`, `RailSlotMap` — per-session segment claims       |
//! | [`session`]     | `Session`, `SessionArena`, `SessionKey`, `SessionHandle`     |
//! | [`slot`]        | `MutexZoneSlot` — `track` / `enter` / `on_tick` / queries    |
//! | [`registry`]    | `SlotRegistry` — zones, named and anonymous slots            |
//! | [`world`]       | Collaborator traits and `ArbiterContext`                     |
//! | [`result`]      | `EnterResult`, `ConflictEvent`                               |
//! | [`status`]      | `SessionReport`                                              |
//! | [`error`]       | `ArbiterError`, `ArbiterResult<T>`                           |
//!
//! # Claim model
//!
//! An agent near a slot `track`s it every tick and then `enter`s each
//! segment it occupies or is about to occupy.  A *soft* enter announces
//! intent; a *hard* enter commits.  In a `Full` zone one hard claim locks
//! the whole slot; in a `Smart` zone exclusion is per segment, so agents on
//! disjoint segments cross together.
//!
//! Contention never raises an error.  It comes back as an [`EnterResult`];
//! an [`ArbiterError`] always means the caller misused the API.
//!
//! # Logging
//!
//! Conflicts are logged at `warn`, hard enters and releases at `debug`,
//! session bookkeeping at `trace`, all through `tracing`.

pub mod error;
pub mod rail_slot;
pub mod registry;
pub mod result;
pub mod session;
pub mod slot;
pub mod status;
pub mod world;

#[cfg(test)]
mod tests;

pub use error::{ArbiterError, ArbiterResult};
pub use rail_slot::{RailSlot, RailSlotMap};
pub use registry::SlotRegistry;
pub use result::{ConflictEvent, EnterResult};
pub use session::{Session, SessionArena, SessionHandle, SessionKey};
pub use slot::{MutexZoneSlot, SlotZone};
pub use status::SessionReport;
pub use world::{
    filters_match, AcceptAll, AgentClock, ArbiterContext, FilterEvaluator, IndicatorSink,
    NoopIndicator, OccupancyOracle,
};
