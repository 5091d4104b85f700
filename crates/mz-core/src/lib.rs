//! `mz-core` — foundational types for the `rail_mutex` zone arbitration framework.
//!
//! This crate is a dependency of every other `mz-*` crate.  It intentionally
//! has no `mz-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `ZoneId`, `SlotId`                         |
//! | [`segment`]     | `Segment` — integer track-block coordinate            |
//! | [`time`]        | `Tick`                                                |
//! | [`lock`]        | `LockMode` (`Full` / `Smart`)                         |
//! | [`config`]      | `ArbiterConfig`                                       |
//! | [`rng`]         | `SimRng` (seeded agent-order shuffling)               |
//! | [`error`]       | `MzError`, `MzResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod lock;
pub mod rng;
pub mod segment;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::ArbiterConfig;
pub use error::{MzError, MzResult};
pub use ids::{AgentId, SlotId, ZoneId};
pub use lock::LockMode;
pub use rng::SimRng;
pub use segment::Segment;
pub use time::Tick;
