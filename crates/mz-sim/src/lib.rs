//! `mz-sim` — tick loop harness for the rail_mutex framework.
//!
//! Trains run on fixed routes of segments, one segment per tick, and ask the
//! zone arbiter before moving on.  The crate owns the single authoritative
//! tick loop the arbiter assumes: nothing here runs concurrently.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Spawn   — pending trains whose spawn tick has come join the track.
//!   ② Clocks  — each running train's local tick advances.
//!   ③ Sweep   — SlotRegistry::on_tick releases abandoned sessions.
//!   ④ Drive   — per train (ascending id, or seeded shuffle):
//!                 track each slot within soft_lookahead,
//!                 enter its segments, all hard if the slot's nearest
//!                 segment is within hard_lookahead, else all soft,
//!                 hold if a hard enter is occupied, else advance;
//!                 off the end of the route → despawn.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`config`]   | `SimConfig`                                           |
//! | [`train`]    | `Train`, `TrainState`                                 |
//! | [`world`]    | `TrackWorld`, `TagFilter`, `IndicatorLog`             |
//! | [`sim`]      | `Sim` and the tick loop                               |
//! | [`builder`]  | `SimBuilder`                                          |
//! | [`observer`] | `SimObserver`, `NoopObserver`, `TracingObserver`      |
//! | [`error`]    | `SimError`, `SimResult<T>`                            |
//!
//! # Cargo features
//!
//! | Feature | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` for `SimConfig`.                |

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod sim;
pub mod train;
pub mod world;


pub use builder::SimBuilder;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use observer::{EnterEvent, NoopObserver, SimObserver, TickSummary, TracingObserver};
pub use sim::Sim;
pub use train::{Train, TrainState};
pub use world::{IndicatorLog, TagFilter, TrackWorld};
