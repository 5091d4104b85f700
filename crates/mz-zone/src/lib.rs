//! `mz-zone` — zone descriptors and the zone geometry provider.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`zone`]    | `ZoneDecl` (as declared), `Zone` (validated, immutable)     |
//! | [`index`]   | `ZoneIndex` — R-tree lookup of zones by segment             |
//! | [`error`]   | `ZoneError`, `ZoneResult`                                   |
//!
//! Discovering declarations in world data is not done here; callers build
//! `ZoneDecl`s however they like and hand them to the slot registry.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod index;
pub mod zone;


pub use error::{ZoneError, ZoneResult};
pub use index::ZoneIndex;
pub use zone::{Zone, ZoneDecl};
