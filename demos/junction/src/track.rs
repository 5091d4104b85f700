//! The demo layout: a mainline crossing a branch line, plus a two-track yard.
//!
//! ```text
//!                 x = 0 (branch)
//!                   |
//!   z = 0  ---------+------------[LC]---   mainline, level crossing at x = 12..13
//!                   |
//!   z = 6           |   ----[yard]------   yard tracks from x = 3, smart-locked
//!   z = 8           |   ----[yard]------   over both tracks
//!                   |
//! ```

use mz_core::{AgentId, LockMode, Segment, Tick};
use mz_sim::Train;
use mz_zone::ZoneDecl;

const REACH: i32 = 20;

/// Eastbound along `z`, starting at `x`.
fn east_from(x: i32, z: i32) -> Vec<Segment> {
    (x..=REACH).map(|x| Segment::new(x, 0, z)).collect()
}

fn east(z: i32) -> Vec<Segment> {
    east_from(-REACH, z)
}

/// Southbound along `x`.
fn south(x: i32) -> Vec<Segment> {
    (-REACH..=REACH).map(|z| Segment::new(x, 0, z)).collect()
}

pub fn zones() -> Vec<ZoneDecl> {
    vec![
        // Mainline and branch cross here; one train at a time.
        ZoneDecl::new(Segment::new(-1, 0, -1), Segment::new(1, 0, 1), LockMode::Full)
            .named("junction")
            .with_anchor(Segment::new(-2, 1, -2)),
        // Both yard tracks share one slot, but trains on different tracks
        // do not exclude each other.
        ZoneDecl::new(Segment::new(8, 0, 6), Segment::new(12, 0, 6), LockMode::Smart)
            .named("yard")
            .with_anchor(Segment::new(7, 1, 5)),
        ZoneDecl::new(Segment::new(8, 0, 8), Segment::new(12, 0, 8), LockMode::Smart)
            .named("yard")
            .with_anchor(Segment::new(7, 1, 9)),
        // A level crossing that freight is exempt from.
        ZoneDecl::new(Segment::new(12, 0, 0), Segment::new(13, 0, 0), LockMode::Full)
            .with_filter("!freight"),
    ]
}

pub fn trains() -> Vec<Train> {
    let mut north = south(0);
    north.reverse();
    vec![
        Train::new(AgentId(0), east(0)).length(3).tag("passenger"),
        Train::new(AgentId(1), south(0)).length(4).tag("freight"),
        Train::new(AgentId(2), east_from(3, 6)).length(2).tag("passenger").spawn_at(Tick(2)),
        Train::new(AgentId(3), east_from(3, 8)).length(3).tag("freight").spawn_at(Tick(2)),
        Train::new(AgentId(4), east(0)).length(2).tag("passenger").spawn_at(Tick(45)),
        Train::new(AgentId(5), north).length(3).tag("passenger").spawn_at(Tick(60)),
    ]
}
