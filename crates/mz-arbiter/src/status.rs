//! Human-readable session summaries for operators and logs.

use std::fmt;

use mz_core::{AgentId, SlotId};

use crate::{AgentClock, ConflictEvent, RailSlot, Session};

/// Snapshot of one session, detached from the slot.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub slot:           SlotId,
    pub slot_name:      String,
    pub agent:          AgentId,
    pub active:         bool,
    pub hard:           bool,
    pub age:            u64,
    pub distance:       f64,
    pub occupied_fully: bool,
    /// Last attempted path; after a forced release the segment that caused
    /// it comes last.
    pub path:           Vec<RailSlot>,
    pub conflict:       Option<ConflictEvent>,
}

impl SessionReport {
    pub fn new(slot: SlotId, slot_name: &str, session: &Session, clock: &dyn AgentClock) -> Self {
        Self {
            slot,
            slot_name:      slot_name.to_owned(),
            agent:          session.agent(),
            active:         session.is_active(),
            hard:           session.is_hard(),
            age:            session.age(clock),
            distance:       session.distance(),
            occupied_fully: session.is_occupied_fully(),
            path:           session.rails().last_path(),
            conflict:       session.conflict().cloned(),
        }
    }

    /// `"hard"`, `"soft"` or `"inactive"`.
    pub fn state(&self) -> &'static str {
        match (self.active, self.hard) {
            (false, _)    => "inactive",
            (true, true)  => "hard",
            (true, false) => "soft",
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slot_name.is_empty() {
            write!(f, "{} (anonymous)", self.slot)?;
        } else {
            write!(f, "{} '{}'", self.slot, self.slot_name)?;
        }
        writeln!(
            f,
            ": {} {}, age {}, distance {:.1}{}",
            self.agent,
            self.state(),
            self.age,
            self.distance,
            if self.occupied_fully { ", fully locked" } else { "" },
        )?;

        write!(f, "  path:")?;
        if self.path.is_empty() {
            write!(f, " (none)")?;
        }
        for rail in &self.path {
            write!(f, " {rail}")?;
        }

        if let Some(conflict) = &self.conflict {
            write!(f, "\n  conflict: {conflict}")?;
        }
        Ok(())
    }
}
