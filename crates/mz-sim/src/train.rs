//! Trains: agents that move one segment per tick along a fixed route.

use mz_core::{AgentId, Segment, Tick};

/// Where a train is in its life.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TrainState {
    /// Not spawned yet.
    Pending,
    Running,
    /// Ran off the end of its route and despawned.
    Finished,
}

/// A train on a fixed route.
///
/// The train covers `length` consecutive route segments ending at `head`.
/// It spawns with its whole length on the route, so `head` starts at
/// `length - 1` (clamped to the route).
#[derive(Clone, Debug)]
pub struct Train {
    pub id:          AgentId,
    pub route:       Vec<Segment>,
    /// Index into `route` of the leading segment.
    pub head:        usize,
    pub length:      usize,
    /// Matched by zone filters (`tag` / `!tag`).
    pub tags:        Vec<String>,
    /// Global tick the train appears at.
    pub spawn_tick:  Tick,
    /// The train's own clock; starts at zero on spawn.
    pub local_tick:  Tick,
    pub state:       TrainState,
    /// Ticks spent held in front of an occupied zone.
    pub waited:      u64,
    pub finished_at: Option<Tick>,
}

impl Train {
    pub fn new(id: AgentId, route: Vec<Segment>) -> Self {
        Self {
            id,
            route,
            head:        0,
            length:      1,
            tags:        Vec::new(),
            spawn_tick:  Tick::ZERO,
            local_tick:  Tick::ZERO,
            state:       TrainState::Pending,
            waited:      0,
            finished_at: None,
        }
    }

    /// Number of segments the train covers.  Zero is raised to one.
    pub fn length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn spawn_at(mut self, tick: Tick) -> Self {
        self.spawn_tick = tick;
        self
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == TrainState::Running
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Put the train on its route.
    pub(crate) fn spawn(&mut self) {
        self.head = self.length.saturating_sub(1).min(self.route.len().saturating_sub(1));
        self.local_tick = Tick::ZERO;
        self.state = TrainState::Running;
    }

    fn tail(&self) -> usize {
        (self.head + 1).saturating_sub(self.length)
    }

    /// Segments under the train, tail first.  Empty unless running.
    pub fn occupied(&self) -> &[Segment] {
        if !self.is_running() {
            return &[];
        }
        &self.route[self.tail()..=self.head]
    }

    /// Segments the train covers or will reach within `lookahead` moves,
    /// each with its distance from the head.  Covered segments come first
    /// at distance 0.
    pub fn path_ahead(&self, lookahead: u32) -> Vec<(u32, Segment)> {
        let mut path: Vec<(u32, Segment)> = self.occupied().iter().map(|&s| (0, s)).collect();
        if !self.is_running() {
            return path;
        }
        let end = (self.head + lookahead as usize).min(self.route.len().saturating_sub(1));
        for (i, &segment) in self.route.iter().enumerate().take(end + 1).skip(self.head + 1) {
            path.push(((i - self.head) as u32, segment));
        }
        path
    }

    /// Move one segment forward.  Returns `false`, and despawns the train,
    /// when it was already on the last segment of its route.
    pub(crate) fn advance(&mut self, now: Tick) -> bool {
        if self.head + 1 < self.route.len() {
            self.head += 1;
            return true;
        }
        self.state = TrainState::Finished;
        self.finished_at = Some(now);
        false
    }
}
