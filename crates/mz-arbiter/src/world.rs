//! Collaborator traits and the per-call arbitration context.
//!
//! The engine never reaches into global state.  Everything it needs from the
//! outside world (agent clocks, physical occupancy, filter evaluation, and
//! the indicator output) arrives through an [`ArbiterContext`] passed into
//! every mutating call.

use mz_core::{AgentId, Segment, Tick, ZoneId};

/// Per-agent monotonic tick counters.
pub trait AgentClock {
    /// The agent's local tick, or `None` if the agent no longer exists.
    fn local_tick(&self, agent: AgentId) -> Option<Tick>;
}

/// Where agents physically are.
///
/// Used to confirm an agent still sits on a segment it claimed earlier,
/// which catches agents that derail or despawn without releasing.
pub trait OccupancyOracle {
    /// Every segment currently under `agent`.  Empty for vanished agents.
    fn segments_occupied_by(&self, agent: AgentId) -> Vec<Segment>;

    /// `true` if `agent` is physically on `segment`.
    ///
    /// The default scans [`segments_occupied_by`][Self::segments_occupied_by];
    /// implementors with a per-segment index should override it.
    fn is_occupying(&self, agent: AgentId, segment: Segment) -> bool {
        self.segments_occupied_by(agent).contains(&segment)
    }
}

/// Evaluates a single zone filter expression against an agent.
pub trait FilterEvaluator {
    fn evaluate(&self, expression: &str, agent: AgentId) -> bool;
}

/// One-way output for the zone indicator (a lever, a signal lamp, …).
///
/// The engine suppresses repeated identical states per zone, so every call
/// is a real change for every zone listed.
pub trait IndicatorSink {
    fn set_indicator(&mut self, zones: &[ZoneId], on: bool);
}

/// A [`FilterEvaluator`] that lets every agent through.
pub struct AcceptAll;

impl FilterEvaluator for AcceptAll {
    fn evaluate(&self, _expression: &str, _agent: AgentId) -> bool {
        true
    }
}

/// An [`IndicatorSink`] that discards every update.
pub struct NoopIndicator;

impl IndicatorSink for NoopIndicator {
    fn set_indicator(&mut self, _zones: &[ZoneId], _on: bool) {}
}

/// Everything one arbitration call may consult or drive.
pub struct ArbiterContext<'a> {
    /// The global tick of the current arbitration pass.
    pub tick:      Tick,
    pub clock:     &'a dyn AgentClock,
    pub occupancy: &'a dyn OccupancyOracle,
    pub filter:    &'a dyn FilterEvaluator,
    pub indicator: &'a mut dyn IndicatorSink,
}

impl<'a> ArbiterContext<'a> {
    pub fn new(
        tick:      Tick,
        clock:     &'a dyn AgentClock,
        occupancy: &'a dyn OccupancyOracle,
        filter:    &'a dyn FilterEvaluator,
        indicator: &'a mut dyn IndicatorSink,
    ) -> Self {
        Self { tick, clock, occupancy, filter, indicator }
    }
}

/// Combine a slot's filter list for `agent`.
///
/// Expressions are folded left to right starting from `true`.  A leading `|`
/// ORs the expression into the running result, a leading `&` (or none) ANDs
/// it.  Empty expressions are skipped.
pub fn filters_match(filters: &[String], agent: AgentId, evaluator: &dyn FilterEvaluator) -> bool {
    let mut matched = true;
    for raw in filters {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (is_and, expression) = match raw.as_bytes()[0] {
            b'&' => (true, &raw[1..]),
            b'|' => (false, &raw[1..]),
            _    => (true, raw),
        };
        let result = evaluator.evaluate(expression.trim(), agent);
        if is_and {
            matched &= result;
        } else {
            matched |= result;
        }
    }
    matched
}
