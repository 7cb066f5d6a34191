//! Per-unit decision loop
//!
//! Every unit owns a [`UnitBrain`]: an independently throttled loop that
//! builds a narrow perception, asks a tactical source for one action, and
//! buffers exactly one pending result for the host simulation to drain.
//! There is no cross-unit synchronization; many units may have calls in
//! flight at once.

pub mod perception;

use crate::core::config::UnitLoopConfig;
use crate::core::types::{GridPos, Tick, UnitId, UnitRole};
use crate::decision::TacticalSource;
use crate::directive::StandingOrders;
use crate::unit::perception::UnitPerception;
use crate::world::WorldView;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Kinds of tactical action a unit can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Hold,
    MoveTo,
    AttackUnit,
    GatherAt,
    Retreat,
    Scout,
}

/// One tactical action proposed for a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitAction {
    pub kind: ActionKind,
    #[serde(default)]
    pub target: Option<GridPos>,
    #[serde(default)]
    pub target_unit: Option<UnitId>,
    #[serde(default)]
    pub reasoning: String,
}

impl UnitAction {
    pub fn hold(reasoning: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Hold,
            target: None,
            target_unit: None,
            reasoning: reasoning.into(),
        }
    }
}

/// Independently throttled decision loop for one unit
pub struct UnitBrain {
    unit_id: UnitId,
    role: UnitRole,
    interval: Tick,
    perception_radius: i32,
    log_tail: usize,
    last_think_tick: Tick,
    thinking: bool,
    /// Single-slot hand-off to the host loop, last-write-wins
    pending: Option<UnitAction>,
    /// Recent activity, carried into perceptions as context
    log: VecDeque<String>,
    /// Inbound messages from other units/systems, drained on the next think
    inbox: Vec<String>,
}

impl UnitBrain {
    pub fn new(unit_id: UnitId, role: UnitRole, config: &UnitLoopConfig) -> Self {
        Self {
            unit_id,
            role,
            interval: config.think_interval(role),
            perception_radius: config.perception_radius,
            log_tail: config.log_tail,
            last_think_tick: 0,
            thinking: false,
            pending: None,
            log: VecDeque::new(),
            inbox: Vec::new(),
        }
    }

    pub fn unit_id(&self) -> &UnitId {
        &self.unit_id
    }

    pub fn role(&self) -> UnitRole {
        self.role
    }

    /// Gate for the next think cycle: interval elapsed and no call in flight
    pub fn should_think(&self, tick: Tick) -> bool {
        !self.thinking && tick.saturating_sub(self.last_think_tick) >= self.interval
    }

    /// Run one decision cycle against the tactical source
    ///
    /// Overwrites the pending slot on success; failures only log. Nothing
    /// here can stall the host loop: the thinking flag is cleared on every
    /// exit path.
    pub async fn think<S: TacticalSource>(
        &mut self,
        world: &impl WorldView,
        orders: &StandingOrders,
        tick: Tick,
        source: &S,
    ) {
        self.thinking = true;
        self.last_think_tick = tick;

        let outcome = match world.unit(&self.unit_id) {
            Some(unit) if unit.alive => {
                let messages = std::mem::take(&mut self.inbox);
                let recent_log: Vec<String> = self
                    .log
                    .iter()
                    .rev()
                    .take(self.log_tail)
                    .rev()
                    .cloned()
                    .collect();
                let perception = UnitPerception::build(
                    unit,
                    world,
                    orders.get(&self.unit_id),
                    recent_log,
                    messages,
                    self.perception_radius,
                );
                Some(source.advise(&perception).await)
            }
            _ => None,
        };

        match outcome {
            Some(Ok(action)) => {
                self.record(format!("tick {}: decided {:?}", tick, action.kind));
                if self.pending.is_some() {
                    tracing::debug!(unit = %self.unit_id, "undrained action discarded");
                }
                self.pending = Some(action);
            }
            Some(Err(e)) => {
                tracing::debug!(unit = %self.unit_id, error = %e, "tactical source failed");
            }
            None => {
                tracing::debug!(unit = %self.unit_id, "skipping think: unit gone or dead");
            }
        }

        self.thinking = false;
    }

    /// Atomically read and clear the pending action slot
    ///
    /// Single-producer/single-consumer hand-off, not a queue.
    pub fn take_pending(&mut self) -> Option<UnitAction> {
        self.pending.take()
    }

    /// Queue an inbound message for the next perception
    pub fn push_message(&mut self, message: impl Into<String>) {
        self.inbox.push(message.into());
    }

    /// Append an audit-log line, trimming to a bounded tail
    pub fn record(&mut self, line: impl Into<String>) {
        self.log.push_back(line.into());
        // keep a little history beyond the perception tail for debugging
        while self.log.len() > self.log_tail * 4 {
            self.log.pop_front();
        }
    }
}
