//! Strategic Coordinator - one per player
//!
//! Batches world observations into a single evaluation request, gated by
//! priority-ordered triggers and rate limits, and turns the response into
//! validated, durable directives. Never blocks the simulation loop and never
//! issues redundant calls: at most one evaluation is in flight per player.
//!
//! Host contract per tick:
//! 1. `pump_events()` - drain the event mailbox
//! 2. `scan_for_discoveries(world, tick)` - throttled world diff
//! 3. `should_evaluate(tick)` - cheap gate
//! 4. if true, `evaluate(world, tick).await` - the only suspension point

pub mod perception;
pub mod triggers;

use crate::core::config::CoordinatorConfig;
use crate::core::error::CouncilError;
use crate::core::types::{PlayerId, Tick, UnitId};
use crate::decision::{DecisionError, DecisionSource, StrategicResponse};
use crate::directive::{Directive, DirectiveStore, DirectiveType, ProposedDirective, StandingOrders};
use crate::events::GameEvent;
use crate::world::WorldView;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use triggers::{DiscoveryLedger, Trigger, TriggerState};

/// Everything needed to run one decision call outside the coordinator
///
/// Produced by [`StrategicCoordinator::begin_evaluation`]; the flag-set /
/// flag-clear discipline around it is what guarantees mutual exclusion.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Why this evaluation is running (command > specific trigger > heartbeat)
    pub reason: String,
    /// Serialized battle perception for the decision source
    pub perception: String,
}

pub struct StrategicCoordinator<S: DecisionSource> {
    player: PlayerId,
    config: CoordinatorConfig,
    source: S,
    events: mpsc::UnboundedReceiver<GameEvent>,
    triggers: TriggerState,
    ledger: DiscoveryLedger,
    directives: DirectiveStore,
    standing_orders: StandingOrders,
    last_scan_tick: Tick,
    /// In-flight guard: set synchronously before the first suspension point,
    /// cleared synchronously on every exit path of an evaluation
    evaluating: bool,
    /// One-way degradation: once the service reports itself absent, no
    /// further strategic calls are made this session
    source_disabled: bool,
}

impl<S: DecisionSource> StrategicCoordinator<S> {
    pub fn new(
        player: PlayerId,
        config: CoordinatorConfig,
        source: S,
        events: mpsc::UnboundedReceiver<GameEvent>,
    ) -> Self {
        Self {
            player,
            config,
            source,
            events,
            triggers: TriggerState::new(),
            ledger: DiscoveryLedger::new(),
            directives: DirectiveStore::new(),
            standing_orders: StandingOrders::new(),
            last_scan_tick: 0,
            evaluating: false,
            source_disabled: false,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn directives(&self) -> &DirectiveStore {
        &self.directives
    }

    /// Executor-side hook: the host marks directives done here
    ///
    /// Completing a unit the coordinator never assigned anything to is a
    /// host bug, surfaced as an error rather than silently ignored.
    pub fn mark_directive_completed(&mut self, unit: &UnitId) -> Result<(), CouncilError> {
        if self.directives.mark_completed(unit) {
            Ok(())
        } else {
            Err(CouncilError::UnitNotFound(unit.clone()))
        }
    }

    pub fn standing_orders(&self) -> &StandingOrders {
        &self.standing_orders
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluating
    }

    pub fn source_disabled(&self) -> bool {
        self.source_disabled
    }

    /// Drain the event mailbox; called synchronously each tick
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::PlayerCommand { player, transcript } if player == self.player => {
                debug!(player = %self.player, "player command received");
                self.triggers.note_command(transcript, Vec::new());
            }
            GameEvent::UnitCommand {
                player,
                transcript,
                targets,
            } if player == self.player => {
                debug!(player = %self.player, targets = targets.len(), "unit command received");
                for target in &targets {
                    self.standing_orders.set(target.clone(), transcript.clone());
                }
                self.triggers.note_command(transcript, targets);
            }
            GameEvent::UnitDestroyed { unit, owner } if owner == self.player => {
                self.triggers.raise(Trigger::UnitLost(unit));
            }
            GameEvent::BuildingCompleted { building, owner } if owner == self.player => {
                self.triggers.raise(Trigger::BuildingCompleted(building));
            }
            _ => {}
        }
    }

    /// Throttled polling step for discovery triggers
    ///
    /// Polling replaces event subscriptions here on purpose: "spotted" and
    /// "damage" events fire far too often to gate an expensive call on.
    pub fn scan_for_discoveries(&mut self, world: &impl WorldView, tick: Tick) {
        if tick.saturating_sub(self.last_scan_tick) < self.config.world_scan_interval {
            return;
        }
        self.last_scan_tick = tick;

        let mut new_enemies = 0usize;
        for sighting in world.visible_enemies(self.player) {
            if self.ledger.note_enemy(sighting.id) {
                new_enemies += 1;
            }
        }
        if new_enemies > 0 {
            debug!(player = %self.player, new_enemies, "new enemy contacts");
            self.triggers.raise(Trigger::EnemySpotted(new_enemies));
        }

        for sighting in world.visible_resources(self.player) {
            self.ledger.note_resource(sighting.pos.key());
        }
        // A lone tile never triggers; the batch must clear the threshold and
        // no combat-relevant trigger may already be pending.
        let pending = self.ledger.pending_batch();
        if pending >= self.config.resource_batch_threshold {
            let trigger = Trigger::ResourcesFound(pending);
            if !self.triggers.blocks(trigger.rank()) {
                self.ledger.take_batch();
                self.triggers.raise(trigger);
            }
        }
    }

    /// Gating decision for this tick
    pub fn should_evaluate(&self, tick: Tick) -> bool {
        // Mutual exclusion: one in-flight evaluation per player.
        if self.evaluating {
            return false;
        }

        let gap = tick.saturating_sub(self.triggers.last_eval_tick);

        // Player intent is the most responsive class; it also wins the
        // cycle outright, so an unsatisfied command gap blocks this tick.
        if self.triggers.command_pending {
            return gap >= self.config.player_command_gap;
        }

        // The AI stays fully idle until the player engages at least once.
        if !self.triggers.ever_commanded {
            return false;
        }

        if gap < self.config.min_evaluation_gap {
            return false;
        }

        if self.triggers.world_change_pending {
            return true;
        }

        gap >= self.config.heartbeat_interval
    }

    /// Launch an evaluation: set the in-flight flag, consume pending
    /// triggers, and serialize the perception
    ///
    /// Every `begin_evaluation` MUST be paired with `finish_evaluation`;
    /// [`evaluate`](Self::evaluate) does this with no early return between
    /// the two, so the flag can never be left set.
    pub fn begin_evaluation(&mut self, world: &impl WorldView, tick: Tick) -> EvaluationRequest {
        self.evaluating = true;
        self.triggers.last_eval_tick = tick;

        // Clear the accumulation flags immediately: triggers raised while
        // the call is in flight start a fresh cycle instead of being
        // dropped or double-counted.
        let had_command = self.triggers.command_pending;
        self.triggers.command_pending = false;
        self.triggers.world_change_pending = false;

        let command = self.triggers.current_command.clone();
        let targets = self.triggers.command_targets.clone();

        let reason = if had_command {
            "responding to player command".to_string()
        } else {
            self.triggers
                .trigger_reason
                .clone()
                .unwrap_or_else(|| "periodic heartbeat".to_string())
        };

        info!(player = %self.player, tick, %reason, "launching strategic evaluation");

        let perception = perception::serialize_battle_perception(
            world,
            self.player,
            tick,
            &reason,
            &self.directives,
            &self.standing_orders,
            command.as_deref(),
            &targets,
            &self.config,
        );

        EvaluationRequest { reason, perception }
    }

    /// Apply the outcome of a decision call and release the in-flight flag
    ///
    /// Runs the fallback (default-directive assignment) on every failure
    /// class; the one-shot trigger fields are cleared on all paths.
    pub fn finish_evaluation(
        &mut self,
        world: &impl WorldView,
        tick: Tick,
        outcome: Result<StrategicResponse, DecisionError>,
    ) {
        match outcome {
            Ok(response) => {
                info!(
                    player = %self.player,
                    proposals = response.directives.len(),
                    "evaluation returned directives"
                );
                self.apply_directives(response.directives, world, tick);
            }
            Err(DecisionError::NotConfigured) => {
                if !self.source_disabled {
                    warn!(
                        player = %self.player,
                        "decision service not configured; disabling strategic calls for this session"
                    );
                }
                self.source_disabled = true;
                self.assign_default_directives(world, tick);
            }
            Err(e) => {
                warn!(player = %self.player, error = %e, "evaluation failed, falling back to defaults");
                self.assign_default_directives(world, tick);
            }
        }

        // Guaranteed cleanup: without this an error anywhere above would
        // leave the coordinator permanently "evaluating" and unresponsive.
        self.triggers.clear_one_shot();
        self.evaluating = false;
    }

    /// Run one full evaluation cycle against the owned decision source
    ///
    /// The decision call runs under a hard wall-clock timeout; expiry is
    /// treated exactly like a transport failure and is not retried within
    /// this cycle.
    pub async fn evaluate(&mut self, world: &impl WorldView, tick: Tick) {
        let request = self.begin_evaluation(world, tick);

        let outcome = if self.source_disabled {
            Err(DecisionError::NotConfigured)
        } else {
            match tokio::time::timeout(
                self.config.decision_timeout,
                self.source.decide(&request.perception),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DecisionError::Timeout),
            }
        };

        self.finish_evaluation(world, tick, outcome);
    }

    /// Validate and apply a list of proposed directives
    ///
    /// Each proposal stands alone: a rejected entry never aborts processing
    /// of the rest. After the list, every live owned unit still lacking an
    /// active directive receives a generated idle default.
    fn apply_directives(
        &mut self,
        proposals: Vec<ProposedDirective>,
        world: &impl WorldView,
        tick: Tick,
    ) {
        let bounds = world.map_bounds();

        for proposal in proposals {
            let Some(unit) = world.unit(&proposal.unit_id) else {
                debug!(unit = %proposal.unit_id, "skipping proposal for unknown unit");
                continue;
            };
            if unit.owner != self.player {
                debug!(unit = %proposal.unit_id, "skipping proposal for unowned unit");
                continue;
            }
            if !unit.alive {
                debug!(unit = %proposal.unit_id, "skipping proposal for dead unit");
                continue;
            }

            let Some(kind) = DirectiveType::from_raw(&proposal.kind) else {
                warn!(
                    unit = %proposal.unit_id,
                    raw = %proposal.kind,
                    "rejecting directive with unrecognized type"
                );
                continue;
            };

            // Standing-order gate: the decision source may not assign
            // autonomous behavior to units the player never delegated.
            if kind != DirectiveType::Idle && !self.standing_orders.contains(&proposal.unit_id) {
                warn!(
                    unit = %proposal.unit_id,
                    kind = %kind,
                    "rejecting non-idle directive for unit without standing order"
                );
                self.directives.remove(&proposal.unit_id);
                continue;
            }

            let directive = Directive {
                unit_id: proposal.unit_id.clone(),
                kind,
                target: proposal.target.map(|pos| pos.clamped(&bounds)),
                target_unit: proposal.target_unit_id,
                building_type: proposal.building_type,
                resource_type: proposal.resource_type,
                priority: proposal.priority.unwrap_or(self.config.default_priority),
                reasoning: proposal.reasoning.unwrap_or_default(),
                created_at_tick: tick,
                ttl: self.config.default_directive_ttl,
                completed: false,
            };
            info!(unit = %directive.unit_id, directive = %directive.tag(), "directive assigned");
            self.directives.insert(directive);
        }

        self.assign_default_directives(world, tick);
    }

    /// Give every live owned unit without an active directive an idle default
    ///
    /// Also the entire fallback path: existing directives are left
    /// untouched, only the gaps are filled.
    fn assign_default_directives(&mut self, world: &impl WorldView, tick: Tick) {
        let mut assigned = 0usize;
        let ids: Vec<_> = world
            .units()
            .iter()
            .filter(|u| u.owner == self.player && u.alive)
            .map(|u| u.id.clone())
            .collect();
        for id in ids {
            if !self.directives.has_active(&id) {
                self.directives.insert(Directive::idle_default(
                    id,
                    tick,
                    self.config.default_directive_ttl,
                    self.config.default_priority,
                ));
                assigned += 1;
            }
        }
        if assigned > 0 {
            debug!(player = %self.player, assigned, "idle defaults assigned");
        }
    }
}
