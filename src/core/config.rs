//! Scheduler configuration with documented constants
//!
//! All timing constants are collected here with explanations of their purpose
//! and how they interact with each other. Everything is measured in
//! simulation ticks except the decision-call timeout, which is wall clock.

use crate::core::types::{Tick, UnitRole};
use std::time::Duration;

/// Configuration for the per-player Strategic Coordinator
///
/// These values control how often the expensive external decision service
/// may be consulted. Lowering the gaps raises cost and latency pressure;
/// raising them makes the AI feel unresponsive.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum gap between evaluations before one runs with no trigger at all
    ///
    /// Safety net against a quiet battlefield: even if nothing noteworthy
    /// happens, the coordinator re-assesses every `heartbeat_interval` ticks.
    pub heartbeat_interval: Tick,

    /// Minimum gap before any non-command trigger may fire
    ///
    /// World-change triggers (losses, discoveries, completions) are batched
    /// behind this gap so a skirmish does not produce a call per casualty.
    pub min_evaluation_gap: Tick,

    /// Minimum gap before a pending player command forces an evaluation
    ///
    /// Deliberately short: player intent must be responsive. Still nonzero
    /// so a player rattling off three commands in a second produces one call.
    pub player_command_gap: Tick,

    /// How often the discovery scan runs
    ///
    /// Discovery detection polls the visible world instead of subscribing to
    /// "spotted"/"damage" events, which would fire far too often.
    pub world_scan_interval: Tick,

    /// Newly seen resource tiles needed before a world-change trigger fires
    ///
    /// A lone resource tile is not worth a strategy call; a cluster is.
    pub resource_batch_threshold: usize,

    /// Hard cap on resource entries serialized into a perception
    ///
    /// Bounds the prompt payload on resource-rich maps.
    pub visible_resource_cap: usize,

    /// TTL stamped onto every directive
    ///
    /// Recorded for observability only. Directives never auto-expire; they
    /// are replaced by the next evaluation or completed by the executor.
    pub default_directive_ttl: Tick,

    /// Priority assigned when the decision source omits one
    pub default_priority: u8,

    /// Wall-clock timeout for one decision-source call
    ///
    /// On expiry the call is abandoned and the fallback path runs. No retry
    /// happens within the same evaluation cycle.
    pub decision_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: 1200,
            min_evaluation_gap: 200,
            player_command_gap: 30,
            world_scan_interval: 20,
            resource_batch_threshold: 3,
            visible_resource_cap: 10,
            default_directive_ttl: 1200,
            default_priority: 5,
            decision_timeout: Duration::from_secs(10),
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.player_command_gap >= self.min_evaluation_gap {
            return Err(format!(
                "player_command_gap ({}) should be < min_evaluation_gap ({})",
                self.player_command_gap, self.min_evaluation_gap
            ));
        }
        if self.min_evaluation_gap >= self.heartbeat_interval {
            return Err(format!(
                "min_evaluation_gap ({}) should be < heartbeat_interval ({})",
                self.min_evaluation_gap, self.heartbeat_interval
            ));
        }
        if self.resource_batch_threshold == 0 {
            return Err("resource_batch_threshold must be at least 1".into());
        }
        if self.decision_timeout.is_zero() {
            return Err("decision_timeout must be nonzero".into());
        }
        Ok(())
    }
}

/// Configuration for per-unit decision loops
#[derive(Debug, Clone)]
pub struct UnitLoopConfig {
    /// Think interval for reconnaissance units (shortest: they react fast)
    pub scout_interval: Tick,
    /// Think interval for workers
    pub worker_interval: Tick,
    /// Think interval for line combat units
    pub soldier_interval: Tick,
    /// Think interval for siege units
    pub siege_interval: Tick,
    /// Think interval for support units (longest: they follow, not lead)
    pub support_interval: Tick,
    /// How many recent audit-log lines a unit carries into its perception
    pub log_tail: usize,
    /// Chebyshev radius (tiles) a unit perceives around itself
    pub perception_radius: i32,
}

impl Default for UnitLoopConfig {
    fn default() -> Self {
        Self {
            scout_interval: 40,
            worker_interval: 80,
            soldier_interval: 80,
            siege_interval: 120,
            support_interval: 160,
            log_tail: 6,
            perception_radius: 12,
        }
    }
}

impl UnitLoopConfig {
    /// Think interval for a given battlefield role
    pub fn think_interval(&self, role: UnitRole) -> Tick {
        match role {
            UnitRole::Scout => self.scout_interval,
            UnitRole::Worker => self.worker_interval,
            UnitRole::Soldier => self.soldier_interval,
            UnitRole::Siege => self.siege_interval,
            UnitRole::Support => self.support_interval,
        }
    }
}
