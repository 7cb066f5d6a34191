//! Trigger classification and per-cycle trigger state
//!
//! Trigger state is transient: event handlers set it (producer side, any
//! tick), `evaluate()` consumes and clears it (consumer side, single point).
//! It lives inside the owning coordinator; nothing here is shared or global.

use crate::core::types::{Tick, UnitId};
use ahash::AHashSet;

/// World-change trigger classes, in descending priority
///
/// Player commands are tracked separately (they carry a transcript and a
/// target list); everything here competes for the single world-change slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// An owned unit was destroyed
    UnitLost(UnitId),
    /// An owned building finished construction
    BuildingCompleted(String),
    /// Previously unseen enemy units entered vision
    EnemySpotted(usize),
    /// A batch of previously unseen resource tiles entered vision
    ResourcesFound(usize),
}

impl Trigger {
    /// Lower rank = higher priority
    pub fn rank(&self) -> u8 {
        match self {
            Self::UnitLost(_) => 0,
            Self::BuildingCompleted(_) => 1,
            Self::EnemySpotted(_) => 2,
            Self::ResourcesFound(_) => 3,
        }
    }

    /// Human-readable reason text, forwarded into the perception
    pub fn reason(&self) -> String {
        match self {
            Self::UnitLost(unit) => format!("unit {} was destroyed", unit),
            Self::BuildingCompleted(name) => format!("{} finished construction", name),
            Self::EnemySpotted(count) => format!("{} new enemy unit(s) spotted", count),
            Self::ResourcesFound(count) => format!("discovered {} new resource deposits", count),
        }
    }
}

/// Pending-trigger flags and one-shot command fields for one coordinator
#[derive(Debug)]
pub struct TriggerState {
    /// A player command is waiting for the next evaluation
    pub command_pending: bool,
    /// A world-change trigger is waiting for the next evaluation
    pub world_change_pending: bool,
    /// One-shot: reason text of the highest-priority pending world change
    pub trigger_reason: Option<String>,
    /// One-shot: transcript of the freshest player command
    pub current_command: Option<String>,
    /// One-shot: units the fresh command was scoped to (empty = all)
    pub command_targets: Vec<UnitId>,
    /// The player has engaged at least once; until then the AI stays idle
    pub ever_commanded: bool,
    /// Tick at which the last evaluation was launched
    pub last_eval_tick: Tick,
    /// Rank of the trigger currently holding `trigger_reason`
    pending_rank: u8,
}

impl TriggerState {
    pub fn new() -> Self {
        Self {
            command_pending: false,
            world_change_pending: false,
            trigger_reason: None,
            current_command: None,
            command_targets: Vec::new(),
            ever_commanded: false,
            last_eval_tick: 0,
            pending_rank: u8::MAX,
        }
    }

    /// Record a fresh player command (highest-priority trigger class)
    pub fn note_command(&mut self, transcript: String, targets: Vec<UnitId>) {
        self.command_pending = true;
        self.ever_commanded = true;
        self.current_command = Some(transcript);
        self.command_targets = targets;
    }

    /// Raise a world-change trigger; only a higher-priority one may replace
    /// the pending reason
    pub fn raise(&mut self, trigger: Trigger) {
        let rank = trigger.rank();
        if !self.world_change_pending || rank < self.pending_rank {
            self.trigger_reason = Some(trigger.reason());
            self.pending_rank = rank;
        }
        self.world_change_pending = true;
    }

    /// True when a trigger strictly more urgent than `rank` is already
    /// pending (player commands outrank everything)
    pub fn blocks(&self, rank: u8) -> bool {
        self.command_pending || (self.world_change_pending && self.pending_rank < rank)
    }

    /// Clear the one-shot fields
    ///
    /// Called unconditionally at the end of every evaluation. The pending
    /// flags are NOT touched here: triggers raised while a call was in
    /// flight keep their flag and start a fresh cycle.
    pub fn clear_one_shot(&mut self) {
        self.current_command = None;
        self.command_targets.clear();
        self.trigger_reason = None;
        self.pending_rank = u8::MAX;
    }
}

impl Default for TriggerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotone record of what this player has already discovered
///
/// Never pruned: an enemy that leaves vision and returns is not re-reported.
#[derive(Debug, Default)]
pub struct DiscoveryLedger {
    known_enemies: AHashSet<UnitId>,
    known_resources: AHashSet<String>,
    /// Newly seen resource tiles since the last batch trigger
    pending_resource_batch: usize,
}

impl DiscoveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this enemy has never been seen before
    pub fn note_enemy(&mut self, id: UnitId) -> bool {
        self.known_enemies.insert(id)
    }

    /// Returns true if this resource tile key has never been seen before;
    /// new tiles accumulate toward the batch threshold
    pub fn note_resource(&mut self, key: String) -> bool {
        let new = self.known_resources.insert(key);
        if new {
            self.pending_resource_batch += 1;
        }
        new
    }

    pub fn pending_batch(&self) -> usize {
        self.pending_resource_batch
    }

    /// Consume the accumulated batch when its trigger fires
    pub fn take_batch(&mut self) -> usize {
        std::mem::take(&mut self.pending_resource_batch)
    }

    pub fn known_enemy_count(&self) -> usize {
        self.known_enemies.len()
    }

    pub fn known_resource_count(&self) -> usize {
        self.known_resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_priority_ordering() {
        assert!(Trigger::UnitLost(UnitId::from("U1")).rank() < Trigger::EnemySpotted(1).rank());
        assert!(Trigger::EnemySpotted(1).rank() < Trigger::ResourcesFound(3).rank());
    }

    #[test]
    fn test_raise_keeps_higher_priority_reason() {
        let mut state = TriggerState::new();
        state.raise(Trigger::UnitLost(UnitId::from("U1")));
        state.raise(Trigger::ResourcesFound(4));

        assert!(state.world_change_pending);
        assert_eq!(
            state.trigger_reason.as_deref(),
            Some("unit U1 was destroyed")
        );
    }

    #[test]
    fn test_raise_upgrades_to_higher_priority() {
        let mut state = TriggerState::new();
        state.raise(Trigger::ResourcesFound(4));
        state.raise(Trigger::EnemySpotted(2));

        assert_eq!(
            state.trigger_reason.as_deref(),
            Some("2 new enemy unit(s) spotted")
        );
    }

    #[test]
    fn test_blocks_on_pending_command() {
        let mut state = TriggerState::new();
        state.note_command("attack".into(), vec![]);
        assert!(state.blocks(Trigger::ResourcesFound(3).rank()));
    }

    #[test]
    fn test_blocks_only_on_strictly_higher_priority() {
        let mut state = TriggerState::new();
        state.raise(Trigger::EnemySpotted(1));
        assert!(state.blocks(Trigger::ResourcesFound(3).rank()));
        assert!(!state.blocks(Trigger::UnitLost(UnitId::from("U1")).rank()));
    }

    #[test]
    fn test_clear_one_shot_keeps_pending_flags() {
        let mut state = TriggerState::new();
        state.note_command("go".into(), vec![UnitId::from("U1")]);
        state.raise(Trigger::EnemySpotted(1));

        state.clear_one_shot();

        assert!(state.current_command.is_none());
        assert!(state.command_targets.is_empty());
        assert!(state.trigger_reason.is_none());
        // flags survive so fresh triggers start a new cycle
        assert!(state.command_pending);
        assert!(state.world_change_pending);
    }

    #[test]
    fn test_ledger_reports_only_new_discoveries() {
        let mut ledger = DiscoveryLedger::new();
        assert!(ledger.note_enemy(UnitId::from("E1")));
        assert!(!ledger.note_enemy(UnitId::from("E1")));

        assert!(ledger.note_resource("3,4".into()));
        assert!(!ledger.note_resource("3,4".into()));
        assert_eq!(ledger.pending_batch(), 1);
    }

    #[test]
    fn test_ledger_batch_consumption() {
        let mut ledger = DiscoveryLedger::new();
        ledger.note_resource("1,1".into());
        ledger.note_resource("1,2".into());
        ledger.note_resource("1,3".into());

        assert_eq!(ledger.take_batch(), 3);
        assert_eq!(ledger.pending_batch(), 0);
        // the tiles stay known after the batch is consumed
        assert_eq!(ledger.known_resource_count(), 3);
    }
}
