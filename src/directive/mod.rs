//! Directive data model and per-unit strategic state
//!
//! A Directive is the durable strategic intent the coordinator assigns to a
//! unit. Directives are overwritten wholesale by later evaluations; the only
//! deletion path is a standing-order rejection, which leaves the unit with no
//! directive until the next cycle assigns one.

use crate::core::types::{GridPos, Tick, UnitId};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized strategic directive types
///
/// Anything the decision source sends outside this set is rejected outright;
/// there is no coercion to a "closest" type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveType {
    Idle,
    Move,
    Gather,
    Attack,
    Build,
    Explore,
    Defend,
    Patrol,
    Siege,
}

impl DirectiveType {
    /// Parse a raw decision-source type string
    ///
    /// Normalizes case and separators ("Move-To" style variants collapse to
    /// snake case) before matching. Returns None for anything unrecognized.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "idle" => Some(Self::Idle),
            "move" => Some(Self::Move),
            "gather" => Some(Self::Gather),
            "attack" => Some(Self::Attack),
            "build" => Some(Self::Build),
            "explore" => Some(Self::Explore),
            "defend" => Some(Self::Defend),
            "patrol" => Some(Self::Patrol),
            "siege" => Some(Self::Siege),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Move => "move",
            Self::Gather => "gather",
            Self::Attack => "attack",
            Self::Build => "build",
            Self::Explore => "explore",
            Self::Defend => "defend",
            Self::Patrol => "patrol",
            Self::Siege => "siege",
        }
    }
}

impl fmt::Display for DirectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persistent strategic order assigned to one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub unit_id: UnitId,
    pub kind: DirectiveType,
    pub target: Option<GridPos>,
    pub target_unit: Option<UnitId>,
    pub building_type: Option<String>,
    pub resource_type: Option<String>,
    /// Metadata for downstream executors, not enforced here
    pub priority: u8,
    /// Free-text rationale, surfaced to the unit log
    pub reasoning: String,
    pub created_at_tick: Tick,
    /// Recorded for observability; never compared against the current tick.
    /// Directives do not auto-expire.
    pub ttl: Tick,
    /// Flipped by the external executor when the order is done
    pub completed: bool,
}

impl Directive {
    /// Default directive for a unit the decision source left unaddressed
    pub fn idle_default(unit_id: UnitId, tick: Tick, ttl: Tick, priority: u8) -> Self {
        Self {
            unit_id,
            kind: DirectiveType::Idle,
            target: None,
            target_unit: None,
            building_type: None,
            resource_type: None,
            priority,
            reasoning: "Awaiting orders".into(),
            created_at_tick: tick,
            ttl,
            completed: false,
        }
    }

    /// Short tag for perception status lines, e.g. "gather@(4,7)"
    pub fn tag(&self) -> String {
        match self.target {
            Some(pos) => format!("{}@{}", self.kind, pos),
            None => match &self.target_unit {
                Some(unit) => format!("{}>{}", self.kind, unit),
                None => self.kind.to_string(),
            },
        }
    }
}

/// One proposed directive as deserialized from the decision-source response
///
/// `kind` stays a raw string here; validation happens in the coordinator so
/// a single bad entry never aborts parsing of the rest of the list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedDirective {
    pub unit_id: UnitId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub target: Option<GridPos>,
    #[serde(default)]
    pub target_unit_id: Option<UnitId>,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Authoritative map of unit id to current directive
#[derive(Debug, Default)]
pub struct DirectiveStore {
    map: AHashMap<UnitId, Directive>,
}

impl DirectiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, directive: Directive) {
        self.map.insert(directive.unit_id.clone(), directive);
    }

    pub fn remove(&mut self, unit: &UnitId) -> Option<Directive> {
        self.map.remove(unit)
    }

    pub fn get(&self, unit: &UnitId) -> Option<&Directive> {
        self.map.get(unit)
    }

    /// A unit counts as "has an active directive" only while its entry
    /// exists and the executor has not completed it
    pub fn has_active(&self, unit: &UnitId) -> bool {
        self.map.get(unit).map(|d| !d.completed).unwrap_or(false)
    }

    /// Executor-side hook: mark a directive finished so the next cycle
    /// assigns a fresh one. Returns false when the unit has no entry.
    pub fn mark_completed(&mut self, unit: &UnitId) -> bool {
        match self.map.get_mut(unit) {
            Some(directive) => {
                directive.completed = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &Directive)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Player-issued free-text intent bound to specific units
///
/// Persists until overwritten by a new order to the same unit, independent
/// of directive lifecycle. A unit with no standing order may only ever hold
/// an idle directive.
#[derive(Debug, Default)]
pub struct StandingOrders {
    map: AHashMap<UnitId, String>,
}

impl StandingOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, unit: UnitId, order: impl Into<String>) {
        self.map.insert(unit, order.into());
    }

    pub fn get(&self, unit: &UnitId) -> Option<&str> {
        self.map.get(unit).map(|s| s.as_str())
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.map.contains_key(unit)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &String)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parsing_case_folds() {
        assert_eq!(DirectiveType::from_raw("GATHER"), Some(DirectiveType::Gather));
        assert_eq!(DirectiveType::from_raw("Attack"), Some(DirectiveType::Attack));
        assert_eq!(DirectiveType::from_raw(" idle "), Some(DirectiveType::Idle));
    }

    #[test]
    fn test_type_parsing_rejects_unknown() {
        assert_eq!(DirectiveType::from_raw("teleport"), None);
        assert_eq!(DirectiveType::from_raw(""), None);
        assert_eq!(DirectiveType::from_raw("gather_fast"), None);
    }

    #[test]
    fn test_proposed_directive_wire_shape() {
        let json = r#"{
            "unitId": "U1",
            "type": "gather",
            "target": {"col": 4, "row": 7},
            "priority": 8,
            "reasoning": "minerals close by"
        }"#;
        let proposal: ProposedDirective = serde_json::from_str(json).unwrap();
        assert_eq!(proposal.unit_id, UnitId::from("U1"));
        assert_eq!(proposal.kind, "gather");
        assert_eq!(proposal.target, Some(GridPos::new(4, 7)));
        assert_eq!(proposal.priority, Some(8));
        assert!(proposal.target_unit_id.is_none());
    }

    #[test]
    fn test_store_active_tracking() {
        let mut store = DirectiveStore::new();
        let u1 = UnitId::from("U1");
        assert!(!store.has_active(&u1));

        store.insert(Directive::idle_default(u1.clone(), 10, 1200, 5));
        assert!(store.has_active(&u1));

        assert!(store.mark_completed(&u1));
        assert!(!store.has_active(&u1));
        // entry is still present for observability
        assert!(store.get(&u1).is_some());
        assert!(!store.mark_completed(&UnitId::from("U9")));
    }

    #[test]
    fn test_standing_order_overwrite() {
        let mut orders = StandingOrders::new();
        let u1 = UnitId::from("U1");
        orders.set(u1.clone(), "gather minerals");
        orders.set(u1.clone(), "defend the ramp");
        assert_eq!(orders.get(&u1), Some("defend the ramp"));
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_directive_tag() {
        let mut d = Directive::idle_default(UnitId::from("U1"), 0, 1200, 5);
        assert_eq!(d.tag(), "idle");

        d.kind = DirectiveType::Gather;
        d.target = Some(GridPos::new(4, 7));
        assert_eq!(d.tag(), "gather@(4,7)");

        d.target = None;
        d.kind = DirectiveType::Attack;
        d.target_unit = Some(UnitId::from("E3"));
        assert_eq!(d.tag(), "attack>E3");
    }
}
