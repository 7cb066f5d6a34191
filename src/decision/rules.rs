//! Rule-based tactical source
//!
//! Deterministic local heuristics so units keep behaving when no LLM is
//! reachable. Deliberately conservative: the interesting strategy comes from
//! the coordinator's directives, not from here.

use crate::core::types::{GridPos, UnitRole};
use crate::decision::{DecisionError, TacticalSource};
use crate::unit::perception::UnitPerception;
use crate::unit::{ActionKind, UnitAction};
use rand::Rng;

/// Health fraction below which a unit breaks contact
const RETREAT_HEALTH_THRESHOLD: f32 = 0.3;

/// How far a scout's randomized sweep leg reaches, in tiles
const SWEEP_DISTANCE: i32 = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedSource;

impl RuleBasedSource {
    pub fn new() -> Self {
        Self
    }

    fn pick(&self, p: &UnitPerception) -> UnitAction {
        let enemy_near = p.nearby_enemies.first();

        // Survival first, regardless of role.
        if p.health_frac < RETREAT_HEALTH_THRESHOLD && enemy_near.is_some() {
            return UnitAction {
                kind: ActionKind::Retreat,
                target: None,
                target_unit: None,
                reasoning: "low health with enemy in sight, breaking contact".into(),
            };
        }

        match p.role {
            UnitRole::Soldier | UnitRole::Siege => {
                if let Some(enemy) = enemy_near {
                    return UnitAction {
                        kind: ActionKind::AttackUnit,
                        target: Some(enemy.pos),
                        target_unit: Some(enemy.id.clone()),
                        reasoning: format!("engaging nearest enemy {}", enemy.id),
                    };
                }
            }
            UnitRole::Worker => {
                // Workers with free hands head for the nearest resource.
                if p.cargo.is_none() {
                    if let Some(resource) = p.nearby_resources.first() {
                        return UnitAction {
                            kind: ActionKind::GatherAt,
                            target: Some(resource.pos),
                            target_unit: None,
                            reasoning: format!("gathering {}", resource.resource),
                        };
                    }
                }
            }
            UnitRole::Scout => {
                if enemy_near.is_none() {
                    // Randomized sweep leg; the host clamps and pathfinds.
                    let mut rng = rand::thread_rng();
                    let target = GridPos::new(
                        p.pos.col + rng.gen_range(-SWEEP_DISTANCE..=SWEEP_DISTANCE),
                        p.pos.row + rng.gen_range(-SWEEP_DISTANCE..=SWEEP_DISTANCE),
                    );
                    return UnitAction {
                        kind: ActionKind::Scout,
                        target: Some(target),
                        target_unit: None,
                        reasoning: "area clear, continuing sweep".into(),
                    };
                }
            }
            UnitRole::Support => {}
        }

        UnitAction::hold("no rule applies, holding position")
    }
}

impl TacticalSource for RuleBasedSource {
    async fn advise(&self, perception: &UnitPerception) -> Result<UnitAction, DecisionError> {
        Ok(self.pick(perception))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{GridPos, UnitId};
    use crate::world::{Cargo, EnemySighting, ResourceSighting};

    fn base_perception(role: UnitRole) -> UnitPerception {
        UnitPerception {
            unit_id: UnitId::from("U1"),
            role,
            pos: GridPos::new(10, 10),
            health_frac: 1.0,
            cargo: None,
            standing_order: None,
            nearby_allies: vec![],
            nearby_enemies: vec![],
            nearby_resources: vec![],
            recent_log: vec![],
            messages: vec![],
        }
    }

    fn raider_at(col: i32, row: i32) -> EnemySighting {
        EnemySighting {
            id: UnitId::from("E1"),
            pos: GridPos::new(col, row),
            kind: "raider".into(),
        }
    }

    #[tokio::test]
    async fn test_wounded_unit_retreats() {
        let mut p = base_perception(UnitRole::Soldier);
        p.health_frac = 0.2;
        p.nearby_enemies.push(raider_at(12, 10));

        let action = RuleBasedSource::new().advise(&p).await.unwrap();
        assert_eq!(action.kind, ActionKind::Retreat);
    }

    #[tokio::test]
    async fn test_soldier_attacks_nearest_enemy() {
        let mut p = base_perception(UnitRole::Soldier);
        p.nearby_enemies.push(raider_at(12, 10));

        let action = RuleBasedSource::new().advise(&p).await.unwrap();
        assert_eq!(action.kind, ActionKind::AttackUnit);
        assert_eq!(action.target_unit, Some(UnitId::from("E1")));
    }

    #[tokio::test]
    async fn test_empty_handed_worker_gathers() {
        let mut p = base_perception(UnitRole::Worker);
        p.nearby_resources.push(ResourceSighting {
            pos: GridPos::new(8, 9),
            resource: "minerals".into(),
        });

        let action = RuleBasedSource::new().advise(&p).await.unwrap();
        assert_eq!(action.kind, ActionKind::GatherAt);
        assert_eq!(action.target, Some(GridPos::new(8, 9)));
    }

    #[tokio::test]
    async fn test_loaded_worker_holds() {
        let mut p = base_perception(UnitRole::Worker);
        p.cargo = Some(Cargo {
            resource: "minerals".into(),
            amount: 5,
        });
        p.nearby_resources.push(ResourceSighting {
            pos: GridPos::new(8, 9),
            resource: "minerals".into(),
        });

        let action = RuleBasedSource::new().advise(&p).await.unwrap();
        assert_eq!(action.kind, ActionKind::Hold);
    }

    #[tokio::test]
    async fn test_scout_sweeps_when_clear() {
        let p = base_perception(UnitRole::Scout);
        let action = RuleBasedSource::new().advise(&p).await.unwrap();
        assert_eq!(action.kind, ActionKind::Scout);

        let target = action.target.unwrap();
        assert!((target.col - p.pos.col).abs() <= 6);
        assert!((target.row - p.pos.row).abs() <= 6);
    }
}
