//! Narrow per-unit perception
//!
//! Rebuilt on every think cycle and never persisted. Positions of nearby
//! entities are rendered relative to the unit so the tactical source reasons
//! in offsets, not absolute map coordinates.

use crate::core::types::{GridPos, UnitId, UnitRole};
use crate::world::{Cargo, EnemySighting, ResourceSighting, UnitSnapshot, WorldView};
use std::fmt::Write;

/// Snapshot of what one unit knows at the moment it thinks
#[derive(Debug, Clone)]
pub struct UnitPerception {
    pub unit_id: UnitId,
    pub role: UnitRole,
    pub pos: GridPos,
    pub health_frac: f32,
    pub cargo: Option<Cargo>,
    pub standing_order: Option<String>,
    /// Living friendly units within perception radius, nearest first
    pub nearby_allies: Vec<UnitSnapshot>,
    /// Enemies within perception radius, nearest first
    pub nearby_enemies: Vec<EnemySighting>,
    /// Resource tiles within perception radius, nearest first
    pub nearby_resources: Vec<ResourceSighting>,
    pub recent_log: Vec<String>,
    pub messages: Vec<String>,
}

impl UnitPerception {
    /// Build a perception for `unit` from the player-visible world
    pub fn build(
        unit: &UnitSnapshot,
        world: &impl WorldView,
        standing_order: Option<&str>,
        recent_log: Vec<String>,
        messages: Vec<String>,
        radius: i32,
    ) -> Self {
        let mut nearby_allies: Vec<UnitSnapshot> = world
            .units()
            .iter()
            .filter(|u| {
                u.owner == unit.owner
                    && u.alive
                    && u.id != unit.id
                    && unit.pos.chebyshev(&u.pos) <= radius
            })
            .cloned()
            .collect();
        nearby_allies.sort_by_key(|u| unit.pos.chebyshev(&u.pos));

        let mut nearby_enemies: Vec<EnemySighting> = world
            .visible_enemies(unit.owner)
            .into_iter()
            .filter(|e| unit.pos.chebyshev(&e.pos) <= radius)
            .collect();
        nearby_enemies.sort_by_key(|e| unit.pos.chebyshev(&e.pos));

        let mut nearby_resources: Vec<ResourceSighting> = world
            .visible_resources(unit.owner)
            .into_iter()
            .filter(|r| unit.pos.chebyshev(&r.pos) <= radius)
            .collect();
        nearby_resources.sort_by_key(|r| unit.pos.chebyshev(&r.pos));

        Self {
            unit_id: unit.id.clone(),
            role: unit.role,
            pos: unit.pos,
            health_frac: unit.health_frac,
            cargo: unit.cargo.clone(),
            standing_order: standing_order.map(|s| s.to_string()),
            nearby_allies,
            nearby_enemies,
            nearby_resources,
            recent_log,
            messages,
        }
    }

    /// Deterministic text rendering for prompt-based tactical sources
    pub fn render(&self) -> String {
        let mut s = String::new();

        let _ = writeln!(
            s,
            "YOU: {} ({}) at {} hp {}%",
            self.unit_id,
            self.role.label(),
            self.pos,
            (self.health_frac * 100.0).round() as u32
        );
        if let Some(cargo) = &self.cargo {
            let _ = writeln!(s, "Carrying: {} {}", cargo.amount, cargo.resource);
        }
        if let Some(order) = &self.standing_order {
            let _ = writeln!(s, "Your order: \"{}\"", order);
        }

        if !self.nearby_allies.is_empty() {
            s.push_str("\nALLIES IN SIGHT (offsets from you):\n");
            for ally in &self.nearby_allies {
                let _ = writeln!(
                    s,
                    "- {} {} at ({:+},{:+})",
                    ally.id,
                    ally.role.label(),
                    ally.pos.col - self.pos.col,
                    ally.pos.row - self.pos.row
                );
            }
        }

        if !self.nearby_enemies.is_empty() {
            s.push_str("\nENEMIES IN SIGHT (offsets from you):\n");
            for enemy in &self.nearby_enemies {
                let _ = writeln!(
                    s,
                    "- {} {} at ({:+},{:+})",
                    enemy.id,
                    enemy.kind,
                    enemy.pos.col - self.pos.col,
                    enemy.pos.row - self.pos.row
                );
            }
        }

        if !self.nearby_resources.is_empty() {
            s.push_str("\nRESOURCES IN SIGHT (offsets from you):\n");
            for resource in &self.nearby_resources {
                let _ = writeln!(
                    s,
                    "- {} at ({:+},{:+})",
                    resource.resource,
                    resource.pos.col - self.pos.col,
                    resource.pos.row - self.pos.row
                );
            }
        }

        if !self.recent_log.is_empty() {
            s.push_str("\nRECENT ACTIVITY:\n");
            for line in &self.recent_log {
                let _ = writeln!(s, "- {}", line);
            }
        }

        if !self.messages.is_empty() {
            s.push_str("\nMESSAGES:\n");
            for message in &self.messages {
                let _ = writeln!(s, "- {}", message);
            }
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MapBounds, PlayerId};
    use crate::world::GridWorld;

    fn scout_at(col: i32, row: i32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::from("U1"),
            owner: PlayerId(0),
            role: UnitRole::Scout,
            pos: GridPos::new(col, row),
            health_frac: 0.75,
            alive: true,
            cargo: None,
        }
    }

    #[test]
    fn test_radius_filter_and_ordering() {
        let mut world = GridWorld::new(MapBounds::new(40, 40));
        world.set_enemy_sightings(
            PlayerId(0),
            vec![
                EnemySighting {
                    id: UnitId::from("E_far"),
                    pos: GridPos::new(30, 30),
                    kind: "raider".into(),
                },
                EnemySighting {
                    id: UnitId::from("E_near"),
                    pos: GridPos::new(11, 10),
                    kind: "raider".into(),
                },
                EnemySighting {
                    id: UnitId::from("E_mid"),
                    pos: GridPos::new(15, 10),
                    kind: "raider".into(),
                },
            ],
        );
        let unit = scout_at(10, 10);

        let perception = UnitPerception::build(&unit, &world, None, vec![], vec![], 12);

        assert_eq!(perception.nearby_enemies.len(), 2);
        assert_eq!(perception.nearby_enemies[0].id, UnitId::from("E_near"));
        assert_eq!(perception.nearby_enemies[1].id, UnitId::from("E_mid"));
    }

    #[test]
    fn test_allies_filtered_by_radius_owner_and_liveness() {
        let mut world = GridWorld::new(MapBounds::new(40, 40));
        let unit = scout_at(10, 10);
        world.add_unit(unit.clone());
        world.add_unit(UnitSnapshot {
            id: UnitId::from("A_near"),
            owner: PlayerId(0),
            role: UnitRole::Soldier,
            pos: GridPos::new(12, 10),
            health_frac: 1.0,
            alive: true,
            cargo: None,
        });
        world.add_unit(UnitSnapshot {
            id: UnitId::from("A_far"),
            owner: PlayerId(0),
            role: UnitRole::Worker,
            pos: GridPos::new(30, 30),
            health_frac: 1.0,
            alive: true,
            cargo: None,
        });
        world.add_unit(UnitSnapshot {
            id: UnitId::from("A_dead"),
            owner: PlayerId(0),
            role: UnitRole::Soldier,
            pos: GridPos::new(11, 10),
            health_frac: 0.0,
            alive: false,
            cargo: None,
        });
        world.add_unit(UnitSnapshot {
            id: UnitId::from("X1"),
            owner: PlayerId(1),
            role: UnitRole::Soldier,
            pos: GridPos::new(9, 10),
            health_frac: 1.0,
            alive: true,
            cargo: None,
        });

        let perception = UnitPerception::build(&unit, &world, None, vec![], vec![], 12);

        // one ally survives the filters; self, dead, far and enemy-owned do not
        assert_eq!(perception.nearby_allies.len(), 1);
        assert_eq!(perception.nearby_allies[0].id, UnitId::from("A_near"));

        let text = perception.render();
        assert!(text.contains("ALLIES IN SIGHT (offsets from you):"));
        assert!(text.contains("- A_near soldier at (+2,+0)"));
    }

    #[test]
    fn test_render_contains_relative_offsets() {
        let mut world = GridWorld::new(MapBounds::new(40, 40));
        world.set_enemy_sightings(
            PlayerId(0),
            vec![EnemySighting {
                id: UnitId::from("E1"),
                pos: GridPos::new(7, 12),
                kind: "raider".into(),
            }],
        );
        let unit = scout_at(10, 10);

        let perception = UnitPerception::build(
            &unit,
            &world,
            Some("screen the west flank"),
            vec!["tick 40: decided Scout".into()],
            vec!["U2: need cover at the ridge".into()],
            12,
        );
        let text = perception.render();

        assert!(text.contains("U1 (scout) at (10,10) hp 75%"));
        assert!(text.contains("(-3,+2)"));
        assert!(text.contains("screen the west flank"));
        assert!(text.contains("RECENT ACTIVITY"));
        assert!(text.contains("need cover at the ridge"));
    }

    #[test]
    fn test_render_omits_empty_sections() {
        let world = GridWorld::new(MapBounds::new(40, 40));
        let unit = scout_at(10, 10);
        let perception = UnitPerception::build(&unit, &world, None, vec![], vec![], 12);
        let text = perception.render();

        assert!(!text.contains("ENEMIES IN SIGHT"));
        assert!(!text.contains("MESSAGES"));
    }
}
