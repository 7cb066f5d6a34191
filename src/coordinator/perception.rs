//! Battle perception serialization
//!
//! The decision source is prompt-based and has no memory across calls, so
//! every evaluation re-derives full context as one deterministic text block.
//! Section order is fixed: map legend, stockpile/tick header, trigger
//! reason, unit status lines, enemies, resources (capped), buildings, the
//! fresh command block, and finally a standing-orders reminder that restates
//! player intent as a hard constraint.

use crate::core::config::CoordinatorConfig;
use crate::core::types::{PlayerId, Tick, UnitId};
use crate::directive::{DirectiveStore, StandingOrders};
use crate::world::WorldView;
use std::fmt::Write;

#[allow(clippy::too_many_arguments)]
pub fn serialize_battle_perception(
    world: &impl WorldView,
    player: PlayerId,
    tick: Tick,
    reason: &str,
    directives: &DirectiveStore,
    orders: &StandingOrders,
    command: Option<&str>,
    command_targets: &[UnitId],
    config: &CoordinatorConfig,
) -> String {
    let mut s = String::new();
    let bounds = world.map_bounds();

    let _ = writeln!(
        s,
        "MAP {}x{} grid. Coordinates are (col,row); (0,0) is the northwest corner.",
        bounds.cols, bounds.rows
    );
    let _ = writeln!(
        s,
        "Stockpile: {} | Tick: {}",
        world.stockpile_summary(player),
        tick
    );
    let _ = writeln!(s, "Evaluation trigger: {}", reason);

    s.push_str("\nYOUR UNITS:\n");
    for unit in world.units().iter().filter(|u| u.owner == player && u.alive) {
        let directive_tag = directives
            .get(&unit.id)
            .map(|d| d.tag())
            .unwrap_or_else(|| "none".into());
        let _ = write!(
            s,
            "- {} {} at {} hp {}% directive={}",
            unit.id,
            unit.role.label(),
            unit.pos,
            (unit.health_frac * 100.0).round() as u32,
            directive_tag
        );
        if let Some(order) = orders.get(&unit.id) {
            let _ = write!(s, " order=\"{}\"", order);
        }
        if let Some(cargo) = &unit.cargo {
            let _ = write!(s, " carrying {} {}", cargo.amount, cargo.resource);
        }
        s.push('\n');
    }

    // Enemy list is bounded by visibility itself, so it is never truncated.
    let mut enemies = world.visible_enemies(player);
    enemies.sort_by(|a, b| a.id.0.cmp(&b.id.0));
    if !enemies.is_empty() {
        s.push_str("\nENEMIES IN SIGHT:\n");
        for enemy in &enemies {
            let _ = writeln!(s, "- {} {} at {}", enemy.id, enemy.kind, enemy.pos);
        }
    }

    let mut resources = world.visible_resources(player);
    resources.sort_by_key(|r| (r.pos.row, r.pos.col));
    if !resources.is_empty() {
        s.push_str("\nVISIBLE RESOURCES:\n");
        let total = resources.len();
        for resource in resources.iter().take(config.visible_resource_cap) {
            let _ = writeln!(s, "- {} at {}", resource.resource, resource.pos);
        }
        if total > config.visible_resource_cap {
            let _ = writeln!(s, "(and {} more)", total - config.visible_resource_cap);
        }
    }

    let buildings = world.buildings(player);
    if !buildings.is_empty() {
        s.push_str("\nBUILDINGS:\n");
        for building in &buildings {
            if building.progress_frac >= 1.0 {
                let _ = writeln!(s, "- {} at {} (complete)", building.name, building.pos);
            } else {
                let _ = writeln!(
                    s,
                    "- {} at {} ({}% built)",
                    building.name,
                    building.pos,
                    (building.progress_frac * 100.0).round() as u32
                );
            }
        }
    }

    if let Some(cmd) = command {
        if command_targets.is_empty() {
            s.push_str("\nNEW COMMAND:\n");
        } else {
            let ids: Vec<&str> = command_targets.iter().map(|u| u.0.as_str()).collect();
            let _ = writeln!(s, "\nNEW COMMAND (to {}):", ids.join(", "));
        }
        let _ = writeln!(s, "\"{}\"", cmd);
    }

    if !orders.is_empty() {
        s.push_str("\nSTANDING ORDERS (hard constraints):\n");
        let mut sorted: Vec<(&UnitId, &String)> = orders.iter().collect();
        sorted.sort_by(|a, b| a.0 .0.cmp(&b.0 .0));
        for (unit, order) in sorted {
            let _ = writeln!(s, "- {}: \"{}\"", unit, order);
        }
        s.push_str("Units without a standing order must remain idle. Do not override player intent.\n");
    }

    s
}
