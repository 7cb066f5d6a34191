//! World-query boundary
//!
//! Terrain, pathfinding, fog of war and combat resolution live in the host
//! simulation. This crate only reads from them through [`WorldView`]: every
//! query is already filtered by the asking player's visibility, so the
//! coordinator never sees through the fog of war by accident.

use crate::core::types::{GridPos, MapBounds, PlayerId, UnitId, UnitRole};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// What a unit is carrying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub resource: String,
    pub amount: u32,
}

/// Point-in-time view of one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub owner: PlayerId,
    pub role: UnitRole,
    pub pos: GridPos,
    /// 0.0 = destroyed, 1.0 = full health
    pub health_frac: f32,
    pub alive: bool,
    pub cargo: Option<Cargo>,
}

/// An enemy unit currently inside the player's vision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySighting {
    pub id: UnitId,
    pub pos: GridPos,
    pub kind: String,
}

/// A resource tile currently inside the player's vision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSighting {
    pub pos: GridPos,
    pub resource: String,
}

/// A friendly building, possibly under construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    pub name: String,
    pub pos: GridPos,
    pub owner: PlayerId,
    /// 1.0 = construction complete
    pub progress_frac: f32,
}

/// Read-only world queries, answered per asking player
pub trait WorldView {
    fn map_bounds(&self) -> MapBounds;
    fn units(&self) -> &[UnitSnapshot];
    fn unit(&self, id: &UnitId) -> Option<&UnitSnapshot>;
    fn visible_enemies(&self, player: PlayerId) -> Vec<EnemySighting>;
    fn visible_resources(&self, player: PlayerId) -> Vec<ResourceSighting>;
    fn buildings(&self, player: PlayerId) -> Vec<BuildingSnapshot>;
    /// One-line resource stockpile summary for the perception header
    fn stockpile_summary(&self, player: PlayerId) -> String;
}

/// In-memory world used by the demo binary and the test suite
///
/// The host engine supplies its own [`WorldView`]; this one just holds the
/// snapshots it is given.
#[derive(Debug, Default)]
pub struct GridWorld {
    bounds: MapBounds,
    units: Vec<UnitSnapshot>,
    enemy_sightings: AHashMap<PlayerId, Vec<EnemySighting>>,
    resource_sightings: AHashMap<PlayerId, Vec<ResourceSighting>>,
    buildings: Vec<BuildingSnapshot>,
    stockpiles: AHashMap<PlayerId, String>,
}

impl GridWorld {
    pub fn new(bounds: MapBounds) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    pub fn add_unit(&mut self, unit: UnitSnapshot) {
        self.units.push(unit);
    }

    /// Mark a unit dead; the snapshot stays so lookups still resolve it
    pub fn kill_unit(&mut self, id: &UnitId) {
        if let Some(unit) = self.units.iter_mut().find(|u| &u.id == id) {
            unit.alive = false;
            unit.health_frac = 0.0;
        }
    }

    pub fn set_enemy_sightings(&mut self, player: PlayerId, sightings: Vec<EnemySighting>) {
        self.enemy_sightings.insert(player, sightings);
    }

    pub fn set_resource_sightings(&mut self, player: PlayerId, sightings: Vec<ResourceSighting>) {
        self.resource_sightings.insert(player, sightings);
    }

    pub fn add_building(&mut self, building: BuildingSnapshot) {
        self.buildings.push(building);
    }

    pub fn set_stockpile(&mut self, player: PlayerId, summary: impl Into<String>) {
        self.stockpiles.insert(player, summary.into());
    }
}

impl WorldView for GridWorld {
    fn map_bounds(&self) -> MapBounds {
        self.bounds
    }

    fn units(&self) -> &[UnitSnapshot] {
        &self.units
    }

    fn unit(&self, id: &UnitId) -> Option<&UnitSnapshot> {
        self.units.iter().find(|u| &u.id == id)
    }

    fn visible_enemies(&self, player: PlayerId) -> Vec<EnemySighting> {
        self.enemy_sightings.get(&player).cloned().unwrap_or_default()
    }

    fn visible_resources(&self, player: PlayerId) -> Vec<ResourceSighting> {
        self.resource_sightings
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    fn buildings(&self, player: PlayerId) -> Vec<BuildingSnapshot> {
        self.buildings
            .iter()
            .filter(|b| b.owner == player)
            .cloned()
            .collect()
    }

    fn stockpile_summary(&self, player: PlayerId) -> String {
        self.stockpiles
            .get(&player)
            .cloned()
            .unwrap_or_else(|| "no stockpile data".into())
    }
}
