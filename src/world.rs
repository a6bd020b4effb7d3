//! Serializable snapshot of the full simulation state.
//!
//! The `Snapshot` struct is the boundary between the core and any external
//! renderer or auditor: everything observable about a tick in one plain
//! value. It also backs the determinism tests, which compare the JSON form
//! of two seeded runs.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::math::Vec2;
use crate::players::PlayerState;
use crate::projectile::Projectile;
use crate::rules::RulesRes;
use crate::state::{CameraState, GameStatus, MapConfig, Notification, SimTick, UiState};

/// One entity's externally visible state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: SimId,
    pub owner: PlayerId,
    pub kind: String,
    /// Rules key for units and buildings; "ore"/"well"/"rock" otherwise.
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub turret_angle: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub cargo: u32,
    pub flash: u32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub running: bool,
    pub winner: Option<crate::state::Outcome>,
    pub camera: CameraState,
    pub notification: Option<Notification>,
    pub map: Option<MapConfig>,
    pub entities: Vec<EntitySnapshot>,
    pub projectiles: Vec<Projectile>,
    pub players: Vec<PlayerState>,
    pub selection: Vec<SimId>,
    pub sell_mode: bool,
    pub repair_mode: bool,
}

impl Snapshot {
    /// Create a snapshot from the ECS world. Entities are emitted in id
    /// order so equal states serialize identically.
    #[allow(clippy::type_complexity)]
    pub fn from_world(world: &mut World) -> Self {
        let rules = world.resource::<RulesRes>().clone();
        let mut entities = Vec::new();
        {
            let mut query = world.query::<(
                &SimId,
                &Owner,
                &Position,
                &Health,
                Option<&UnitType>,
                Option<&BuildingType>,
                Option<&OreTag>,
                Option<&WellTag>,
                Option<&Movement>,
                Option<&CombatState>,
                Option<&Harvester>,
            )>();
            for (id, owner, pos, health, ut, bt, ore, well, movement, combat, harvester) in
                query.iter(world)
            {
                if !health.is_alive() {
                    continue;
                }
                let (kind, key) = if let Some(ut) = ut {
                    ("unit", rules.unit(ut.0).key.clone())
                } else if let Some(bt) = bt {
                    ("building", rules.building(bt.0).key.clone())
                } else if ore.is_some() {
                    ("resource", "ore".to_string())
                } else if well.is_some() {
                    ("well", "well".to_string())
                } else {
                    ("rock", "rock".to_string())
                };
                entities.push(EntitySnapshot {
                    id: *id,
                    owner: owner.0,
                    kind: kind.to_string(),
                    key,
                    x: pos.0.x,
                    y: pos.0.y,
                    rotation: movement.map(|m| m.rotation).unwrap_or(0.0),
                    turret_angle: combat.map(|c| c.turret_angle).unwrap_or(0.0),
                    hp: health.current,
                    max_hp: health.max,
                    cargo: harvester.map(|h| h.cargo).unwrap_or(0),
                    flash: combat.map(|c| c.flash).unwrap_or(0),
                });
            }
        }
        entities.sort_by_key(|e| e.id);

        let status = *world.resource::<GameStatus>();
        let ui = world.resource::<UiState>().clone();
        Self {
            tick: world.resource::<SimTick>().0,
            running: status.running,
            winner: status.winner,
            camera: *world.resource::<CameraState>(),
            notification: world.resource::<crate::state::ActiveNotification>().0.clone(),
            map: Some(*world.resource::<MapConfig>()),
            entities,
            projectiles: world.resource::<crate::projectile::ProjectilePool>().shots.clone(),
            players: world.resource::<crate::players::Players>().0.clone(),
            selection: ui.selection,
            sell_mode: ui.sell_mode,
            repair_mode: ui.repair_mode,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Positions of every live entity of a player, for quick assertions.
    pub fn positions_of(&self, owner: PlayerId) -> Vec<Vec2> {
        self.entities
            .iter()
            .filter(|e| e.owner == owner)
            .map(|e| Vec2::new(e.x, e.y))
            .collect()
    }
}
