//! ECS components for the Ironvein simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.
//!
//! Every entity carries the shared header (`SimId`, `Owner`, `Position`,
//! `PrevPosition`, `Health`, `Footprint`) plus a kind tag and the components
//! that kind needs. Cross-entity references are stored as [`SimId`] and
//! resolved through the `IdIndex` resource so stale references can be
//! detected and cleared.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::rules::{BuildingKey, UnitKey};

/// Player identifier. Negative is the neutral owner (ore, wells, rocks).
pub type PlayerId = i32;

/// Owner id of entities that belong to no player.
pub const NEUTRAL: PlayerId = -1;

// ============================================================================
// HEADER COMPONENTS
// ============================================================================

/// Stable public entity id, unique for the lifetime of the run.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimId(pub u32);

/// Owning player.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner(pub PlayerId);

impl Owner {
    pub fn is_neutral(&self) -> bool {
        self.0 < 0
    }
}

/// World position.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }
}

/// Position at the end of the previous tick; used for velocity smoothing.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PrevPosition(pub Vec2);

/// Hit points. For ore deposits `current` is the remaining extractable amount.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn damage(&mut self, amount: i32) {
        self.current = (self.current - amount).min(self.max);
    }

    pub fn heal(&mut self, amount: i32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Physical extent: axis-aligned box for statics, radius for dynamics.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Footprint {
    pub w: f32,
    pub h: f32,
    pub radius: f32,
}

impl Footprint {
    pub fn round(radius: f32) -> Self {
        Self { w: radius * 2.0, h: radius * 2.0, radius }
    }

    pub fn rect(w: f32, h: f32) -> Self {
        Self { w, h, radius: 0.5 * w.max(h) }
    }
}

// ============================================================================
// KIND TAGS
// ============================================================================

/// Marker for mobile units.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct UnitTag;

/// Marker for buildings.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BuildingTag;

/// Marker for ore deposits.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct OreTag;

/// Marker for wells.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WellTag;

/// Marker for rocks (static obstacles).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RockTag;

/// Rules key of a unit entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitType(pub UnitKey);

/// Rules key of a building entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingType(pub BuildingKey);

// ============================================================================
// UNIT COMPONENTS
// ============================================================================

/// Steering and path-following state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movement {
    pub vel: Vec2,
    /// Body heading in radians, damped toward the velocity direction.
    pub rotation: f32,
    pub move_target: Option<Vec2>,
    /// Auto-engage enemies encountered while traveling.
    pub attack_move: bool,
    pub path: Option<Vec<Vec2>>,
    pub path_idx: usize,
    /// Destination the current path was computed for.
    pub final_dest: Option<Vec2>,
    pub stuck_timer: u32,
    pub unstuck_dir: Option<Vec2>,
    pub unstuck_timer: u32,
    /// Exponentially smoothed actual displacement per tick.
    pub avg_vel: Vec2,
    pub last_dist_to_move_target: Option<f32>,
    pub best_dist_to_move_target: Option<f32>,
    pub move_target_no_progress_ticks: u32,
}

impl Movement {
    /// Order a move, dropping the stale path and progress trackers.
    pub fn order_move(&mut self, dest: Vec2) {
        self.move_target = Some(dest);
        self.attack_move = false;
        self.path = None;
        self.path_idx = 0;
        self.final_dest = None;
        self.best_dist_to_move_target = None;
        self.last_dist_to_move_target = None;
        self.move_target_no_progress_ticks = 0;
    }

    pub fn clear_move(&mut self) {
        self.move_target = None;
        self.attack_move = false;
        self.path = None;
        self.path_idx = 0;
        self.final_dest = None;
        self.best_dist_to_move_target = None;
        self.last_dist_to_move_target = None;
        self.move_target_no_progress_ticks = 0;
    }
}

/// Targeting, cooldown and damage-memory state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatState {
    pub target_id: Option<SimId>,
    pub last_attacker_id: Option<SimId>,
    pub last_attacker_owner: Option<PlayerId>,
    pub last_damage_tick: Option<u64>,
    /// Ticks until the weapon can fire again.
    pub cooldown: u32,
    /// Damage flash countdown (visual).
    pub flash: u32,
    /// Turret heading in radians; tracks the target faster than the body.
    pub turret_angle: f32,
}

/// Harvester cargo and routing state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Harvester {
    pub cargo: u32,
    pub resource_target: Option<SimId>,
    pub base_target: Option<SimId>,
    /// True after an explicit player/AI order; suppresses auto ore-seeking.
    pub manual_mode: bool,
    pub harvest_attempt_ticks: u32,
    pub last_dist_to_ore: Option<f32>,
    pub best_dist_to_ore: Option<f32>,
    /// Ore this harvester gave up on, ignored until the timer expires.
    pub blocked_ore: Option<SimId>,
    pub blocked_ore_timer: u32,
    /// AI must not re-command this harvester before the given tick.
    pub flee_cooldown_until: Option<u64>,
}

/// Engineer capture/repair intents, resolved one tick after contact.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineerState {
    pub capture_target: Option<SimId>,
    pub repair_target: Option<SimId>,
}

/// Building-specific state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingState {
    pub is_repairing: bool,
    pub placed_tick: u64,
}

/// Flight state of an air unit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirState {
    #[default]
    Docked,
    Flying,
    Attacking,
    Returning,
}

/// Air-unit ammo and docking state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirUnit {
    pub ammo: u32,
    pub max_ammo: u32,
    pub state: AirState,
    pub home_base: Option<SimId>,
    pub docked_slot: Option<u32>,
}

/// Demo-truck assignment. The explosion itself is resolved by the reducer's
/// detonation phase after death.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoTruck {
    pub detonation_target: Option<SimId>,
    pub detonation_pos: Option<Vec2>,
    pub has_detonated: bool,
}

/// Well spawner state.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellState {
    pub next_spawn_tick: u64,
    pub current_ore_count: u32,
    pub total_spawned: u32,
    /// True iff the last spawn attempt found no clear position.
    pub is_blocked: bool,
}

/// Air-base docking slots and launch pacing.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirBase {
    pub slots: Vec<Option<SimId>>,
    pub last_launch_tick: u64,
    /// Countdown until the next ammo point is loaded into a docked unit.
    pub reload_timer: u32,
}

impl AirBase {
    pub fn with_slots(count: u32) -> Self {
        Self {
            slots: vec![None; count as usize],
            last_launch_tick: 0,
            reload_timer: 0,
        }
    }

    pub fn free_slot(&self) -> Option<u32> {
        self.slots.iter().position(|s| s.is_none()).map(|i| i as u32)
    }
}

// ============================================================================
// BUNDLES
// ============================================================================

/// Everything a mobile unit spawns with. Special components (harvester,
/// engineer, air, demo) are inserted on top by the spawn helpers.
#[derive(Bundle)]
pub struct UnitBundle {
    pub sim_id: SimId,
    pub owner: Owner,
    pub position: Position,
    pub prev_position: PrevPosition,
    pub health: Health,
    pub footprint: Footprint,
    pub unit_type: UnitType,
    pub tag: UnitTag,
    pub movement: Movement,
    pub combat: CombatState,
}

/// Everything a building spawns with.
#[derive(Bundle)]
pub struct BuildingBundle {
    pub sim_id: SimId,
    pub owner: Owner,
    pub position: Position,
    pub prev_position: PrevPosition,
    pub health: Health,
    pub footprint: Footprint,
    pub building_type: BuildingType,
    pub tag: BuildingTag,
    pub state: BuildingState,
}

/// Neutral ore deposit.
#[derive(Bundle)]
pub struct OreBundle {
    pub sim_id: SimId,
    pub owner: Owner,
    pub position: Position,
    pub prev_position: PrevPosition,
    pub health: Health,
    pub footprint: Footprint,
    pub tag: OreTag,
}

/// Neutral well.
#[derive(Bundle)]
pub struct WellBundle {
    pub sim_id: SimId,
    pub owner: Owner,
    pub position: Position,
    pub prev_position: PrevPosition,
    pub health: Health,
    pub footprint: Footprint,
    pub tag: WellTag,
    pub state: WellState,
}

/// Neutral rock.
#[derive(Bundle)]
pub struct RockBundle {
    pub sim_id: SimId,
    pub owner: Owner,
    pub position: Position,
    pub prev_position: PrevPosition,
    pub health: Health,
    pub footprint: Footprint,
    pub tag: RockTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_and_heal_clamp() {
        let mut h = Health::new(100);
        h.damage(30);
        assert_eq!(h.current, 70);
        h.heal(500);
        assert_eq!(h.current, 100);
        h.damage(1000);
        assert!(!h.is_alive());
        // Healing (negative damage) never exceeds max.
        h.current = 90;
        h.damage(-50);
        assert_eq!(h.current, 100);
    }

    #[test]
    fn test_order_move_resets_path_state() {
        let mut m = Movement {
            path: Some(vec![Vec2::new(1.0, 1.0)]),
            path_idx: 3,
            best_dist_to_move_target: Some(12.0),
            ..Default::default()
        };
        m.order_move(Vec2::new(50.0, 50.0));
        assert!(m.path.is_none());
        assert_eq!(m.path_idx, 0);
        assert!(m.best_dist_to_move_target.is_none());
        assert_eq!(m.move_target, Some(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn test_air_base_slots() {
        let mut base = AirBase::with_slots(6);
        assert_eq!(base.free_slot(), Some(0));
        base.slots[0] = Some(SimId(9));
        assert_eq!(base.free_slot(), Some(1));
    }
}
