//! Global simulation state resources.
//!
//! Everything here is owned by the ECS `World` so a whole simulation is one
//! self-contained value; nothing module-level, nothing shared between runs.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::components::{PlayerId, SimId};

/// Global simulation tick counter, incremented once per `tick()`.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Top-level run mode. Win/elimination checks only run in `Game` and `Demo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Game,
    /// AI-vs-AI showcase; same rules as `Game`.
    Demo,
    /// Free play without win conditions.
    Sandbox,
}

/// Final result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Player(PlayerId),
    Draw,
}

/// Whether the simulation is running and how it ended.
#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameStatus {
    pub running: bool,
    pub mode: GameMode,
    pub winner: Option<Outcome>,
}

impl Default for GameStatus {
    fn default() -> Self {
        Self {
            running: true,
            mode: GameMode::Game,
            winner: None,
        }
    }
}

/// Camera position and shake state (consumed by the renderer).
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub shake_intensity: f32,
    pub shake_duration: u32,
}

impl CameraState {
    pub fn shake(&mut self, intensity: f32, duration: u32) {
        if intensity > self.shake_intensity {
            self.shake_intensity = intensity;
        }
        self.shake_duration = self.shake_duration.max(duration);
    }
}

/// A short user-facing message with the tick it was raised on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub tick: u64,
}

/// At most one active notification; old ones decay after a fixed window.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveNotification(pub Option<Notification>);

impl ActiveNotification {
    pub fn raise(&mut self, text: impl Into<String>, tick: u64) {
        self.0 = Some(Notification {
            text: text.into(),
            tick,
        });
    }
}

/// UI-facing flags mirrored in the state so snapshots are complete.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiState {
    pub selection: Vec<SimId>,
    pub sell_mode: bool,
    pub repair_mode: bool,
    /// Building key the local player is currently placing.
    pub placing_building: Option<String>,
    pub debug_overlay: bool,
    pub minimap: bool,
}

/// Map dimensions and generation densities.
#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: f32,
    pub height: f32,
    pub resource_density: f32,
    pub rock_density: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 2400.0,
            height: 1800.0,
            resource_density: 1.0,
            rock_density: 1.0,
        }
    }
}

/// Engine tuning knobs.
#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for the deterministic RNG.
    pub seed: u64,
    /// Full AI plans run when `tick % stagger == player_id % stagger`.
    pub ai_stagger_interval: u64,
    /// Ticks an active notification stays visible.
    pub notification_ticks: u64,
    /// Relaxation passes of the unit collision resolver.
    pub collision_passes: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ai_stagger_interval: 8,
            notification_ticks: 180,
            collision_passes: 4,
        }
    }
}

/// Allocates stable public entity ids.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn alloc(&mut self) -> SimId {
        let id = SimId(self.next);
        self.next += 1;
        id
    }
}

/// Maps public [`SimId`]s to ECS entities. Maintained by the spawn helpers
/// and the cleanup phase.
#[derive(Resource, Debug, Default)]
pub struct IdIndex {
    map: HashMap<SimId, Entity>,
}

impl IdIndex {
    pub fn insert(&mut self, id: SimId, entity: Entity) {
        let prev = self.map.insert(id, entity);
        debug_assert!(prev.is_none(), "duplicate sim id {id:?}");
    }

    pub fn remove(&mut self, id: SimId) {
        self.map.remove(&id);
    }

    pub fn get(&self, id: SimId) -> Option<Entity> {
        self.map.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// One pending damage application, already modified for armor and splash.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: SimId,
    /// Negative amounts heal.
    pub amount: i32,
    pub attacker: Option<SimId>,
    pub attacker_owner: Option<PlayerId>,
}

/// Damage collected during the behavior/projectile phases and applied in the
/// damage phase, in emission order.
#[derive(Resource, Debug, Default)]
pub struct DamageQueue(pub Vec<DamageEvent>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocator_is_monotone() {
        let mut alloc = IdAllocator::default();
        let a = alloc.alloc();
        let b = alloc.alloc();
        assert!(b > a);
    }

    #[test]
    fn test_camera_shake_takes_maximum() {
        let mut cam = CameraState::default();
        cam.shake(5.0, 20);
        cam.shake(2.0, 40);
        assert_eq!(cam.shake_intensity, 5.0);
        assert_eq!(cam.shake_duration, 40);
    }

    #[test]
    fn test_notification_overwrites() {
        let mut n = ActiveNotification::default();
        n.raise("first", 1);
        n.raise("second", 2);
        assert_eq!(n.0.as_ref().unwrap().text, "second");
    }
}
