//! Reducer systems for the Ironvein simulation.
//!
//! One tick is a single chained schedule; the phase order below is fixed and
//! load-bearing (damage applies after all shooting, repairs after damage,
//! the win check last).
//!
//! | # | System | Reads | Writes |
//! |---|--------|-------|--------|
//! | 1 | `spatial_grid_update_system` | Position, Owner, Footprint, Health | SpatialGrid |
//! | 2 | `nav_grid_refresh_system` | Position, Footprint (statics, units) | NavGrid |
//! | 3 | `notification_decay_system` | SimTick | ActiveNotification |
//! | 4 | `production_system` | Players, buildings | Players, spawns units |
//! | 5 | `wells_system` | wells, ore, SpatialGrid | ore hp, spawns ore, credits |
//! | 6 | `harvester_behavior_system` | grid, ore, refineries | Harvester, Movement, CombatState, credits |
//! | 7 | `combat_unit_behavior_system` | grid, target views | Movement, CombatState, EngineerState, projectiles |
//! | 8 | `demo_truck_behavior_system` | target positions | Movement, DemoTruck, Health |
//! | 9 | `air_base_system` | AirBase slots | AirUnit ammo |
//! | 10 | `air_unit_behavior_system` | ground targets, bases | AirUnit, Movement, CombatState |
//! | 11 | `defense_building_system` | grid, projectiles | CombatState, projectiles |
//! | 12 | `steering_system` | grid, NavGrid | Movement (vel, path) |
//! | 13 | `movement_integration_system` | Movement | Position, PrevPosition, cooldowns |
//! | 14 | `turret_tracking_system` | Position | CombatState turret |
//! | 15 | `collision_resolution_system` | grid, statics | Position |
//! | 16 | `projectile_system` | positions, armor | ProjectilePool, DamageQueue |
//! | 17 | `damage_apply_system` | DamageQueue | Health, CombatState |
//! | 18 | `capture_resolution_system` | EngineerState | Owner, Health |
//! | 19 | `building_repair_system` | Players | Health, BuildingState, credits |
//! | 20 | `depot_heal_system` | depots | vehicle Health |
//! | 21 | `demo_detonation_system` | DemoTruck | Health, CameraState |
//! | 22 | `elimination_system` | Players, holdings | Players, GameStatus, Health |
//! | 23 | `cleanup_system` | Health | despawns, IdIndex, UiState, CameraState |

pub mod air;
pub mod cleanup;
pub mod collision;
pub mod combat;
pub mod damage;
pub mod harvester;
pub mod movement;
pub mod production;
pub mod projectiles;
pub mod wells;

pub use air::{air_base_system, air_unit_behavior_system};
pub use cleanup::{cleanup_system, elimination_system};
pub use collision::collision_resolution_system;
pub use combat::{combat_unit_behavior_system, defense_building_system, demo_truck_behavior_system};
pub use damage::{
    building_repair_system, capture_resolution_system, damage_apply_system, demo_detonation_system,
    depot_heal_system,
};
pub use harvester::harvester_behavior_system;
pub use movement::{movement_integration_system, steering_system, turret_tracking_system};
pub use production::{notification_decay_system, production_system};
pub use projectiles::projectile_system;
pub use wells::wells_system;
