//! Ironvein - Deterministic RTS Simulation Core
//!
//! A deterministic, tick-based simulation and AI engine for a
//! real-time-strategy game. Uses `bevy_ecs` for the entity-component-system
//! architecture. Rendering, input and audio live outside the crate and talk
//! to it through [`Action`]s and [`Snapshot`]s.

pub mod actions;
pub mod ai;
pub mod api;
pub mod components;
pub mod math;
pub mod nav;
pub mod players;
pub mod projectile;
pub mod rng;
pub mod rules;
pub mod spatial;
pub mod spawn;
pub mod state;
pub mod systems;
pub mod world;

pub use actions::Action;
pub use api::{SimWorld, SimWorldConfig};
pub use components::{PlayerId, SimId};
pub use math::Vec2;
pub use players::{Difficulty, PlayerState, Players};
pub use rules::{ProductionCategory, RulesCatalog};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use state::{GameMode, GameStatus, Outcome};
pub use world::Snapshot;
