//! Well phase: ore growth, ore spawning, and extractor trickle income.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::math::Vec2;
use crate::players::Players;
use crate::rng::SimRng;
use crate::rules::RulesRes;
use crate::spatial::{EntryKind, SpatialGrid};
use crate::spawn::spawn_ore;
use crate::state::SimTick;

/// Spread positions attempted per spawn window.
const SPAWN_ATTEMPTS: usize = 8;
/// Retry delay after a fully blocked attempt window.
const BLOCKED_RETRY_TICKS: u64 = 30;
/// How close an extractor must be to a live well to earn.
const EXTRACTOR_WELL_RANGE: f32 = 60.0;

/// Grow or spawn ore around every well, deterministically in well-id order.
pub fn wells_system(world: &mut World) {
    let rules = world.resource::<RulesRes>().clone();
    let tick = world.resource::<SimTick>().0;
    let well_rules = rules.well.clone();

    // Snapshot wells sorted by id.
    let mut wells: Vec<(Entity, SimId, Vec2, f32)> = {
        let mut q = world.query_filtered::<(Entity, &SimId, &Position, &Footprint, &Health), With<WellTag>>();
        q.iter(world)
            .filter(|(_, _, _, _, h)| h.is_alive())
            .map(|(e, id, p, f, _)| (e, *id, p.0, f.radius))
            .collect()
    };
    wells.sort_by_key(|(_, id, _, _)| *id);

    for (well_entity, _, well_pos, well_radius) in wells {
        // Nearby ore, lowest id first.
        let nearby_ore: Vec<(SimId, Entity, i32)> = {
            let grid = world.resource::<SpatialGrid>();
            let mut entries = grid.query_radius_kind(
                well_pos.x,
                well_pos.y,
                well_rules.ore_spawn_radius,
                EntryKind::Ore,
            );
            entries.sort_by_key(|e| e.id);
            entries
                .iter()
                .filter_map(|e| {
                    world
                        .get::<Health>(e.entity)
                        .filter(|h| h.is_alive())
                        .map(|h| (e.id, e.entity, h.current))
                })
                .collect()
        };
        let ore_count = nearby_ore.len();

        // Heal at most one non-full deposit per tick (lowest id).
        let grew = nearby_ore
            .iter()
            .find(|(_, entity, current)| {
                world
                    .get::<Health>(*entity)
                    .map(|h| *current < h.max)
                    .unwrap_or(false)
            })
            .map(|(_, entity, _)| *entity);
        if let Some(ore_entity) = grew {
            if let Some(mut h) = world.get_mut::<Health>(ore_entity) {
                h.heal(well_rules.ore_growth_rate);
            }
            continue;
        }

        let due = {
            let state = world.get::<WellState>(well_entity);
            state.map(|s| tick >= s.next_spawn_tick).unwrap_or(false)
        };
        if !due || ore_count >= well_rules.max_ore_per_well {
            if let Some(mut state) = world.get_mut::<WellState>(well_entity) {
                state.current_ore_count = ore_count as u32;
            }
            continue;
        }

        // Try a handful of spread-out positions inside the spawn radius.
        let mut spawned_at: Option<Vec2> = None;
        for _ in 0..SPAWN_ATTEMPTS {
            let (angle, dist) = {
                let mut rng = world.resource_mut::<SimRng>();
                (
                    rng.heading(),
                    rng.range_f32(well_radius + 20.0, well_rules.ore_spawn_radius),
                )
            };
            let candidate = well_pos + Vec2::from_angle(angle) * dist;
            if position_clear_for_ore(world, candidate) {
                spawned_at = Some(candidate);
                break;
            }
        }

        match spawned_at {
            Some(pos) => {
                spawn_ore(
                    world,
                    pos,
                    well_rules.initial_ore_amount,
                    well_rules.max_ore_amount,
                );
                let next = {
                    let mut rng = world.resource_mut::<SimRng>();
                    tick + rng.range_u64(well_rules.spawn_rate_ticks_min, well_rules.spawn_rate_ticks_max)
                };
                if let Some(mut state) = world.get_mut::<WellState>(well_entity) {
                    state.is_blocked = false;
                    state.next_spawn_tick = next;
                    state.total_spawned += 1;
                    state.current_ore_count = ore_count as u32 + 1;
                }
            }
            None => {
                if let Some(mut state) = world.get_mut::<WellState>(well_entity) {
                    state.is_blocked = true;
                    state.next_spawn_tick = tick + BLOCKED_RETRY_TICKS;
                    state.current_ore_count = ore_count as u32;
                }
            }
        }
    }

    extractor_income(world, tick);
}

/// Ore may not spawn under units, buildings, rocks or other ore.
fn position_clear_for_ore(world: &World, pos: Vec2) -> bool {
    const ORE_RADIUS: f32 = 14.0;
    let grid = world.resource::<SpatialGrid>();
    grid.query_radius(pos.x, pos.y, ORE_RADIUS + 30.0)
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EntryKind::Unit | EntryKind::Building | EntryKind::Rock | EntryKind::Ore | EntryKind::Well
            )
        })
        .all(|e| e.dist_sq(pos.x, pos.y) > (e.radius + ORE_RADIUS) * (e.radius + ORE_RADIUS))
}

/// Extractors trickle credits to their owner while a live well is in range.
fn extractor_income(world: &mut World, tick: u64) {
    let rules = world.resource::<RulesRes>().clone();
    if tick == 0 || tick % rules.economy.extractor_interval != 0 {
        return;
    }
    let mut earners: Vec<PlayerId> = Vec::new();
    {
        let mut q = world
            .query_filtered::<(&Owner, &Position, &BuildingType, &Health), With<BuildingTag>>();
        let grid = world.resource::<SpatialGrid>();
        for (owner, pos, bt, health) in q.iter(world) {
            if owner.is_neutral() || !health.is_alive() || !rules.building(bt.0).is_extractor {
                continue;
            }
            let well_alive = grid
                .query_radius_kind(pos.0.x, pos.0.y, EXTRACTOR_WELL_RANGE, EntryKind::Well)
                .into_iter()
                .next()
                .is_some();
            if well_alive {
                earners.push(owner.0);
            }
        }
    }
    earners.sort_unstable();
    let trickle = f64::from(rules.economy.extractor_trickle);
    let mut players = world.resource_mut::<Players>();
    for owner in earners {
        if let Some(p) = players.get_mut(owner) {
            p.credits += trickle;
        }
    }
}
