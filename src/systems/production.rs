//! Production phase: queue funding, progress, and completion spawning.
//!
//! Pay-as-you-go: each tick a lane pays `cost / build_ticks`, scaled by the
//! extra-production speedup and the power factor, capped by the credits on
//! hand. Progress follows the money, so an empty wallet pauses production
//! without cancelling it.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::players::{Players, SpecRef};
use crate::rng::SimRng;
use crate::rules::{ProductionCategory, RulesRes, UnitSpecial};
use crate::spawn::spawn_unit;
use crate::state::SimTick;

/// Offset below a production building where fresh units appear.
const SPAWN_OFFSET: f32 = 30.0;
/// Random scatter applied to spawn positions.
const SPAWN_JITTER: f32 = 10.0;

#[derive(Default)]
struct Holdings {
    power_generated: i32,
    power_drain: i32,
    /// Per category: count and lowest-id building position/height.
    production: [(u32, Option<(SimId, Vec2, f32)>); 4],
    buildings: u32,
    mcvs: u32,
}

fn collect_holdings(world: &mut World) -> HashMap<PlayerId, Holdings> {
    let rules = world.resource::<RulesRes>().clone();
    let mut holdings: HashMap<PlayerId, Holdings> = HashMap::new();

    let mut buildings =
        world.query_filtered::<(&SimId, &Owner, &Position, &BuildingType, &Health), With<BuildingTag>>();
    for (id, owner, pos, bt, health) in buildings.iter(world) {
        if owner.is_neutral() || !health.is_alive() {
            continue;
        }
        let spec = rules.building(bt.0);
        let entry = holdings.entry(owner.0).or_default();
        entry.buildings += 1;
        entry.power_generated += spec.power.max(0);
        entry.power_drain += (-spec.power).max(0);
        if let Some(category) = spec.produces {
            let slot = &mut entry.production[category.index()];
            slot.0 += 1;
            let candidate = (*id, pos.0, spec.h);
            match slot.1 {
                Some((existing, _, _)) if existing <= *id => {}
                _ => slot.1 = Some(candidate),
            }
        }
    }

    let mut units = world.query_filtered::<(&Owner, &UnitType, &Health), With<UnitTag>>();
    for (owner, ut, health) in units.iter(world) {
        if owner.is_neutral() || !health.is_alive() {
            continue;
        }
        if rules.unit(ut.0).special == UnitSpecial::Mcv {
            holdings.entry(owner.0).or_default().mcvs += 1;
        }
    }

    holdings
}

/// Does the spec's prerequisite list resolve against the player's holdings?
fn prereqs_standing(
    world: &mut World,
    player: PlayerId,
    prereqs: &[String],
) -> bool {
    let rules = world.resource::<RulesRes>().clone();
    let mut query =
        world.query_filtered::<(&Owner, &BuildingType, &Health), With<BuildingTag>>();
    prereqs.iter().all(|p| {
        let Some(key) = rules.building_key(p) else {
            return false;
        };
        query
            .iter(world)
            .any(|(o, bt, h)| o.0 == player && bt.0 == key && h.is_alive())
    })
}

/// Advance all four production lanes of every player, spawning completions.
pub fn production_system(world: &mut World) {
    let rules = world.resource::<RulesRes>().clone();
    let holdings = collect_holdings(world);
    let player_ids: Vec<PlayerId> = world.resource::<Players>().0.iter().map(|p| p.id).collect();

    for player_id in player_ids {
        let empty = Holdings::default();
        let own = holdings.get(&player_id).unwrap_or(&empty);

        // A player with no buildings and no MCV has nothing left to build
        // with: void the queues without refund. (The entity wipe itself is
        // the elimination phase's job.)
        if own.buildings == 0 && own.mcvs == 0 {
            if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
                for queue in &mut p.queues {
                    queue.void(false);
                }
                p.ready_to_place = None;
            }
            continue;
        }

        if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
            p.power_generated = own.power_generated;
            p.power_drain = own.power_drain;
        }

        for category in ProductionCategory::ALL {
            advance_lane(world, player_id, category, own, &rules);
        }
    }
}

fn advance_lane(
    world: &mut World,
    player_id: PlayerId,
    category: ProductionCategory,
    own: &Holdings,
    rules: &crate::rules::RulesRes,
) {
    let Some(active) = world
        .resource::<Players>()
        .get(player_id)
        .and_then(|p| p.queue(category).current)
    else {
        return;
    };

    // Re-verify the item can still be built; tech can be destroyed mid-build.
    let (prereqs, cost, build_ticks) = match active.item {
        SpecRef::Unit(k) => {
            let s = rules.unit(k);
            (s.prerequisites.clone(), s.cost, s.build_ticks)
        }
        SpecRef::Building(k) => {
            let s = rules.building(k);
            (s.prerequisites.clone(), s.cost, s.build_ticks)
        }
    };
    let lane_count = own.production[category.index()].0;
    let lane_ok = lane_count > 0;
    if !lane_ok || !prereqs_standing(world, player_id, &prereqs) {
        if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
            let refund = p.queue_mut(category).void(true);
            p.credits += refund;
        }
        return;
    }

    // Buildings hold at 100% until the pending one is placed.
    if category == ProductionCategory::Building {
        let blocked = world
            .resource::<Players>()
            .get(player_id)
            .map(|p| p.ready_to_place.is_some())
            .unwrap_or(false);
        if blocked {
            return;
        }
    }

    let low_power_factor = rules.economy.low_power_factor;
    let speedup = rules.economy.extra_production_speedup;
    let mut completed: Option<SpecRef> = None;
    if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
        let speed_multiplier = 1.0 + speedup * (lane_count.saturating_sub(1)) as f32;
        let power_factor = p.power_factor(low_power_factor);
        let cost_per_tick =
            f64::from(cost) / f64::from(build_ticks.max(1)) * f64::from(speed_multiplier * power_factor);
        let cost_f = f64::from(cost.max(1));
        // Never invest past the full price; the last tick pays the remainder.
        let outstanding = p
            .queue(category)
            .current
            .map(|a| (cost_f - a.invested).max(0.0))
            .unwrap_or(0.0);
        let pay = cost_per_tick.min(p.credits).min(outstanding).max(0.0);
        let queue = p.queue_mut(category);
        if let Some(active) = queue.current.as_mut() {
            active.invested += pay;
            active.progress += (100.0 * pay / cost_f) as f32;
            if active.progress >= 100.0 || active.invested >= cost_f - 1e-6 {
                completed = Some(active.item);
                queue.current = None;
                queue.advance_from_backlog();
            }
        }
        p.credits -= pay;
    }

    let Some(item) = completed else {
        return;
    };
    match item {
        SpecRef::Building(key) => {
            if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
                p.ready_to_place = Some(key);
            }
        }
        SpecRef::Unit(key) => {
            let spawn_at = own.production[category.index()]
                .1
                .or(own.production[ProductionCategory::Building.index()].1);
            let Some((_, base_pos, base_h)) = spawn_at else {
                return;
            };
            let jitter = world.resource_mut::<SimRng>().jitter(SPAWN_JITTER);
            let pos = base_pos + Vec2::new(0.0, base_h * 0.5 + SPAWN_OFFSET) + jitter;
            let id = spawn_unit(world, player_id, key, pos);
            if rules.unit(key).is_air {
                dock_new_air_unit(world, player_id, id);
            }
        }
    }
}

/// Try to dock a freshly built air unit into an owned air base with a free
/// slot; otherwise it simply starts airborne.
fn dock_new_air_unit(world: &mut World, player_id: PlayerId, unit_id: SimId) {
    let mut bases =
        world.query_filtered::<(&SimId, &Owner, &Position, &Health, &mut AirBase), With<BuildingTag>>();
    let mut chosen: Option<(SimId, Vec2, u32)> = None;
    for (id, owner, pos, health, base) in bases.iter(world) {
        if owner.0 != player_id || !health.is_alive() {
            continue;
        }
        if let Some(slot) = base.free_slot() {
            match chosen {
                Some((existing, _, _)) if existing <= *id => {}
                _ => chosen = Some((*id, pos.0, slot)),
            }
        }
    }
    let Some((base_id, base_pos, slot)) = chosen else {
        return;
    };
    for (id, _, _, _, mut base) in bases.iter_mut(world) {
        if *id == base_id {
            base.slots[slot as usize] = Some(unit_id);
            break;
        }
    }
    let entity = world.resource::<crate::state::IdIndex>().get(unit_id);
    if let Some(entity) = entity {
        if let Some(mut air) = world.get_mut::<AirUnit>(entity) {
            air.state = AirState::Docked;
            air.home_base = Some(base_id);
            air.docked_slot = Some(slot);
        }
        if let Some(mut pos) = world.get_mut::<Position>(entity) {
            pos.0 = base_pos;
        }
    }
}

/// Notification decay runs just before production each tick.
pub fn notification_decay_system(world: &mut World) {
    let tick = world.resource::<SimTick>().0;
    let window = world.resource::<crate::state::SimConfig>().notification_ticks;
    let mut note = world.resource_mut::<crate::state::ActiveNotification>();
    if let Some(n) = &note.0 {
        if tick.saturating_sub(n.tick) > window {
            note.0 = None;
        }
    }
}
