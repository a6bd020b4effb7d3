//! Entity construction helpers.
//!
//! All entity creation funnels through these functions so the id index stays
//! consistent and every kind gets its full component set.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::math::Vec2;
use crate::rules::{BuildingKey, RulesRes, UnitKey, UnitSpecial};
use crate::state::{IdAllocator, IdIndex, SimTick};

fn alloc_id(world: &mut World) -> SimId {
    world.resource_mut::<IdAllocator>().alloc()
}

fn register(world: &mut World, id: SimId, entity: Entity) {
    world.resource_mut::<IdIndex>().insert(id, entity);
}

/// Spawn a unit of the given rules key. Returns its public id.
pub fn spawn_unit(world: &mut World, owner: PlayerId, key: UnitKey, pos: Vec2) -> SimId {
    let rules = world.resource::<RulesRes>().clone();
    let spec = rules.unit(key);
    let id = alloc_id(world);
    let bundle = UnitBundle {
        sim_id: id,
        owner: Owner(owner),
        position: Position(pos),
        prev_position: PrevPosition(pos),
        health: Health::new(spec.hp),
        footprint: Footprint::round(spec.radius),
        unit_type: UnitType(key),
        tag: UnitTag,
        movement: Movement::default(),
        combat: CombatState::default(),
    };
    let special = spec.special;
    let is_air = spec.is_air;
    let ammo = spec.ammo;
    let entity = world.spawn(bundle).id();
    match special {
        UnitSpecial::Harvester => {
            world.entity_mut(entity).insert(Harvester::default());
        }
        UnitSpecial::Engineer | UnitSpecial::Hijacker => {
            world.entity_mut(entity).insert(EngineerState::default());
        }
        UnitSpecial::DemoTruck => {
            world.entity_mut(entity).insert(DemoTruck::default());
        }
        _ => {}
    }
    if is_air {
        world.entity_mut(entity).insert(AirUnit {
            ammo,
            max_ammo: ammo,
            state: AirState::Flying,
            home_base: None,
            docked_slot: None,
        });
    }
    register(world, id, entity);
    id
}

/// Spawn a building of the given rules key. Returns its public id.
pub fn spawn_building(world: &mut World, owner: PlayerId, key: BuildingKey, pos: Vec2) -> SimId {
    let rules = world.resource::<RulesRes>().clone();
    let spec = rules.building(key);
    let id = alloc_id(world);
    let tick = world.resource::<SimTick>().0;
    let bundle = BuildingBundle {
        sim_id: id,
        owner: Owner(owner),
        position: Position(pos),
        prev_position: PrevPosition(pos),
        health: Health::new(spec.hp),
        footprint: Footprint::rect(spec.w, spec.h),
        building_type: BuildingType(key),
        tag: BuildingTag,
        state: BuildingState {
            is_repairing: false,
            placed_tick: tick,
        },
    };
    let has_weapon = spec.weapon.is_some();
    let air_slots = spec.air_slots;
    let entity = world.spawn(bundle).id();
    if has_weapon {
        world.entity_mut(entity).insert(CombatState::default());
    }
    if air_slots > 0 {
        world.entity_mut(entity).insert(AirBase::with_slots(air_slots));
    }
    register(world, id, entity);
    id
}

/// Spawn a neutral ore deposit holding `amount` extractable credits.
pub fn spawn_ore(world: &mut World, pos: Vec2, amount: i32, max_amount: i32) -> SimId {
    let id = alloc_id(world);
    let entity = world
        .spawn(OreBundle {
            sim_id: id,
            owner: Owner(NEUTRAL),
            position: Position(pos),
            prev_position: PrevPosition(pos),
            health: Health {
                current: amount,
                max: max_amount,
            },
            footprint: Footprint::round(14.0),
            tag: OreTag,
        })
        .id();
    register(world, id, entity);
    id
}

/// Spawn a neutral well. Its first ore spawn is scheduled by the well phase.
pub fn spawn_well(world: &mut World, pos: Vec2) -> SimId {
    let id = alloc_id(world);
    let entity = world
        .spawn(WellBundle {
            sim_id: id,
            owner: Owner(NEUTRAL),
            position: Position(pos),
            prev_position: PrevPosition(pos),
            health: Health::new(1000),
            footprint: Footprint::rect(48.0, 48.0),
            tag: WellTag,
            state: WellState::default(),
        })
        .id();
    register(world, id, entity);
    id
}

/// Spawn a neutral rock obstacle.
pub fn spawn_rock(world: &mut World, pos: Vec2, radius: f32) -> SimId {
    let id = alloc_id(world);
    let entity = world
        .spawn(RockBundle {
            sim_id: id,
            owner: Owner(NEUTRAL),
            position: Position(pos),
            prev_position: PrevPosition(pos),
            health: Health::new(10_000),
            footprint: Footprint::rect(radius * 2.0, radius * 2.0),
            tag: RockTag,
        })
        .id();
    register(world, id, entity);
    id
}

/// Resolve a public id to its live entity, if any.
pub fn resolve_live(world: &World, id: SimId) -> Option<Entity> {
    let entity = world.resource::<IdIndex>().get(id)?;
    let health = world.get::<Health>(entity)?;
    health.is_alive().then_some(entity)
}
