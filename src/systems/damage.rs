//! Damage application, capture resolution, building repair, detonations.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::math::Vec2;
use crate::players::Players;
use crate::rules::{ArmorClass, RulesCatalog, RulesRes, WeaponClass};
use crate::state::{CameraState, DamageQueue, IdIndex, SimTick};

/// Hp restored by one engineer repair touch.
const ENGINEER_REPAIR_AMOUNT: i32 = 150;
/// Chain-reaction bound for demo-truck explosions.
const MAX_DETONATION_WAVES: usize = 8;
/// Camera shake from a demolition blast.
const DETONATION_SHAKE: f32 = 12.0;
const DETONATION_SHAKE_TICKS: u32 = 18;

/// Drain the damage queue in emission order.
pub fn damage_apply_system(
    tick: Res<SimTick>,
    index: Res<IdIndex>,
    mut damage: ResMut<DamageQueue>,
    mut victims: Query<(&mut Health, Option<&mut CombatState>)>,
) {
    let events = std::mem::take(&mut damage.0);
    for event in events {
        let Some(entity) = index.get(event.target) else {
            continue;
        };
        let Ok((mut health, combat)) = victims.get_mut(entity) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }
        health.damage(event.amount);
        if event.amount > 0 {
            if let Some(mut c) = combat {
                c.flash = 5;
                if event.attacker_owner.is_some() {
                    c.last_attacker_id = event.attacker;
                    c.last_attacker_owner = event.attacker_owner;
                    c.last_damage_tick = Some(tick.0);
                }
            }
        }
    }
}

/// Resolve engineer captures, hijacks and engineer repairs.
///
/// Ownership of buildings changes only here. The capturing infantry is
/// consumed by a successful conversion.
pub fn capture_resolution_system(world: &mut World) {
    let mut intents: Vec<(SimId, Entity, PlayerId, Option<SimId>, Option<SimId>)> = {
        let mut q = world.query_filtered::<(Entity, &SimId, &Owner, &Health, &EngineerState), With<UnitTag>>();
        q.iter(world)
            .filter(|(_, _, _, h, eng)| {
                h.is_alive() && (eng.capture_target.is_some() || eng.repair_target.is_some())
            })
            .map(|(e, id, owner, _, eng)| (*id, e, owner.0, eng.capture_target, eng.repair_target))
            .collect()
    };
    intents.sort_by_key(|(id, ..)| *id);

    for (_, engineer_entity, new_owner, capture, repair) in intents {
        if let Some(target_id) = capture {
            let target = world.resource::<IdIndex>().get(target_id);
            let Some(target_entity) = target else {
                clear_intents(world, engineer_entity);
                continue;
            };
            let target_alive = world
                .get::<Health>(target_entity)
                .map(|h| h.is_alive())
                .unwrap_or(false);
            let target_owner = world.get::<Owner>(target_entity).map(|o| o.0);
            if target_alive && target_owner.map(|o| o >= 0 && o != new_owner).unwrap_or(false) {
                if let Some(mut owner) = world.get_mut::<Owner>(target_entity) {
                    owner.0 = new_owner;
                }
                if let Some(mut state) = world.get_mut::<BuildingState>(target_entity) {
                    state.is_repairing = false;
                }
                if let Some(mut combat) = world.get_mut::<CombatState>(target_entity) {
                    combat.target_id = None;
                }
                if let Some(mut movement) = world.get_mut::<Movement>(target_entity) {
                    movement.clear_move();
                }
                log::debug!("capture: entity {target_id:?} now owned by {new_owner}");
                // The converting infantry is spent.
                if let Some(mut health) = world.get_mut::<Health>(engineer_entity) {
                    health.current = 0;
                }
            }
            clear_intents(world, engineer_entity);
            continue;
        }
        if let Some(target_id) = repair {
            let target = world.resource::<IdIndex>().get(target_id);
            if let Some(target_entity) = target {
                let friendly = world.get::<Owner>(target_entity).map(|o| o.0) == Some(new_owner);
                if friendly {
                    if let Some(mut health) = world.get_mut::<Health>(target_entity) {
                        if health.is_alive() {
                            health.heal(ENGINEER_REPAIR_AMOUNT);
                        }
                    }
                }
            }
            clear_intents(world, engineer_entity);
        }
    }
}

fn clear_intents(world: &mut World, engineer_entity: Entity) {
    if let Some(mut eng) = world.get_mut::<EngineerState>(engineer_entity) {
        eng.capture_target = None;
        eng.repair_target = None;
    }
}

/// Buildings flagged `is_repairing` heal a fixed fraction per tick and
/// charge the owner for it; repairs stop when the wallet is empty.
pub fn building_repair_system(
    rules: Res<RulesRes>,
    mut players: ResMut<Players>,
    mut buildings: Query<
        (&SimId, &Owner, &BuildingType, &mut Health, &mut BuildingState),
        With<BuildingTag>,
    >,
) {
    let mut order: Vec<SimId> = buildings
        .iter()
        .filter(|(_, _, _, h, state)| h.is_alive() && state.is_repairing)
        .map(|(id, ..)| *id)
        .collect();
    order.sort_unstable();

    for want in order {
        for (id, owner, bt, mut health, mut state) in buildings.iter_mut() {
            if *id != want {
                continue;
            }
            let spec = rules.building(bt.0);
            let duration = rules.economy.repair_duration_ticks.max(1);
            let heal = (spec.hp / duration as i32).max(1);
            let cost_per_tick = f64::from(spec.cost)
                * f64::from(rules.economy.repair_cost_percentage)
                / f64::from(duration);
            let Some(p) = players.get_mut(owner.0) else {
                state.is_repairing = false;
                break;
            };
            if p.credits < cost_per_tick {
                state.is_repairing = false;
                break;
            }
            p.credits -= cost_per_tick;
            health.heal(heal);
            if health.current >= health.max {
                state.is_repairing = false;
            }
            break;
        }
    }
}

/// Service depots patch up friendly ground vehicles parked around them.
#[allow(clippy::type_complexity)]
pub fn depot_heal_system(
    rules: Res<RulesRes>,
    depots: Query<(&Owner, &Position, &BuildingType, &Health), With<BuildingTag>>,
    mut vehicles: Query<
        (&Owner, &Position, &UnitType, &mut Health),
        (With<UnitTag>, Without<BuildingTag>, Without<AirUnit>),
    >,
) {
    const DEPOT_RADIUS: f32 = 150.0;
    const DEPOT_HEAL: i32 = 3;

    let pads: Vec<(PlayerId, crate::math::Vec2)> = depots
        .iter()
        .filter(|(_, _, bt, h)| h.is_alive() && rules.building(bt.0).is_depot)
        .map(|(owner, pos, _, _)| (owner.0, pos.0))
        .collect();
    if pads.is_empty() {
        return;
    }

    for (owner, pos, ut, mut health) in vehicles.iter_mut() {
        if !health.is_alive() || health.current >= health.max {
            continue;
        }
        if rules.unit(ut.0).category != crate::rules::ProductionCategory::Vehicle {
            continue;
        }
        let on_pad = pads
            .iter()
            .any(|&(o, p)| o == owner.0 && p.distance_to(pos.0) <= DEPOT_RADIUS);
        if on_pad {
            health.heal(DEPOT_HEAL);
        }
    }
}

/// Explode newly dead demo trucks, chaining into others. The wave bound
/// guarantees termination.
pub fn demo_detonation_system(world: &mut World) {
    let rules = world.resource::<RulesRes>().clone();

    for _ in 0..MAX_DETONATION_WAVES {
        let mut bombs: Vec<(SimId, Entity, Vec2, i32, f32)> = {
            let mut q = world.query_filtered::<(Entity, &SimId, &Position, &UnitType, &Health, &DemoTruck), With<UnitTag>>();
            q.iter(world)
                .filter(|(_, _, _, _, h, truck)| !h.is_alive() && !truck.has_detonated)
                .map(|(e, id, pos, ut, _, _)| {
                    let spec = rules.unit(ut.0);
                    (*id, e, pos.0, spec.demolition_damage, spec.demolition_radius)
                })
                .collect()
        };
        if bombs.is_empty() {
            break;
        }
        bombs.sort_by_key(|(id, ..)| *id);

        for (_, bomb_entity, center, base_damage, radius) in bombs {
            if let Some(mut truck) = world.get_mut::<DemoTruck>(bomb_entity) {
                truck.has_detonated = true;
            }
            world
                .resource_mut::<CameraState>()
                .shake(DETONATION_SHAKE, DETONATION_SHAKE_TICKS);
            log::debug!("demolition blast at ({:.0},{:.0})", center.x, center.y);

            // Friendly fire included; resources, rocks and wells spared.
            let mut hits: Vec<(Entity, i32)> = Vec::new();
            {
                let mut q = world.query_filtered::<(
                    Entity,
                    &SimId,
                    &Position,
                    &Health,
                    Option<&UnitType>,
                    Option<&BuildingType>,
                ), Or<(With<UnitTag>, With<BuildingTag>)>>();
                for (entity, _, pos, health, ut, bt) in q.iter(world) {
                    if entity == bomb_entity || !health.is_alive() {
                        continue;
                    }
                    let dist = pos.0.distance_to(center);
                    if dist > radius {
                        continue;
                    }
                    let armor = match (ut, bt) {
                        (Some(ut), _) => rules.unit(ut.0).armor,
                        (None, Some(_)) => ArmorClass::Structure,
                        (None, None) => continue,
                    };
                    let amount = (base_damage as f32
                        * rules.damage_modifier(WeaponClass::Demolition, armor)
                        * RulesCatalog::splash_falloff(dist, radius))
                    .round() as i32;
                    if amount > 0 {
                        hits.push((entity, amount));
                    }
                }
            }
            for (entity, amount) in hits {
                if let Some(mut health) = world.get_mut::<Health>(entity) {
                    health.damage(amount);
                }
                if let Some(mut combat) = world.get_mut::<CombatState>(entity) {
                    combat.flash = 5;
                }
            }
        }
    }
}
