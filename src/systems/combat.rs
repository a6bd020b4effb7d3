//! Combat behavior: target acquisition, chasing, firing, contact specials.
//!
//! Collect-then-apply: a read-only view of every potential target is built
//! first, then units are processed in id order. All damage flows through
//! projectiles and the damage queue; nothing loses hp directly here except
//! a demo truck arming itself.

use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::projectile::{Projectile, ProjectilePool};
use crate::rules::{ProductionCategory, RulesRes, UnitSpecial, WeaponSpec};
use crate::spatial::SpatialGrid;

/// Extra scan distance beyond weapon range for auto-acquisition.
const ACQUIRE_BUFFER: f32 = 60.0;
/// Scan distance for unarmed specialists (engineer, hijacker).
const SPECIALIST_SCAN: f32 = 260.0;
/// Contact slack for capture/repair touches.
const CONTACT_SLACK: f32 = 6.0;
/// Engineer repair pacing.
const ENGINEER_REPAIR_COOLDOWN: u32 = 50;

/// Read-only view of a potential target.
#[derive(Debug, Clone, Copy)]
pub struct TargetView {
    pub pos: Vec2,
    pub radius: f32,
    pub owner: PlayerId,
    pub is_building: bool,
    pub is_air: bool,
    pub is_vehicle: bool,
    pub damaged: bool,
}

/// Can this weapon engage that target?
fn weapon_can_hit(weapon: &WeaponSpec, target: &TargetView) -> bool {
    if target.is_air {
        weapon.targets_air
    } else {
        weapon.targets_ground
    }
}

fn fire(
    pool: &mut ProjectilePool,
    weapon: &WeaponSpec,
    owner: PlayerId,
    shooter: SimId,
    from: Vec2,
    target_id: SimId,
    target: &TargetView,
) {
    pool.spawn(Projectile::from_weapon(
        weapon,
        owner,
        Some(shooter),
        from,
        target_id,
        target.pos,
    ));
}

fn build_target_views<F: QueryFilter>(
    units: &Query<(&SimId, &Position, &Footprint, &Owner, &UnitType, &Health, Option<&AirUnit>), With<UnitTag>>,
    buildings: &Query<(&SimId, &Position, &Footprint, &Owner, &BuildingType, &Health), F>,
    rules: &RulesRes,
) -> HashMap<SimId, TargetView> {
    let mut views = HashMap::new();
    for (id, pos, footprint, owner, ut, health, air) in units.iter() {
        if !health.is_alive() {
            continue;
        }
        let spec = rules.unit(ut.0);
        views.insert(
            *id,
            TargetView {
                pos: pos.0,
                radius: footprint.radius,
                owner: owner.0,
                is_building: false,
                is_air: air.is_some(),
                is_vehicle: spec.category == ProductionCategory::Vehicle,
                damaged: health.current < health.max,
            },
        );
    }
    for (id, pos, footprint, owner, _, health) in buildings.iter() {
        if !health.is_alive() {
            continue;
        }
        views.insert(
            *id,
            TargetView {
                pos: pos.0,
                radius: footprint.radius,
                owner: owner.0,
                is_building: true,
                is_air: false,
                is_vehicle: false,
                damaged: health.current < health.max,
            },
        );
    }
    views
}

#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn combat_unit_behavior_system(
    rules: Res<RulesRes>,
    grid: Res<SpatialGrid>,
    mut pool: ResMut<ProjectilePool>,
    mut movers: Query<
        (
            Entity,
            &SimId,
            &Owner,
            &Position,
            &Footprint,
            &UnitType,
            &Health,
            &mut Movement,
            &mut CombatState,
            Option<&mut EngineerState>,
        ),
        (With<UnitTag>, Without<AirUnit>, Without<Harvester>, Without<DemoTruck>),
    >,
    units_info: Query<(&SimId, &Position, &Footprint, &Owner, &UnitType, &Health, Option<&AirUnit>), With<UnitTag>>,
    buildings_info: Query<(&SimId, &Position, &Footprint, &Owner, &BuildingType, &Health), With<BuildingTag>>,
) {
    let targets = build_target_views(&units_info, &buildings_info, &rules);

    let mut order: Vec<(SimId, Entity)> = movers
        .iter()
        .filter(|(_, _, _, _, _, _, h, ..)| h.is_alive())
        .map(|(e, id, ..)| (*id, e))
        .collect();
    order.sort_by_key(|(id, _)| *id);

    for (id, entity) in order {
        let Ok((_, _, owner, pos, footprint, ut, _, mut m, mut c, engineer)) =
            movers.get_mut(entity)
        else {
            continue;
        };
        let owner = owner.0;
        let pos = pos.0;
        let spec = rules.unit(ut.0);
        let weapon = rules.unit_weapon(ut.0);
        let special = spec.special;

        // Drop stale references before anything else.
        if let Some(tid) = c.target_id {
            if !targets.contains_key(&tid) {
                c.target_id = None;
            }
        }

        // Auto-acquire.
        let can_engage = weapon.is_some()
            || matches!(special, UnitSpecial::Engineer | UnitSpecial::Hijacker);
        if c.target_id.is_none() && can_engage && (m.move_target.is_none() || m.attack_move) {
            let scan = match &weapon {
                Some(w) => w.range + ACQUIRE_BUFFER,
                None => SPECIALIST_SCAN,
            };
            c.target_id = acquire_target(&grid, &targets, id, owner, pos, scan, special, weapon);
        }

        let Some(tid) = c.target_id else {
            continue;
        };
        let Some(target) = targets.get(&tid).copied() else {
            continue;
        };
        let dist = pos.distance_to(target.pos);

        match special {
            UnitSpecial::Engineer => {
                let contact = footprint.radius + target.radius + CONTACT_SLACK;
                if dist <= contact {
                    m.clear_move();
                    if let Some(mut eng) = engineer {
                        if target.is_building && target.owner >= 0 && target.owner != owner {
                            eng.capture_target = Some(tid);
                        } else if target.is_building && target.owner == owner && target.damaged {
                            if c.cooldown == 0 {
                                eng.repair_target = Some(tid);
                                c.cooldown = ENGINEER_REPAIR_COOLDOWN;
                            }
                        } else {
                            c.target_id = None;
                        }
                    }
                } else {
                    ensure_move(&mut m, target.pos);
                }
            }
            UnitSpecial::Hijacker => {
                let contact = footprint.radius + target.radius + CONTACT_SLACK;
                if dist <= contact {
                    m.clear_move();
                    if let Some(mut eng) = engineer {
                        if target.is_vehicle && !target.is_building && target.owner >= 0 && target.owner != owner {
                            eng.capture_target = Some(tid);
                        } else {
                            c.target_id = None;
                        }
                    }
                } else {
                    ensure_move(&mut m, target.pos);
                }
            }
            _ => {
                let Some(weapon) = weapon else {
                    c.target_id = None;
                    continue;
                };
                if !weapon_can_hit(weapon, &target) {
                    c.target_id = None;
                    continue;
                }
                if dist <= weapon.range + target.radius {
                    // Kiting-capable units keep their move order while firing.
                    if !spec.attack_while_moving {
                        m.clear_move();
                    }
                    if c.cooldown == 0 {
                        fire(&mut pool, weapon, owner, id, pos, tid, &target);
                        c.cooldown = weapon.cooldown;
                    }
                } else {
                    ensure_move(&mut m, target.pos);
                }
            }
        }
    }
}

/// Pick a target per the unit's role. Grid results arrive nearest-first.
#[allow(clippy::too_many_arguments)]
fn acquire_target(
    grid: &SpatialGrid,
    targets: &HashMap<SimId, TargetView>,
    self_id: SimId,
    owner: PlayerId,
    pos: Vec2,
    scan: f32,
    special: UnitSpecial,
    weapon: Option<&WeaponSpec>,
) -> Option<SimId> {
    let healer = weapon.map(|w| w.damage < 0).unwrap_or(false);
    let nearby = grid.query_radius(pos.x, pos.y, scan);

    if healer {
        return nearby.iter().find_map(|e| {
            let t = targets.get(&e.id)?;
            (e.id != self_id && t.owner == owner && !t.is_building && t.damaged).then_some(e.id)
        });
    }
    match special {
        UnitSpecial::Engineer => {
            let capture = nearby.iter().find_map(|e| {
                let t = targets.get(&e.id)?;
                (t.is_building && t.owner >= 0 && t.owner != owner).then_some(e.id)
            });
            capture.or_else(|| {
                nearby.iter().find_map(|e| {
                    let t = targets.get(&e.id)?;
                    (t.is_building && t.owner == owner && t.damaged).then_some(e.id)
                })
            })
        }
        UnitSpecial::Hijacker => nearby.iter().find_map(|e| {
            let t = targets.get(&e.id)?;
            (t.is_vehicle && !t.is_building && t.owner >= 0 && t.owner != owner && !t.is_air)
                .then_some(e.id)
        }),
        _ => {
            let weapon = weapon?;
            nearby.iter().find_map(|e| {
                let t = targets.get(&e.id)?;
                (e.id != self_id && t.owner >= 0 && t.owner != owner && weapon_can_hit(weapon, t))
                    .then_some(e.id)
            })
        }
    }
}

/// Set a steering destination without discarding a still-valid path.
fn ensure_move(m: &mut Movement, dest: Vec2) {
    match m.move_target {
        Some(current) if current.distance_to(dest) < 1.0 => {}
        _ => m.move_target = Some(dest),
    }
}

/// Demo trucks drive at their mark and self-destruct on arrival; the blast
/// itself is the detonation phase's job.
#[allow(clippy::type_complexity)]
pub fn demo_truck_behavior_system(
    mut trucks: Query<
        (
            &SimId,
            &Position,
            &Footprint,
            &mut Health,
            &mut Movement,
            &mut DemoTruck,
        ),
        With<UnitTag>,
    >,
    points: Query<(&SimId, &Position, &Footprint), Without<DemoTruck>>,
) {
    const TRIGGER_SLACK: f32 = 8.0;

    let marks: HashMap<SimId, (Vec2, f32)> = points
        .iter()
        .map(|(id, pos, footprint)| (*id, (pos.0, footprint.radius)))
        .collect();

    for (_, pos, footprint, mut health, mut m, mut truck) in trucks.iter_mut() {
        if truck.has_detonated || !health.is_alive() {
            continue;
        }
        let mark = match truck.detonation_target {
            Some(tid) => match marks.get(&tid) {
                Some(&(p, r)) => Some((p, r)),
                None => {
                    truck.detonation_target = None;
                    truck.detonation_pos.map(|p| (p, 0.0))
                }
            },
            None => truck.detonation_pos.map(|p| (p, 0.0)),
        };
        let Some((target_pos, target_radius)) = mark else {
            continue;
        };
        let trigger = footprint.radius + target_radius + TRIGGER_SLACK;
        if pos.0.distance_to(target_pos) <= trigger {
            health.current = 0;
            m.clear_move();
        } else {
            ensure_move(&mut m, target_pos);
        }
    }
}

/// Defense buildings: projectile interception first, then direct fire.
/// SAM-style weapons prefer flying targets.
#[allow(clippy::type_complexity)]
pub fn defense_building_system(
    rules: Res<RulesRes>,
    grid: Res<SpatialGrid>,
    mut pool: ResMut<ProjectilePool>,
    mut defenses: Query<
        (Entity, &SimId, &Owner, &Position, &BuildingType, &Health, &mut CombatState),
        With<BuildingTag>,
    >,
    units_info: Query<(&SimId, &Position, &Footprint, &Owner, &UnitType, &Health, Option<&AirUnit>), With<UnitTag>>,
    buildings_info: Query<(&SimId, &Position, &Footprint, &Owner, &BuildingType, &Health), (With<BuildingTag>, Without<CombatState>)>,
) {
    let targets = build_target_views(&units_info, &buildings_info, &rules);

    let mut order: Vec<(SimId, Entity)> = defenses
        .iter()
        .filter(|(_, _, _, _, _, h, _)| h.is_alive())
        .map(|(e, id, ..)| (*id, e))
        .collect();
    order.sort_by_key(|(id, _)| *id);

    for (id, entity) in order {
        let Ok((_, _, owner, pos, bt, _, mut c)) = defenses.get_mut(entity) else {
            continue;
        };
        let owner = owner.0;
        let pos = pos.0;
        let Some(weapon) = rules.building_weapon(bt.0) else {
            continue;
        };

        // SAM behavior: shoot down interceptable enemy ordnance first.
        if weapon.targets_projectiles && c.cooldown == 0 {
            let mut best: Option<(f32, usize)> = None;
            for (i, shot) in pool.shots.iter().enumerate() {
                if !shot.interceptable() || shot.owner == owner {
                    continue;
                }
                let d = shot.pos.distance_to(pos);
                if d <= weapon.range && best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, i));
                }
            }
            if let Some((_, i)) = best {
                let shot = &mut pool.shots[i];
                shot.hp -= weapon.damage;
                if shot.hp <= 0 {
                    shot.dead = true;
                }
                c.turret_angle = (shot.pos - pos).angle();
                c.cooldown = weapon.cooldown;
                continue;
            }
        }

        // Stale or out-of-range targets are dropped.
        if let Some(tid) = c.target_id {
            let drop = match targets.get(&tid) {
                None => true,
                Some(t) => {
                    pos.distance_to(t.pos) > weapon.range + t.radius || !weapon_can_hit(weapon, t)
                }
            };
            if drop {
                c.target_id = None;
            }
        }

        if c.target_id.is_none() {
            let nearby = grid.query_radius(pos.x, pos.y, weapon.range);
            let pick_air = if weapon.targets_air {
                nearby.iter().find_map(|e| {
                    let t = targets.get(&e.id)?;
                    (t.is_air && t.owner >= 0 && t.owner != owner).then_some(e.id)
                })
            } else {
                None
            };
            c.target_id = pick_air.or_else(|| {
                nearby.iter().find_map(|e| {
                    let t = targets.get(&e.id)?;
                    (t.owner >= 0 && t.owner != owner && weapon_can_hit(weapon, t)).then_some(e.id)
                })
            });
        }

        if let Some(tid) = c.target_id {
            if let Some(target) = targets.get(&tid) {
                if c.cooldown == 0 && pos.distance_to(target.pos) <= weapon.range + target.radius {
                    fire(&mut pool, weapon, owner, id, pos, tid, target);
                    c.cooldown = weapon.cooldown;
                }
            }
        }
    }
}
