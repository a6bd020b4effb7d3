//! Air-base docking/reload and the air-unit flight state machine
//! (docked → flying → attacking → returning → docked).

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::projectile::{Projectile, ProjectilePool};
use crate::rules::RulesRes;
use crate::state::{IdIndex, SimTick};

/// Minimum ticks between two launches from the same base.
const MIN_LAUNCH_GAP: u64 = 12;
/// Docking tolerance around the base center.
const DOCK_RANGE: f32 = 36.0;
/// Ticks per ammo point reloaded into a docked unit.
const RELOAD_INTERVAL: u32 = 40;

/// Reload docked aircraft and drop slot entries whose unit is gone.
pub fn air_base_system(
    index: Res<IdIndex>,
    mut bases: Query<(&Owner, &Health, &mut AirBase), With<BuildingTag>>,
    mut flyers: Query<(&SimId, &mut AirUnit)>,
) {
    // Docked ammo state by unit id.
    let mut docked: HashMap<SimId, (u32, u32)> = HashMap::new();
    for (id, air) in flyers.iter() {
        if air.state == AirState::Docked {
            docked.insert(*id, (air.ammo, air.max_ammo));
        }
    }

    let mut reload_now: Vec<SimId> = Vec::new();
    for (_, health, mut base) in bases.iter_mut() {
        if !health.is_alive() {
            continue;
        }
        // Slots referencing dead or launched units are freed.
        for slot in base.slots.iter_mut() {
            if let Some(unit_id) = *slot {
                let gone = index.get(unit_id).is_none() || !docked.contains_key(&unit_id);
                if gone {
                    *slot = None;
                }
            }
        }
        if base.reload_timer > 0 {
            base.reload_timer -= 1;
            continue;
        }
        // Lowest slot with missing ammo reloads first.
        let needy = base.slots.iter().flatten().copied().find(|unit_id| {
            docked
                .get(unit_id)
                .map(|&(ammo, max)| ammo < max)
                .unwrap_or(false)
        });
        if let Some(unit_id) = needy {
            reload_now.push(unit_id);
            base.reload_timer = RELOAD_INTERVAL;
        }
    }

    for (id, mut air) in flyers.iter_mut() {
        if reload_now.contains(id) {
            air.ammo = (air.ammo + 1).min(air.max_ammo);
        }
    }
}

struct BaseView {
    id: SimId,
    owner: PlayerId,
    pos: Vec2,
    free_slots: Vec<u32>,
    last_launch_tick: u64,
}

#[derive(Clone, Copy)]
enum BaseCmd {
    FreeSlot(SimId, u32),
    ClaimSlot(SimId, u32, SimId),
    Launched(SimId, u64),
}

/// Drive every air unit's flight state machine.
#[allow(clippy::type_complexity)]
pub fn air_unit_behavior_system(
    tick: Res<SimTick>,
    rules: Res<RulesRes>,
    mut pool: ResMut<ProjectilePool>,
    mut flyers: Query<
        (
            Entity,
            &SimId,
            &Owner,
            &Position,
            &UnitType,
            &Health,
            &mut Movement,
            &mut CombatState,
            &mut AirUnit,
        ),
        With<UnitTag>,
    >,
    ground_info: Query<
        (&SimId, &Position, &Footprint, &Owner, &Health),
        (Without<AirUnit>, Or<(With<UnitTag>, With<BuildingTag>)>),
    >,
    mut bases: Query<(&SimId, &Owner, &Position, &Health, &mut AirBase), With<BuildingTag>>,
) {
    let tick = tick.0;

    // Target views (air units strike ground targets).
    let targets: HashMap<SimId, (Vec2, f32)> = ground_info
        .iter()
        .filter(|(_, _, _, _, h)| h.is_alive())
        .map(|(id, pos, footprint, _, _)| (*id, (pos.0, footprint.radius)))
        .collect();

    let mut base_views: Vec<BaseView> = bases
        .iter()
        .filter(|(_, _, _, h, _)| h.is_alive())
        .map(|(id, owner, pos, _, base)| BaseView {
            id: *id,
            owner: owner.0,
            pos: pos.0,
            free_slots: base
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_none())
                .map(|(i, _)| i as u32)
                .collect(),
            last_launch_tick: base.last_launch_tick,
        })
        .collect();
    base_views.sort_by_key(|b| b.id);

    let mut order: Vec<(SimId, Entity)> = flyers
        .iter()
        .filter(|(_, _, _, _, _, h, ..)| h.is_alive())
        .map(|(e, id, ..)| (*id, e))
        .collect();
    order.sort_by_key(|(id, _)| *id);

    let mut base_cmds: Vec<BaseCmd> = Vec::new();

    for (id, entity) in order {
        let Ok((_, _, owner, pos, ut, _, mut m, mut c, mut air)) = flyers.get_mut(entity) else {
            continue;
        };
        let owner = owner.0;
        let pos = pos.0;
        let Some(weapon) = rules.unit_weapon(ut.0) else {
            continue;
        };

        if let Some(tid) = c.target_id {
            if !targets.contains_key(&tid) {
                c.target_id = None;
            }
        }

        match air.state {
            AirState::Docked => {
                let home = air
                    .home_base
                    .and_then(|b| base_views.iter().find(|v| v.id == b));
                let Some(home) = home else {
                    // Base destroyed under us: scramble.
                    air.state = AirState::Flying;
                    air.home_base = None;
                    air.docked_slot = None;
                    continue;
                };
                if c.target_id.is_some()
                    && air.ammo > 0
                    && tick.saturating_sub(home.last_launch_tick) >= MIN_LAUNCH_GAP
                {
                    let home_id = home.id;
                    if let Some(slot) = air.docked_slot.take() {
                        base_cmds.push(BaseCmd::FreeSlot(home_id, slot));
                    }
                    base_cmds.push(BaseCmd::Launched(home_id, tick));
                    if let Some(v) = base_views.iter_mut().find(|v| v.id == home_id) {
                        v.last_launch_tick = tick;
                    }
                    air.state = AirState::Flying;
                }
            }
            AirState::Flying => match c.target_id.and_then(|t| targets.get(&t)) {
                Some(&(target_pos, target_radius)) => {
                    if pos.distance_to(target_pos) <= weapon.range + target_radius {
                        air.state = AirState::Attacking;
                        m.clear_move();
                    } else {
                        m.move_target = Some(target_pos);
                    }
                }
                None => {
                    air.state = AirState::Returning;
                }
            },
            AirState::Attacking => {
                let target = c.target_id.and_then(|t| targets.get(&t).map(|v| (t, *v)));
                match target {
                    Some((tid, (target_pos, target_radius))) if air.ammo > 0 => {
                        let dist = pos.distance_to(target_pos);
                        if dist > weapon.range + target_radius {
                            air.state = AirState::Flying;
                        } else if c.cooldown == 0 {
                            pool.spawn(Projectile::from_weapon(
                                weapon, owner, Some(id), pos, tid, target_pos,
                            ));
                            c.cooldown = weapon.cooldown;
                            air.ammo -= 1;
                            if air.ammo == 0 {
                                c.target_id = None;
                                air.state = AirState::Returning;
                            }
                        }
                    }
                    _ => {
                        c.target_id = None;
                        air.state = AirState::Returning;
                    }
                }
            }
            AirState::Returning => {
                // Fly home; adopt a new base if ours is gone or full.
                let home = air
                    .home_base
                    .and_then(|b| base_views.iter().position(|v| v.id == b && !v.free_slots.is_empty()))
                    .or_else(|| {
                        let mut best: Option<(f32, usize)> = None;
                        for (i, v) in base_views.iter().enumerate() {
                            if v.owner != owner || v.free_slots.is_empty() {
                                continue;
                            }
                            let d = v.pos.distance_sq(pos);
                            if best.map_or(true, |(bd, _)| d < bd) {
                                best = Some((d, i));
                            }
                        }
                        best.map(|(_, i)| i)
                    });
                let Some(home_idx) = home else {
                    m.clear_move();
                    continue;
                };
                let base_pos = base_views[home_idx].pos;
                if pos.distance_to(base_pos) <= DOCK_RANGE {
                    let base_id = base_views[home_idx].id;
                    let slot = base_views[home_idx].free_slots.remove(0);
                    base_cmds.push(BaseCmd::ClaimSlot(base_id, slot, id));
                    air.state = AirState::Docked;
                    air.home_base = Some(base_id);
                    air.docked_slot = Some(slot);
                    m.clear_move();
                } else {
                    m.move_target = Some(base_pos);
                }
            }
        }
    }

    for cmd in base_cmds {
        let base_id = match cmd {
            BaseCmd::FreeSlot(b, _) | BaseCmd::ClaimSlot(b, _, _) | BaseCmd::Launched(b, _) => b,
        };
        for (id, _, _, _, mut base) in bases.iter_mut() {
            if *id != base_id {
                continue;
            }
            match cmd {
                BaseCmd::FreeSlot(_, slot) => base.slots[slot as usize] = None,
                BaseCmd::ClaimSlot(_, slot, unit) => base.slots[slot as usize] = Some(unit),
                BaseCmd::Launched(_, t) => base.last_launch_tick = t,
            }
            break;
        }
    }
}
