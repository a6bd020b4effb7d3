//! Harvester behavior: gathering, dock queuing, unloading, self-defense.
//!
//! One decision pass per tick per harvester, over a read-only snapshot taken
//! at the start of the system (collect-then-apply). Harvesters are processed
//! in id order so dock queues and ore claims resolve deterministically.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::players::Players;
use crate::projectile::{Projectile, ProjectilePool};
use crate::rules::RulesRes;
use crate::spatial::{EntryKind, SpatialGrid};
use crate::state::{DamageEvent, DamageQueue, SimTick};

/// Center distance at which extraction works.
const HARVEST_RANGE: f32 = 45.0;
/// Center distance at which unloading works.
const DOCK_TOLERANCE: f32 = 30.0;
/// Queued harvesters hold position once this close to the dock.
const QUEUE_HOLD_RANGE: f32 = 130.0;
/// Manual (flee) moves expire after this many no-progress ticks.
const FLEE_NO_PROGRESS_TICKS: u32 = 60;
/// AI may not re-command a harvester for this long after a flee timeout.
const FLEE_COOLDOWN_TICKS: u64 = 150;
/// Harvesters per ore deposit.
const CONGESTION_CAP: usize = 2;
/// Score penalty per claimant when choosing ore.
const CONGESTION_PENALTY: f32 = 500.0;
/// Ore search radius before falling back to a global scan.
const ORE_SEARCH_RADIUS: f32 = 800.0;
/// Give-up thresholds (see the boundary tests).
const BLOCKED_ATTEMPT_TICKS: u32 = 30;
const STUCK_GIVEUP_TICKS: u32 = 30;
const FAR_GIVEUP_DIST: f32 = 45.0;
const FAR_GIVEUP_TICKS: u32 = 60;
/// Ticks a given-up ore stays on the harvester's blacklist.
const BLOCKED_ORE_MEMORY: u32 = 300;

struct HarvView {
    id: SimId,
    pos: Vec2,
    radius: f32,
    resource_target: Option<SimId>,
    base_target: Option<SimId>,
    full: bool,
    manual: bool,
}

struct RefineryView {
    id: SimId,
    owner: PlayerId,
    dock: Vec2,
}

/// Set a steering destination without discarding a still-valid path.
fn ensure_move(m: &mut Movement, dest: Vec2) {
    match m.move_target {
        Some(current) if current.distance_to(dest) < 1.0 => {}
        _ => m.move_target = Some(dest),
    }
}

#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn harvester_behavior_system(
    tick: Res<SimTick>,
    rules: Res<RulesRes>,
    grid: Res<SpatialGrid>,
    mut players: ResMut<Players>,
    mut pool: ResMut<ProjectilePool>,
    mut damage: ResMut<DamageQueue>,
    mut harvesters: Query<
        (
            Entity,
            &SimId,
            &Owner,
            &Position,
            &Footprint,
            &UnitType,
            &Health,
            &mut Harvester,
            &mut Movement,
            &mut CombatState,
        ),
        With<UnitTag>,
    >,
    ores: Query<(&SimId, &Position, &Health), With<OreTag>>,
    refineries: Query<(&SimId, &Owner, &Position, &Footprint, &BuildingType, &Health), With<BuildingTag>>,
) {
    let tick = tick.0;

    // ---- snapshot phase -------------------------------------------------
    let mut views: Vec<(Entity, HarvView)> = harvesters
        .iter()
        .filter(|(_, _, _, _, _, ut, health, ..)| {
            health.is_alive() && rules.unit(ut.0).cargo_capacity > 0
        })
        .map(|(entity, id, _, pos, footprint, ut, _, h, m, _)| {
            let capacity = rules.unit(ut.0).cargo_capacity;
            (
                entity,
                HarvView {
                    id: *id,
                    pos: pos.0,
                    radius: footprint.radius,
                    resource_target: h.resource_target,
                    base_target: h.base_target,
                    full: h.cargo >= capacity,
                    manual: m.move_target.is_some() && h.manual_mode,
                },
            )
        })
        .collect();
    views.sort_by_key(|(_, v)| v.id);

    let ore_map: HashMap<SimId, (Vec2, i32)> = ores
        .iter()
        .filter(|(_, _, h)| h.is_alive())
        .map(|(id, pos, h)| (*id, (pos.0, h.current)))
        .collect();

    let refinery_views: Vec<RefineryView> = refineries
        .iter()
        .filter(|(_, _, _, _, bt, h)| h.is_alive() && rules.building(bt.0).is_refinery)
        .map(|(id, owner, pos, footprint, _, _)| RefineryView {
            id: *id,
            owner: owner.0,
            dock: pos.0 + Vec2::new(0.0, footprint.h * 0.5 + 26.0),
        })
        .collect();

    // Claimants per ore (id-sorted thanks to the view ordering).
    let mut claimants: HashMap<SimId, Vec<SimId>> = HashMap::new();
    for (_, v) in &views {
        if let Some(ore) = v.resource_target {
            claimants.entry(ore).or_default().push(v.id);
        }
    }

    // Dock queue membership: full cargo, automatic mode, same refinery.
    let mut dock_queues: HashMap<SimId, Vec<(f32, SimId)>> = HashMap::new();
    for (_, v) in &views {
        if !v.full || v.manual {
            continue;
        }
        if let Some(base) = v.base_target {
            if let Some(r) = refinery_views.iter().find(|r| r.id == base) {
                dock_queues
                    .entry(base)
                    .or_default()
                    .push((v.pos.distance_to(r.dock), v.id));
            }
        }
    }
    for queue in dock_queues.values_mut() {
        queue.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
    }

    // ---- decision phase -------------------------------------------------
    for (entity, _) in &views {
        let Ok((_, id, owner, pos, footprint, ut, _, mut h, mut m, mut c)) =
            harvesters.get_mut(*entity)
        else {
            continue;
        };
        let id = *id;
        let owner = owner.0;
        let pos = pos.0;
        let spec = rules.unit(ut.0);
        let capacity = spec.cargo_capacity;
        let full = h.cargo >= capacity;

        // Blacklist memory decay.
        if h.blocked_ore.is_some() {
            if h.blocked_ore_timer > 0 {
                h.blocked_ore_timer -= 1;
            } else {
                h.blocked_ore = None;
            }
        }

        // Self-defense: fire at the nearest enemy in range without chasing.
        // The turret swings for the shot but `target_id` stays clear.
        if c.cooldown == 0 && m.move_target.is_none() {
            if let Some(weapon) = rules.unit_weapon(ut.0) {
                let victim = grid
                    .query_enemies(pos.x, pos.y, weapon.range, owner)
                    .into_iter()
                    .find(|e| !e.air || weapon.targets_air);
                if let Some(victim) = victim {
                    let victim_pos = Vec2::new(victim.x, victim.y);
                    if pos.distance_to(victim_pos) <= weapon.range {
                        c.turret_angle = (victim_pos - pos).angle();
                        c.cooldown = weapon.cooldown;
                        pool.spawn(Projectile::from_weapon(
                            weapon,
                            owner,
                            Some(id),
                            pos,
                            victim.id,
                            victim_pos,
                        ));
                    }
                }
            }
        }

        // Manual move: the player's order wins, unless the hold is full.
        if m.move_target.is_some() && h.manual_mode {
            if full {
                m.clear_move();
            } else if m.move_target_no_progress_ticks > FLEE_NO_PROGRESS_TICKS {
                m.clear_move();
                h.manual_mode = false;
                h.flee_cooldown_until = Some(tick + FLEE_COOLDOWN_TICKS);
            } else {
                continue;
            }
        }

        if full {
            deliver(
                &mut h, &mut m, &mut players, &refinery_views, &dock_queues, owner, id, pos,
            );
            continue;
        }

        if let Some(ore_id) = h.resource_target {
            let gone = !ore_map.contains_key(&ore_id);
            if gone || h.blocked_ore == Some(ore_id) {
                h.resource_target = None;
                h.harvest_attempt_ticks = 0;
                h.best_dist_to_ore = None;
                // Fall through to reselection below.
            } else {
                let (ore_pos, ore_hp) = ore_map[&ore_id];

                // Over-claimed ore: late claimants step aside.
                let over_cap = claimants
                    .get(&ore_id)
                    .map(|list| list.iter().position(|&cid| cid == id).unwrap_or(0) >= CONGESTION_CAP)
                    .unwrap_or(false);
                if over_cap {
                    h.resource_target = None;
                    h.harvest_attempt_ticks = 0;
                    h.best_dist_to_ore = None;
                } else {
                    let dist = pos.distance_to(ore_pos);
                    if dist <= HARVEST_RANGE {
                        h.harvest_attempt_ticks = 0;
                        h.best_dist_to_ore = Some(dist);
                        h.last_dist_to_ore = Some(dist);
                        m.clear_move();
                        if c.cooldown == 0 {
                            let room = capacity.saturating_sub(h.cargo) as i32;
                            let amount = spec.harvest_rate.min(ore_hp).min(room);
                            if amount > 0 {
                                h.cargo += amount as u32;
                                c.cooldown = spec.harvest_cooldown;
                                c.turret_angle = (ore_pos - pos).angle();
                                damage.0.push(DamageEvent {
                                    target: ore_id,
                                    amount,
                                    attacker: Some(id),
                                    attacker_owner: None,
                                });
                            }
                        }
                        continue;
                    }

                    h.harvest_attempt_ticks += 1;
                    h.last_dist_to_ore = Some(dist);
                    let best = h.best_dist_to_ore.map_or(dist, |b| b.min(dist));
                    h.best_dist_to_ore = Some(best);

                    let blocked_by_peer = blocked_by_other_harvester(
                        &views, id, pos, footprint.radius, ore_pos,
                    );
                    let give_up = (blocked_by_peer
                        && h.harvest_attempt_ticks > BLOCKED_ATTEMPT_TICKS)
                        || m.stuck_timer > STUCK_GIVEUP_TICKS
                        || (best > FAR_GIVEUP_DIST && h.harvest_attempt_ticks > FAR_GIVEUP_TICKS);
                    if give_up {
                        h.blocked_ore = Some(ore_id);
                        h.blocked_ore_timer = BLOCKED_ORE_MEMORY;
                        h.resource_target = None;
                        h.harvest_attempt_ticks = 0;
                        h.best_dist_to_ore = None;
                        m.clear_move();
                        continue;
                    }

                    ensure_move(&mut m, ore_pos);
                    continue;
                }
            }
        }

        if !h.manual_mode {
            let chosen = choose_ore(&grid, &ore_map, &claimants, pos, h.blocked_ore);
            match chosen {
                Some(ore_id) => {
                    h.resource_target = Some(ore_id);
                    h.harvest_attempt_ticks = 0;
                    h.best_dist_to_ore = None;
                    h.last_dist_to_ore = None;
                }
                None if h.cargo > 0 => {
                    // Nothing left to mine; bank what we carry.
                    deliver(
                        &mut h, &mut m, &mut players, &refinery_views, &dock_queues, owner, id,
                        pos,
                    );
                }
                None => {}
            }
        }
    }
}

/// Head for the refinery dock; unload when first in line and close enough.
#[allow(clippy::too_many_arguments)]
fn deliver(
    h: &mut Harvester,
    m: &mut Movement,
    players: &mut Players,
    refineries: &[RefineryView],
    dock_queues: &HashMap<SimId, Vec<(f32, SimId)>>,
    owner: PlayerId,
    id: SimId,
    pos: Vec2,
) {
    // Keep a live refinery of ours as the base target.
    let valid = h
        .base_target
        .and_then(|b| refineries.iter().find(|r| r.id == b && r.owner == owner));
    let refinery = match valid {
        Some(r) => r,
        None => {
            let nearest = refineries
                .iter()
                .filter(|r| r.owner == owner)
                .min_by(|a, b| {
                    let da = a.dock.distance_sq(pos);
                    let db = b.dock.distance_sq(pos);
                    da.partial_cmp(&db)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.id.cmp(&b.id))
                });
            match nearest {
                Some(r) => {
                    h.base_target = Some(r.id);
                    r
                }
                None => {
                    m.clear_move();
                    return;
                }
            }
        }
    };

    let dist = pos.distance_to(refinery.dock);
    let queue_pos = dock_queues
        .get(&refinery.id)
        .and_then(|q| q.iter().position(|&(_, qid)| qid == id))
        .unwrap_or(0);

    if queue_pos == 0 && dist <= DOCK_TOLERANCE {
        if let Some(p) = players.get_mut(owner) {
            p.credits += f64::from(h.cargo);
        }
        h.cargo = 0;
        m.clear_move();
    } else if queue_pos > 0 && dist <= QUEUE_HOLD_RANGE {
        m.clear_move();
    } else {
        ensure_move(m, refinery.dock);
    }
}

/// Is another harvester parked between us and the ore?
fn blocked_by_other_harvester(
    views: &[(Entity, HarvView)],
    id: SimId,
    pos: Vec2,
    radius: f32,
    ore_pos: Vec2,
) -> bool {
    let to_ore = (ore_pos - pos).normalized();
    views.iter().any(|(_, other)| {
        if other.id == id {
            return false;
        }
        let gap = other.pos.distance_to(pos);
        if gap > radius + other.radius + 10.0 {
            return false;
        }
        (other.pos - pos).normalized().dot(to_ore) > 0.6
    })
}

/// Best ore by `-(distance + 500 * claimants)`, lowest id on ties.
fn choose_ore(
    grid: &SpatialGrid,
    ore_map: &HashMap<SimId, (Vec2, i32)>,
    claimants: &HashMap<SimId, Vec<SimId>>,
    pos: Vec2,
    blocked: Option<SimId>,
) -> Option<SimId> {
    let mut candidates: Vec<SimId> = grid
        .query_radius_kind(pos.x, pos.y, ORE_SEARCH_RADIUS, EntryKind::Ore)
        .iter()
        .map(|e| e.id)
        .collect();
    if candidates.is_empty() {
        candidates = ore_map.keys().copied().collect();
        candidates.sort_unstable();
    }

    let mut best: Option<(f32, SimId)> = None;
    for ore_id in candidates {
        if Some(ore_id) == blocked {
            continue;
        }
        let Some(&(ore_pos, hp)) = ore_map.get(&ore_id) else {
            continue;
        };
        if hp <= 0 {
            continue;
        }
        let load = claimants.get(&ore_id).map(Vec::len).unwrap_or(0);
        if load >= CONGESTION_CAP {
            continue;
        }
        let score = pos.distance_to(ore_pos) + CONGESTION_PENALTY * load as f32;
        let better = match best {
            None => true,
            Some((bs, bid)) => score < bs || (score == bs && ore_id < bid),
        };
        if better {
            best = Some((score, ore_id));
        }
    }
    best.map(|(_, id)| id)
}
