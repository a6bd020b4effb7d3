//! Harvester management: role-based ore routing, the hard-difficulty
//! danger map, flee decisions, and the last-ditch suicide run.

use crate::actions::Action;
use crate::components::{PlayerId, SimId};
use crate::math::Vec2;
use crate::rules::UnitSpecial;

use super::planner::Strategy;
use super::{AiController, DangerSpot, PlanContext};

/// Gathering temperament, derived from the stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Safe,
    Standard,
    RiskTaker,
    Opportunist,
}

fn role_of(id: SimId) -> Role {
    match id.0 % 4 {
        0 => Role::Safe,
        1 => Role::Standard,
        2 => Role::RiskTaker,
        _ => Role::Opportunist,
    }
}

/// Base flee trigger distance per role.
fn flee_distance(role: Role) -> f32 {
    match role {
        Role::Safe => 300.0,
        Role::Standard => 250.0,
        Role::Opportunist => 220.0,
        Role::RiskTaker => 180.0,
    }
}

const DANGER_DECAY: f32 = 0.98;
const DANGER_RADIUS: f32 = 250.0;
const DANGER_AVOID_THRESHOLD: f32 = 0.5;
/// A refinery is "safe" if no enemy stands within this radius.
const SAFE_REFINERY_RADIUS: f32 = 400.0;
const PANIC_FLEE_DISTANCE: f32 = 300.0;

fn my_harvesters<'a>(
    ctl: &AiController,
    ctx: &'a PlanContext,
) -> Vec<&'a super::PEntity> {
    ctx.perception
        .units_of(ctl.player)
        .filter(|u| {
            u.unit_key
                .map(|k| ctx.rules.unit(k).special == UnitSpecial::Harvester)
                .unwrap_or(false)
        })
        .collect()
}

/// Full-plan routing: maintain the danger map and send idle harvesters to
/// ore that suits their role.
pub fn gather(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let harvesters = my_harvesters(ctl, ctx);

    // Death memory (hard only): a harvester that vanished since last plan
    // marks its last known position as dangerous.
    if ctl.personality.danger_map_enabled {
        let current: std::collections::HashMap<SimId, Vec2> =
            harvesters.iter().map(|h| (h.id, h.pos)).collect();
        let mut lost: Vec<(SimId, Vec2)> = ctl
            .known_harvesters
            .iter()
            .filter(|(id, _)| !current.contains_key(id))
            .map(|(id, pos)| (*id, *pos))
            .collect();
        lost.sort_by_key(|(id, _)| *id);
        for (_, pos) in lost {
            ctl.danger_map.push(DangerSpot { pos, weight: 1.0 });
        }
        for spot in &mut ctl.danger_map {
            spot.weight *= DANGER_DECAY;
        }
        ctl.danger_map.retain(|s| s.weight > 0.05);
        ctl.known_harvesters = current;
    }

    let desperate = ctx.credits < 300.0;
    for h in &harvesters {
        // Parked manual-mode harvesters (post-flee) are fair game again
        // once their cooldown has passed; everything else busy is left be.
        let busy = h.resource_target.is_some() || h.move_target.is_some() || h.cargo > 0;
        if busy {
            continue;
        }
        if h.flee_cooldown_until.map(|t| ctx.tick < t).unwrap_or(false) {
            continue;
        }
        let role = role_of(h.id);
        let Some(ore) = pick_ore(ctl, ctx, h.pos, role, desperate) else {
            continue;
        };
        actions.push(Action::CommandAttack {
            player: me,
            unit_ids: vec![h.id],
            target: ore,
        });
    }
}

fn danger_at(ctl: &AiController, pos: Vec2) -> f32 {
    ctl.danger_map
        .iter()
        .filter(|s| s.pos.distance_to(pos) <= DANGER_RADIUS)
        .map(|s| s.weight)
        .sum()
}

fn pick_ore(
    ctl: &AiController,
    ctx: &PlanContext,
    from: Vec2,
    role: Role,
    desperate: bool,
) -> Option<SimId> {
    let p = ctx.perception;
    let claimed = |ore: SimId| {
        p.units_of(ctl.player)
            .filter(|u| u.resource_target == Some(ore))
            .count()
    };

    let mut best: Option<(f32, SimId)> = None;
    for ore in p.ores() {
        if ore.hp <= 0 {
            continue;
        }
        if claimed(ore.id) >= 2 {
            continue;
        }
        if ctl.personality.danger_map_enabled
            && !desperate
            && danger_at(ctl, ore.pos) > DANGER_AVOID_THRESHOLD
        {
            continue;
        }
        // Lower is better for every role's key.
        let key = match role {
            Role::Safe => ore.pos.distance_to(ctl.base_center),
            Role::Standard => ore.pos.distance_to(from),
            Role::RiskTaker => -(ore.hp as f32) + ore.pos.distance_to(from) * 0.01,
            Role::Opportunist => claimed(ore.id) as f32 * 1000.0 + ore.pos.distance_to(from),
        };
        let better = match best {
            None => true,
            Some((bk, bid)) => key < bk || (key == bk && ore.id < bid),
        };
        if better {
            best = Some((key, ore.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Every-tick safety pass: flee decisions and defender dispatch.
pub fn safety(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;
    let desperation = 1.0 - (ctx.credits / 2000.0).clamp(0.0, 1.0) as f32;

    for h in my_harvesters(ctl, ctx) {
        if h.flee_cooldown_until.map(|t| ctx.tick < t).unwrap_or(false) {
            continue;
        }
        // Already fleeing under a manual order.
        if h.manual_mode && h.move_target.is_some() {
            continue;
        }

        let nearest_enemy = nearest_enemy_unit(ctx, me, h.pos);
        let under_fire = ctl.threats.harvesters_under_attack.contains(&h.id);
        let mut trigger = flee_distance(role_of(h.id)) * (1.0 - 0.4 * desperation);
        if h.cargo > 300 {
            trigger += 50.0;
        }
        let menaced = nearest_enemy
            .map(|(_, pos)| pos.distance_to(h.pos) <= trigger)
            .unwrap_or(false);
        let ally_under_fire = ctl
            .threats
            .harvesters_under_attack
            .iter()
            .filter_map(|&id| p.get(id))
            .any(|other| other.id != h.id && other.pos.distance_to(h.pos) <= 200.0);
        if !(under_fire || menaced || ally_under_fire) {
            continue;
        }
        let Some((enemy_id, enemy_pos)) = nearest_enemy else {
            continue;
        };

        // Safe refinery first, panic vector otherwise.
        let safe_refinery = p
            .buildings_of(me)
            .filter(|b| {
                b.building_key
                    .map(|k| rules.building(k).is_refinery)
                    .unwrap_or(false)
            })
            .find(|r| {
                !p.entities.iter().any(|e| {
                    e.owner >= 0 && e.owner != me && e.is_unit()
                        && e.pos.distance_to(r.pos) <= SAFE_REFINERY_RADIUS
                })
            });
        let dest = match safe_refinery {
            Some(r) => r.pos + Vec2::new(0.0, r.radius + 40.0),
            None => {
                let away = (ctl.base_center - enemy_pos).normalized();
                h.pos + away * PANIC_FLEE_DISTANCE
            }
        };
        let dest = Vec2::new(
            dest.x.clamp(20.0, ctx.map_size.x - 20.0),
            dest.y.clamp(20.0, ctx.map_size.y - 20.0),
        );
        actions.push(Action::CommandMove {
            player: me,
            unit_ids: vec![h.id],
            x: dest.x,
            y: dest.y,
        });

        // Send the closest gun at the aggressor.
        let defender = p
            .combat_units_of(me, rules)
            .filter(|u| u.pos.distance_to(h.pos) <= 600.0)
            .min_by(|a, b| {
                let da = a.pos.distance_sq(h.pos);
                let db = b.pos.distance_sq(h.pos);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
        if let Some(defender) = defender {
            if defender.target_id != Some(enemy_id) {
                actions.push(Action::CommandAttack {
                    player: me,
                    unit_ids: vec![defender.id],
                    target: enemy_id,
                });
            }
        }
    }
}

/// With no army left and an all-in posture, the harvesters themselves are
/// thrown at the most valuable enemy building.
pub fn suicide_run(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    if ctx.perception.count_combat_units(me, ctx.rules) > 0 {
        return;
    }
    if ctl.strategy != Strategy::AllIn {
        return;
    }
    let target = ctx
        .perception
        .entities
        .iter()
        .filter(|e| e.owner >= 0 && e.owner != me && e.is_building())
        .max_by(|a, b| {
            let va = a.building_key.map(|k| ctx.rules.building(k).cost).unwrap_or(0);
            let vb = b.building_key.map(|k| ctx.rules.building(k).cost).unwrap_or(0);
            va.cmp(&vb).then(b.id.cmp(&a.id))
        });
    let Some(target) = target else {
        return;
    };
    let riders: Vec<SimId> = my_harvesters(ctl, ctx)
        .iter()
        .filter(|h| h.move_target.is_none())
        .map(|h| h.id)
        .collect();
    if !riders.is_empty() {
        actions.push(Action::CommandMove {
            player: me,
            unit_ids: riders,
            x: target.pos.x,
            y: target.pos.y,
        });
    }
}

fn nearest_enemy_unit(ctx: &PlanContext, me: PlayerId, from: Vec2) -> Option<(SimId, Vec2)> {
    let mut best: Option<(f32, SimId, Vec2)> = None;
    for e in &ctx.perception.entities {
        if e.owner < 0 || e.owner == me || !e.is_unit() {
            continue;
        }
        let d = from.distance_sq(e.pos);
        let better = match best {
            None => true,
            Some((bd, bid, _)) => d < bd || (d == bd && e.id < bid),
        };
        if better {
            best = Some((d, e.id, e.pos));
        }
    }
    best.map(|(_, id, pos)| (id, pos))
}
