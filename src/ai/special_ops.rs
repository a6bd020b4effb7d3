//! Special operations: air strikes, demo-truck assaults, engineer capture,
//! vehicle hijacking.

use crate::actions::Action;
use crate::components::SimId;
use crate::rules::UnitSpecial;

use super::{AiController, PlanContext};

/// Minimum strike score before a harrier is committed.
const STRIKE_SCORE_THRESHOLD: f32 = 500.0;
/// Penalty per anti-air defense covering the target.
const AA_PENALTY: f32 = 600.0;
const AA_COVER_RADIUS: f32 = 350.0;
/// Minimum building-cluster value before a demo truck rolls.
const DEMO_CLUSTER_THRESHOLD: u32 = 2000;
const DEMO_CLUSTER_RADIUS: f32 = 180.0;
/// Capture targets must be reasonably near our base.
const CAPTURE_RANGE: f32 = 1500.0;

pub fn run(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    air_strikes(ctl, ctx, actions);
    demo_assault(ctl, ctx, actions);
    engineer_capture(ctl, ctx, actions);
    hijack(ctl, ctx, actions);
}

/// Launch fully armed, docked harriers at the highest-value target that
/// is not sitting under anti-air cover.
fn air_strikes(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    let ready: Vec<SimId> = p
        .units_of(me)
        .filter(|u| u.is_air && u.air_docked && u.air_ammo > 0 && u.target_id.is_none())
        .filter(|u| {
            u.unit_key
                .map(|k| u.air_ammo >= rules.unit(k).ammo)
                .unwrap_or(false)
        })
        .map(|u| u.id)
        .collect();
    if ready.is_empty() {
        return;
    }

    // Anti-air coverage points.
    let aa_sites: Vec<crate::math::Vec2> = p
        .entities
        .iter()
        .filter(|e| e.owner >= 0 && e.owner != me)
        .filter(|e| {
            e.building_key
                .and_then(|k| rules.building_weapon(k))
                .map(|w| w.targets_air)
                .unwrap_or(false)
        })
        .map(|e| e.pos)
        .collect();

    let mut best: Option<(f32, SimId)> = None;
    for e in &p.entities {
        if e.owner < 0 || e.owner == me || e.is_air {
            continue;
        }
        let value = e
            .unit_key
            .map(|k| rules.unit(k).cost)
            .or_else(|| e.building_key.map(|k| rules.building(k).cost))
            .unwrap_or(0) as f32;
        if value <= 0.0 {
            continue;
        }
        let aa_cover = aa_sites
            .iter()
            .filter(|s| s.distance_to(e.pos) <= AA_COVER_RADIUS)
            .count() as f32;
        let score = value - aa_cover * AA_PENALTY - e.pos.distance_to(ctl.base_center) * 0.05;
        let better = match best {
            None => true,
            Some((bs, bid)) => score > bs || (score == bs && e.id < bid),
        };
        if better && score >= STRIKE_SCORE_THRESHOLD {
            best = Some((score, e.id));
        }
    }
    let Some((_, target)) = best else {
        return;
    };
    // One sortie per plan.
    actions.push(Action::CommandAttack {
        player: me,
        unit_ids: vec![ready[0]],
        target,
    });
}

/// Roll one demo truck at the richest building cluster; one truck at a
/// time so a single SAM wall doesn't eat the whole fleet.
fn demo_assault(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    let trucks: Vec<&super::PEntity> = p
        .units_of(me)
        .filter(|u| {
            u.unit_key
                .map(|k| rules.unit(k).special == UnitSpecial::DemoTruck)
                .unwrap_or(false)
        })
        .collect();
    if trucks.is_empty() || trucks.iter().any(|t| t.detonation_assigned) {
        return;
    }
    let Some(truck) = trucks.iter().min_by_key(|t| t.id).map(|t| t.id) else {
        return;
    };

    let enemy_buildings: Vec<&super::PEntity> = p
        .entities
        .iter()
        .filter(|e| e.owner >= 0 && e.owner != me && e.is_building())
        .collect();
    let mut best: Option<(u32, SimId)> = None;
    for candidate in &enemy_buildings {
        let cluster_value: u32 = enemy_buildings
            .iter()
            .filter(|other| other.pos.distance_to(candidate.pos) <= DEMO_CLUSTER_RADIUS)
            .filter_map(|other| other.building_key.map(|k| rules.building(k).cost))
            .sum();
        let better = match best {
            None => true,
            Some((bv, bid)) => cluster_value > bv || (cluster_value == bv && candidate.id < bid),
        };
        if better && cluster_value >= DEMO_CLUSTER_THRESHOLD {
            best = Some((cluster_value, candidate.id));
        }
    }
    if let Some((_, target)) = best {
        actions.push(Action::CommandAttack {
            player: me,
            unit_ids: vec![truck],
            target,
        });
    }
}

/// Idle engineers walk at capturable production near our base.
fn engineer_capture(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    let engineers: Vec<SimId> = p
        .units_of(me)
        .filter(|u| {
            u.unit_key
                .map(|k| rules.unit(k).special == UnitSpecial::Engineer)
                .unwrap_or(false)
        })
        .filter(|u| u.is_idle())
        .map(|u| u.id)
        .collect();
    if engineers.is_empty() {
        return;
    }

    let priority = |key: &str| -> u32 {
        match key {
            "construction_yard" => 0,
            "war_factory" => 1,
            "ore_refinery" => 2,
            _ => 3,
        }
    };
    let target = p
        .entities
        .iter()
        .filter(|e| e.owner >= 0 && e.owner != me && e.is_building())
        .filter(|e| e.pos.distance_to(ctl.base_center) <= CAPTURE_RANGE)
        .min_by(|a, b| {
            let pa = a.building_key.map(|k| priority(&rules.building(k).key)).unwrap_or(9);
            let pb = b.building_key.map(|k| priority(&rules.building(k).key)).unwrap_or(9);
            pa.cmp(&pb)
                .then_with(|| {
                    a.pos
                        .distance_sq(ctl.base_center)
                        .partial_cmp(&b.pos.distance_sq(ctl.base_center))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then(a.id.cmp(&b.id))
        });
    if let Some(target) = target {
        actions.push(Action::CommandAttack {
            player: me,
            unit_ids: vec![engineers[0]],
            target: target.id,
        });
    }
}

/// One hijacker per enemy vehicle, highest value first.
fn hijack(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    ctl.hijack_claims
        .retain(|thief, victim| p.get(*thief).is_some() && p.get(*victim).is_some());
    let claimed: Vec<SimId> = ctl.hijack_claims.values().copied().collect();

    let idle_hijackers: Vec<SimId> = p
        .units_of(me)
        .filter(|u| {
            u.unit_key
                .map(|k| rules.unit(k).special == UnitSpecial::Hijacker)
                .unwrap_or(false)
        })
        .filter(|u| u.is_idle() && !ctl.hijack_claims.contains_key(&u.id))
        .map(|u| u.id)
        .collect();

    for thief in idle_hijackers {
        let prize = p
            .entities
            .iter()
            .filter(|e| e.owner >= 0 && e.owner != me && e.is_unit() && !e.is_air)
            .filter(|e| {
                e.unit_key
                    .map(|k| {
                        rules.unit(k).category == crate::rules::ProductionCategory::Vehicle
                    })
                    .unwrap_or(false)
            })
            .filter(|e| !claimed.contains(&e.id) && !ctl.hijack_claims.values().any(|&v| v == e.id))
            .max_by(|a, b| {
                let va = a.unit_key.map(|k| rules.unit(k).cost).unwrap_or(0);
                let vb = b.unit_key.map(|k| rules.unit(k).cost).unwrap_or(0);
                va.cmp(&vb).then(b.id.cmp(&a.id))
            });
        let Some(prize) = prize else {
            break;
        };
        ctl.hijack_claims.insert(thief, prize.id);
        actions.push(Action::CommandAttack {
            player: me,
            unit_ids: vec![thief],
            target: prize.id,
        });
    }
}
