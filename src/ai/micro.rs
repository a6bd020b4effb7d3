//! Per-unit micro: wounded retreat, kiting, and the stop-fire-move pattern.
//!
//! The cardinal rule: never move a unit whose weapon is ready to fire.
//! Repositioning happens in the cooldown window, or immediately when an
//! enemy is critically close.

use crate::actions::Action;
use crate::math::Vec2;
use crate::rules::UnitSpecial;

use super::{AiController, PlanContext};

/// Enemies inside this distance always justify stepping back.
const CRITICAL_CLOSE: f32 = 60.0;
/// Range advantage required before kiting pays off.
const KITE_ADVANTAGE: f32 = 20.0;
/// Step sizes.
const KITE_STEP: f32 = 60.0;
const BACKPEDAL_STEP: f32 = 80.0;

pub fn micro_units(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    let depot = p.buildings_of(me).find(|b| {
        b.building_key
            .map(|k| rules.building(k).is_depot)
            .unwrap_or(false)
    });

    for unit in p.combat_units_of(me, rules) {
        let Some(key) = unit.unit_key else { continue };
        let spec = rules.unit(key);
        let Some(weapon) = rules.unit_weapon(key) else {
            continue;
        };
        let Some(target) = unit.target_id.and_then(|t| p.get(t)) else {
            continue;
        };
        let dist = unit.pos.distance_to(target.pos);

        // Wounded units limp to the service depot when there is one.
        if unit.hp_fraction() < ctl.personality.retreat_threshold {
            if let Some(depot) = &depot {
                actions.push(Action::CommandMove {
                    player: me,
                    unit_ids: vec![unit.id],
                    x: depot.pos.x,
                    y: depot.pos.y,
                });
                continue;
            }
        }

        // Kiting: outrange the enemy and keep it that way while shooting
        // on the move.
        let enemy_range = target
            .unit_key
            .and_then(|k| rules.unit_weapon(k))
            .or_else(|| target.building_key.and_then(|k| rules.building_weapon(k)))
            .map(|w| w.range)
            .unwrap_or(0.0);
        if spec.attack_while_moving
            && weapon.range > enemy_range + KITE_ADVANTAGE
            && dist < weapon.range * 0.75
        {
            let away = (unit.pos - target.pos).normalized() * KITE_STEP;
            let dest = clamp_to_map(unit.pos + away, ctx.map_size);
            actions.push(Action::CommandAttackMove {
                player: me,
                unit_ids: vec![unit.id],
                x: dest.x,
                y: dest.y,
            });
            continue;
        }

        // Stop-fire-move: a ready weapon is never interrupted.
        if unit.cooldown == 0 {
            continue;
        }
        let just_fired = unit.cooldown >= weapon.cooldown.saturating_sub(2);
        if dist < CRITICAL_CLOSE || (just_fired && dist < weapon.range * 0.5) {
            let away = (unit.pos - target.pos).normalized() * BACKPEDAL_STEP;
            let dest = clamp_to_map(unit.pos + away, ctx.map_size);
            actions.push(Action::CommandAttackMove {
                player: me,
                unit_ids: vec![unit.id],
                x: dest.x,
                y: dest.y,
            });
        }
    }

    // Parking: damaged vehicles spread out around the depot to heal.
    if let Some(depot) = depot {
        let mut slot = 0usize;
        let hurt: Vec<_> = p
            .units_of(me)
            .filter(|u| {
                u.unit_key
                    .map(|k| {
                        let s = rules.unit(k);
                        s.category == crate::rules::ProductionCategory::Vehicle
                            && s.special != UnitSpecial::Harvester
                            && !s.is_air
                    })
                    .unwrap_or(false)
            })
            .filter(|u| u.hp_fraction() < 0.6 && u.is_idle())
            .collect();
        for unit in hurt {
            let angle = slot as f32 * (std::f32::consts::TAU / 6.0);
            let park = depot.pos + Vec2::from_angle(angle) * 110.0;
            slot += 1;
            actions.push(Action::CommandMove {
                player: me,
                unit_ids: vec![unit.id],
                x: park.x,
                y: park.y,
            });
        }
    }
}

fn clamp_to_map(p: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(p.x.clamp(20.0, size.x - 20.0), p.y.clamp(20.0, size.y - 20.0))
}
