//! Steering and movement integration.
//!
//! Steering combines path following (A* waypoints), separation against
//! neighbors, whisker avoidance against the collision grid, and a keep-right
//! bias in crowds. Stuck units sidestep perpendicular to their intended
//! direction for a short burst.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::math::{rotate_towards, Vec2};
use crate::nav::NavGrid;
use crate::rng::SimRng;
use crate::rules::RulesRes;
use crate::spatial::{EntryKind, SpatialGrid};
use crate::state::IdIndex;

/// Waypoint advance distance.
const WAYPOINT_REACH: f32 = 25.0;
/// Default arrival tolerance; harvesters on manual orders use the wide one.
const ARRIVE_TOLERANCE: f32 = 20.0;
const ARRIVE_TOLERANCE_HARVESTER: f32 = 40.0;
/// A path is stale once its destination drifted this far.
const PATH_STALE_DIST: f32 = 20.0;
/// Stuck detection: slow for this many ticks triggers a sidestep.
const STUCK_SPEED_FRACTION: f32 = 0.15;
const STUCK_TRIGGER_TICKS: u32 = 20;
const PATH_RETRY_STUCK_TICKS: u32 = 30;
const UNSTUCK_DURATION: u32 = 25;
/// Velocity blend: 40% new desire, 60% previous.
const VEL_BLEND: f32 = 0.4;
/// Body rotation damping fraction per tick.
const BODY_TURN_FRACTION: f32 = 0.15;
/// Turret tracking step in radians per tick.
const TURRET_TURN_STEP: f32 = 0.3;

/// Damp an angle toward a target by a fraction of the shortest arc.
fn damp_angle(current: f32, target: f32, fraction: f32) -> f32 {
    let mut diff = target - current;
    while diff > std::f32::consts::PI {
        diff -= std::f32::consts::TAU;
    }
    while diff < -std::f32::consts::PI {
        diff += std::f32::consts::TAU;
    }
    current + diff * fraction
}

/// Compute per-unit velocities from move targets.
#[allow(clippy::type_complexity)]
pub fn steering_system(
    rules: Res<RulesRes>,
    grid: Res<SpatialGrid>,
    mut nav: ResMut<NavGrid>,
    mut rng: ResMut<SimRng>,
    mut movers: Query<
        (
            Entity,
            &SimId,
            &Owner,
            &Position,
            &PrevPosition,
            &Footprint,
            &UnitType,
            &Health,
            &mut Movement,
            Option<&AirUnit>,
            Option<&Harvester>,
        ),
        With<UnitTag>,
    >,
) {
    let mut order: Vec<(SimId, Entity)> = movers
        .iter()
        .filter(|(_, _, _, _, _, _, _, h, ..)| h.is_alive())
        .map(|(e, id, ..)| (*id, e))
        .collect();
    order.sort_by_key(|(id, _)| *id);

    for (_, entity) in order {
        let Ok((_, _, owner, pos, prev, footprint, ut, _, mut m, air, harvester)) =
            movers.get_mut(entity)
        else {
            continue;
        };
        let owner = owner.0;
        let pos = pos.0;
        let speed = rules.unit(ut.0).speed;

        m.avg_vel = m.avg_vel * 0.8 + (pos - prev.0) * 0.2;

        let Some(target) = m.move_target else {
            m.vel = Vec2::ZERO;
            m.stuck_timer = 0;
            m.unstuck_timer = 0;
            continue;
        };

        let manual_harvester = harvester.map(|h| h.manual_mode).unwrap_or(false);
        let tolerance = if manual_harvester {
            ARRIVE_TOLERANCE_HARVESTER
        } else {
            ARRIVE_TOLERANCE
        };
        let dist_to_target = pos.distance_to(target);
        if dist_to_target <= tolerance {
            m.clear_move();
            m.vel = Vec2::ZERO;
            continue;
        }

        // Progress bookkeeping feeds flee timeouts and give-up logic.
        let best = m.best_dist_to_move_target.map_or(dist_to_target, |b| b.min(dist_to_target));
        if m.best_dist_to_move_target.map_or(true, |b| dist_to_target < b - 1.0) {
            m.move_target_no_progress_ticks = 0;
        } else {
            m.move_target_no_progress_ticks = m.move_target_no_progress_ticks.saturating_add(1);
        }
        m.best_dist_to_move_target = Some(best);
        m.last_dist_to_move_target = Some(dist_to_target);

        // Aircraft fly straight.
        if air.is_some() {
            m.vel = (target - pos).normalized() * speed;
            continue;
        }

        // Path upkeep.
        let stale = match m.final_dest {
            None => true,
            Some(dest) => dest.distance_to(target) > PATH_STALE_DIST,
        } || m.stuck_timer > PATH_RETRY_STUCK_TICKS;
        if m.path.is_none() || stale {
            m.path = nav.find_path(pos, target, footprint.radius, owner);
            m.path_idx = 0;
            m.final_dest = Some(target);
        }

        // Immediate steering point: next waypoint, else the target itself.
        let immediate = match m.path.as_ref().map(|w| w.len()) {
            Some(len) => {
                let mut idx = m.path_idx;
                while idx + 1 < len && pos.distance_to(m.path.as_ref().unwrap()[idx]) < WAYPOINT_REACH {
                    idx += 1;
                }
                m.path_idx = idx;
                m.path.as_ref().unwrap().get(idx).copied().unwrap_or(target)
            }
            None => target,
        };
        let dir = (immediate - pos).normalized();

        // Stuck detection and perpendicular escape.
        if m.avg_vel.length() < STUCK_SPEED_FRACTION * speed {
            m.stuck_timer = m.stuck_timer.saturating_add(1);
        } else {
            m.stuck_timer = 0;
        }
        if m.unstuck_timer == 0 && m.stuck_timer > STUCK_TRIGGER_TICKS {
            let side = if rng.chance(0.5) { 1.0 } else { -1.0 };
            m.unstuck_dir = Some(dir.perp() * side);
            m.unstuck_timer = UNSTUCK_DURATION;
            m.stuck_timer = 0;
        }
        if m.unstuck_timer > 0 {
            m.unstuck_timer -= 1;
            if let Some(escape) = m.unstuck_dir {
                m.vel = escape * speed;
            }
            if m.unstuck_timer == 0 {
                m.unstuck_dir = None;
            }
            continue;
        }

        // Separation from nearby ground units.
        let mut push = Vec2::ZERO;
        let mut crowd = 0u32;
        for e in grid.query_radius(pos.x, pos.y, footprint.radius + 30.0) {
            if e.entity == entity || e.kind != EntryKind::Unit || e.air {
                continue;
            }
            let reach = footprint.radius + e.radius + 3.0;
            let d = pos.distance_to(Vec2::new(e.x, e.y));
            if d < reach {
                crowd += 1;
                if d > 0.01 {
                    push += (pos - Vec2::new(e.x, e.y)).normalized() * (1.0 - d / reach);
                }
            }
        }

        // Whisker probes against the collision grid; fewer when a path
        // already routes around statics.
        let heading = dir.angle();
        let whisker_angles: &[f32] = if m.path.is_some() {
            &[-0.5, 0.0, 0.5]
        } else {
            &[-1.0, -0.5, 0.0, 0.5, 1.0]
        };
        let mut avoid = Vec2::ZERO;
        let probe_dist = footprint.radius + 25.0;
        for &a in whisker_angles {
            let probe = pos + Vec2::from_angle(heading + a) * probe_dist;
            if !nav.is_clear(probe, footprint.radius * 0.5) {
                let weight = 1.0 - a.abs() * 0.5;
                avoid -= Vec2::from_angle(heading + a) * weight;
            }
        }

        // Keep-right bias in crowds.
        let bias = if crowd >= 2 { dir.perp() * -0.15 } else { Vec2::ZERO };

        let mut desired = dir + push * 1.2 + avoid + bias;
        // Combined force pointing backward would make the unit spin in
        // place; snap to the perpendicular instead.
        if desired.dot(dir) < 0.0 {
            desired = dir.perp();
        }
        let desired = desired.normalized() * speed;
        let blended = m.vel * (1.0 - VEL_BLEND) + desired * VEL_BLEND;
        m.vel = if blended.length() > speed {
            blended.normalized() * speed
        } else {
            blended
        };
    }
}

/// Apply velocities, damp body rotation, run down combat timers.
#[allow(clippy::type_complexity)]
pub fn movement_integration_system(
    mut units: Query<
        (
            &mut Position,
            &mut PrevPosition,
            &mut Movement,
            Option<&AirUnit>,
            &Health,
        ),
        With<UnitTag>,
    >,
    mut timers: Query<&mut CombatState>,
) {
    for (mut pos, mut prev, mut m, air, health) in units.iter_mut() {
        if !health.is_alive() {
            continue;
        }
        prev.0 = pos.0;
        pos.0 += m.vel;
        if m.vel.length() > 0.01 {
            let target_angle = m.vel.angle();
            m.rotation = if air.is_some() {
                target_angle
            } else {
                damp_angle(m.rotation, target_angle, BODY_TURN_FRACTION)
            };
        }
    }

    for mut c in timers.iter_mut() {
        if c.cooldown > 0 {
            c.cooldown -= 1;
        }
        if c.flash > 0 {
            c.flash -= 1;
        }
    }
}

/// Turrets swing toward their target faster than the hull turns.
pub fn turret_tracking_system(
    index: Res<IdIndex>,
    positions: Query<&Position>,
    mut gunners: Query<(Entity, &mut CombatState)>,
) {
    for (entity, mut c) in gunners.iter_mut() {
        let Some(target) = c.target_id else {
            continue;
        };
        let Some(target_entity) = index.get(target) else {
            continue;
        };
        let (Ok(own_pos), Ok(target_pos)) = (positions.get(entity), positions.get(target_entity))
        else {
            continue;
        };
        let want = (target_pos.0 - own_pos.0).angle();
        c.turret_angle = rotate_towards(c.turret_angle, want, TURRET_TURN_STEP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damp_angle_moves_fractionally() {
        let r = damp_angle(0.0, 1.0, 0.15);
        assert!((r - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_damp_angle_takes_short_arc() {
        use std::f32::consts::PI;
        let r = damp_angle(PI - 0.05, -PI + 0.05, 0.5);
        // Should move across the seam, not the long way around.
        assert!(r > PI - 0.06);
    }
}
