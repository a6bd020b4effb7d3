//! Overlap resolution between units, and between units and statics.
//!
//! Runs a fixed number of relaxation passes per tick. Moving units yield
//! more of the correction than parked ones, and two moving units slide past
//! each other with a keep-right tangential nudge. Statics never move: a unit
//! overlapping a building, rock or well takes the full correction.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::math::Vec2;
use crate::spatial::{EntryKind, SpatialGrid};
use crate::state::{MapConfig, SimConfig};

/// Share of the correction taken by a moving unit against a parked one.
const MOVING_SHARE: f32 = 0.75;
/// Tangential keep-right slide when both units are moving.
const SLIDE_FACTOR: f32 = 0.3;

struct Mover {
    entity: Entity,
    id: SimId,
    pos: Vec2,
    radius: f32,
    moving: bool,
}

#[allow(clippy::type_complexity)]
pub fn collision_resolution_system(
    config: Res<SimConfig>,
    map: Res<MapConfig>,
    grid: Res<SpatialGrid>,
    mut units: Query<
        (Entity, &SimId, &mut Position, &Footprint, &Movement, &Health),
        (With<UnitTag>, Without<AirUnit>),
    >,
    statics: Query<
        (&Position, &Footprint, &Health),
        (
            Or<(With<BuildingTag>, With<RockTag>, With<WellTag>)>,
            Without<UnitTag>,
        ),
    >,
) {
    let mut movers: Vec<Mover> = units
        .iter()
        .filter(|(_, _, _, _, _, h)| h.is_alive())
        .map(|(entity, id, pos, footprint, m, _)| Mover {
            entity,
            id: *id,
            pos: pos.0,
            radius: footprint.radius,
            moving: m.vel.length() > 0.05,
        })
        .collect();
    movers.sort_by_key(|m| m.id);

    let obstacles: Vec<(Vec2, f32, f32)> = statics
        .iter()
        .filter(|(_, _, h)| h.is_alive())
        .map(|(pos, footprint, _)| (pos.0, footprint.w, footprint.h))
        .collect();

    let index_of: std::collections::HashMap<SimId, usize> = movers
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    // Pair candidates come from the start-of-tick grid; the query buffer
    // absorbs the drift from this tick's integration.
    let mut pair_list: Vec<(usize, usize)> = Vec::new();
    for (i, mover) in movers.iter().enumerate() {
        for e in grid.query_radius(mover.pos.x, mover.pos.y, mover.radius + 30.0) {
            if e.kind != EntryKind::Unit || e.air || e.id <= mover.id {
                continue;
            }
            if let Some(&j) = index_of.get(&e.id) {
                pair_list.push((i, j));
            }
        }
    }

    for _ in 0..config.collision_passes {
        for &(i, j) in &pair_list {
            let (pi, pj) = (movers[i].pos, movers[j].pos);
            let reach = movers[i].radius + movers[j].radius;
            let delta = pj - pi;
            let dist = delta.length();
            if dist >= reach {
                continue;
            }
            // Coincident centers get a deterministic separation axis.
            let axis = if dist < 0.01 {
                Vec2::from_angle((movers[i].id.0 + movers[j].id.0) as f32)
            } else {
                delta.normalized()
            };
            let overlap = reach - dist;
            let (wi, wj) = match (movers[i].moving, movers[j].moving) {
                (true, true) | (false, false) => (0.5, 0.5),
                (true, false) => (MOVING_SHARE, 1.0 - MOVING_SHARE),
                (false, true) => (1.0 - MOVING_SHARE, MOVING_SHARE),
            };
            movers[i].pos -= axis * (overlap * wi);
            movers[j].pos += axis * (overlap * wj);
            if movers[i].moving && movers[j].moving {
                let slide = axis.perp() * (overlap * SLIDE_FACTOR);
                movers[i].pos -= slide;
                movers[j].pos += slide;
            }
        }

        // Units yield the full overlap against statics.
        for mover in movers.iter_mut() {
            for &(center, w, h) in &obstacles {
                let half_w = w * 0.5;
                let half_h = h * 0.5;
                let closest = Vec2::new(
                    mover.pos.x.clamp(center.x - half_w, center.x + half_w),
                    mover.pos.y.clamp(center.y - half_h, center.y + half_h),
                );
                let delta = mover.pos - closest;
                let dist = delta.length();
                if dist >= mover.radius {
                    continue;
                }
                if dist < 0.01 {
                    // Center inside the box: exit through the nearest face.
                    let dx_left = (mover.pos.x - (center.x - half_w)).abs();
                    let dx_right = ((center.x + half_w) - mover.pos.x).abs();
                    let dy_top = (mover.pos.y - (center.y - half_h)).abs();
                    let dy_bottom = ((center.y + half_h) - mover.pos.y).abs();
                    let min = dx_left.min(dx_right).min(dy_top).min(dy_bottom);
                    if min == dx_left {
                        mover.pos.x = center.x - half_w - mover.radius;
                    } else if min == dx_right {
                        mover.pos.x = center.x + half_w + mover.radius;
                    } else if min == dy_top {
                        mover.pos.y = center.y - half_h - mover.radius;
                    } else {
                        mover.pos.y = center.y + half_h + mover.radius;
                    }
                } else {
                    mover.pos = closest + delta.normalized() * mover.radius;
                }
            }
            mover.pos.x = mover.pos.x.clamp(mover.radius, map.width - mover.radius);
            mover.pos.y = mover.pos.y.clamp(mover.radius, map.height - mover.radius);
        }
    }

    for mover in &movers {
        if let Ok((_, _, mut pos, _, _, _)) = units.get_mut(mover.entity) {
            pos.0 = mover.pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::players::Difficulty;

    #[test]
    fn test_overlapping_units_separate() {
        let mut sim = SimWorld::sandbox(7);
        let p = sim.add_player(false, Difficulty::Easy);
        let a = sim.spawn_unit_at(p, "light_tank", 500.0, 500.0);
        let b = sim.spawn_unit_at(p, "light_tank", 505.0, 500.0);
        for _ in 0..20 {
            sim.tick();
        }
        let ea = sim.resolve(a).unwrap();
        let eb = sim.resolve(b).unwrap();
        let pa = sim.world().get::<Position>(ea).unwrap().0;
        let pb = sim.world().get::<Position>(eb).unwrap().0;
        // Both tanks have radius 18; centers should be pushed to ~36 apart.
        assert!(pa.distance_to(pb) >= 30.0, "still overlapping: {}", pa.distance_to(pb));
    }

    #[test]
    fn test_unit_pushed_out_of_building() {
        let mut sim = SimWorld::sandbox(7);
        let p = sim.add_player(false, Difficulty::Easy);
        sim.spawn_building_at(p, "power_plant", 500.0, 500.0);
        let u = sim.spawn_unit_at(p, "rifleman", 505.0, 500.0);
        for _ in 0..10 {
            sim.tick();
        }
        let e = sim.resolve(u).unwrap();
        let pos = sim.world().get::<Position>(e).unwrap().0;
        // Power plant is 64x64 at (500,500); the rifleman (r=8) must end
        // outside the slab.
        let dx = (pos.x - 500.0).abs();
        let dy = (pos.y - 500.0).abs();
        assert!(dx >= 39.0 || dy >= 39.0, "unit still inside footprint at {pos:?}");
    }
}
