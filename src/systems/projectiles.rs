//! Projectile integration: flight, impact, splash, expiry.
//!
//! Shots fly at their target's live position; if the target dies mid-flight
//! they coast into its former position and fizzle. Impact damage is rounded
//! after the armor modifier and splash falloff are applied.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::projectile::{ProjectilePool, PROJECTILE_LIFETIME};
use crate::rules::{ArmorClass, RulesCatalog, RulesRes};
use crate::spatial::{EntryKind, SpatialGrid};
use crate::state::{DamageEvent, DamageQueue};

struct VictimInfo {
    pos: Vec2,
    armor: Option<ArmorClass>,
}

#[allow(clippy::type_complexity)]
pub fn projectile_system(
    rules: Res<RulesRes>,
    grid: Res<SpatialGrid>,
    mut pool: ResMut<ProjectilePool>,
    mut damage: ResMut<DamageQueue>,
    victims: Query<(
        &SimId,
        &Position,
        &Health,
        Option<&UnitType>,
        Option<&BuildingType>,
        Option<&OreTag>,
    )>,
) {
    let info: HashMap<SimId, VictimInfo> = victims
        .iter()
        .filter(|(_, _, h, ..)| h.is_alive())
        .map(|(id, pos, _, ut, bt, ore)| {
            let armor = if let Some(ut) = ut {
                Some(rules.unit(ut.0).armor)
            } else if bt.is_some() {
                Some(ArmorClass::Structure)
            } else if ore.is_some() {
                None
            } else {
                None
            };
            (
                *id,
                VictimInfo {
                    pos: pos.0,
                    armor,
                },
            )
        })
        .collect();

    for shot in pool.shots.iter_mut() {
        if shot.dead {
            continue;
        }
        shot.age += 1;
        if shot.age > PROJECTILE_LIFETIME {
            shot.dead = true;
            continue;
        }

        let target_alive = info.contains_key(&shot.target);
        if let Some(v) = info.get(&shot.target) {
            shot.target_pos = v.pos;
        }
        shot.vel = (shot.target_pos - shot.pos).normalized() * shot.speed;
        shot.pos += shot.vel;
        shot.push_trail();

        if shot.pos.distance_to(shot.target_pos) > shot.speed.max(10.0) {
            continue;
        }
        shot.dead = true;

        if shot.splash > 0.0 {
            // Area damage around the impact point; resources and rocks are
            // spared, friendlies are not.
            for e in grid.query_radius(shot.target_pos.x, shot.target_pos.y, shot.splash) {
                if !matches!(e.kind, EntryKind::Unit | EntryKind::Building) {
                    continue;
                }
                let Some(v) = info.get(&e.id) else {
                    continue;
                };
                let dist = v.pos.distance_to(shot.target_pos);
                if dist > shot.splash {
                    continue;
                }
                let modifier = v
                    .armor
                    .map(|a| rules.damage_modifier(shot.weapon_class, a))
                    .unwrap_or(0.0);
                let amount = (shot.damage as f32
                    * modifier
                    * RulesCatalog::splash_falloff(dist, shot.splash))
                .round() as i32;
                if amount != 0 {
                    damage.0.push(DamageEvent {
                        target: e.id,
                        amount,
                        attacker: shot.shooter,
                        attacker_owner: Some(shot.owner),
                    });
                }
            }
        } else if target_alive {
            let modifier = info
                .get(&shot.target)
                .and_then(|v| v.armor)
                .map(|a| rules.damage_modifier(shot.weapon_class, a))
                .unwrap_or(1.0);
            let amount = (shot.damage as f32 * modifier).round() as i32;
            if amount != 0 {
                damage.0.push(DamageEvent {
                    target: shot.target,
                    amount,
                    attacker: shot.shooter,
                    attacker_owner: Some(shot.owner),
                });
            }
        }
    }

    pool.retain_live();
}
