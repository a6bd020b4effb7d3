//! In-flight projectiles.
//!
//! Projectiles live in an ordered pool resource rather than as entities:
//! they are created and destroyed in bulk every tick and are iterated in
//! emission order, which keeps damage application deterministic.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{PlayerId, SimId};
use crate::math::Vec2;
use crate::rules::{WeaponArchetype, WeaponClass, WeaponSpec};

/// Maximum ticks a projectile may fly before it expires.
pub const PROJECTILE_LIFETIME: u32 = 240;
/// Trail samples kept for the renderer.
const TRAIL_POINTS: usize = 6;

/// One in-flight shot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: PlayerId,
    pub shooter: Option<SimId>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub target: SimId,
    /// Last known target position; the shot coasts here if the target dies.
    pub target_pos: Vec2,
    pub speed: f32,
    /// Damage already includes the weapon's base value only; armor modifier
    /// and splash falloff apply at impact.
    pub damage: i32,
    pub splash: f32,
    pub weapon_class: WeaponClass,
    pub archetype: WeaponArchetype,
    /// Remaining interception hp; 0 means not interceptable.
    pub hp: i32,
    pub max_hp: i32,
    /// Peak visual arc height over the flight.
    pub arc_height: f32,
    pub start_pos: Vec2,
    pub trail: Vec<Vec2>,
    pub age: u32,
    pub dead: bool,
}

impl Projectile {
    pub fn from_weapon(
        weapon: &WeaponSpec,
        owner: PlayerId,
        shooter: Option<SimId>,
        start: Vec2,
        target: SimId,
        target_pos: Vec2,
    ) -> Self {
        let dist = start.distance_to(target_pos);
        Self {
            owner,
            shooter,
            pos: start,
            vel: (target_pos - start).normalized() * weapon.speed,
            target,
            target_pos,
            speed: weapon.speed,
            damage: weapon.damage,
            splash: weapon.splash,
            weapon_class: weapon.class,
            archetype: weapon.archetype,
            hp: weapon.projectile_hp,
            max_hp: weapon.projectile_hp,
            arc_height: dist * weapon.archetype.arc_factor(),
            start_pos: start,
            trail: Vec::new(),
            age: 0,
            dead: false,
        }
    }

    pub fn interceptable(&self) -> bool {
        self.hp > 0 && !self.dead
    }

    /// Record the current position for the renderer trail.
    pub fn push_trail(&mut self) {
        self.trail.push(self.pos);
        if self.trail.len() > TRAIL_POINTS {
            self.trail.remove(0);
        }
    }
}

/// Ordered sequence of in-flight projectiles, integrated once per tick.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct ProjectilePool {
    pub shots: Vec<Projectile>,
}

impl ProjectilePool {
    pub fn spawn(&mut self, projectile: Projectile) {
        self.shots.push(projectile);
    }

    pub fn retain_live(&mut self) {
        self.shots.retain(|p| !p.dead);
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesCatalog;

    #[test]
    fn test_from_weapon_arc_and_interception() {
        let rules = RulesCatalog::standard();
        let howitzer = rules.weapon(rules.weapon_key("howitzer").unwrap());
        let p = Projectile::from_weapon(
            howitzer,
            0,
            Some(SimId(1)),
            Vec2::ZERO,
            SimId(2),
            Vec2::new(400.0, 0.0),
        );
        assert!(p.arc_height > 0.0);
        assert!(p.interceptable());

        let rifle = rules.weapon(rules.weapon_key("rifle").unwrap());
        let p = Projectile::from_weapon(rifle, 0, None, Vec2::ZERO, SimId(2), Vec2::new(100.0, 0.0));
        assert_eq!(p.arc_height, 0.0);
        assert!(!p.interceptable());
    }

    #[test]
    fn test_trail_is_bounded() {
        let rules = RulesCatalog::standard();
        let rifle = rules.weapon(rules.weapon_key("rifle").unwrap());
        let mut p =
            Projectile::from_weapon(rifle, 0, None, Vec2::ZERO, SimId(2), Vec2::new(100.0, 0.0));
        for i in 0..20 {
            p.pos = Vec2::new(i as f32, 0.0);
            p.push_trail();
        }
        assert_eq!(p.trail.len(), 6);
        assert_eq!(p.trail.last().unwrap().x, 19.0);
    }
}
