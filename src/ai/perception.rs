//! Per-tick derived views over the entity store for the AI planner.
//!
//! Built in a single pass and partitioned by owner so every module query is
//! a cheap index walk. The planner and all action modules only ever see this
//! snapshot, never the live world.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::*;
use crate::math::Vec2;
use crate::rules::{BuildingKey, RulesCatalog, UnitKey, UnitSpecial};

/// Read-only view of one entity.
#[derive(Debug, Clone)]
pub struct PEntity {
    pub id: SimId,
    pub owner: PlayerId,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub unit_key: Option<UnitKey>,
    pub building_key: Option<BuildingKey>,
    pub is_ore: bool,
    pub is_well: bool,
    pub is_air: bool,
    pub air_docked: bool,
    pub air_ammo: u32,
    pub cargo: u32,
    pub manual_mode: bool,
    pub flee_cooldown_until: Option<u64>,
    pub resource_target: Option<SimId>,
    pub move_target: Option<Vec2>,
    pub target_id: Option<SimId>,
    pub cooldown: u32,
    pub last_attacker_owner: Option<PlayerId>,
    pub last_damage_tick: Option<u64>,
    pub detonation_assigned: bool,
}

impl PEntity {
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
        }
    }

    pub fn is_unit(&self) -> bool {
        self.unit_key.is_some()
    }

    pub fn is_building(&self) -> bool {
        self.building_key.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.move_target.is_none() && self.target_id.is_none()
    }
}

/// One-pass snapshot of the world, partitioned by owner.
#[derive(Debug, Default)]
pub struct Perception {
    pub entities: Vec<PEntity>,
    by_id: HashMap<SimId, usize>,
    units_by_owner: HashMap<PlayerId, Vec<usize>>,
    buildings_by_owner: HashMap<PlayerId, Vec<usize>>,
    ores: Vec<usize>,
    wells: Vec<usize>,
}

impl Perception {
    /// Capture the current world. Entities arrive in id order.
    #[allow(clippy::type_complexity)]
    pub fn capture(world: &mut World) -> Self {
        let mut entities: Vec<PEntity> = Vec::new();
        {
            let mut q = world.query::<(
                &SimId,
                &Owner,
                &Position,
                &Footprint,
                &Health,
                Option<&UnitType>,
                Option<&BuildingType>,
                Option<&OreTag>,
                Option<&WellTag>,
                Option<&AirUnit>,
                Option<&Harvester>,
                Option<&Movement>,
                Option<&CombatState>,
                Option<&DemoTruck>,
            )>();
            for (id, owner, pos, footprint, health, ut, bt, ore, well, air, harv, movement, combat, truck) in
                q.iter(world)
            {
                if !health.is_alive() {
                    continue;
                }
                entities.push(PEntity {
                    id: *id,
                    owner: owner.0,
                    pos: pos.0,
                    radius: footprint.radius,
                    hp: health.current,
                    max_hp: health.max,
                    unit_key: ut.map(|u| u.0),
                    building_key: bt.map(|b| b.0),
                    is_ore: ore.is_some(),
                    is_well: well.is_some(),
                    is_air: air.is_some(),
                    air_docked: air.map(|a| a.state == AirState::Docked).unwrap_or(false),
                    air_ammo: air.map(|a| a.ammo).unwrap_or(0),
                    cargo: harv.map(|h| h.cargo).unwrap_or(0),
                    manual_mode: harv.map(|h| h.manual_mode).unwrap_or(false),
                    flee_cooldown_until: harv.and_then(|h| h.flee_cooldown_until),
                    resource_target: harv.and_then(|h| h.resource_target),
                    move_target: movement.and_then(|m| m.move_target),
                    target_id: combat.and_then(|c| c.target_id),
                    cooldown: combat.map(|c| c.cooldown).unwrap_or(0),
                    last_attacker_owner: combat.and_then(|c| c.last_attacker_owner),
                    last_damage_tick: combat.and_then(|c| c.last_damage_tick),
                    detonation_assigned: truck
                        .map(|t| t.detonation_target.is_some() || t.detonation_pos.is_some())
                        .unwrap_or(false),
                });
            }
        }
        entities.sort_by_key(|e| e.id);

        let mut perception = Perception {
            by_id: HashMap::with_capacity(entities.len()),
            ..Default::default()
        };
        for (i, e) in entities.iter().enumerate() {
            perception.by_id.insert(e.id, i);
            if e.is_ore {
                perception.ores.push(i);
            } else if e.is_well {
                perception.wells.push(i);
            } else if e.is_unit() {
                perception.units_by_owner.entry(e.owner).or_default().push(i);
            } else if e.is_building() {
                perception
                    .buildings_by_owner
                    .entry(e.owner)
                    .or_default()
                    .push(i);
            }
        }
        perception.entities = entities;
        perception
    }

    pub fn get(&self, id: SimId) -> Option<&PEntity> {
        self.by_id.get(&id).map(|&i| &self.entities[i])
    }

    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &PEntity> {
        self.units_by_owner
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|&i| &self.entities[i])
    }

    pub fn buildings_of(&self, owner: PlayerId) -> impl Iterator<Item = &PEntity> {
        self.buildings_by_owner
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|&i| &self.entities[i])
    }

    pub fn ores(&self) -> impl Iterator<Item = &PEntity> {
        self.ores.iter().map(|&i| &self.entities[i])
    }

    pub fn wells(&self) -> impl Iterator<Item = &PEntity> {
        self.wells.iter().map(|&i| &self.entities[i])
    }

    /// Owners with at least one live unit or building, id order.
    pub fn active_owners(&self) -> Vec<PlayerId> {
        let mut owners: Vec<PlayerId> = self
            .units_by_owner
            .keys()
            .chain(self.buildings_by_owner.keys())
            .copied()
            .filter(|&o| o >= 0)
            .collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }

    /// Line combat units: armed, no special role, ground.
    pub fn combat_units_of<'a>(
        &'a self,
        owner: PlayerId,
        rules: &'a RulesCatalog,
    ) -> impl Iterator<Item = &'a PEntity> {
        self.units_of(owner).filter(move |e| {
            e.unit_key
                .map(|k| {
                    let spec = rules.unit(k);
                    spec.weapon.is_some() && spec.special == UnitSpecial::None && !spec.is_air
                })
                .unwrap_or(false)
        })
    }

    pub fn count_combat_units(&self, owner: PlayerId, rules: &RulesCatalog) -> usize {
        self.combat_units_of(owner, rules).count()
    }

    /// Conyard position, else building centroid, else `None`.
    pub fn base_center(&self, owner: PlayerId, rules: &RulesCatalog) -> Option<Vec2> {
        let conyard = self
            .buildings_of(owner)
            .find(|e| e.building_key.map(|k| rules.building(k).is_conyard).unwrap_or(false));
        if let Some(c) = conyard {
            return Some(c.pos);
        }
        let mut sum = Vec2::ZERO;
        let mut n = 0u32;
        for b in self.buildings_of(owner) {
            sum += b.pos;
            n += 1;
        }
        (n > 0).then(|| sum * (1.0 / n as f32))
    }
}
