//! Strategy selection, threat assessment, enemy intelligence, vengeance,
//! and rush/boom detection.

use std::collections::HashMap;

use crate::components::{PlayerId, SimId};
use crate::rules::{ArmorClass, UnitSpecial};

use super::{AiController, PlanContext};

/// Top-level posture of the planner's FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Buildup,
    Defend,
    Attack,
    Harass,
    AllIn,
}

/// Minimum ticks between strategy flips.
const STRATEGY_COOLDOWN: u64 = 120;
/// Vengeance decay applied per situation update.
const VENGEANCE_DECAY: f32 = 0.995;
/// Vengeance added per fresh hit on our stuff.
const VENGEANCE_PER_HIT: f32 = 1.0;
/// Vengeance boost toward a detected rush target.
pub const RUSH_VENGEANCE_BOOST: f32 = 25.0;
/// Rush detection gates.
const RUSH_MIN_TICK: u64 = 600;
const RUSH_MIN_ARMY: usize = 4;
const RUSH_SCORE_THRESHOLD: f32 = 40.0;
/// Damage younger than this counts as "recent".
const RECENT_DAMAGE_TICKS: u64 = 30;

/// What the planner knows about one enemy.
#[derive(Debug, Clone, Default)]
pub struct EnemyIntel {
    pub unit_count: usize,
    pub combat_unit_count: usize,
    pub building_count: usize,
    pub defense_count: usize,
    pub refinery_count: usize,
    pub harvester_count: usize,
    /// Most common armor class among their ground forces.
    pub dominant_armor: Option<ArmorClass>,
}

/// Current threats against our base and economy.
#[derive(Debug, Clone, Default)]
pub struct ThreatAssessment {
    /// Enemy units inside the base defense radius, innermost first.
    pub base_threats: Vec<SimId>,
    /// Enemy units near any of our buildings.
    pub building_threats: Vec<SimId>,
    /// Our harvesters that are under attack or menaced.
    pub harvesters_under_attack: Vec<SimId>,
}

/// Refresh base center, intel, vengeance and threat lists. Runs every tick.
pub fn update_situation(ctl: &mut AiController, ctx: &PlanContext) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    if let Some(center) = p.base_center(me, rules) {
        ctl.base_center = center;
    }

    // Enemy base location: conyard first, else any building.
    let enemies: Vec<PlayerId> = p.active_owners().into_iter().filter(|&o| o != me).collect();
    if ctl.enemy_base_location.is_none() {
        for &enemy in &enemies {
            if let Some(center) = p.base_center(enemy, rules) {
                ctl.enemy_base_location = Some(center);
                break;
            }
        }
    }

    // Intelligence counters.
    ctl.enemy_intel.clear();
    for &enemy in &enemies {
        let mut intel = EnemyIntel::default();
        let mut armor_votes: HashMap<u8, (ArmorClass, usize)> = HashMap::new();
        for u in p.units_of(enemy) {
            intel.unit_count += 1;
            if let Some(key) = u.unit_key {
                let spec = rules.unit(key);
                if spec.is_combat() {
                    intel.combat_unit_count += 1;
                }
                if spec.special == UnitSpecial::Harvester {
                    intel.harvester_count += 1;
                }
                if !spec.is_air {
                    let entry = armor_votes
                        .entry(spec.armor.index() as u8)
                        .or_insert((spec.armor, 0));
                    entry.1 += 1;
                }
            }
        }
        for b in p.buildings_of(enemy) {
            intel.building_count += 1;
            if let Some(key) = b.building_key {
                let spec = rules.building(key);
                if spec.is_defense {
                    intel.defense_count += 1;
                }
                if spec.is_refinery {
                    intel.refinery_count += 1;
                }
            }
        }
        intel.dominant_armor = armor_votes
            .values()
            .max_by_key(|(armor, n)| (*n, std::cmp::Reverse(armor.index())))
            .map(|(armor, _)| *armor);
        ctl.enemy_intel.insert(enemy, intel);
    }

    // Vengeance: decay, then accrue from fresh hits on our entities.
    for score in ctl.vengeance.values_mut() {
        *score *= VENGEANCE_DECAY;
    }
    ctl.vengeance.retain(|_, s| *s > 0.05);
    for e in p.units_of(me).chain(p.buildings_of(me)) {
        let recent = e
            .last_damage_tick
            .map(|t| ctx.tick.saturating_sub(t) <= RECENT_DAMAGE_TICKS)
            .unwrap_or(false);
        if !recent {
            continue;
        }
        if let Some(attacker) = e.last_attacker_owner {
            if attacker != me && attacker >= 0 {
                *ctl.vengeance.entry(attacker).or_insert(0.0) += VENGEANCE_PER_HIT;
            }
        }
    }

    // Threats.
    let mut threats = ThreatAssessment::default();
    let base = ctl.base_center;
    let defense_radius = ctl.personality.base_defense_radius;
    let building_radius = ctl.personality.threat_detection_radius;
    let my_buildings: Vec<crate::math::Vec2> = p.buildings_of(me).map(|b| b.pos).collect();

    let mut base_threats: Vec<(f32, SimId)> = Vec::new();
    for &enemy in &enemies {
        for u in p.units_of(enemy) {
            let base_dist = u.pos.distance_to(base);
            if base_dist <= defense_radius {
                base_threats.push((base_dist, u.id));
            } else if my_buildings
                .iter()
                .any(|b| b.distance_to(u.pos) <= building_radius)
            {
                threats.building_threats.push(u.id);
            }
        }
    }
    base_threats.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    threats.base_threats = base_threats.into_iter().map(|(_, id)| id).collect();

    for h in p.units_of(me) {
        let is_harvester = h
            .unit_key
            .map(|k| rules.unit(k).special == UnitSpecial::Harvester)
            .unwrap_or(false);
        if !is_harvester {
            continue;
        }
        let recently_hit = h
            .last_damage_tick
            .map(|t| ctx.tick.saturating_sub(t) <= RECENT_DAMAGE_TICKS)
            .unwrap_or(false);
        let menaced = enemies.iter().any(|&enemy| {
            p.units_of(enemy)
                .any(|u| u.pos.distance_to(h.pos) <= 220.0)
        });
        if recently_hit || menaced {
            threats.harvesters_under_attack.push(h.id);
        }
    }
    ctl.threats = threats;
}

/// Strategy FSM with a flip-flop cooldown. Runs on full plans only.
pub fn update_strategy(ctl: &mut AiController, ctx: &PlanContext) {
    if ctx.tick.saturating_sub(ctl.strategy_changed_tick) < STRATEGY_COOLDOWN {
        return;
    }
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    let my_army = p.count_combat_units(me, rules);
    let enemy_army = ctl
        .enemy_intel
        .values()
        .map(|i| i.combat_unit_count)
        .max()
        .unwrap_or(0);
    let my_refineries = p
        .buildings_of(me)
        .filter(|b| b.building_key.map(|k| rules.building(k).is_refinery).unwrap_or(false))
        .count();
    let my_harvesters = p
        .units_of(me)
        .filter(|u| {
            u.unit_key
                .map(|k| rules.unit(k).special == UnitSpecial::Harvester)
                .unwrap_or(false)
        })
        .count();

    let economy_dead = my_refineries == 0 && my_harvesters == 0 && ctx.credits < 500.0;
    let under_threat = !ctl.threats.base_threats.is_empty();
    let attack_ready = my_army >= ctl.personality.group_min
        && my_army as f32 >= enemy_army as f32 * (0.8 + 0.6 * (1.0 - ctl.personality.aggression));
    let harass_ready =
        my_army >= 3 && ctl.personality.aggression >= 0.5 && ctl.enemy_base_location.is_some();

    let next = if economy_dead {
        Strategy::AllIn
    } else if under_threat {
        Strategy::Defend
    } else if attack_ready && ctl.enemy_base_location.is_some() {
        Strategy::Attack
    } else if harass_ready {
        Strategy::Harass
    } else {
        Strategy::Buildup
    };

    if next != ctl.strategy {
        log::debug!(
            "player {} strategy {:?} -> {:?} at tick {}",
            me,
            ctl.strategy,
            next,
            ctx.tick
        );
        ctl.strategy = next;
        ctl.strategy_changed_tick = ctx.tick;
    }
}

/// Score enemies for rush/boom opportunities; the best target above the
/// threshold forces an attack posture and seeds the target location.
pub fn detect_rush_targets(ctl: &mut AiController, ctx: &PlanContext) {
    if ctx.tick < RUSH_MIN_TICK {
        return;
    }
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;
    let my_army = p.count_combat_units(me, rules);
    if my_army < RUSH_MIN_ARMY {
        return;
    }

    let mut best: Option<(f32, PlayerId)> = None;
    let mut owners: Vec<PlayerId> = ctl.enemy_intel.keys().copied().collect();
    owners.sort_unstable();
    for enemy in owners {
        let intel = &ctl.enemy_intel[&enemy];
        let mut score = 0.0f32;
        // Greed: an undefended economy with no standing army.
        if intel.combat_unit_count == 0 && intel.defense_count == 0 {
            score += 50.0;
        }
        // Boom: expanding economy behind little defense.
        if intel.refinery_count >= 2 && intel.defense_count == 0 {
            score += 30.0;
        }
        // Plain numerical outmatch.
        if my_army >= intel.combat_unit_count * 2 {
            score += 20.0 + (my_army - intel.combat_unit_count) as f32;
        }
        let better = match best {
            None => score >= RUSH_SCORE_THRESHOLD,
            Some((bs, _)) => score > bs,
        };
        if better && score >= RUSH_SCORE_THRESHOLD {
            best = Some((score, enemy));
        }
    }

    let Some((score, target)) = best else {
        return;
    };
    log::debug!(
        "player {} rush target: player {} (score {:.0})",
        me,
        target,
        score
    );
    ctl.strategy = Strategy::Attack;
    ctl.strategy_changed_tick = ctx.tick;
    if let Some(center) = p.base_center(target, rules) {
        ctl.enemy_base_location = Some(center);
    }
    *ctl.vengeance.entry(target).or_insert(0.0) += RUSH_VENGEANCE_BOOST;
}
