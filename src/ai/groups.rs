//! Attack-group cohesion state machine, base defense, harassment, and
//! stray rallying.

use crate::actions::Action;
use crate::components::{PlayerId, SimId};
use crate::math::Vec2;
use crate::rules::UnitSpecial;

use super::planner::Strategy;
use super::{AiController, PlanContext};

/// Members inside this radius of the centroid count as "together".
const COHESION_RADIUS: f32 = 150.0;
/// Share of members that must be together to leave `Rallying`.
const COHESION_QUORUM: f32 = 0.7;
/// Give up rallying after this long and march anyway.
const RALLY_TIMEOUT: u64 = 300;
/// Max spread before stragglers are pulled back in while moving.
const SPREAD_THRESHOLD: f32 = 400.0;
const REGROUP_INTERVAL: u64 = 100;
/// Threat scan radius while traveling.
const ENGAGE_SCAN: f32 = 350.0;
/// Reinforcement wait bound.
const REINFORCE_TIMEOUT: u64 = 600;
/// Health recovery (percentage points) required to leave `Retreating`.
const RETREAT_RECOVERY: f32 = 0.20;
/// Groups at or above this size consider a two-front split.
const SPLIT_SIZE: usize = 10;
/// Units farther than this from base with nothing to do get rallied home.
const STRAY_DISTANCE: f32 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    Forming,
    Rallying,
    Moving,
    Engaging,
    Attacking,
    Retreating,
    Reinforcing,
}

/// One offensive group and its cohesion bookkeeping.
#[derive(Debug, Clone)]
pub struct AttackGroup {
    pub id: u32,
    pub unit_ids: Vec<SimId>,
    pub status: GroupStatus,
    pub target: Option<SimId>,
    pub rally_point: Option<Vec2>,
    pub move_target: Option<Vec2>,
    /// Where to resume after an en-route engagement.
    pub pre_engage_target: Option<Vec2>,
    pub engaged_enemies: Vec<SimId>,
    pub last_order_tick: u64,
    pub status_since_tick: u64,
    pub avg_health_percent: f32,
    pub needs_reinforcements: bool,
    pub reinforcement_ids: Vec<SimId>,
    pub last_regroup_tick: u64,
}

impl AttackGroup {
    fn new(id: u32, tick: u64) -> Self {
        Self {
            id,
            unit_ids: Vec::new(),
            status: GroupStatus::Forming,
            target: None,
            rally_point: None,
            move_target: None,
            pre_engage_target: None,
            engaged_enemies: Vec::new(),
            last_order_tick: tick,
            status_since_tick: tick,
            avg_health_percent: 1.0,
            needs_reinforcements: false,
            reinforcement_ids: Vec::new(),
            last_regroup_tick: tick,
        }
    }

    /// Bare group for state-machine tests.
    #[cfg(test)]
    pub(crate) fn test_group(id: u32, tick: u64) -> Self {
        Self::new(id, tick)
    }

    fn set_status(&mut self, status: GroupStatus, tick: u64) {
        if self.status != status {
            self.status = status;
            self.status_since_tick = tick;
        }
    }

    fn centroid(&self, ctx: &PlanContext) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut n = 0u32;
        for &id in &self.unit_ids {
            if let Some(e) = ctx.perception.get(id) {
                sum += e.pos;
                n += 1;
            }
        }
        (n > 0).then(|| sum * (1.0 / n as f32))
    }

    /// Accepting recruits? Only while gathering, or under critical minimum.
    fn accepts_recruits(&self, group_min: usize) -> bool {
        matches!(self.status, GroupStatus::Forming | GroupStatus::Rallying)
            || self.unit_ids.len() < group_min.div_ceil(2)
    }
}

/// Ids already spoken for by any group/harass/scout assignment.
fn assigned_ids(ctl: &AiController) -> Vec<SimId> {
    let mut ids: Vec<SimId> = ctl
        .groups
        .iter()
        .flat_map(|g| g.unit_ids.iter().chain(g.reinforcement_ids.iter()))
        .copied()
        .collect();
    ids.extend(ctl.harass_group.iter().copied());
    if let Some(scout) = ctl.scout_unit {
        ids.push(scout);
    }
    ids
}

/// Full-plan group upkeep: membership, state machine, orders.
pub fn run(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let tick = ctx.tick;

    // Prune dead or converted members.
    for group in &mut ctl.groups {
        group.unit_ids.retain(|&id| {
            ctx.perception.get(id).map(|e| e.owner == me).unwrap_or(false)
        });
        group.reinforcement_ids.retain(|&id| {
            ctx.perception.get(id).map(|e| e.owner == me).unwrap_or(false)
        });
    }
    ctl.groups.retain(|g| !g.unit_ids.is_empty() || g.status == GroupStatus::Forming);

    // Recruit idle combat units.
    let taken = assigned_ids(ctl);
    let recruits: Vec<SimId> = ctx
        .perception
        .combat_units_of(me, ctx.rules)
        .filter(|e| !taken.contains(&e.id))
        .map(|e| e.id)
        .collect();
    let group_min = ctl.personality.group_min;
    let group_max = ctl.personality.group_max;
    for id in recruits {
        // Reinforcement requests first.
        if let Some(group) = ctl
            .groups
            .iter_mut()
            .find(|g| g.needs_reinforcements && g.unit_ids.len() + g.reinforcement_ids.len() < group_max)
        {
            group.reinforcement_ids.push(id);
            continue;
        }
        let open = ctl
            .groups
            .iter_mut()
            .find(|g| g.accepts_recruits(group_min) && g.unit_ids.len() < group_max);
        match open {
            Some(group) => group.unit_ids.push(id),
            None => {
                let gid = ctl.next_group_id;
                ctl.next_group_id += 1;
                let mut group = AttackGroup::new(gid, tick);
                group.unit_ids.push(id);
                ctl.groups.push(group);
            }
        }
    }

    let base = ctl.base_center;
    let enemy_base = ctl.enemy_base_location;
    let vengeance = ctl.vengeance.clone();
    let retreat_threshold = ctl.personality.retreat_threshold;
    let reinforce_threshold = ctl.personality.reinforce_threshold;
    let aggressive = matches!(ctl.strategy, Strategy::Attack | Strategy::AllIn);

    for group in &mut ctl.groups {
        // Health average drives retreat/reinforce decisions.
        let mut health_sum = 0.0;
        let mut n = 0u32;
        for &id in &group.unit_ids {
            if let Some(e) = ctx.perception.get(id) {
                health_sum += e.hp_fraction();
                n += 1;
            }
        }
        group.avg_health_percent = if n > 0 { health_sum / n as f32 } else { 1.0 };

        let Some(centroid) = group.centroid(ctx) else {
            continue;
        };

        match group.status {
            GroupStatus::Forming => {
                if group.unit_ids.len() >= group_min && aggressive {
                    let toward = enemy_base.unwrap_or(centroid);
                    group.rally_point = Some(base + (toward - base).normalized() * 300.0);
                    group.set_status(GroupStatus::Rallying, tick);
                }
            }
            GroupStatus::Rallying => {
                let Some(rally) = group.rally_point else {
                    group.set_status(GroupStatus::Forming, tick);
                    continue;
                };
                let together = group
                    .unit_ids
                    .iter()
                    .filter_map(|&id| ctx.perception.get(id))
                    .filter(|e| e.pos.distance_to(rally) <= COHESION_RADIUS)
                    .count();
                let quorum =
                    together as f32 >= group.unit_ids.len() as f32 * COHESION_QUORUM;
                if quorum || tick.saturating_sub(group.status_since_tick) > RALLY_TIMEOUT {
                    group.move_target = enemy_base;
                    group.set_status(GroupStatus::Moving, tick);
                } else {
                    order_move_members(ctx, me, &group.unit_ids, rally, false, actions);
                }
            }
            GroupStatus::Moving => {
                let Some(dest) = group.move_target.or(enemy_base) else {
                    group.set_status(GroupStatus::Forming, tick);
                    continue;
                };
                group.move_target = Some(dest);

                // En-route threats flip the group into an engagement.
                let threat = nearest_enemy_near(ctx, me, centroid, ENGAGE_SCAN);
                if let Some(threat) = threat {
                    group.pre_engage_target = Some(dest);
                    group.engaged_enemies = vec![threat];
                    group.set_status(GroupStatus::Engaging, tick);
                    continue;
                }
                if centroid.distance_to(dest) <= COHESION_RADIUS {
                    group.set_status(GroupStatus::Attacking, tick);
                    continue;
                }
                // Cohesion on the march: pull stragglers, slow the tip.
                let spread = group
                    .unit_ids
                    .iter()
                    .filter_map(|&id| ctx.perception.get(id))
                    .map(|e| e.pos.distance_to(centroid))
                    .fold(0.0f32, f32::max);
                if spread > SPREAD_THRESHOLD
                    && tick.saturating_sub(group.last_regroup_tick) > REGROUP_INTERVAL
                {
                    group.last_regroup_tick = tick;
                    let stragglers: Vec<SimId> = group
                        .unit_ids
                        .iter()
                        .filter(|&&id| {
                            ctx.perception
                                .get(id)
                                .map(|e| e.pos.distance_to(centroid) > SPREAD_THRESHOLD * 0.75)
                                .unwrap_or(false)
                        })
                        .copied()
                        .collect();
                    order_move_members(ctx, me, &stragglers, centroid, false, actions);
                } else {
                    order_move_members(ctx, me, &group.unit_ids, dest, true, actions);
                }
            }
            GroupStatus::Engaging => {
                let threats: Vec<SimId> = group
                    .engaged_enemies
                    .iter()
                    .filter(|&&id| ctx.perception.get(id).is_some())
                    .copied()
                    .collect();
                let live_threat = threats
                    .first()
                    .copied()
                    .or_else(|| nearest_enemy_near(ctx, me, centroid, ENGAGE_SCAN));
                match live_threat {
                    Some(threat) => {
                        group.engaged_enemies = vec![threat];
                        order_attack_members(ctx, me, &group.unit_ids, threat, actions);
                    }
                    None => {
                        group.engaged_enemies.clear();
                        if group.pre_engage_target.take().is_some() {
                            group.set_status(GroupStatus::Moving, tick);
                        } else {
                            group.set_status(GroupStatus::Attacking, tick);
                        }
                    }
                }
            }
            GroupStatus::Attacking => {
                if group.avg_health_percent < retreat_threshold {
                    group.set_status(GroupStatus::Retreating, tick);
                    continue;
                }
                if group.avg_health_percent < reinforce_threshold {
                    group.needs_reinforcements = true;
                    group.set_status(GroupStatus::Reinforcing, tick);
                    continue;
                }
                let scored = score_targets(ctx, me, group, centroid, &vengeance);
                let Some(&(_, best)) = scored.first() else {
                    // Nothing left here; push on toward the enemy base.
                    if let Some(dest) = enemy_base {
                        group.move_target = Some(dest);
                        group.set_status(GroupStatus::Moving, tick);
                    }
                    continue;
                };
                group.target = Some(best);
                if group.unit_ids.len() >= SPLIT_SIZE && scored.len() >= 2 {
                    // Two-front pressure: 60% on the best target, 40% on
                    // the runner-up.
                    let second = scored[1].1;
                    let cut = group.unit_ids.len() * 6 / 10;
                    let (front, flank) = group.unit_ids.split_at(cut);
                    order_attack_members(ctx, me, front, best, actions);
                    order_attack_members(ctx, me, flank, second, actions);
                } else {
                    order_attack_members(ctx, me, &group.unit_ids, best, actions);
                }
            }
            GroupStatus::Retreating => {
                if group.avg_health_percent >= retreat_threshold + RETREAT_RECOVERY {
                    group.set_status(GroupStatus::Rallying, tick);
                    group.rally_point = Some(base);
                    continue;
                }
                order_move_members(ctx, me, &group.unit_ids, base, false, actions);
            }
            GroupStatus::Reinforcing => {
                let arrived = group
                    .reinforcement_ids
                    .iter()
                    .filter_map(|&id| ctx.perception.get(id))
                    .filter(|e| e.pos.distance_to(centroid) <= COHESION_RADIUS * 1.5)
                    .count();
                let quorum = !group.reinforcement_ids.is_empty()
                    && arrived as f32 >= group.reinforcement_ids.len() as f32 * COHESION_QUORUM;
                let timeout = tick.saturating_sub(group.status_since_tick) > REINFORCE_TIMEOUT;
                if quorum || timeout {
                    let fresh = std::mem::take(&mut group.reinforcement_ids);
                    group.unit_ids.extend(fresh);
                    group.needs_reinforcements = false;
                    group.set_status(GroupStatus::Attacking, tick);
                } else {
                    let members = group.reinforcement_ids.clone();
                    order_move_members(ctx, me, &members, centroid, true, actions);
                }
            }
        }
        group.last_order_tick = tick;
    }
}

/// Innermost-threat base defense. Runs every tick and bypasses trickle
/// prevention: anyone close enough fights.
pub fn defend_base(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let Some(&threat) = ctl.threats.base_threats.first() else {
        return;
    };
    let me = ctl.player;
    let base = ctl.base_center;
    let radius = ctl.personality.base_defense_radius * 1.5;
    let defenders: Vec<SimId> = ctx
        .perception
        .combat_units_of(me, ctx.rules)
        .filter(|e| e.pos.distance_to(base) <= radius)
        .filter(|e| {
            // Already fighting something at the gates? Leave them to it.
            e.target_id
                .map(|t| !ctl.threats.base_threats.contains(&t))
                .unwrap_or(true)
        })
        .map(|e| e.id)
        .collect();
    order_attack_members(ctx, me, &defenders, threat, actions);
}

/// Small fast-mover squad hitting the enemy economy.
pub fn harass(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    ctl.harass_group.retain(|&id| {
        ctx.perception.get(id).map(|e| e.owner == me).unwrap_or(false)
    });
    if !matches!(ctl.strategy, Strategy::Harass | Strategy::Attack | Strategy::AllIn) {
        return;
    }

    if ctl.harass_group.len() < 4 {
        let taken = assigned_ids(ctl);
        let fast: Vec<SimId> = ctx
            .perception
            .combat_units_of(me, ctx.rules)
            .filter(|e| {
                e.unit_key
                    .map(|k| ctx.rules.unit(k).speed >= 3.5)
                    .unwrap_or(false)
            })
            .filter(|e| !taken.contains(&e.id))
            .map(|e| e.id)
            .take(4 - ctl.harass_group.len())
            .collect();
        ctl.harass_group.extend(fast);
    }
    if ctl.harass_group.is_empty() {
        return;
    }

    // Economy targets first: harvesters, refineries, power. Fallback:
    // whatever enemy is closest.
    let centroid = {
        let mut sum = Vec2::ZERO;
        let mut n = 0u32;
        for &id in &ctl.harass_group {
            if let Some(e) = ctx.perception.get(id) {
                sum += e.pos;
                n += 1;
            }
        }
        if n == 0 {
            return;
        }
        sum * (1.0 / n as f32)
    };
    let target = harass_target(ctx, me, centroid);
    if let Some(target) = target {
        order_attack_members(ctx, me, &ctl.harass_group.clone(), target, actions);
    }
}

fn harass_target(ctx: &PlanContext, me: PlayerId, from: Vec2) -> Option<SimId> {
    let rules = ctx.rules;
    let mut best: Option<(u32, f32, SimId)> = None;
    for e in &ctx.perception.entities {
        if e.owner < 0 || e.owner == me {
            continue;
        }
        let tier = if e
            .unit_key
            .map(|k| rules.unit(k).special == UnitSpecial::Harvester)
            .unwrap_or(false)
        {
            0
        } else if let Some(k) = e.building_key {
            let spec = rules.building(k);
            if spec.is_refinery {
                1
            } else if spec.key == "power_plant" {
                2
            } else {
                3
            }
        } else if e.is_unit() {
            3
        } else {
            continue;
        };
        let dist = e.pos.distance_to(from);
        let better = match best {
            None => true,
            Some((bt, bd, bid)) => (tier, dist, e.id) < (bt, bd, bid),
        };
        if better {
            best = Some((tier, dist, e.id));
        }
    }
    best.map(|(_, _, id)| id)
}

/// Idle units stranded far from base walk back to the rally point.
pub fn rally_strays(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let base = ctl.base_center;
    let rally = base + (ctx.map_size * 0.5 - base) * 0.3;
    let taken = assigned_ids(ctl);
    let strays: Vec<SimId> = ctx
        .perception
        .combat_units_of(me, ctx.rules)
        .filter(|e| e.is_idle() && e.pos.distance_to(base) > STRAY_DISTANCE)
        .filter(|e| !taken.contains(&e.id))
        .map(|e| e.id)
        .collect();
    if !strays.is_empty() {
        actions.push(Action::CommandMove {
            player: me,
            unit_ids: strays,
            x: rally.x,
            y: rally.y,
        });
    }
}

fn nearest_enemy_near(ctx: &PlanContext, me: PlayerId, from: Vec2, radius: f32) -> Option<SimId> {
    let mut best: Option<(f32, SimId)> = None;
    for e in &ctx.perception.entities {
        if e.owner < 0 || e.owner == me || !e.is_unit() {
            continue;
        }
        let d = e.pos.distance_to(from);
        if d > radius {
            continue;
        }
        let better = match best {
            None => true,
            Some((bd, bid)) => d < bd || (d == bd && e.id < bid),
        };
        if better {
            best = Some((d, e.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Composite target scoring for a group in `Attacking`, best first.
fn score_targets(
    ctx: &PlanContext,
    me: PlayerId,
    group: &AttackGroup,
    centroid: Vec2,
    vengeance: &std::collections::HashMap<PlayerId, f32>,
) -> Vec<(f32, SimId)> {
    let rules = ctx.rules;

    // Who are the members currently shooting at (ally focus)?
    let mut focus_count: std::collections::HashMap<SimId, u32> = std::collections::HashMap::new();
    for &id in &group.unit_ids {
        if let Some(t) = ctx.perception.get(id).and_then(|e| e.target_id) {
            *focus_count.entry(t).or_insert(0) += 1;
        }
    }

    let mut scored: Vec<(f32, SimId)> = Vec::new();
    for e in &ctx.perception.entities {
        if e.owner < 0 || e.owner == me || (!e.is_unit() && !e.is_building()) {
            continue;
        }
        let dist = e.pos.distance_to(centroid);
        if dist > 900.0 {
            continue;
        }
        let mut score = 0.0f32;
        if group.engaged_enemies.contains(&e.id) {
            score += 40.0;
        }
        if let Some(k) = e.building_key {
            let spec = rules.building(k);
            if spec.is_defense && dist < 400.0 {
                score += 30.0;
            }
            score += strategic_rank(&spec.key);
        } else {
            score += 15.0;
        }
        score += (1.0 - e.hp_fraction()) * 20.0;
        score -= dist * 0.01;
        score += *focus_count.get(&e.id).unwrap_or(&0) as f32 * 2.0;
        score += vengeance.get(&e.owner).copied().unwrap_or(0.0) * 0.5;
        scored.push((score, e.id));
    }
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    scored
}

/// Fixed strategic priority of building kinds.
fn strategic_rank(key: &str) -> f32 {
    match key {
        "construction_yard" => 50.0,
        "war_factory" => 40.0,
        "barracks" => 30.0,
        "ore_refinery" => 25.0,
        "power_plant" => 20.0,
        _ => 10.0,
    }
}

/// Move orders with re-issue suppression.
fn order_move_members(
    ctx: &PlanContext,
    me: PlayerId,
    members: &[SimId],
    dest: Vec2,
    attack_move: bool,
    actions: &mut Vec<Action>,
) {
    let needs_order: Vec<SimId> = members
        .iter()
        .filter(|&&id| {
            ctx.perception
                .get(id)
                .map(|e| e.move_target.map(|t| t.distance_to(dest) > 60.0).unwrap_or(true))
                .unwrap_or(false)
        })
        .copied()
        .collect();
    if needs_order.is_empty() {
        return;
    }
    actions.push(if attack_move {
        Action::CommandAttackMove {
            player: me,
            unit_ids: needs_order,
            x: dest.x,
            y: dest.y,
        }
    } else {
        Action::CommandMove {
            player: me,
            unit_ids: needs_order,
            x: dest.x,
            y: dest.y,
        }
    });
}

/// Attack orders with re-issue suppression: units already on the intended
/// target are left alone.
fn order_attack_members(
    ctx: &PlanContext,
    me: PlayerId,
    members: &[SimId],
    target: SimId,
    actions: &mut Vec<Action>,
) {
    let needs_order: Vec<SimId> = members
        .iter()
        .filter(|&&id| {
            ctx.perception
                .get(id)
                .map(|e| e.target_id != Some(target))
                .unwrap_or(false)
        })
        .copied()
        .collect();
    if !needs_order.is_empty() {
        actions.push(Action::CommandAttack {
            player: me,
            unit_ids: needs_order,
            target,
        });
    }
}
