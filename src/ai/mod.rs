//! Hierarchical AI controller.
//!
//! One [`AiController`] per automated player. Full plans run on a staggered
//! schedule (`tick % stagger == player_id % stagger`); critical reactions
//! (base defense, harvester safety, micro) run every tick. Modules only read
//! the [`Perception`] snapshot and emit [`Action`]s, which the facade feeds
//! into the next tick's action stream.

pub mod economy;
pub mod groups;
pub mod harvesters;
pub mod micro;
pub mod perception;
pub mod planner;
pub mod scouting;
pub mod special_ops;

pub use perception::{PEntity, Perception};

use std::collections::HashMap;

use crate::actions::Action;
use crate::components::{PlayerId, SimId};
use crate::math::Vec2;
use crate::players::Difficulty;
use crate::rng::SimRng;
use crate::rules::RulesCatalog;
use groups::AttackGroup;
use planner::{EnemyIntel, Strategy, ThreatAssessment};

/// Behavior thresholds derived from difficulty.
#[derive(Debug, Clone)]
pub struct Personality {
    /// Full-plan cadence in ticks.
    pub stagger: u64,
    pub group_min: usize,
    pub group_max: usize,
    /// Group retreats below this average health fraction.
    pub retreat_threshold: f32,
    /// Group calls for reinforcements below this fraction.
    pub reinforce_threshold: f32,
    pub base_defense_radius: f32,
    pub threat_detection_radius: f32,
    /// Harvesters per refinery the economy aims for.
    pub harvesters_per_refinery: usize,
    pub max_refineries: usize,
    /// 0 = turtle, 1 = berserk.
    pub aggression: f32,
    pub micro_enabled: bool,
    pub scouting_enabled: bool,
    pub special_ops_enabled: bool,
    pub danger_map_enabled: bool,
    pub rush_detection_enabled: bool,
}

impl Personality {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Dummy => Self {
                stagger: u64::MAX,
                group_min: 0,
                group_max: 0,
                retreat_threshold: 0.0,
                reinforce_threshold: 0.0,
                base_defense_radius: 0.0,
                threat_detection_radius: 0.0,
                harvesters_per_refinery: 0,
                max_refineries: 0,
                aggression: 0.0,
                micro_enabled: false,
                scouting_enabled: false,
                special_ops_enabled: false,
                danger_map_enabled: false,
                rush_detection_enabled: false,
            },
            Difficulty::Easy => Self {
                stagger: 16,
                group_min: 4,
                group_max: 7,
                retreat_threshold: 0.35,
                reinforce_threshold: 0.5,
                base_defense_radius: 500.0,
                threat_detection_radius: 350.0,
                harvesters_per_refinery: 1,
                max_refineries: 2,
                aggression: 0.3,
                micro_enabled: false,
                scouting_enabled: false,
                special_ops_enabled: false,
                danger_map_enabled: false,
                rush_detection_enabled: false,
            },
            Difficulty::Medium => Self {
                stagger: 8,
                group_min: 6,
                group_max: 10,
                retreat_threshold: 0.3,
                reinforce_threshold: 0.45,
                base_defense_radius: 600.0,
                threat_detection_radius: 400.0,
                harvesters_per_refinery: 2,
                max_refineries: 3,
                aggression: 0.55,
                micro_enabled: true,
                scouting_enabled: true,
                special_ops_enabled: false,
                danger_map_enabled: false,
                rush_detection_enabled: false,
            },
            Difficulty::Hard => Self {
                stagger: 4,
                group_min: 8,
                group_max: 14,
                retreat_threshold: 0.25,
                reinforce_threshold: 0.4,
                base_defense_radius: 700.0,
                threat_detection_radius: 450.0,
                harvesters_per_refinery: 2,
                max_refineries: 4,
                aggression: 0.8,
                micro_enabled: true,
                scouting_enabled: true,
                special_ops_enabled: true,
                danger_map_enabled: true,
                rush_detection_enabled: true,
            },
        }
    }
}

/// A decaying record of a spot where one of our harvesters died.
#[derive(Debug, Clone, Copy)]
pub struct DangerSpot {
    pub pos: Vec2,
    pub weight: f32,
}

/// Persistent state of one automated player.
pub struct AiController {
    pub player: PlayerId,
    pub difficulty: Difficulty,
    pub personality: Personality,
    pub strategy: Strategy,
    pub strategy_changed_tick: u64,
    pub base_center: Vec2,
    pub enemy_base_location: Option<Vec2>,
    pub enemy_intel: HashMap<PlayerId, EnemyIntel>,
    pub vengeance: HashMap<PlayerId, f32>,
    pub threats: ThreatAssessment,
    pub groups: Vec<AttackGroup>,
    pub harass_group: Vec<SimId>,
    /// Decaying memory of harvester deaths (hard difficulty only).
    pub danger_map: Vec<DangerSpot>,
    /// Harvester ids seen last plan, for death detection.
    pub known_harvesters: HashMap<SimId, Vec2>,
    pub scout_unit: Option<SimId>,
    pub scout_corner: usize,
    pub last_scout_tick: u64,
    /// Hijacker id -> claimed vehicle id.
    pub hijack_claims: HashMap<SimId, SimId>,
    pub next_group_id: u32,
}

impl AiController {
    pub fn new(player: PlayerId, difficulty: Difficulty) -> Self {
        Self {
            player,
            difficulty,
            personality: Personality::for_difficulty(difficulty),
            strategy: Strategy::Buildup,
            strategy_changed_tick: 0,
            base_center: Vec2::ZERO,
            enemy_base_location: None,
            enemy_intel: HashMap::new(),
            vengeance: HashMap::new(),
            threats: ThreatAssessment::default(),
            groups: Vec::new(),
            harass_group: Vec::new(),
            danger_map: Vec::new(),
            known_harvesters: HashMap::new(),
            scout_unit: None,
            scout_corner: 0,
            last_scout_tick: 0,
            hijack_claims: HashMap::new(),
            next_group_id: 0,
        }
    }

    fn full_plan_due(&self, tick: u64) -> bool {
        let stagger = self.personality.stagger;
        if stagger == u64::MAX {
            return false;
        }
        tick % stagger == (self.player.max(0) as u64) % stagger
    }
}

/// Everything a plan step needs to see, bundled to keep signatures sane.
pub struct PlanContext<'a> {
    pub perception: &'a Perception,
    pub rules: &'a RulesCatalog,
    pub tick: u64,
    pub map_size: Vec2,
    pub credits: f64,
    pub low_power: bool,
    pub ready_to_place: Option<crate::rules::BuildingKey>,
    pub queue_lens: [usize; 4],
}

/// Run one AI step for a player; returns the actions to feed the next tick.
pub fn run_ai(
    ctl: &mut AiController,
    ctx: &PlanContext,
    rng: &mut SimRng,
) -> Vec<Action> {
    if ctl.difficulty == Difficulty::Dummy {
        return Vec::new();
    }
    let mut actions = Vec::new();

    // Critical reactions run every tick.
    planner::update_situation(ctl, ctx);
    groups::defend_base(ctl, ctx, &mut actions);
    harvesters::safety(ctl, ctx, &mut actions);
    if ctl.personality.micro_enabled {
        micro::micro_units(ctl, ctx, &mut actions);
    }

    if !ctl.full_plan_due(ctx.tick) {
        return actions;
    }

    // Full plan, staggered.
    planner::update_strategy(ctl, ctx);
    if ctl.personality.rush_detection_enabled {
        planner::detect_rush_targets(ctl, ctx);
    }
    economy::run(ctl, ctx, rng, &mut actions);
    harvesters::gather(ctl, ctx, &mut actions);
    harvesters::suicide_run(ctl, ctx, &mut actions);
    groups::run(ctl, ctx, &mut actions);
    groups::harass(ctl, ctx, &mut actions);
    groups::rally_strays(ctl, ctx, &mut actions);
    if ctl.personality.scouting_enabled {
        scouting::run(ctl, ctx, &mut actions);
    }
    if ctl.personality.special_ops_enabled {
        special_ops::run(ctl, ctx, &mut actions);
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::groups::{AttackGroup, GroupStatus};
    use super::planner::{Strategy, RUSH_VENGEANCE_BOOST};
    use super::*;
    use crate::api::SimWorld;
    use crate::components::{CombatState, Health, Position};

    fn plan_context<'a>(
        perception: &'a Perception,
        rules: &'a RulesCatalog,
        tick: u64,
        credits: f64,
    ) -> PlanContext<'a> {
        PlanContext {
            perception,
            rules,
            tick,
            map_size: Vec2::new(2400.0, 1800.0),
            credits,
            low_power: false,
            ready_to_place: None,
            queue_lens: [0; 4],
        }
    }

    #[test]
    fn test_rush_detection_targets_greedy_opponent() {
        let mut sim = SimWorld::sandbox(30);
        let p0 = sim.add_player(true, Difficulty::Hard);
        let p1 = sim.add_player(false, Difficulty::Easy);
        sim.spawn_building_at(p0, "construction_yard", 400.0, 400.0);
        for i in 0..5 {
            sim.spawn_unit_at(p0, "light_tank", 500.0 + i as f32 * 50.0, 500.0);
        }
        let enemy_yard = sim.spawn_building_at(p1, "construction_yard", 2000.0, 1400.0);
        sim.spawn_building_at(p1, "barracks", 2000.0, 1250.0);

        let enemy_yard_pos = {
            let e = sim.resolve(enemy_yard).unwrap();
            sim.world().get::<Position>(e).unwrap().0
        };
        let perception = Perception::capture(sim.world_mut());
        let rules = sim.rules();
        let ctx = plan_context(&perception, &rules, 700, 5000.0);

        let mut ctl = AiController::new(p0, Difficulty::Hard);
        planner::update_situation(&mut ctl, &ctx);
        planner::detect_rush_targets(&mut ctl, &ctx);

        assert_eq!(ctl.strategy, Strategy::Attack);
        assert_eq!(ctl.enemy_base_location, Some(enemy_yard_pos));
        let vengeance = ctl.vengeance.get(&p1).copied().unwrap_or(0.0);
        assert!(
            (vengeance - RUSH_VENGEANCE_BOOST).abs() < 1e-3,
            "vengeance was {vengeance}"
        );
    }

    #[test]
    fn test_micro_never_interrupts_a_ready_shot() {
        let mut sim = SimWorld::sandbox(31);
        let p0 = sim.add_player(true, Difficulty::Hard);
        let p1 = sim.add_player(false, Difficulty::Easy);
        let tank = sim.spawn_unit_at(p0, "heavy_tank", 500.0, 500.0);
        let enemy = sim.spawn_unit_at(p1, "rifleman", 1040.0, 500.0);
        {
            let e = sim.resolve(tank).unwrap();
            let mut c = sim.world_mut().get_mut::<CombatState>(e).unwrap();
            c.target_id = Some(enemy);
            c.cooldown = 0;
        }
        let perception = Perception::capture(sim.world_mut());
        let rules = sim.rules();
        let ctx = plan_context(&perception, &rules, 100, 5000.0);
        let mut ctl = AiController::new(p0, Difficulty::Hard);
        planner::update_situation(&mut ctl, &ctx);

        let mut actions = Vec::new();
        micro::micro_units(&mut ctl, &ctx, &mut actions);
        let moved_tank = actions.iter().any(|a| match a {
            Action::CommandMove { unit_ids, .. } | Action::CommandAttackMove { unit_ids, .. } => {
                unit_ids.contains(&tank)
            }
            _ => false,
        });
        assert!(!moved_tank, "micro moved a unit with a ready weapon: {actions:?}");
    }

    #[test]
    fn test_micro_backpedals_when_critically_close() {
        let mut sim = SimWorld::sandbox(32);
        let p0 = sim.add_player(true, Difficulty::Hard);
        let p1 = sim.add_player(false, Difficulty::Easy);
        let tank = sim.spawn_unit_at(p0, "heavy_tank", 500.0, 500.0);
        let enemy = sim.spawn_unit_at(p1, "rifleman", 530.0, 500.0);
        {
            let e = sim.resolve(tank).unwrap();
            let mut c = sim.world_mut().get_mut::<CombatState>(e).unwrap();
            c.target_id = Some(enemy);
            c.cooldown = 30;
        }
        let perception = Perception::capture(sim.world_mut());
        let rules = sim.rules();
        let ctx = plan_context(&perception, &rules, 100, 5000.0);
        let mut ctl = AiController::new(p0, Difficulty::Hard);
        planner::update_situation(&mut ctl, &ctx);

        let mut actions = Vec::new();
        micro::micro_units(&mut ctl, &ctx, &mut actions);
        let moved_tank = actions.iter().any(|a| match a {
            Action::CommandMove { unit_ids, .. } | Action::CommandAttackMove { unit_ids, .. } => {
                unit_ids.contains(&tank)
            }
            _ => false,
        });
        assert!(moved_tank, "point-blank enemy in the cooldown window must trigger a step back");
    }

    #[test]
    fn test_group_retreat_recovers_with_hysteresis() {
        let mut sim = SimWorld::sandbox(33);
        let p0 = sim.add_player(true, Difficulty::Hard);
        let t1 = sim.spawn_unit_at(p0, "light_tank", 500.0, 500.0);
        let t2 = sim.spawn_unit_at(p0, "light_tank", 540.0, 500.0);
        let set_hp = |sim: &mut SimWorld, id, frac: f32| {
            let e = sim.resolve(id).unwrap();
            let mut h = sim.world_mut().get_mut::<Health>(e).unwrap();
            h.current = (h.max as f32 * frac) as i32;
        };
        set_hp(&mut sim, t1, 0.3);
        set_hp(&mut sim, t2, 0.3);

        let rules = sim.rules();
        let mut ctl = AiController::new(p0, Difficulty::Hard);
        let mut group = AttackGroup::test_group(1, 0);
        group.unit_ids = vec![t1, t2];
        group.status = GroupStatus::Retreating;
        ctl.groups.push(group);

        // 30% health: 0.30 < retreat(0.25) + 0.20, so the group keeps
        // falling back.
        {
            let perception = Perception::capture(sim.world_mut());
            let ctx = plan_context(&perception, &rules, 500, 5000.0);
            planner::update_situation(&mut ctl, &ctx);
            let mut actions = Vec::new();
            groups::run(&mut ctl, &ctx, &mut actions);
            assert_eq!(ctl.groups[0].status, GroupStatus::Retreating);
        }

        // Healed past the hysteresis band: back to rallying.
        set_hp(&mut sim, t1, 0.6);
        set_hp(&mut sim, t2, 0.6);
        {
            let perception = Perception::capture(sim.world_mut());
            let ctx = plan_context(&perception, &rules, 700, 5000.0);
            planner::update_situation(&mut ctl, &ctx);
            let mut actions = Vec::new();
            groups::run(&mut ctl, &ctx, &mut actions);
            assert_eq!(ctl.groups[0].status, GroupStatus::Rallying);
        }
    }
}
