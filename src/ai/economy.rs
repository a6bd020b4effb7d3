//! Economy and production module: build order, power margin, dual-lane
//! production, placement proposals, deploys, emergency selling.

use crate::actions::Action;
use crate::math::Vec2;
use crate::rng::SimRng;
use crate::rules::{BuildingKey, ProductionCategory, UnitSpecial};

use super::planner::Strategy;
use super::{AiController, PlanContext};

/// Spare generation kept above the drain before more power is queued.
const POWER_MARGIN: i32 = 20;
/// Placement proposals attempted per plan.
const PLACEMENT_ATTEMPTS: usize = 10;

struct Holdings {
    conyard: bool,
    power_margin: i32,
    refineries: usize,
    barracks: bool,
    factory: bool,
    airbase: bool,
    tech: bool,
    depot: bool,
    defenses: usize,
    harvesters: usize,
    air_units: usize,
    infantry: usize,
}

fn survey(ctl: &AiController, ctx: &PlanContext) -> Holdings {
    let p = ctx.perception;
    let rules = ctx.rules;
    let me = ctl.player;
    let mut h = Holdings {
        conyard: false,
        power_margin: 0,
        refineries: 0,
        barracks: false,
        factory: false,
        airbase: false,
        tech: false,
        depot: false,
        defenses: 0,
        harvesters: 0,
        air_units: 0,
        infantry: 0,
    };
    let mut generated = 0i32;
    let mut drained = 0i32;
    for b in p.buildings_of(me) {
        let Some(key) = b.building_key else { continue };
        let spec = rules.building(key);
        generated += spec.power.max(0);
        drained += (-spec.power).max(0);
        if spec.is_conyard {
            h.conyard = true;
        }
        if spec.is_refinery {
            h.refineries += 1;
        }
        if spec.is_defense {
            h.defenses += 1;
        }
        if spec.is_depot {
            h.depot = true;
        }
        match spec.key.as_str() {
            "barracks" => h.barracks = true,
            "war_factory" => h.factory = true,
            "air_base" => h.airbase = true,
            "tech_center" => h.tech = true,
            _ => {}
        }
    }
    h.power_margin = generated - drained;
    for u in p.units_of(me) {
        let Some(key) = u.unit_key else { continue };
        let spec = rules.unit(key);
        if spec.special == UnitSpecial::Harvester {
            h.harvesters += 1;
        }
        if spec.is_air {
            h.air_units += 1;
        }
        if spec.category == ProductionCategory::Infantry {
            h.infantry += 1;
        }
    }
    h
}

pub fn run(ctl: &mut AiController, ctx: &PlanContext, rng: &mut SimRng, actions: &mut Vec<Action>) {
    let own = survey(ctl, ctx);
    let me = ctl.player;

    building_lane(ctl, ctx, &own, actions);
    placement(ctl, ctx, rng, actions);
    infantry_lane(ctl, ctx, &own, actions);
    vehicle_lane(ctl, ctx, &own, actions);
    air_lane(ctl, ctx, &own, actions);
    deploys(ctl, ctx, actions);

    // Last-resort selling: an all-in with an empty wallet liquidates its
    // tech structures for one more wave.
    if ctl.strategy == Strategy::AllIn && ctx.credits < 50.0 {
        let sellable = ctx
            .perception
            .buildings_of(me)
            .filter(|b| {
                b.building_key
                    .map(|k| {
                        let spec = ctx.rules.building(k);
                        spec.is_defense || spec.key == "tech_center" || spec.is_depot
                    })
                    .unwrap_or(false)
            })
            .min_by_key(|b| b.id);
        if let Some(b) = sellable {
            actions.push(Action::SellBuilding {
                player: me,
                building_id: b.id,
            });
        }
    }
}

fn building_lane(ctl: &AiController, ctx: &PlanContext, own: &Holdings, actions: &mut Vec<Action>) {
    if ctx.queue_lens[ProductionCategory::Building.index()] > 0 || ctx.ready_to_place.is_some() {
        return;
    }
    if !own.conyard {
        return;
    }
    let me = ctl.player;
    let credits = ctx.credits;

    let choice: Option<&str> = if ctx.low_power || own.power_margin < POWER_MARGIN {
        Some("power_plant")
    } else if own.refineries == 0 {
        Some("ore_refinery")
    } else if !own.barracks {
        Some("barracks")
    } else if !own.factory {
        Some("war_factory")
    } else if own.refineries < ctl.personality.max_refineries && credits > 2000.0 {
        Some("ore_refinery")
    } else if own.defenses < 2 && credits > 1400.0 {
        if own.defenses == 0 {
            Some("guard_turret")
        } else {
            Some("sam_site")
        }
    } else if !own.tech && credits > 2800.0 {
        Some("tech_center")
    } else if !own.depot && own.tech && credits > 2600.0 {
        Some("service_depot")
    } else if !own.airbase && own.tech && ctl.personality.special_ops_enabled && credits > 2200.0 {
        Some("air_base")
    } else if own.defenses < 4 && credits > 3500.0 {
        Some("guard_turret")
    } else {
        None
    };

    if let Some(key) = choice {
        actions.push(Action::StartBuild {
            player: me,
            category: ProductionCategory::Building,
            key: key.into(),
        });
    }
}

/// Propose a placement for a finished building. Proximity heuristics:
/// defenses face the enemy, refineries lean toward ore, everything else
/// rings the conyard. The reducer re-validates, so a bad proposal just
/// burns one plan.
fn placement(ctl: &AiController, ctx: &PlanContext, rng: &mut SimRng, actions: &mut Vec<Action>) {
    let Some(key) = ctx.ready_to_place else {
        return;
    };
    let me = ctl.player;
    let rules = ctx.rules;
    let spec = rules.building(key);
    let p = ctx.perception;

    let anchor = pick_anchor(ctl, ctx, key);
    let build_radius = rules.economy.build_radius;
    let clearance = spec.radius() + 12.0;

    for _ in 0..PLACEMENT_ATTEMPTS {
        let angle = rng.heading();
        let dist = rng.range_f32(spec.radius() + 60.0, build_radius - 10.0);
        let pos = anchor + Vec2::from_angle(angle) * dist;
        if pos.x < clearance
            || pos.y < clearance
            || pos.x > ctx.map_size.x - clearance
            || pos.y > ctx.map_size.y - clearance
        {
            continue;
        }
        let blocked = p.entities.iter().any(|e| {
            !e.is_air && e.pos.distance_to(pos) < e.radius + clearance
        });
        if blocked {
            continue;
        }
        actions.push(Action::PlaceBuilding {
            player: me,
            key: spec.key.clone(),
            x: pos.x,
            y: pos.y,
        });
        return;
    }
}

fn pick_anchor(ctl: &AiController, ctx: &PlanContext, key: BuildingKey) -> Vec2 {
    let rules = ctx.rules;
    let spec = rules.building(key);
    let p = ctx.perception;
    let me = ctl.player;

    if spec.is_defense {
        // Front line: our building closest to the enemy.
        if let Some(enemy) = ctl.enemy_base_location {
            if let Some(b) = p.buildings_of(me).min_by(|a, b| {
                let da = a.pos.distance_sq(enemy);
                let db = b.pos.distance_sq(enemy);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            }) {
                return b.pos;
            }
        }
    }
    if spec.is_refinery {
        // Expansion: our building closest to the richest nearby ore.
        if let Some(ore) = p.ores().min_by(|a, b| {
            let da = a.pos.distance_sq(ctl.base_center);
            let db = b.pos.distance_sq(ctl.base_center);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        }) {
            if let Some(b) = p.buildings_of(me).min_by(|a, b| {
                let da = a.pos.distance_sq(ore.pos);
                let db = b.pos.distance_sq(ore.pos);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            }) {
                return b.pos;
            }
        }
    }
    ctl.base_center
}

fn infantry_lane(ctl: &AiController, ctx: &PlanContext, own: &Holdings, actions: &mut Vec<Action>) {
    if !own.barracks || ctx.queue_lens[ProductionCategory::Infantry.index()] > 0 {
        return;
    }
    if ctx.credits < 300.0 {
        return;
    }
    let me = ctl.player;
    // Cheap rotation keyed to the plan tick keeps the mix deterministic.
    let slot = (ctx.tick / ctl.personality.stagger.max(1)) % 4;
    let key = match slot {
        0 | 1 => "rifleman",
        2 => "rocket_trooper",
        _ => {
            if own.infantry >= 6 {
                "medic"
            } else {
                "grenadier"
            }
        }
    };
    actions.push(Action::StartBuild {
        player: me,
        category: ProductionCategory::Infantry,
        key: key.into(),
    });
}

fn vehicle_lane(ctl: &AiController, ctx: &PlanContext, own: &Holdings, actions: &mut Vec<Action>) {
    if !own.factory || ctx.queue_lens[ProductionCategory::Vehicle.index()] > 0 {
        return;
    }
    let me = ctl.player;
    let want_harvesters = own.refineries * ctl.personality.harvesters_per_refinery;
    let key = if own.harvesters < want_harvesters.max(1) && ctx.credits > 900.0 {
        "harvester"
    } else if ctx.credits > 1600.0 && own.tech {
        "heavy_tank"
    } else if ctx.credits > 900.0 {
        "light_tank"
    } else if ctx.credits > 550.0 {
        "recon_buggy"
    } else {
        return;
    };
    actions.push(Action::StartBuild {
        player: me,
        category: ProductionCategory::Vehicle,
        key: key.into(),
    });
}

fn air_lane(ctl: &AiController, ctx: &PlanContext, own: &Holdings, actions: &mut Vec<Action>) {
    if !own.airbase
        || !ctl.personality.special_ops_enabled
        || ctx.queue_lens[ProductionCategory::Air.index()] > 0
        || own.air_units >= 4
        || ctx.credits < 1600.0
    {
        return;
    }
    actions.push(Action::StartBuild {
        player: ctl.player,
        category: ProductionCategory::Air,
        key: "harrier".into(),
    });
}

/// Deploy MCVs on stable ground; walk rigs onto wells and deploy them.
fn deploys(ctl: &AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    let me = ctl.player;
    let p = ctx.perception;
    let rules = ctx.rules;

    for u in p.units_of(me) {
        let Some(key) = u.unit_key else { continue };
        match rules.unit(key).special {
            UnitSpecial::Mcv => {
                if u.move_target.is_none() {
                    actions.push(Action::DeployMcv { unit_id: u.id });
                }
            }
            UnitSpecial::Rig => {
                // A well is free if no extractor sits on it yet.
                let target_well = p
                    .wells()
                    .filter(|w| {
                        !p.entities.iter().any(|e| {
                            e.is_building()
                                && e.building_key
                                    .map(|k| rules.building(k).is_extractor)
                                    .unwrap_or(false)
                                && e.pos.distance_to(w.pos) < 80.0
                        })
                    })
                    .min_by(|a, b| {
                        let da = a.pos.distance_sq(u.pos);
                        let db = b.pos.distance_sq(u.pos);
                        da.partial_cmp(&db)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.id.cmp(&b.id))
                    });
                let Some(well) = target_well else { continue };
                if u.pos.distance_to(well.pos) <= 55.0 {
                    actions.push(Action::DeployMcv { unit_id: u.id });
                } else if u.move_target.is_none() {
                    actions.push(Action::CommandMove {
                        player: me,
                        unit_ids: vec![u.id],
                        x: well.pos.x,
                        y: well.pos.y,
                    });
                }
            }
            _ => {}
        }
    }
}
