//! The closed action taxonomy and its validation.
//!
//! Actions are the only way players (human or AI) mutate the simulation.
//! They are buffered by the facade and drained at the start of each tick in
//! submission order. Invalid payloads (unknown key, unknown entity, wrong
//! owner, missing prerequisites, bad placement) are no-ops: the world is
//! left unchanged and a notification is raised.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::math::Vec2;
use crate::players::{Players, SpecRef};
use crate::rules::{BuildingKey, ProductionCategory, RulesRes, UnitSpecial};
use crate::spatial::{EntryKind, SpatialGrid};
use crate::spawn::{resolve_live, spawn_building, spawn_unit};
use crate::state::{ActiveNotification, SimTick, UiState};

/// Everything a player can ask the simulation to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Advance one tick. Present for stream completeness; the facade's
    /// `tick()` is the driver.
    Tick,
    StartBuild {
        player: PlayerId,
        category: ProductionCategory,
        key: String,
    },
    PlaceBuilding {
        player: PlayerId,
        key: String,
        x: f32,
        y: f32,
    },
    CancelBuild {
        player: PlayerId,
        category: ProductionCategory,
    },
    CommandMove {
        player: PlayerId,
        unit_ids: Vec<SimId>,
        x: f32,
        y: f32,
    },
    CommandAttack {
        player: PlayerId,
        unit_ids: Vec<SimId>,
        target: SimId,
    },
    CommandAttackMove {
        player: PlayerId,
        unit_ids: Vec<SimId>,
        x: f32,
        y: f32,
    },
    SelectUnits {
        unit_ids: Vec<SimId>,
    },
    SellBuilding {
        player: PlayerId,
        building_id: SimId,
    },
    ToggleSellMode,
    ToggleRepairMode,
    ToggleDebug,
    ToggleMinimap,
    StartRepair {
        player: PlayerId,
        building_id: SimId,
    },
    StopRepair {
        player: PlayerId,
        building_id: SimId,
    },
    DeployMcv {
        unit_id: SimId,
    },
    QueueUnit {
        player: PlayerId,
        category: ProductionCategory,
        key: String,
        count: u32,
    },
    DequeueUnit {
        player: PlayerId,
        category: ProductionCategory,
        key: String,
        count: u32,
    },
}

fn notify(world: &mut World, text: &str) {
    let tick = world.resource::<SimTick>().0;
    world
        .resource_mut::<ActiveNotification>()
        .raise(text, tick);
    log::debug!("action rejected: {text}");
}

/// Does the player own a live building of the given key?
fn owns_building(world: &mut World, player: PlayerId, key: BuildingKey) -> bool {
    let mut query =
        world.query_filtered::<(&Owner, &BuildingType, &Health), With<BuildingTag>>();
    query
        .iter(world)
        .any(|(o, bt, h)| o.0 == player && bt.0 == key && h.is_alive())
}

fn prerequisites_met(world: &mut World, player: PlayerId, prereqs: &[String]) -> bool {
    let rules = world.resource::<RulesRes>().clone();
    prereqs.iter().all(|p| {
        rules
            .building_key(p)
            .map(|k| owns_building(world, player, k))
            .unwrap_or(false)
    })
}

/// Does the player own a live production building for the category?
fn has_production_building(world: &mut World, player: PlayerId, category: ProductionCategory) -> bool {
    let rules = world.resource::<RulesRes>().clone();
    rules
        .production_buildings(category)
        .iter()
        .any(|&k| owns_building(world, player, k))
}

/// Apply one action to the world. Invalid actions are no-ops.
pub fn apply_action(world: &mut World, action: &Action) {
    match action {
        Action::Tick => {}
        Action::StartBuild {
            player,
            category,
            key,
        } => start_build(world, *player, *category, key, 1),
        Action::QueueUnit {
            player,
            category,
            key,
            count,
        } => {
            if *category == ProductionCategory::Building {
                notify(world, "Buildings cannot be multi-queued");
                return;
            }
            start_build(world, *player, *category, key, (*count).max(1));
        }
        Action::DequeueUnit {
            player,
            category,
            key,
            count,
        } => dequeue_unit(world, *player, *category, key, (*count).max(1)),
        Action::CancelBuild { player, category } => cancel_build(world, *player, *category),
        Action::PlaceBuilding { player, key, x, y } => {
            place_building(world, *player, key, Vec2::new(*x, *y));
        }
        Action::CommandMove {
            player,
            unit_ids,
            x,
            y,
        } => command_move(world, *player, unit_ids, Vec2::new(*x, *y), false),
        Action::CommandAttackMove {
            player,
            unit_ids,
            x,
            y,
        } => command_move(world, *player, unit_ids, Vec2::new(*x, *y), true),
        Action::CommandAttack {
            player,
            unit_ids,
            target,
        } => command_attack(world, *player, unit_ids, *target),
        Action::SelectUnits { unit_ids } => {
            let live: Vec<SimId> = unit_ids
                .iter()
                .copied()
                .filter(|&id| resolve_live(world, id).is_some())
                .collect();
            world.resource_mut::<UiState>().selection = live;
        }
        Action::SellBuilding {
            player,
            building_id,
        } => sell_building(world, *player, *building_id),
        Action::ToggleSellMode => {
            let mut ui = world.resource_mut::<UiState>();
            ui.sell_mode = !ui.sell_mode;
        }
        Action::ToggleRepairMode => {
            let mut ui = world.resource_mut::<UiState>();
            ui.repair_mode = !ui.repair_mode;
        }
        Action::ToggleDebug => {
            let mut ui = world.resource_mut::<UiState>();
            ui.debug_overlay = !ui.debug_overlay;
        }
        Action::ToggleMinimap => {
            let mut ui = world.resource_mut::<UiState>();
            ui.minimap = !ui.minimap;
        }
        Action::StartRepair {
            player,
            building_id,
        } => set_repair(world, *player, *building_id, true),
        Action::StopRepair {
            player,
            building_id,
        } => set_repair(world, *player, *building_id, false),
        Action::DeployMcv { unit_id } => deploy_mcv(world, *unit_id),
    }
}

fn start_build(
    world: &mut World,
    player: PlayerId,
    category: ProductionCategory,
    key: &str,
    count: u32,
) {
    let rules = world.resource::<RulesRes>().clone();
    let max_queue = rules.economy.max_queue;

    let item = if category == ProductionCategory::Building {
        match rules.building_key(key) {
            Some(k) if !rules.building(k).unbuildable => SpecRef::Building(k),
            _ => {
                notify(world, "Unknown building");
                return;
            }
        }
    } else {
        match rules.unit_key(key) {
            Some(k) if rules.unit(k).category == category => SpecRef::Unit(k),
            _ => {
                notify(world, "Unknown unit");
                return;
            }
        }
    };

    let prereqs = match item {
        SpecRef::Unit(k) => rules.unit(k).prerequisites.clone(),
        SpecRef::Building(k) => rules.building(k).prerequisites.clone(),
    };
    if !has_production_building(world, player, category) {
        notify(world, "No production building");
        return;
    }
    if !prerequisites_met(world, player, &prereqs) {
        notify(world, "Missing prerequisites");
        return;
    }

    let Some(state) = world.resource_mut::<Players>().get_mut(player).map(|p| {
        if p.eliminated {
            None
        } else {
            let mut accepted = 0;
            for _ in 0..count {
                if !p.queue_mut(category).enqueue(item, max_queue) {
                    break;
                }
                accepted += 1;
            }
            Some(accepted)
        }
    }) else {
        notify(world, "Unknown player");
        return;
    };
    match state {
        None => notify(world, "Player eliminated"),
        Some(0) => notify(world, "Production queue full"),
        Some(_) => {}
    }
}

fn dequeue_unit(
    world: &mut World,
    player: PlayerId,
    category: ProductionCategory,
    key: &str,
    count: u32,
) {
    let rules = world.resource::<RulesRes>().clone();
    let Some(unit_key) = rules.unit_key(key) else {
        notify(world, "Unknown unit");
        return;
    };
    let target = SpecRef::Unit(unit_key);
    let mut players = world.resource_mut::<Players>();
    let Some(p) = players.get_mut(player) else {
        notify(world, "Unknown player");
        return;
    };
    let queue = p.queue_mut(category);
    let mut remaining = count;
    // Backlog items first (nothing invested), newest first.
    while remaining > 0 {
        if let Some(idx) = queue.queued.iter().rposition(|&i| i == target) {
            queue.queued.remove(idx);
            remaining -= 1;
        } else {
            break;
        }
    }
    if remaining > 0 && queue.current.map(|a| a.item) == Some(target) {
        let refund = queue.cancel();
        p.credits += refund;
    }
}

fn cancel_build(world: &mut World, player: PlayerId, category: ProductionCategory) {
    let rules = world.resource::<RulesRes>().clone();
    let mut players = world.resource_mut::<Players>();
    let Some(p) = players.get_mut(player) else {
        notify(world, "Unknown player");
        return;
    };
    // A completed building waiting for placement refunds its full cost.
    if category == ProductionCategory::Building {
        if let Some(key) = p.ready_to_place.take() {
            p.credits += f64::from(rules.building(key).cost);
            return;
        }
    }
    let refund = p.queue_mut(category).cancel();
    p.credits += refund;
}

fn place_building(world: &mut World, player: PlayerId, key: &str, pos: Vec2) {
    let rules = world.resource::<RulesRes>().clone();
    let Some(building_key) = rules.building_key(key) else {
        notify(world, "Unknown building");
        return;
    };
    {
        let players = world.resource::<Players>();
        let Some(p) = players.get(player) else {
            notify(world, "Unknown player");
            return;
        };
        if p.ready_to_place != Some(building_key) {
            notify(world, "Nothing ready to place");
            return;
        }
    }
    let spec = rules.building(building_key).clone();

    // Placement must stay within build radius of a non-defense building.
    let build_radius = rules.economy.build_radius;
    let mut in_radius = false;
    {
        let mut query =
            world.query_filtered::<(&Owner, &BuildingType, &Position, &Health), With<BuildingTag>>();
        for (o, bt, bpos, h) in query.iter(world) {
            if o.0 == player
                && h.is_alive()
                && !rules.building(bt.0).is_defense
                && bpos.0.distance_to(pos) <= build_radius
            {
                in_radius = true;
                break;
            }
        }
    }
    if !in_radius {
        notify(world, "Out of build range");
        return;
    }
    if !placement_clear(world, pos, spec.w, spec.h) {
        notify(world, "Cannot place building there");
        return;
    }

    if let Some(p) = world.resource_mut::<Players>().get_mut(player) {
        p.ready_to_place = None;
    }
    spawn_building(world, player, building_key, pos);
    if spec.is_refinery {
        if let Some(harvester) = rules.unit_key("harvester") {
            let dock = pos + Vec2::new(0.0, spec.h * 0.5 + 30.0);
            spawn_unit(world, player, harvester, dock);
        }
    }
}

/// Static clearance plus no overlapping units/buildings at the position.
pub fn placement_clear(world: &mut World, pos: Vec2, w: f32, h: f32) -> bool {
    {
        let nav = world.resource::<crate::nav::NavGrid>();
        if !nav.is_rect_clear(pos, w, h) {
            return false;
        }
    }
    let grid = world.resource::<SpatialGrid>();
    let reach = 0.5 * w.max(h);
    grid.query_radius(pos.x, pos.y, reach + 40.0)
        .iter()
        .filter(|e| matches!(e.kind, EntryKind::Unit | EntryKind::Building | EntryKind::Well))
        .all(|e| {
            let dx = (e.x - pos.x).abs();
            let dy = (e.y - pos.y).abs();
            dx > w * 0.5 + e.radius || dy > h * 0.5 + e.radius
        })
}

fn command_move(world: &mut World, player: PlayerId, unit_ids: &[SimId], dest: Vec2, attack_move: bool) {
    for &id in unit_ids {
        let Some(entity) = resolve_live(world, id) else {
            continue;
        };
        if world.get::<Owner>(entity).map(|o| o.0) != Some(player) {
            continue;
        }
        if world.get::<UnitTag>(entity).is_none() {
            continue;
        }
        // Docked aircraft ignore ground orders.
        if let Some(air) = world.get::<AirUnit>(entity) {
            if air.state == AirState::Docked {
                continue;
            }
        }
        if let Some(mut movement) = world.get_mut::<Movement>(entity) {
            movement.order_move(dest);
            movement.attack_move = attack_move;
        }
        if let Some(mut combat) = world.get_mut::<CombatState>(entity) {
            combat.target_id = None;
        }
        if let Some(mut harvester) = world.get_mut::<Harvester>(entity) {
            harvester.manual_mode = true;
            harvester.resource_target = None;
        }
    }
}

fn command_attack(world: &mut World, player: PlayerId, unit_ids: &[SimId], target: SimId) {
    let Some(target_entity) = resolve_live(world, target) else {
        notify(world, "Target gone");
        return;
    };
    let target_owner = world.get::<Owner>(target_entity).map(|o| o.0);
    let target_is_ore = world.get::<OreTag>(target_entity).is_some();
    let target_is_refinery = world
        .get::<BuildingType>(target_entity)
        .map(|bt| {
            let rules = world.resource::<RulesRes>();
            rules.building(bt.0).is_refinery
        })
        .unwrap_or(false);

    for &id in unit_ids {
        let Some(entity) = resolve_live(world, id) else {
            continue;
        };
        if entity == target_entity {
            continue;
        }
        if world.get::<Owner>(entity).map(|o| o.0) != Some(player) {
            continue;
        }
        // Harvester special case: right-clicking ore or an own refinery
        // returns the harvester to automatic gathering.
        if world.get::<Harvester>(entity).is_some() {
            if target_is_ore {
                if let Some(mut h) = world.get_mut::<Harvester>(entity) {
                    h.manual_mode = false;
                    h.resource_target = Some(target);
                    h.harvest_attempt_ticks = 0;
                    h.best_dist_to_ore = None;
                }
                if let Some(mut m) = world.get_mut::<Movement>(entity) {
                    m.clear_move();
                }
            } else if target_is_refinery && target_owner == Some(player) {
                if let Some(mut h) = world.get_mut::<Harvester>(entity) {
                    h.manual_mode = false;
                    h.base_target = Some(target);
                }
                if let Some(mut m) = world.get_mut::<Movement>(entity) {
                    m.clear_move();
                }
            }
            continue;
        }
        if let Some(mut truck) = world.get_mut::<DemoTruck>(entity) {
            truck.detonation_target = Some(target);
            truck.detonation_pos = None;
            continue;
        }
        if let Some(mut combat) = world.get_mut::<CombatState>(entity) {
            combat.target_id = Some(target);
        }
        if let Some(mut movement) = world.get_mut::<Movement>(entity) {
            movement.clear_move();
        }
    }
}

fn sell_building(world: &mut World, player: PlayerId, building_id: SimId) {
    let Some(entity) = resolve_live(world, building_id) else {
        notify(world, "Unknown building");
        return;
    };
    if world.get::<Owner>(entity).map(|o| o.0) != Some(player) {
        notify(world, "Not your building");
        return;
    }
    let Some(bt) = world.get::<BuildingType>(entity).copied() else {
        notify(world, "Not a building");
        return;
    };
    let rules = world.resource::<RulesRes>().clone();
    let Some(health) = world.get::<Health>(entity).copied() else {
        return;
    };
    let refund = (f64::from(rules.building(bt.0).cost)
        * f64::from(rules.economy.sell_return_percentage)
        * f64::from(health.fraction()))
    .floor();
    if let Some(p) = world.resource_mut::<Players>().get_mut(player) {
        p.credits += refund;
    }
    if let Some(mut h) = world.get_mut::<Health>(entity) {
        h.current = 0;
    }
}

fn set_repair(world: &mut World, player: PlayerId, building_id: SimId, on: bool) {
    let Some(entity) = resolve_live(world, building_id) else {
        notify(world, "Unknown building");
        return;
    };
    if world.get::<Owner>(entity).map(|o| o.0) != Some(player) {
        notify(world, "Not your building");
        return;
    }
    if let Some(mut state) = world.get_mut::<BuildingState>(entity) {
        state.is_repairing = on;
    }
}

fn deploy_mcv(world: &mut World, unit_id: SimId) {
    let Some(entity) = resolve_live(world, unit_id) else {
        notify(world, "Unknown unit");
        return;
    };
    let rules = world.resource::<RulesRes>().clone();
    let Some(unit_type) = world.get::<UnitType>(entity).copied() else {
        notify(world, "Not a unit");
        return;
    };
    let spec = rules.unit(unit_type.0);
    let Some(into) = spec.deploys_into.as_deref().and_then(|k| rules.building_key(k)) else {
        notify(world, "Unit cannot deploy");
        return;
    };
    let owner = world.get::<Owner>(entity).map(|o| o.0).unwrap_or(NEUTRAL);
    let pos = world.get::<Position>(entity).map(|p| p.0).unwrap_or_default();
    let building = rules.building(into).clone();

    match spec.special {
        UnitSpecial::Mcv => {
            // The vehicle itself occupies the spot; statics are what matter.
            let nav = world.resource::<crate::nav::NavGrid>();
            if !nav.is_rect_clear(pos, building.w, building.h) {
                notify(world, "No room to deploy");
                return;
            }
        }
        UnitSpecial::Rig => {
            // Rigs deploy onto a well.
            let grid = world.resource::<SpatialGrid>();
            let well_near = grid
                .query_radius_kind(pos.x, pos.y, 60.0, EntryKind::Well)
                .into_iter()
                .next();
            if well_near.is_none() {
                notify(world, "Rig must deploy on a well");
                return;
            }
        }
        _ => {
            notify(world, "Unit cannot deploy");
            return;
        }
    }

    if let Some(mut h) = world.get_mut::<Health>(entity) {
        h.current = 0;
    }
    spawn_building(world, owner, into, pos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::players::Difficulty;

    fn base_world() -> (SimWorld, PlayerId) {
        let mut sim = SimWorld::new();
        let p = sim.add_player(false, Difficulty::Easy);
        sim.spawn_building_at(p, "construction_yard", 500.0, 500.0);
        sim.spawn_building_at(p, "power_plant", 620.0, 500.0);
        (sim, p)
    }

    #[test]
    fn test_toggle_sell_mode_round_trip() {
        let (mut sim, _) = base_world();
        let before = sim.world().resource::<UiState>().sell_mode;
        sim.apply(&Action::ToggleSellMode);
        sim.apply(&Action::ToggleSellMode);
        assert_eq!(sim.world().resource::<UiState>().sell_mode, before);
    }

    #[test]
    fn test_start_then_cancel_refunds_and_empties() {
        let (mut sim, p) = base_world();
        let credits_before = sim.players().get(p).unwrap().credits;
        sim.apply(&Action::StartBuild {
            player: p,
            category: ProductionCategory::Building,
            key: "power_plant".into(),
        });
        sim.apply(&Action::CancelBuild {
            player: p,
            category: ProductionCategory::Building,
        });
        let player = sim.players().get(p).unwrap();
        assert_eq!(player.credits, credits_before);
        assert!(player.queue(ProductionCategory::Building).is_empty());
    }

    #[test]
    fn test_unknown_key_is_noop_with_notification() {
        let (mut sim, p) = base_world();
        sim.apply(&Action::StartBuild {
            player: p,
            category: ProductionCategory::Building,
            key: "chrome_dome".into(),
        });
        assert!(sim.players().get(p).unwrap().queue(ProductionCategory::Building).is_empty());
        assert!(sim.world().resource::<ActiveNotification>().0.is_some());
    }

    #[test]
    fn test_unit_requires_production_building() {
        let (mut sim, p) = base_world();
        // No barracks yet.
        sim.apply(&Action::StartBuild {
            player: p,
            category: ProductionCategory::Infantry,
            key: "rifleman".into(),
        });
        assert!(sim.players().get(p).unwrap().queue(ProductionCategory::Infantry).is_empty());

        sim.spawn_building_at(p, "barracks", 700.0, 500.0);
        sim.apply(&Action::StartBuild {
            player: p,
            category: ProductionCategory::Infantry,
            key: "rifleman".into(),
        });
        assert_eq!(sim.players().get(p).unwrap().queue(ProductionCategory::Infantry).len(), 1);
    }

    #[test]
    fn test_sell_refund_scales_with_hp() {
        let (mut sim, p) = base_world();
        let turret = sim.spawn_building_at(p, "barracks", 700.0, 560.0);
        // Damage to half hp.
        {
            let e = sim.resolve(turret).unwrap();
            let mut h = sim.world_mut().get_mut::<Health>(e).unwrap();
            h.current = h.max / 2;
        }
        let before = sim.players().get(p).unwrap().credits;
        sim.apply(&Action::SellBuilding {
            player: p,
            building_id: turret,
        });
        let after = sim.players().get(p).unwrap().credits;
        // floor(400 * 0.5 * 0.5) = 100
        assert_eq!(after - before, 100.0);
        // Building is dead after the sale.
        let e = sim.resolve(turret).unwrap();
        assert!(!sim.world().get::<Health>(e).unwrap().is_alive());
    }

    #[test]
    fn test_wrong_owner_command_is_ignored() {
        let (mut sim, p) = base_world();
        let p2 = sim.add_player(false, Difficulty::Easy);
        let tank = sim.spawn_unit_at(p2, "light_tank", 900.0, 900.0);
        sim.apply(&Action::CommandMove {
            player: p,
            unit_ids: vec![tank],
            x: 100.0,
            y: 100.0,
        });
        let e = sim.resolve(tank).unwrap();
        assert!(sim.world().get::<Movement>(e).unwrap().move_target.is_none());
    }

    #[test]
    fn test_attack_command_sets_target_and_clears_move() {
        let (mut sim, p) = base_world();
        let p2 = sim.add_player(false, Difficulty::Easy);
        let tank = sim.spawn_unit_at(p, "light_tank", 600.0, 600.0);
        let victim = sim.spawn_unit_at(p2, "rifleman", 900.0, 900.0);
        sim.apply(&Action::CommandMove {
            player: p,
            unit_ids: vec![tank],
            x: 100.0,
            y: 100.0,
        });
        sim.apply(&Action::CommandAttack {
            player: p,
            unit_ids: vec![tank],
            target: victim,
        });
        let e = sim.resolve(tank).unwrap();
        assert_eq!(sim.world().get::<CombatState>(e).unwrap().target_id, Some(victim));
        assert!(sim.world().get::<Movement>(e).unwrap().move_target.is_none());
    }

    #[test]
    fn test_harvester_right_click_ore_goes_auto() {
        let (mut sim, p) = base_world();
        let harv = sim.spawn_unit_at(p, "harvester", 600.0, 600.0);
        let ore = sim.spawn_ore_at(700.0, 600.0, 300);
        // Manual move first.
        sim.apply(&Action::CommandMove {
            player: p,
            unit_ids: vec![harv],
            x: 100.0,
            y: 100.0,
        });
        let e = sim.resolve(harv).unwrap();
        assert!(sim.world().get::<Harvester>(e).unwrap().manual_mode);
        sim.apply(&Action::CommandAttack {
            player: p,
            unit_ids: vec![harv],
            target: ore,
        });
        let h = sim.world().get::<Harvester>(e).unwrap();
        assert!(!h.manual_mode);
        assert_eq!(h.resource_target, Some(ore));
    }

    #[test]
    fn test_queue_and_dequeue_counts() {
        let (mut sim, p) = base_world();
        sim.spawn_building_at(p, "barracks", 700.0, 500.0);
        sim.apply(&Action::QueueUnit {
            player: p,
            category: ProductionCategory::Infantry,
            key: "rifleman".into(),
            count: 3,
        });
        assert_eq!(sim.players().get(p).unwrap().queue(ProductionCategory::Infantry).len(), 3);
        sim.apply(&Action::DequeueUnit {
            player: p,
            category: ProductionCategory::Infantry,
            key: "rifleman".into(),
            count: 2,
        });
        assert_eq!(sim.players().get(p).unwrap().queue(ProductionCategory::Infantry).len(), 1);
    }

    #[test]
    fn test_deploy_mcv_spawns_conyard() {
        let mut sim = SimWorld::new();
        let p = sim.add_player(false, Difficulty::Easy);
        let mcv = sim.spawn_unit_at(p, "mcv", 1000.0, 1000.0);
        sim.apply(&Action::DeployMcv { unit_id: mcv });
        // MCV consumed.
        assert!(sim.resolve(mcv).is_none() || {
            let e = sim.resolve(mcv).unwrap();
            !sim.world().get::<Health>(e).unwrap().is_alive()
        });
        assert_eq!(sim.count_buildings_of(p, "construction_yard"), 1);
    }
}
