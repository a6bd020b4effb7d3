//! End-of-tick housekeeping: elimination and win check, dead filtering,
//! camera shake decay.

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::players::Players;
use crate::rules::{RulesRes, UnitSpecial};
use crate::state::{
    ActiveNotification, CameraState, GameMode, GameStatus, IdIndex, Outcome, SimTick, UiState,
};

/// A player with no buildings and no MCV is out; the last player standing
/// wins. Sandbox mode skips the check entirely.
pub fn elimination_system(world: &mut World) {
    let mode = world.resource::<GameStatus>().mode;
    if mode == GameMode::Sandbox || !world.resource::<GameStatus>().running {
        return;
    }
    let rules = world.resource::<RulesRes>().clone();
    let tick = world.resource::<SimTick>().0;
    let player_ids: Vec<PlayerId> = world.resource::<Players>().0.iter().map(|p| p.id).collect();
    if player_ids.len() < 2 {
        return;
    }

    for player_id in player_ids {
        let already_out = world
            .resource::<Players>()
            .get(player_id)
            .map(|p| p.eliminated)
            .unwrap_or(true);
        if already_out {
            continue;
        }

        let mut buildings = 0u32;
        let mut mcvs = 0u32;
        {
            let mut q = world.query::<(&Owner, &Health, Option<&BuildingTag>, Option<&UnitType>)>();
            for (owner, health, building, ut) in q.iter(world) {
                if owner.0 != player_id || !health.is_alive() {
                    continue;
                }
                if building.is_some() {
                    buildings += 1;
                } else if let Some(ut) = ut {
                    if rules.unit(ut.0).special == UnitSpecial::Mcv {
                        mcvs += 1;
                    }
                }
            }
        }
        if buildings > 0 || mcvs > 0 {
            continue;
        }

        log::debug!("player {player_id} eliminated at tick {tick}");
        if let Some(p) = world.resource_mut::<Players>().get_mut(player_id) {
            p.eliminated = true;
            for queue in &mut p.queues {
                queue.void(false);
            }
            p.ready_to_place = None;
        }
        // Everything they still own dies with them.
        let mut q = world.query::<(&Owner, &mut Health)>();
        for (owner, mut health) in q.iter_mut(world) {
            if owner.0 == player_id {
                health.current = 0;
            }
        }
        world
            .resource_mut::<ActiveNotification>()
            .raise(format!("Player {player_id} eliminated"), tick);
    }

    let standing: Vec<PlayerId> = {
        let players = world.resource::<Players>();
        players
            .0
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.id)
            .collect()
    };
    let outcome = match standing.len() {
        0 => Some(Outcome::Draw),
        1 => Some(Outcome::Player(standing[0])),
        _ => None,
    };
    if let Some(outcome) = outcome {
        {
            let mut status = world.resource_mut::<GameStatus>();
            status.winner = Some(outcome);
            status.running = false;
        }
        if let Outcome::Player(winner) = outcome {
            world
                .resource_mut::<ActiveNotification>()
                .raise(format!("Player {winner} wins"), tick);
        }
    }
}

/// Despawn dead entities, drop their ids, prune the selection, decay shake.
pub fn cleanup_system(world: &mut World) {
    let dead: Vec<(Entity, SimId)> = {
        let mut q = world.query::<(Entity, &SimId, &Health)>();
        q.iter(world)
            .filter(|(_, _, h)| !h.is_alive())
            .map(|(e, id, _)| (e, *id))
            .collect()
    };
    for (entity, id) in dead {
        world.resource_mut::<IdIndex>().remove(id);
        world.despawn(entity);
    }

    {
        let index_len = world.resource::<IdIndex>().len();
        let mut q = world.query::<&SimId>();
        debug_assert_eq!(index_len, q.iter(world).count(), "id index out of sync");
    }

    let live: Vec<SimId> = {
        let index = world.resource::<IdIndex>();
        world
            .resource::<UiState>()
            .selection
            .iter()
            .copied()
            .filter(|&id| index.get(id).is_some())
            .collect()
    };
    world.resource_mut::<UiState>().selection = live;

    let mut camera = world.resource_mut::<CameraState>();
    if camera.shake_duration > 0 {
        camera.shake_duration -= 1;
        if camera.shake_duration == 0 {
            camera.shake_intensity = 0.0;
        }
    }
}
