//! Scouting: one fast unit sweeps the map corners until the enemy base is
//! located.

use crate::actions::Action;

use super::{AiController, PlanContext};

/// Minimum ticks between scout dispatches.
const SCOUT_INTERVAL: u64 = 200;
/// Corner inset from the map edge.
const CORNER_INSET: f32 = 120.0;

pub fn run(ctl: &mut AiController, ctx: &PlanContext, actions: &mut Vec<Action>) {
    if ctl.enemy_base_location.is_some() {
        ctl.scout_unit = None;
        return;
    }
    // Scout died or converted? Forget it.
    if let Some(id) = ctl.scout_unit {
        let alive = ctx
            .perception
            .get(id)
            .map(|e| e.owner == ctl.player)
            .unwrap_or(false);
        if !alive {
            ctl.scout_unit = None;
        }
    }
    if ctx.tick.saturating_sub(ctl.last_scout_tick) < SCOUT_INTERVAL {
        return;
    }

    let me = ctl.player;
    let scout = match ctl.scout_unit {
        Some(id) => id,
        None => {
            // Fastest idle gun we have.
            let candidate = ctx
                .perception
                .combat_units_of(me, ctx.rules)
                .filter(|e| e.is_idle())
                .max_by(|a, b| {
                    let sa = a.unit_key.map(|k| ctx.rules.unit(k).speed).unwrap_or(0.0);
                    let sb = b.unit_key.map(|k| ctx.rules.unit(k).speed).unwrap_or(0.0);
                    sa.partial_cmp(&sb)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(b.id.cmp(&a.id))
                });
            match candidate {
                Some(e) => {
                    ctl.scout_unit = Some(e.id);
                    e.id
                }
                None => return,
            }
        }
    };

    let corners = [
        (CORNER_INSET, CORNER_INSET),
        (ctx.map_size.x - CORNER_INSET, CORNER_INSET),
        (ctx.map_size.x - CORNER_INSET, ctx.map_size.y - CORNER_INSET),
        (CORNER_INSET, ctx.map_size.y - CORNER_INSET),
    ];
    let (x, y) = corners[ctl.scout_corner % corners.len()];
    ctl.scout_corner += 1;
    ctl.last_scout_tick = ctx.tick;
    actions.push(Action::CommandMove {
        player: me,
        unit_ids: vec![scout],
        x,
        y,
    });
}
