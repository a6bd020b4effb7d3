//! Collision grid and A* pathfinder.
//!
//! A tile bitmap marks cells occluded by buildings, rocks and wells; units
//! contribute soft traversal costs only. The grid is refreshed at the start
//! of every tick before entity updates, which also invalidates the path
//! cache. Identical `(start_cell, goal_cell, radius_bucket, owner)` requests
//! within one tick return the cached path.
//!
//! Paths are sequences of waypoints at cell centers. When no path exists the
//! caller falls back to direct steering with whisker avoidance.

use bevy_ecs::prelude::*;
use std::collections::{BinaryHeap, HashMap};

use crate::components::{
    AirUnit, BuildingTag, Footprint, Health, Owner, PlayerId, Position, RockTag, SimId, UnitTag,
    WellTag,
};
use crate::math::Vec2;
use crate::state::MapConfig;

/// Straight and diagonal step costs (scaled by 10 for integer math).
const COST_STRAIGHT: u32 = 10;
const COST_DIAGONAL: u32 = 14;
/// Soft cost for stepping through a cell occupied by a friendly unit.
const COST_THROUGH_FRIEND: u32 = 3;
/// Soft cost for stepping through a cell occupied by an enemy unit.
const COST_THROUGH_ENEMY: u32 = 6;
/// Expansion bound; beyond this the search gives up.
const MAX_EXPANDED_NODES: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PathKey {
    start: (i32, i32),
    goal: (i32, i32),
    radius_bucket: u8,
    owner: PlayerId,
}

/// Tile-rasterized obstacle bitmap plus the per-tick path cache.
#[derive(Resource, Debug)]
pub struct NavGrid {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    /// Hard-blocked cells (buildings, rocks, wells).
    blocked: Vec<bool>,
    /// Owner of a unit occupying the cell, or -1. Soft cost only.
    unit_owner: Vec<i8>,
    cache: HashMap<PathKey, Option<Vec<Vec2>>>,
}

impl NavGrid {
    pub fn new(world_w: f32, world_h: f32, cell_size: f32) -> Self {
        let width = (world_w / cell_size).ceil().max(1.0) as usize;
        let height = (world_h / cell_size).ceil().max(1.0) as usize;
        Self {
            width,
            height,
            cell_size,
            blocked: vec![false; width * height],
            unit_owner: vec![-1; width * height],
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn cell_center(&self, cell: (i32, i32)) -> Vec2 {
        Vec2::new(
            (cell.0 as f32 + 0.5) * self.cell_size,
            (cell.1 as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    fn index(&self, cell: (i32, i32)) -> Option<usize> {
        if cell.0 < 0 || cell.1 < 0 || cell.0 as usize >= self.width || cell.1 as usize >= self.height
        {
            None
        } else {
            Some(cell.1 as usize * self.width + cell.0 as usize)
        }
    }

    pub fn clear(&mut self) {
        self.blocked.fill(false);
        self.unit_owner.fill(-1);
        self.cache.clear();
    }

    /// Mark the axis-aligned rectangle around `center` as hard-blocked.
    pub fn block_rect(&mut self, center: Vec2, w: f32, h: f32) {
        let min = self.world_to_cell(Vec2::new(center.x - w * 0.5, center.y - h * 0.5));
        let max = self.world_to_cell(Vec2::new(center.x + w * 0.5, center.y + h * 0.5));
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                if let Some(i) = self.index((cx, cy)) {
                    self.blocked[i] = true;
                }
            }
        }
    }

    pub fn mark_unit(&mut self, pos: Vec2, owner: PlayerId) {
        let cell = self.world_to_cell(pos);
        if let Some(i) = self.index(cell) {
            self.unit_owner[i] = owner.clamp(-1, 126) as i8;
        }
    }

    /// Is the cell hard-blocked (out of bounds counts as blocked)?
    pub fn is_blocked_cell(&self, cell: (i32, i32)) -> bool {
        match self.index(cell) {
            Some(i) => self.blocked[i],
            None => true,
        }
    }

    /// Is a disc of `radius` centered at a world point clear of hard blocks?
    pub fn is_clear(&self, p: Vec2, radius: f32) -> bool {
        let inflation = (radius / self.cell_size).ceil() as i32;
        let center = self.world_to_cell(p);
        for dy in -inflation..=inflation {
            for dx in -inflation..=inflation {
                if self.is_blocked_cell((center.0 + dx, center.1 + dy)) {
                    return false;
                }
            }
        }
        true
    }

    /// Is an axis-aligned rectangle clear of hard blocks?
    pub fn is_rect_clear(&self, center: Vec2, w: f32, h: f32) -> bool {
        let min = self.world_to_cell(Vec2::new(center.x - w * 0.5, center.y - h * 0.5));
        let max = self.world_to_cell(Vec2::new(center.x + w * 0.5, center.y + h * 0.5));
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                if self.is_blocked_cell((cx, cy)) {
                    return false;
                }
            }
        }
        true
    }

    fn passable(&self, cell: (i32, i32), inflation: i32) -> bool {
        for dy in -inflation..=inflation {
            for dx in -inflation..=inflation {
                if self.is_blocked_cell((cell.0 + dx, cell.1 + dy)) {
                    return false;
                }
            }
        }
        true
    }

    fn soft_cost(&self, cell: (i32, i32), owner: PlayerId) -> u32 {
        match self.index(cell) {
            Some(i) => match self.unit_owner[i] {
                -1 => 0,
                o if PlayerId::from(o) == owner => COST_THROUGH_FRIEND,
                _ => COST_THROUGH_ENEMY,
            },
            None => 0,
        }
    }

    /// A* shortest path on the 8-connected grid with Chebyshev heuristic.
    ///
    /// Returns waypoints from just after `start` through `goal`, or `None`
    /// when unreachable within the expansion bound. Results are cached until
    /// the next grid refresh.
    pub fn find_path(
        &mut self,
        start: Vec2,
        goal: Vec2,
        radius: f32,
        owner: PlayerId,
    ) -> Option<Vec<Vec2>> {
        let start_cell = self.world_to_cell(start);
        let goal_cell = self.world_to_cell(goal);
        let inflation = (radius / self.cell_size).floor() as i32;
        let key = PathKey {
            start: start_cell,
            goal: goal_cell,
            radius_bucket: inflation.clamp(0, 255) as u8,
            owner,
        };
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let path = self.search(start_cell, goal_cell, inflation, owner, goal);
        self.cache.insert(key, path.clone());
        path
    }

    fn search(
        &self,
        start: (i32, i32),
        goal_cell: (i32, i32),
        inflation: i32,
        owner: PlayerId,
        goal_world: Vec2,
    ) -> Option<Vec<Vec2>> {
        if start == goal_cell {
            return Some(vec![goal_world]);
        }

        // If the goal itself sits inside an obstacle footprint, aim for the
        // nearest passable cell around it (the common "move to a building"
        // case).
        let goal = if self.passable(goal_cell, inflation) {
            goal_cell
        } else {
            self.nearest_passable(goal_cell, inflation, 6)?
        };

        #[derive(PartialEq, Eq)]
        struct Node {
            f: u32,
            seq: u32,
            cell: (i32, i32),
        }
        impl Ord for Node {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                // Min-heap with deterministic FIFO tie-break.
                other.f.cmp(&self.f).then(other.seq.cmp(&self.seq))
            }
        }
        impl PartialOrd for Node {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        let heuristic = |c: (i32, i32)| -> u32 {
            let dx = (c.0 - goal.0).unsigned_abs();
            let dy = (c.1 - goal.1).unsigned_abs();
            dx.max(dy) * COST_STRAIGHT
        };

        let mut open = BinaryHeap::new();
        let mut g_score: HashMap<(i32, i32), u32> = HashMap::new();
        let mut came_from: HashMap<(i32, i32), (i32, i32)> = HashMap::new();
        let mut seq = 0u32;

        g_score.insert(start, 0);
        open.push(Node {
            f: heuristic(start),
            seq,
            cell: start,
        });

        let mut expanded = 0usize;
        while let Some(Node { cell, .. }) = open.pop() {
            if cell == goal {
                return Some(self.reconstruct(&came_from, cell, goal_world));
            }
            expanded += 1;
            if expanded > MAX_EXPANDED_NODES {
                return None;
            }
            let g_here = g_score[&cell];

            const DIRS: [(i32, i32, u32); 8] = [
                (1, 0, COST_STRAIGHT),
                (-1, 0, COST_STRAIGHT),
                (0, 1, COST_STRAIGHT),
                (0, -1, COST_STRAIGHT),
                (1, 1, COST_DIAGONAL),
                (1, -1, COST_DIAGONAL),
                (-1, 1, COST_DIAGONAL),
                (-1, -1, COST_DIAGONAL),
            ];
            for (dx, dy, step) in DIRS {
                let next = (cell.0 + dx, cell.1 + dy);
                if !self.passable(next, inflation) {
                    continue;
                }
                let tentative = g_here + step + self.soft_cost(next, owner);
                if g_score.get(&next).map_or(true, |&g| tentative < g) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, cell);
                    seq += 1;
                    open.push(Node {
                        f: tentative + heuristic(next),
                        seq,
                        cell: next,
                    });
                }
            }
        }
        None
    }

    fn nearest_passable(&self, cell: (i32, i32), inflation: i32, max_ring: i32) -> Option<(i32, i32)> {
        for ring in 1..=max_ring {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let c = (cell.0 + dx, cell.1 + dy);
                    if self.passable(c, inflation) {
                        return Some(c);
                    }
                }
            }
        }
        None
    }

    fn reconstruct(
        &self,
        came_from: &HashMap<(i32, i32), (i32, i32)>,
        mut cell: (i32, i32),
        goal_world: Vec2,
    ) -> Vec<Vec2> {
        let mut cells = vec![cell];
        while let Some(&prev) = came_from.get(&cell) {
            cell = prev;
            cells.push(cell);
        }
        cells.reverse();
        // Drop the start cell and collapse collinear runs.
        let mut waypoints: Vec<Vec2> = Vec::new();
        let mut last_dir: Option<(i32, i32)> = None;
        for pair in cells.windows(2) {
            let dir = (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
            if last_dir == Some(dir) {
                let len = waypoints.len();
                waypoints[len - 1] = self.cell_center(pair[1]);
            } else {
                waypoints.push(self.cell_center(pair[1]));
                last_dir = Some(dir);
            }
        }
        // End exactly on the requested point.
        if let Some(last) = waypoints.last_mut() {
            *last = goal_world;
        }
        waypoints
    }
}

/// System that re-rasterizes obstacles and unit occupancy each tick.
#[allow(clippy::type_complexity)]
pub fn nav_grid_refresh_system(
    mut grid: ResMut<NavGrid>,
    map: Res<MapConfig>,
    statics: Query<
        (&Position, &Footprint, &Health),
        Or<(With<BuildingTag>, With<RockTag>, With<WellTag>)>,
    >,
    units: Query<(&SimId, &Position, &Owner, &Health), (With<UnitTag>, Without<AirUnit>)>,
) {
    // Recreate on map resize (editor/testing only).
    let expected_w = (map.width / grid.cell_size).ceil().max(1.0) as usize;
    if grid.width != expected_w {
        *grid = NavGrid::new(map.width, map.height, grid.cell_size);
    } else {
        grid.clear();
    }

    for (pos, footprint, health) in statics.iter() {
        if health.is_alive() {
            grid.block_rect(pos.0, footprint.w, footprint.h);
        }
    }

    // Id order keeps the last-writer-wins occupancy deterministic.
    let mut occupants: Vec<(SimId, Vec2, PlayerId)> = units
        .iter()
        .filter(|(_, _, _, h)| h.is_alive())
        .map(|(id, pos, owner, _)| (*id, pos.0, owner.0))
        .collect();
    occupants.sort_by_key(|(id, _, _)| *id);
    for (_, pos, owner) in occupants {
        grid.mark_unit(pos, owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> NavGrid {
        NavGrid::new(1000.0, 1000.0, 20.0)
    }

    #[test]
    fn test_direct_path_on_open_ground() {
        let mut grid = open_grid();
        let path = grid
            .find_path(Vec2::new(50.0, 50.0), Vec2::new(450.0, 50.0), 10.0, 0)
            .unwrap();
        assert!(!path.is_empty());
        let last = *path.last().unwrap();
        assert!((last.x - 450.0).abs() < 1e-3);
        // Collinear compression should keep the path short.
        assert!(path.len() <= 3, "path had {} waypoints", path.len());
    }

    #[test]
    fn test_path_routes_around_wall() {
        let mut grid = open_grid();
        // Vertical wall with a gap at the bottom.
        grid.block_rect(Vec2::new(500.0, 400.0), 40.0, 800.0);
        let path = grid
            .find_path(Vec2::new(100.0, 100.0), Vec2::new(900.0, 100.0), 8.0, 0)
            .unwrap();
        let max_y = path.iter().map(|p| p.y).fold(0.0f32, f32::max);
        assert!(max_y > 700.0, "path should detour below the wall, max_y={max_y}");
    }

    #[test]
    fn test_no_path_when_sealed() {
        let mut grid = NavGrid::new(400.0, 400.0, 20.0);
        // Box in the start position.
        grid.block_rect(Vec2::new(100.0, 40.0), 200.0, 20.0);
        grid.block_rect(Vec2::new(100.0, 160.0), 200.0, 20.0);
        grid.block_rect(Vec2::new(40.0, 100.0), 20.0, 200.0);
        grid.block_rect(Vec2::new(160.0, 100.0), 20.0, 200.0);
        let path = grid.find_path(Vec2::new(100.0, 100.0), Vec2::new(350.0, 350.0), 8.0, 0);
        assert!(path.is_none());
    }

    #[test]
    fn test_goal_inside_building_snaps_to_rim() {
        let mut grid = open_grid();
        grid.block_rect(Vec2::new(500.0, 500.0), 80.0, 80.0);
        let path = grid.find_path(Vec2::new(100.0, 500.0), Vec2::new(500.0, 500.0), 8.0, 0);
        assert!(path.is_some(), "goal inside a footprint should route to its rim");
    }

    #[test]
    fn test_cache_hit_until_clear() {
        let mut grid = open_grid();
        let a = grid.find_path(Vec2::new(50.0, 50.0), Vec2::new(800.0, 800.0), 10.0, 0);
        let b = grid.find_path(Vec2::new(50.0, 50.0), Vec2::new(800.0, 800.0), 10.0, 0);
        assert_eq!(a, b);
        grid.clear();
        let c = grid.find_path(Vec2::new(50.0, 50.0), Vec2::new(800.0, 800.0), 10.0, 0);
        assert_eq!(a, c);
    }

    #[test]
    fn test_radius_inflation_blocks_narrow_gap() {
        let mut grid = NavGrid::new(600.0, 600.0, 20.0);
        // Two blocks leaving a single-cell corridor at x=300.
        grid.block_rect(Vec2::new(140.0, 300.0), 280.0, 40.0);
        grid.block_rect(Vec2::new(460.0, 300.0), 280.0, 40.0);
        // A small unit fits through the 20px corridor.
        let small = grid.find_path(Vec2::new(300.0, 100.0), Vec2::new(300.0, 500.0), 5.0, 0);
        assert!(small.is_some());
        // A fat unit must not fit (inflated footprint seals the corridor),
        // and there is no way around inside this map.
        let mut grid2 = NavGrid::new(600.0, 600.0, 20.0);
        grid2.block_rect(Vec2::new(150.0, 300.0), 300.0, 40.0);
        grid2.block_rect(Vec2::new(450.0, 300.0), 300.0, 40.0);
        grid2.block_rect(Vec2::new(10.0, 300.0), 20.0, 40.0);
        grid2.block_rect(Vec2::new(590.0, 300.0), 20.0, 40.0);
        let fat = grid2.find_path(Vec2::new(300.0, 100.0), Vec2::new(300.0, 500.0), 25.0, 0);
        assert!(fat.is_none());
    }
}
