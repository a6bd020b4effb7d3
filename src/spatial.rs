//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force.
//!
//! The grid is rebuilt once per tick before any behavior runs. Iteration
//! order is deterministic: buckets are sorted by [`SimId`] after the rebuild
//! and query results are sorted by distance with the id as tie-breaker.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::{
    AirUnit, BuildingTag, Footprint, Health, OreTag, Owner, PlayerId, Position, RockTag, SimId,
    UnitTag, WellTag,
};

/// Coarse kind of a grid entry, enough for most queries without a component
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Unit,
    Building,
    Ore,
    Well,
    Rock,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub id: SimId,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub kind: EntryKind,
    pub air: bool,
}

impl SpatialEntry {
    pub fn dist_sq(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }

    pub fn is_enemy_of(&self, owner: PlayerId) -> bool {
        self.owner >= 0 && self.owner != owner
    }
}

/// Grid-based spatial partitioning structure.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units; kept at ≥ 2x the largest entity radius.
    pub cell_size: f32,
    /// Query slack so radius queries never miss a touching neighbor.
    pub buffer: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    count: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(100.0, 48.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32, buffer: f32) -> Self {
        Self {
            cell_size,
            buffer,
            cells: HashMap::new(),
            count: 0,
        }
    }

    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let cell = self.world_to_cell(entry.x, entry.y);
        self.cells.entry(cell).or_default().push(entry);
        self.count += 1;
    }

    /// Sort every bucket by id. Must run after the last insert of the tick.
    pub fn finalize(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.sort_by_key(|e| e.id);
        }
    }

    /// All live entities whose center lies within `radius + buffer`,
    /// sorted by distance (id as tie-breaker).
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let effective = radius + self.buffer;
        let effective_sq = effective * effective;
        let cells_to_check = (effective / self.cell_size).ceil() as i32 + 1;
        let center = self.world_to_cell(x, y);

        let mut results = Vec::new();
        for dx in -cells_to_check..=cells_to_check {
            for dy in -cells_to_check..=cells_to_check {
                if let Some(entries) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    for entry in entries {
                        if entry.dist_sq(x, y) <= effective_sq {
                            results.push(*entry);
                        }
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            a.dist_sq(x, y)
                .partial_cmp(&b.dist_sq(x, y))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        results
    }

    /// Narrowed variant of [`query_radius`](Self::query_radius).
    pub fn query_radius_kind(&self, x: f32, y: f32, radius: f32, kind: EntryKind) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| e.kind == kind);
        results
    }

    /// Enemy units and buildings within radius.
    pub fn query_enemies(&self, x: f32, y: f32, radius: f32, owner: PlayerId) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| {
            e.is_enemy_of(owner) && matches!(e.kind, EntryKind::Unit | EntryKind::Building)
        });
        results
    }

    /// Friendly units and buildings within radius.
    pub fn query_friendlies(&self, x: f32, y: f32, radius: f32, owner: PlayerId) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| {
            e.owner == owner && matches!(e.kind, EntryKind::Unit | EntryKind::Building)
        });
        results
    }

    /// Expanding ring search: nearest entry within `max_radius` satisfying
    /// the predicate, or `None`.
    pub fn find_nearest<F>(&self, x: f32, y: f32, max_radius: f32, predicate: F) -> Option<SpatialEntry>
    where
        F: Fn(&SpatialEntry) -> bool,
    {
        let center = self.world_to_cell(x, y);
        let max_ring = ((max_radius + self.buffer) / self.cell_size).ceil() as i32 + 1;
        let max_sq = max_radius * max_radius;

        let mut best: Option<(f32, SpatialEntry)> = None;
        for ring in 0..=max_ring {
            // Once a hit exists, stop as soon as the ring's inner edge is
            // provably farther than the best hit.
            if let Some((best_sq, _)) = best {
                let inner = (ring - 1).max(0) as f32 * self.cell_size;
                if inner * inner > best_sq {
                    break;
                }
            }
            for (cx, cy) in ring_cells(center, ring) {
                if let Some(entries) = self.cells.get(&(cx, cy)) {
                    for entry in entries {
                        if !predicate(entry) {
                            continue;
                        }
                        let d = entry.dist_sq(x, y);
                        if d > max_sq {
                            continue;
                        }
                        let better = match best {
                            None => true,
                            Some((bd, be)) => d < bd || (d == bd && entry.id < be.id),
                        };
                        if better {
                            best = Some((d, *entry));
                        }
                    }
                }
            }
        }
        best.map(|(_, e)| e)
    }

    pub fn total_count(&self) -> usize {
        self.count
    }
}

/// Cells on the square ring at Chebyshev distance `ring` from `center`.
fn ring_cells(center: (i32, i32), ring: i32) -> Vec<(i32, i32)> {
    if ring == 0 {
        return vec![center];
    }
    let mut cells = Vec::with_capacity((ring as usize) * 8);
    for dx in -ring..=ring {
        cells.push((center.0 + dx, center.1 - ring));
        cells.push((center.0 + dx, center.1 + ring));
    }
    for dy in (-ring + 1)..ring {
        cells.push((center.0 - ring, center.1 + dy));
        cells.push((center.0 + ring, center.1 + dy));
    }
    cells
}

/// System that rebuilds the spatial grid each tick before any behavior runs.
#[allow(clippy::type_complexity)]
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(
        Entity,
        &SimId,
        &Position,
        &Owner,
        &Footprint,
        &Health,
        Option<&UnitTag>,
        Option<&BuildingTag>,
        Option<&OreTag>,
        Option<&WellTag>,
        Option<&RockTag>,
        Option<&AirUnit>,
    )>,
) {
    grid.clear();
    for (entity, id, pos, owner, footprint, health, unit, building, ore, well, rock, air) in
        query.iter()
    {
        if !health.is_alive() {
            continue;
        }
        let kind = if unit.is_some() {
            EntryKind::Unit
        } else if building.is_some() {
            EntryKind::Building
        } else if ore.is_some() {
            EntryKind::Ore
        } else if well.is_some() {
            EntryKind::Well
        } else if rock.is_some() {
            EntryKind::Rock
        } else {
            continue;
        };
        grid.insert(SpatialEntry {
            entity,
            id: *id,
            owner: owner.0,
            x: pos.0.x,
            y: pos.0.y,
            radius: footprint.radius,
            kind,
            air: air.is_some(),
        });
    }
    grid.finalize();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, owner: PlayerId, x: f32, y: f32, kind: EntryKind) -> SpatialEntry {
        SpatialEntry {
            entity: Entity::from_raw(id),
            id: SimId(id),
            owner,
            x,
            y,
            radius: 10.0,
            kind,
            air: false,
        }
    }

    #[test]
    fn test_query_radius_with_buffer() {
        let mut grid = SpatialGrid::new(50.0, 10.0);
        grid.insert(entry(1, 0, 0.0, 0.0, EntryKind::Unit));
        grid.insert(entry(2, 0, 55.0, 0.0, EntryKind::Unit));
        grid.insert(entry(3, 0, 500.0, 0.0, EntryKind::Unit));
        grid.finalize();

        // 55 > 50 but within 50 + 10 buffer.
        let nearby = grid.query_radius(0.0, 0.0, 50.0);
        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].id, SimId(1));
    }

    #[test]
    fn test_enemy_and_friendly_filters_ignore_neutral() {
        let mut grid = SpatialGrid::new(50.0, 0.0);
        grid.insert(entry(1, 0, 0.0, 0.0, EntryKind::Unit));
        grid.insert(entry(2, 1, 10.0, 0.0, EntryKind::Unit));
        grid.insert(entry(3, -1, 20.0, 0.0, EntryKind::Ore));
        grid.finalize();

        let enemies = grid.query_enemies(0.0, 0.0, 100.0, 0);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].id, SimId(2));

        let friends = grid.query_friendlies(0.0, 0.0, 100.0, 0);
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, SimId(1));
    }

    #[test]
    fn test_find_nearest_expanding_ring() {
        let mut grid = SpatialGrid::new(40.0, 0.0);
        grid.insert(entry(1, 0, 300.0, 0.0, EntryKind::Ore));
        grid.insert(entry(2, 0, 120.0, 0.0, EntryKind::Ore));
        grid.insert(entry(3, 0, 121.0, 0.0, EntryKind::Unit));
        grid.finalize();

        let nearest = grid
            .find_nearest(0.0, 0.0, 1000.0, |e| e.kind == EntryKind::Ore)
            .unwrap();
        assert_eq!(nearest.id, SimId(2));

        assert!(grid.find_nearest(0.0, 0.0, 50.0, |e| e.kind == EntryKind::Ore).is_none());
    }

    #[test]
    fn test_find_nearest_tie_breaks_by_id() {
        let mut grid = SpatialGrid::new(40.0, 0.0);
        grid.insert(entry(7, 0, 100.0, 0.0, EntryKind::Unit));
        grid.insert(entry(4, 0, -100.0, 0.0, EntryKind::Unit));
        grid.finalize();

        let nearest = grid.find_nearest(0.0, 0.0, 500.0, |_| true).unwrap();
        assert_eq!(nearest.id, SimId(4));
    }
}
