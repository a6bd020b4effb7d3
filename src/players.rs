//! Player state: credits, power, and the four production queues.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::components::PlayerId;
use crate::rules::{BuildingKey, ProductionCategory, RulesCatalog, UnitKey};

/// AI difficulty / behavior tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// No planner at all.
    Dummy,
    #[default]
    Easy,
    Medium,
    Hard,
}

/// What a production queue slot refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecRef {
    Unit(UnitKey),
    Building(BuildingKey),
}

impl SpecRef {
    pub fn cost(&self, rules: &RulesCatalog) -> u32 {
        match self {
            SpecRef::Unit(k) => rules.unit(*k).cost,
            SpecRef::Building(k) => rules.building(*k).cost,
        }
    }

    pub fn build_ticks(&self, rules: &RulesCatalog) -> u32 {
        match self {
            SpecRef::Unit(k) => rules.unit(*k).build_ticks,
            SpecRef::Building(k) => rules.building(*k).build_ticks,
        }
    }
}

/// The item currently in production in one lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuild {
    pub item: SpecRef,
    /// Percent complete, 0..=100.
    pub progress: f32,
    /// Credits already paid in; refunded exactly on cancel.
    pub invested: f64,
}

/// One production lane: a single active item plus a FIFO backlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildQueue {
    pub current: Option<ActiveBuild>,
    pub queued: VecDeque<SpecRef>,
}

impl BuildQueue {
    pub fn len(&self) -> usize {
        usize::from(self.current.is_some()) + self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the item immediately or append it. Fails when the lane is at
    /// the configured cap.
    pub fn enqueue(&mut self, item: SpecRef, max: usize) -> bool {
        if self.len() >= max {
            return false;
        }
        if self.current.is_none() {
            self.current = Some(ActiveBuild {
                item,
                progress: 0.0,
                invested: 0.0,
            });
        } else {
            self.queued.push_back(item);
        }
        true
    }

    /// Remove the last queued item, or cancel the active one. Returns the
    /// refund owed.
    pub fn cancel(&mut self) -> f64 {
        if self.queued.pop_back().is_some() {
            return 0.0;
        }
        if let Some(active) = self.current.take() {
            self.advance_from_backlog();
            return active.invested;
        }
        0.0
    }

    /// Clear everything. Returns the refund owed for the active item
    /// (queued items have nothing invested).
    pub fn void(&mut self, refund: bool) -> f64 {
        self.queued.clear();
        match self.current.take() {
            Some(active) if refund => active.invested,
            _ => 0.0,
        }
    }

    /// Pop the next backlog item into the active slot.
    pub fn advance_from_backlog(&mut self) {
        if self.current.is_none() {
            if let Some(item) = self.queued.pop_front() {
                self.current = Some(ActiveBuild {
                    item,
                    progress: 0.0,
                    invested: 0.0,
                });
            }
        }
    }
}

/// Per-player economy, production and presentation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub is_ai: bool,
    pub difficulty: Difficulty,
    pub color: [u8; 3],
    pub credits: f64,
    /// Power generated by buildings this tick.
    pub power_generated: i32,
    /// Power drained by buildings this tick.
    pub power_drain: i32,
    /// Queues indexed by `ProductionCategory::index()`.
    pub queues: [BuildQueue; 4],
    /// Completed building waiting for a PLACE_BUILDING action.
    pub ready_to_place: Option<BuildingKey>,
    pub eliminated: bool,
}

impl PlayerState {
    pub fn new(id: PlayerId, is_ai: bool, difficulty: Difficulty, credits: f64) -> Self {
        const COLORS: [[u8; 3]; 6] = [
            [220, 60, 50],
            [60, 110, 220],
            [60, 180, 90],
            [230, 180, 40],
            [170, 80, 200],
            [80, 190, 190],
        ];
        Self {
            id,
            is_ai,
            difficulty,
            color: COLORS[(id.max(0) as usize) % COLORS.len()],
            credits,
            power_generated: 0,
            power_drain: 0,
            queues: Default::default(),
            ready_to_place: None,
            eliminated: false,
        }
    }

    pub fn queue(&self, category: ProductionCategory) -> &BuildQueue {
        &self.queues[category.index()]
    }

    pub fn queue_mut(&mut self, category: ProductionCategory) -> &mut BuildQueue {
        &mut self.queues[category.index()]
    }

    /// Build-speed factor from the power balance.
    pub fn power_factor(&self, low_power_factor: f32) -> f32 {
        if self.power_generated >= self.power_drain {
            1.0
        } else {
            low_power_factor
        }
    }

    pub fn has_low_power(&self) -> bool {
        self.power_generated < self.power_drain
    }
}

/// All players, indexed by id order. Iteration order is id order, which is
/// what keeps multi-player phases deterministic.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Players(pub Vec<PlayerState>);

impl Players {
    pub fn get(&self, id: PlayerId) -> Option<&PlayerState> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.0.iter_mut().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesCatalog;

    fn rifle_ref(rules: &RulesCatalog) -> SpecRef {
        SpecRef::Unit(rules.unit_key("rifleman").unwrap())
    }

    #[test]
    fn test_queue_single_current_then_backlog() {
        let rules = RulesCatalog::standard();
        let mut q = BuildQueue::default();
        assert!(q.enqueue(rifle_ref(&rules), 99));
        assert!(q.enqueue(rifle_ref(&rules), 99));
        assert!(q.current.is_some());
        assert_eq!(q.queued.len(), 1);
    }

    #[test]
    fn test_queue_cap() {
        let rules = RulesCatalog::standard();
        let mut q = BuildQueue::default();
        for _ in 0..3 {
            q.enqueue(rifle_ref(&rules), 3);
        }
        assert!(!q.enqueue(rifle_ref(&rules), 3));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_cancel_refunds_exact_investment() {
        let rules = RulesCatalog::standard();
        let mut q = BuildQueue::default();
        q.enqueue(rifle_ref(&rules), 99);
        q.current.as_mut().unwrap().invested = 73.5;
        assert_eq!(q.cancel(), 73.5);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancel_removes_backlog_first() {
        let rules = RulesCatalog::standard();
        let mut q = BuildQueue::default();
        q.enqueue(rifle_ref(&rules), 99);
        q.enqueue(rifle_ref(&rules), 99);
        q.current.as_mut().unwrap().invested = 10.0;
        // Backlog item goes first and owes no refund.
        assert_eq!(q.cancel(), 0.0);
        assert!(q.current.is_some());
        // Then the active item refunds its investment.
        assert_eq!(q.cancel(), 10.0);
        assert!(q.is_empty());
    }

    #[test]
    fn test_power_factor() {
        let mut p = PlayerState::new(0, false, Difficulty::Easy, 1000.0);
        p.power_generated = 100;
        p.power_drain = 80;
        assert_eq!(p.power_factor(0.25), 1.0);
        p.power_drain = 120;
        assert_eq!(p.power_factor(0.25), 0.25);
    }
}
