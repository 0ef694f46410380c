//! Engine snapshots for stats and step-back

use serde::Serialize;
use std::collections::VecDeque;

use crate::core::types::Day;
use crate::disease::Disease;
use crate::network::RouteNetwork;
use crate::world::RegionSnapshot;

/// Complete copy of the mutable simulation state at the end of a day
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub day: Day,
    pub regions: Vec<RegionSnapshot>,
    pub disease: Disease,
    #[serde(skip)]
    pub network: RouteNetwork,
}

impl EngineSnapshot {
    pub fn total_infected(&self) -> u64 {
        self.regions.iter().map(|r| r.compartments.infected).sum()
    }
}

/// Bounded history of snapshots, oldest evicted first
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    capacity: usize,
    entries: VecDeque<EngineSnapshot>,
}

impl SnapshotBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, snapshot: EngineSnapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<EngineSnapshot> {
        self.entries.pop_back()
    }

    pub fn latest(&self) -> Option<&EngineSnapshot> {
        self.entries.back()
    }

    /// The snapshot before the latest one
    pub fn previous(&self) -> Option<&EngineSnapshot> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        self.entries.get(len - 2)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineSnapshot> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
