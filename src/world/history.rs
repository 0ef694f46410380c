//! Bounded per-region history

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::Day;
use crate::world::compartments::Compartments;

/// Number of history entries kept per region
pub const REGION_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub day: Day,
    pub compartments: Compartments,
    pub quarantined: bool,
}

/// Ring buffer of compartment snapshots; oldest entries are dropped first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for RegionHistory {
    fn default() -> Self {
        Self::with_capacity(REGION_HISTORY_CAPACITY)
    }
}

impl RegionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries recorded after `day` (used when stepping back)
    pub fn truncate_after(&mut self, day: Day) {
        while self.entries.back().is_some_and(|e| e.day > day) {
            self.entries.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: Day) -> HistoryEntry {
        HistoryEntry {
            day,
            compartments: Compartments::new(10),
            quarantined: false,
        }
    }

    #[test]
    fn test_ring_drops_oldest() {
        let mut history = RegionHistory::with_capacity(3);
        for day in 0..5 {
            history.record(entry(day));
        }
        assert_eq!(history.len(), 3);
        let days: Vec<Day> = history.iter().map(|e| e.day).collect();
        assert_eq!(days, vec![2, 3, 4]);
    }

    #[test]
    fn test_default_capacity() {
        let mut history = RegionHistory::default();
        for day in 0..250 {
            history.record(entry(day));
        }
        assert_eq!(history.len(), REGION_HISTORY_CAPACITY);
        assert_eq!(history.latest().unwrap().day, 249);
    }

    #[test]
    fn test_truncate_after() {
        let mut history = RegionHistory::default();
        for day in [1, 2, 2, 3] {
            history.record(entry(day));
        }
        history.truncate_after(2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().unwrap().day, 2);
    }
}
