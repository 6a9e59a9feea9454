use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::state::Pose;

/// Poses kept per item before the oldest is evicted.
pub const HISTORY_DEPTH: usize = 10;

/// Bounded per-item stacks of settled pre-move poses.
#[derive(Debug, Clone, Serialize)]
pub struct UndoHistory {
    depth: usize,
    stacks: BTreeMap<String, VecDeque<Pose>>,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

impl UndoHistory {
    pub fn new(depth: usize) -> Self {
        UndoHistory {
            depth: depth.max(1),
            stacks: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, id: &str, pose: Pose) {
        let stack = self.stacks.entry(id.to_string()).or_default();
        stack.push_back(pose);
        while stack.len() > self.depth {
            stack.pop_front();
        }
    }

    pub fn pop(&mut self, id: &str) -> Option<Pose> {
        self.stacks.get_mut(id)?.pop_back()
    }

    pub fn clear(&mut self, id: &str) {
        self.stacks.remove(id);
    }

    pub fn len(&self, id: &str) -> usize {
        self.stacks.get(id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, id: &str) -> bool {
        self.len(id) == 0
    }

    /// Oldest-first view of an item's stack.
    pub fn entries(&self, id: &str) -> Vec<Pose> {
        self.stacks
            .get(id)
            .map(|stack| stack.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn peek(&self, id: &str) -> Option<Pose> {
        self.stacks.get(id)?.back().copied()
    }
}
