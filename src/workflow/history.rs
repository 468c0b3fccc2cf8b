/// Bounded linear undo/redo history
///
/// Keeps deep copies of `{nodes, edges}` in a `past` stack (oldest evicted first once the
/// limit is reached) and a `future` stack that is cleared by every new checkpoint.

use crate::workflow::types::{WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// The part of the editor state that undo/redo restores
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<GraphSnapshot>,
    future: Vec<GraphSnapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), limit: limit.max(1) }
    }

    /// Record the state as it was before a mutation
    pub fn checkpoint(&mut self, before: GraphSnapshot) {
        self.future.clear();
        self.past.push_back(before);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Swap `current` for the latest past snapshot. Returns the restored snapshot.
    pub fn undo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Swap `current` for the most recently undone snapshot
    pub fn redo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{NodeConfig, NodeData, Position, TriggerConfig};

    fn snapshot(tag: usize) -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![WorkflowNode {
                id: format!("node-{tag}"),
                config: NodeConfig::Trigger(TriggerConfig::default()),
                position: Position::default(),
                data: NodeData::new("n"),
            }],
            edges: Vec::new(),
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new(10);
        history.checkpoint(snapshot(0));

        let restored = history.undo(snapshot(1)).unwrap();
        assert_eq!(restored, snapshot(0));
        assert!(!history.can_undo());

        let redone = history.redo(restored).unwrap();
        assert_eq!(redone, snapshot(1));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_checkpoint_clears_future() {
        let mut history = History::new(10);
        history.checkpoint(snapshot(0));
        history.undo(snapshot(1));
        assert!(history.can_redo());

        history.checkpoint(snapshot(0));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.checkpoint(snapshot(i));
        }
        assert_eq!(history.past_len(), 3);

        let mut current = snapshot(5);
        for expected in [4, 3, 2] {
            current = history.undo(current).unwrap();
            assert_eq!(current, snapshot(expected));
        }
        assert!(history.undo(current).is_none());
    }
}
