use clickdeck_types::{ItemId, LauncherItem, Point};
use std::collections::VecDeque;
use tracing::debug;

/// One recorded position change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOperation {
    pub item_id: ItemId,
    pub previous: Point,
    pub resulting: Point,
}

/// Applies a position to an item by id.
pub trait PositionSink {
    /// Returns false when no item with `id` exists.
    fn set_position(&mut self, id: ItemId, position: Point) -> bool;
}

impl PositionSink for [LauncherItem] {
    fn set_position(&mut self, id: ItemId, position: Point) -> bool {
        match self.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.set_position(position);
                true
            }
            None => false,
        }
    }
}

impl PositionSink for Vec<LauncherItem> {
    fn set_position(&mut self, id: ItemId, position: Point) -> bool {
        self.as_mut_slice().set_position(id, position)
    }
}

/// Bounded undo/redo log of position changes.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    undo: VecDeque<DragOperation>,
    redo: VecDeque<DragOperation>,
    limit: usize,
}

impl PositionHistory {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record a finished move. Any pending redo is discarded.
    pub fn record_drag(&mut self, item_id: ItemId, previous: Point, resulting: Point) {
        self.redo.clear();
        Self::push_bounded(
            &mut self.undo,
            DragOperation {
                item_id,
                previous,
                resulting,
            },
            self.limit,
        );
    }

    /// Revert the newest operation. Returns true if a position was applied.
    ///
    /// An operation whose item no longer exists is dropped.
    pub fn undo<S: PositionSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        let Some(op) = self.undo.pop_back() else {
            return false;
        };

        if sink.set_position(op.item_id, op.previous) {
            Self::push_bounded(&mut self.redo, op, self.limit);
            true
        } else {
            debug!("Dropping undo for missing item {}", op.item_id);
            false
        }
    }

    /// Re-apply the newest undone operation. Returns true if a position was applied.
    pub fn redo<S: PositionSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        let Some(op) = self.redo.pop_back() else {
            return false;
        };

        if sink.set_position(op.item_id, op.resulting) {
            Self::push_bounded(&mut self.undo, op, self.limit);
            true
        } else {
            debug!("Dropping redo for missing item {}", op.item_id);
            false
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    fn push_bounded(stack: &mut VecDeque<DragOperation>, op: DragOperation, limit: usize) {
        if stack.len() == limit {
            stack.pop_front();
        }
        stack.push_back(op);
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn item_at(x: f64, y: f64) -> LauncherItem {
        LauncherItem::new("A", "a.exe").with_position(x, y)
    }

    #[test]
    fn test_undo_then_redo_single() {
        let mut items = vec![item_at(50.0, 20.0)];
        let id = items[0].id;
        let mut history = PositionHistory::default();
        history.record_drag(id, Point::new(10.0, 20.0), Point::new(50.0, 20.0));

        assert!(history.undo(&mut items));
        assert_eq!(items[0].position(), Point::new(10.0, 20.0));
        assert!(history.can_redo());

        assert!(history.redo(&mut items));
        assert_eq!(items[0].position(), Point::new(50.0, 20.0));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut items = vec![item_at(0.0, 0.0)];
        let mut history = PositionHistory::default();
        assert!(!history.undo(&mut items));
        assert!(!history.redo(&mut items));
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut items = vec![item_at(30.0, 0.0)];
        let id = items[0].id;
        let mut history = PositionHistory::default();
        history.record_drag(id, Point::new(10.0, 0.0), Point::new(30.0, 0.0));
        history.undo(&mut items);

        history.record_drag(id, Point::new(10.0, 0.0), Point::new(90.0, 0.0));
        assert!(!history.can_redo());
        assert!(!history.redo(&mut items));
    }

    #[test]
    fn test_missing_item_is_dropped() {
        let mut items = vec![item_at(0.0, 0.0)];
        let mut history = PositionHistory::default();
        history.record_drag(ItemId::new(), Point::new(1.0, 1.0), Point::new(2.0, 2.0));

        assert!(!history.undo(&mut items));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(items[0].position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_limit_discards_oldest() {
        let mut history = PositionHistory::new(2);
        let id = ItemId::new();
        for i in 0..3 {
            let x = f64::from(i);
            history.record_drag(id, Point::new(x, 0.0), Point::new(x + 1.0, 0.0));
        }
        assert_eq!(history.undo_len(), 2);

        let mut items = vec![LauncherItem {
            id,
            ..item_at(3.0, 0.0)
        }];
        history.undo(&mut items);
        history.undo(&mut items);
        assert_eq!(items[0].x, 1.0);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_clear_empties_both_stacks() {
        let mut items = vec![item_at(5.0, 5.0)];
        let id = items[0].id;
        let mut history = PositionHistory::default();
        history.record_drag(id, Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        history.record_drag(id, Point::new(5.0, 5.0), Point::new(9.0, 9.0));
        history.undo(&mut items);

        history.clear();
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 0);
    }
}
