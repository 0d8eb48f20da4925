use clickdeck_types::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// Recognizes a double click as two clicks on the same element within a
/// fixed window. Timestamps are host milliseconds.
#[derive(Debug, Clone)]
pub struct DoubleClickTracker {
    threshold_ms: u64,
    last: Option<(ItemId, u64)>,
}

impl DoubleClickTracker {
    #[must_use]
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            last: None,
        }
    }

    #[must_use]
    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Record a click on `id` at `time_ms` and classify it.
    ///
    /// A recognized double click consumes the pair, so a third quick click
    /// starts a new sequence.
    pub fn register(&mut self, id: ItemId, time_ms: u64) -> ClickKind {
        if let Some((last_id, last_time)) = self.last
            && last_id == id
            && time_ms >= last_time
            && time_ms - last_time <= self.threshold_ms
        {
            self.last = None;
            return ClickKind::Double;
        }

        self.last = Some((id, time_ms));
        ClickKind::Single
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
