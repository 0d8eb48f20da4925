//! Per-popup working state: selection, drag, undo history and the layout
//! algorithms that operate on the item collection.

mod drag;
mod grid;
mod history;
pub mod layout;
mod selection;

pub use drag::{DragEnd, DragEngine, DragPhase, DragUpdate, MOVE_EPSILON};
pub use grid::{CanvasBounds, GridMetrics, TILE_CHROME};
pub use history::{DragOperation, PositionHistory, PositionSink};
pub use selection::SelectionSet;
