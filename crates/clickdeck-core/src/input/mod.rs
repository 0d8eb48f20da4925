//! Global click intake: chord matching, the hook-side dispatcher and
//! double-click recognition.

mod click;
mod double_click;
mod hotkey;

pub use click::{ClickDispatcher, ClickSink, ClickSource};
pub use double_click::{ClickKind, DoubleClickTracker};
pub use hotkey::matches;
