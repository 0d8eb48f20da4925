//! Pointer input for `PopupController`: selection clicks, drags, hover and
//! the single/double click launch timing.

use super::view::DEFAULT_TITLE;
use super::{PendingLaunch, PopupController};
use crate::input::ClickKind;
use crate::session::{DragEnd, DragUpdate};
use clickdeck_types::{ModifierState, Point};
use tracing::debug;

impl PopupController {
    /// Left button pressed at a canvas-relative position.
    pub fn pointer_down(&mut self, pos: Point, modifiers: ModifierState) {
        let tile = self.tile_size();
        let bounds = self.bounds();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // A new press supersedes a single click still waiting to launch
        session.pending_launch = None;

        match session.hit_test(pos, tile) {
            Some(id) => {
                session.press_toggled = modifiers.ctrl;
                if modifiers.ctrl {
                    session.selection.toggle(&mut session.items, id);
                } else if !session.selection.contains(id) {
                    session.selection.select_only(&mut session.items, id);
                }

                // A Ctrl press that deselected the item does not drag it
                if session.selection.contains(id)
                    && session.drag.begin(id, pos, &session.items, &session.selection, bounds)
                {
                    session.surface.set_capture(true);
                }
            }
            None if !modifiers.any() => {
                session.selection.deselect_all(&mut session.items, None);
            }
            None => {}
        }
        session.surface.invalidate();
    }

    /// Pointer moved; `modifiers.shift` snaps an active drag to the grid.
    pub fn pointer_move(&mut self, pos: Point, modifiers: ModifierState) {
        let tile = self.tile_size();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.drag.is_active() {
            if session.drag.update(pos, modifiers.shift, &mut session.items) == DragUpdate::Moved {
                session.surface.invalidate();
            }
            return;
        }

        let hovered = session.hit_test(pos, tile);
        if hovered != session.hovered {
            session.hovered = hovered;
            let title = hovered
                .and_then(|id| session.item(id))
                .map_or_else(|| DEFAULT_TITLE.to_string(), |item| item.display_name.clone());
            session.surface.set_title(&title);
            session.surface.invalidate();
        }
    }

    /// Left button released at host time `time_ms`.
    ///
    /// A release before the drag threshold is a click: a double click
    /// launches at once, a single click launches once the double-click
    /// window has passed without a second one.
    pub fn pointer_up(&mut self, time_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let was_active = session.drag.is_active();
        let end = session.drag.end(&session.items, &mut session.history);
        if was_active {
            session.surface.set_capture(false);
        }

        match end {
            DragEnd::None => {}
            DragEnd::Dropped { recorded } => {
                debug!("Drag dropped, {recorded} moves recorded");
                session.pending_launch = None;
                session.surface.invalidate();
            }
            DragEnd::Click(_) if session.press_toggled => session.pending_launch = None,
            DragEnd::Click(id) => match session.clicks.register(id, time_ms) {
                ClickKind::Double => {
                    session.pending_launch = None;
                    self.launch(id);
                }
                ClickKind::Single => {
                    let delay = session.clicks.threshold_ms();
                    session.pending_launch = Some(PendingLaunch {
                        id,
                        due_ms: time_ms.saturating_add(delay),
                    });
                    session.surface.schedule_tick(delay);
                }
            },
        }
    }

    /// Pointer capture was taken away mid-gesture: revert the drag.
    pub fn capture_lost(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.drag.cancel(&mut session.items) {
            debug!("Drag cancelled: capture lost");
            session.surface.invalidate();
        }
    }

    /// Timer callback requested through `schedule_tick`.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(pending) = session.pending_launch else {
            return;
        };
        if now_ms < pending.due_ms {
            session.surface.schedule_tick(pending.due_ms - now_ms);
            return;
        }
        session.pending_launch = None;
        self.launch(pending.id);
    }
}
