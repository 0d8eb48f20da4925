use super::hotkey;
use crate::Result;
use clickdeck_types::{HotkeyChord, ModifierState, Point};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::debug;

/// Receives qualifying clicks on the hook thread.
///
/// Implementations must only hand the position off (post a message, push to a
/// queue) and return. Returning `false` means the hand-off failed.
pub trait ClickSink: Send + Sync {
    fn click_detected(&self, at: Point) -> bool;
}

/// A process-wide low-level pointer hook.
pub trait ClickSource {
    /// Install the hook. Calling it again while installed does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Hook`] carrying the OS error code when
    /// registration fails.
    fn install(&mut self) -> Result<()>;

    /// Remove the hook. Safe to call when not installed.
    fn uninstall(&mut self);

    fn is_installed(&self) -> bool;
}

/// Filters raw button-up events from the hook and forwards at most one
/// click at a time to the UI thread.
///
/// The chord lives in an atomic so a config reload on the UI thread can swap
/// it without locking the hook thread.
pub struct ClickDispatcher {
    chord: AtomicU8,
    in_flight: AtomicBool,
    sink: Box<dyn ClickSink>,
}

impl ClickDispatcher {
    pub fn new(chord: HotkeyChord, sink: Box<dyn ClickSink>) -> Self {
        Self {
            chord: AtomicU8::new(chord.to_bits()),
            in_flight: AtomicBool::new(false),
            sink,
        }
    }

    pub fn chord(&self) -> HotkeyChord {
        HotkeyChord::from_bits(self.chord.load(Ordering::Acquire))
    }

    pub fn set_chord(&self, chord: HotkeyChord) {
        self.chord.store(chord.to_bits(), Ordering::Release);
    }

    /// Hook-thread entry point for a right-button release at `at`.
    ///
    /// `modifiers` must be sampled at the moment of the event. Returns true
    /// when the click was forwarded.
    pub fn on_button_up(&self, at: Point, modifiers: ModifierState) -> bool {
        if !hotkey::matches(modifiers, self.chord()) {
            return false;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Click at ({}, {}) dropped, previous click still in flight", at.x, at.y);
            return false;
        }

        if self.sink.click_detected(at) {
            true
        } else {
            self.in_flight.store(false, Ordering::Release);
            false
        }
    }

    /// UI-thread acknowledgement that the forwarded click has been handled.
    pub fn complete(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink {
        clicks: Mutex<Vec<Point>>,
        refuse: AtomicBool,
    }

    impl ClickSink for Arc<RecordingSink> {
        fn click_detected(&self, at: Point) -> bool {
            if self.refuse.load(Ordering::SeqCst) {
                return false;
            }
            self.clicks.lock().unwrap().push(at);
            true
        }
    }

    fn dispatcher() -> (ClickDispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = ClickDispatcher::new(HotkeyChord::default(), Box::new(Arc::clone(&sink)));
        (dispatcher, sink)
    }

    #[test]
    fn test_forwards_matching_click() {
        let (dispatcher, sink) = dispatcher();
        assert!(dispatcher.on_button_up(Point::new(5.0, 6.0), ModifierState::ctrl()));
        assert_eq!(*sink.clicks.lock().unwrap(), vec![Point::new(5.0, 6.0)]);
        assert!(dispatcher.is_in_flight());
    }

    #[test]
    fn test_ignores_non_matching_click() {
        let (dispatcher, sink) = dispatcher();
        assert!(!dispatcher.on_button_up(Point::default(), ModifierState::NONE));
        assert!(!dispatcher.on_button_up(Point::default(), ModifierState::shift()));
        assert!(sink.clicks.lock().unwrap().is_empty());
        assert!(!dispatcher.is_in_flight());
    }

    #[test]
    fn test_single_flight_until_complete() {
        let (dispatcher, sink) = dispatcher();
        assert!(dispatcher.on_button_up(Point::new(1.0, 1.0), ModifierState::ctrl()));
        assert!(!dispatcher.on_button_up(Point::new(2.0, 2.0), ModifierState::ctrl()));

        dispatcher.complete();
        assert!(dispatcher.on_button_up(Point::new(3.0, 3.0), ModifierState::ctrl()));

        let clicks = sink.clicks.lock().unwrap();
        assert_eq!(*clicks, vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)]);
    }

    #[test]
    fn test_failed_handoff_releases_guard() {
        let (dispatcher, sink) = dispatcher();
        sink.refuse.store(true, Ordering::SeqCst);
        assert!(!dispatcher.on_button_up(Point::default(), ModifierState::ctrl()));
        assert!(!dispatcher.is_in_flight());
    }

    #[test]
    fn test_set_chord_takes_effect() {
        let (dispatcher, _sink) = dispatcher();
        let alt = HotkeyChord::new(false, true, false, false);
        dispatcher.set_chord(alt);
        assert_eq!(dispatcher.chord(), alt);
        assert!(!dispatcher.on_button_up(Point::default(), ModifierState::ctrl()));
    }

    #[test]
    fn test_concurrent_clicks_forward_once() {
        let (dispatcher, sink) = dispatcher();
        let dispatcher = Arc::new(dispatcher);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let d = Arc::clone(&dispatcher);
                std::thread::spawn(move || {
                    d.on_button_up(Point::new(f64::from(i), 0.0), ModifierState::ctrl())
                })
            })
            .collect();

        let forwarded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(forwarded, 1);
        assert_eq!(sink.clicks.lock().unwrap().len(), 1);
    }
}
