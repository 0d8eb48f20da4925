use clickdeck_types::{HotkeyChord, ModifierState};

/// True when the live modifier state is exactly the configured chord.
///
/// Every required modifier must be down and every other modifier up. A chord
/// that requires nothing never matches, so a plain right-click is left alone.
#[must_use]
pub fn matches(state: ModifierState, chord: HotkeyChord) -> bool {
    if chord.is_empty() {
        return false;
    }

    state.ctrl == chord.ctrl
        && state.alt == chord.alt
        && state.shift == chord.shift
        && state.win == chord.win
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(ctrl: bool, alt: bool, shift: bool, win: bool) -> ModifierState {
        ModifierState {
            ctrl,
            alt,
            shift,
            win,
        }
    }

    #[test]
    fn test_ctrl_chord_matches_ctrl_only() {
        let chord = HotkeyChord::default();
        assert!(matches(ModifierState::ctrl(), chord));
    }

    #[test]
    fn test_extra_modifier_rejects() {
        let chord = HotkeyChord::default();
        assert!(!matches(state(true, false, true, false), chord));
        assert!(!matches(state(true, false, false, true), chord));
    }

    #[test]
    fn test_missing_modifier_rejects() {
        let chord = HotkeyChord::new(true, true, false, false);
        assert!(!matches(ModifierState::ctrl(), chord));
        assert!(matches(state(true, true, false, false), chord));
    }

    #[test]
    fn test_empty_chord_never_matches() {
        let chord = HotkeyChord::new(false, false, false, false);
        assert!(!matches(ModifierState::NONE, chord));
        assert!(!matches(ModifierState::ctrl(), chord));
    }

    proptest! {
        #[test]
        fn matches_iff_exact(
            c in any::<(bool, bool, bool, bool)>(),
            s in any::<(bool, bool, bool, bool)>(),
        ) {
            let chord = HotkeyChord::new(c.0, c.1, c.2, c.3);
            let live = state(s.0, s.1, s.2, s.3);
            let exact = c == s;
            prop_assert_eq!(matches(live, chord), exact && !chord.is_empty());
        }
    }
}
