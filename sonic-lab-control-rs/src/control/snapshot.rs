//! What the display renderer sees, and how often it sees it.

use super::state::{UiMode, Waveform};

/// Immutable copy of the state the display needs for one frame.
///
/// Produced by the control loop and handed to the renderer; the loop never
/// depends on what the renderer does with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSnapshot {
    pub ui_mode: UiMode,
    pub menu_index: usize,
    pub selected: Option<Waveform>,
    pub muted: bool,
    /// Conditioned pitch, `0..=4095`.
    pub pitch: u16,
    /// Nominal frequency for the pitch readout.
    pub frequency_hz: u32,
}

impl DeviceSnapshot {
    /// `true` when the selector should be drawn instead of the play screen.
    ///
    /// Also covers `Playing` with nothing selected, which cannot be entered
    /// through the state machine but costs nothing to handle.
    pub fn shows_selector(&self) -> bool {
        self.ui_mode == UiMode::Menu || self.selected.is_none()
    }
}

/// Timestamp gate limiting display refreshes to one per `period_ms`.
///
/// A gate, not a delay: [`ready()`](Self::ready) never blocks.
#[derive(Debug, Clone, Copy)]
pub struct RefreshGate {
    period_ms: u32,
    last_ms: u32,
}

impl RefreshGate {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    /// Returns `true` (and restarts the period) if more than `period_ms`
    /// has passed since the last refresh, or if `force` is set.
    pub fn ready(&mut self, now_ms: u32, force: bool) -> bool {
        if force || now_ms.wrapping_sub(self.last_ms) > self.period_ms {
            self.last_ms = now_ms;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_limits_to_one_refresh_per_period() {
        let mut g = RefreshGate::new(33);
        assert!(!g.ready(33, false));
        assert!(g.ready(34, false));
        assert!(!g.ready(50, false));
        assert!(!g.ready(67, false));
        assert!(g.ready(68, false));
    }

    #[test]
    fn forced_refresh_bypasses_and_restarts_gate() {
        let mut g = RefreshGate::new(33);
        assert!(g.ready(10, true));
        assert!(!g.ready(40, false));
        assert!(g.ready(44, false));
    }

    #[test]
    fn selector_shown_in_menu_or_without_selection() {
        let mut snap = DeviceSnapshot {
            ui_mode: UiMode::Playing,
            menu_index: 0,
            selected: None,
            muted: false,
            pitch: 0,
            frequency_hz: 350,
        };
        assert!(snap.shows_selector());
        snap.selected = Some(Waveform::Saw);
        assert!(!snap.shows_selector());
        snap.ui_mode = UiMode::Menu;
        assert!(snap.shows_selector());
    }
}
