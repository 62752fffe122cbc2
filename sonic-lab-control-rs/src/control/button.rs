//! Short-press / long-press classification for the single push button.
//!
//! ```text
//!            press edge                     release (no long press)
//!   IDLE ───────────────► PRESSED ───────────────────────────────► IDLE   → Confirm
//!                            │  held > long_press_ms (once)
//!                            └─────────────────────────────────────────── → MuteToggle
//! ```
//!
//! A press that already fired [`ButtonEvent::MuteToggle`] releases
//! silently.

use super::config::ControlConfig;

/// Event produced by the disambiguator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Short press released: commit the highlighted menu item.
    Confirm,
    /// Long press: flip the mute flag.
    MuteToggle,
}

/// Audible acknowledgement played through the buzzer after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeedbackTone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl ButtonEvent {
    /// Confirmation tone for this event.
    pub fn feedback_tone(self) -> FeedbackTone {
        match self {
            ButtonEvent::Confirm => FeedbackTone {
                frequency_hz: 2000,
                duration_ms: 50,
            },
            ButtonEvent::MuteToggle => FeedbackTone {
                frequency_hz: 500,
                duration_ms: 100,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pressed {
        start_ms: u32,
        long_press_fired: bool,
    },
}

/// Two-state press classifier, polled once per loop iteration.
#[derive(Debug, Clone, Copy)]
pub struct InputDisambiguator {
    phase: Phase,
    settle_ms: u32,
    long_press_ms: u32,
}

impl InputDisambiguator {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            phase: Phase::Idle,
            settle_ms: config.button_settle_ms,
            long_press_ms: config.long_press_ms,
        }
    }

    /// `true` while a press is being tracked.
    pub fn is_pressed(&self) -> bool {
        matches!(self.phase, Phase::Pressed { .. })
    }

    /// Feed the current (debounced-by-time) button level.
    ///
    /// `pressed` is the logical level, already inverted for an active-low
    /// switch. Returns at most one event per call.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonEvent> {
        match (&mut self.phase, pressed) {
            (Phase::Idle, true) => {
                self.phase = Phase::Pressed {
                    start_ms: now_ms,
                    long_press_fired: false,
                };
                None
            }
            (Phase::Idle, false) => None,
            (
                Phase::Pressed {
                    start_ms,
                    long_press_fired,
                },
                true,
            ) => {
                if !*long_press_fired && now_ms.wrapping_sub(*start_ms) > self.long_press_ms {
                    *long_press_fired = true;
                    return Some(ButtonEvent::MuteToggle);
                }
                None
            }
            (
                Phase::Pressed {
                    start_ms,
                    long_press_fired,
                },
                false,
            ) => {
                // Contact bounce right after the press edge.
                if now_ms.wrapping_sub(*start_ms) < self.settle_ms {
                    return None;
                }
                let fired = *long_press_fired;
                self.phase = Phase::Idle;
                if fired {
                    None
                } else {
                    Some(ButtonEvent::Confirm)
                }
            }
        }
    }
}
