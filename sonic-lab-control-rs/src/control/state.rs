//! UI mode, waveform selection and mute flag.
//!
//! Every other component only produces events; [`DeviceState`] is the one
//! place they are applied.

use super::audio::map_range;
use super::config::ControlConfig;
use super::snapshot::DeviceSnapshot;
use super::ADC_MAX;

/// Number of selectable waveforms (and menu entries).
pub const WAVEFORM_COUNT: usize = 4;

/// Top-level UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiMode {
    /// Waveform selector is showing.
    Menu,
    /// Selected waveform is sounding (unless muted).
    Playing,
}

/// Selectable waveform, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    Square,
    Saw,
    Triangle,
    Noise,
}

impl Waveform {
    /// All waveforms in menu order.
    pub const ALL: [Waveform; WAVEFORM_COUNT] = [
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
        Waveform::Noise,
    ];

    /// Waveform at a menu position, `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Menu position of this waveform.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper-case display label.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Square => "SQUARE",
            Waveform::Saw => "SAW",
            Waveform::Triangle => "TRIANGLE",
            Waveform::Noise => "NOISE",
        }
    }
}

/// Device-wide UI state, owned by the control loop.
///
/// Boots into the selector, with nothing selected and muted, so the toy
/// never makes a sound before the user has asked for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    pub ui_mode: UiMode,
    /// Highlighted selector entry, always `< WAVEFORM_COUNT`.
    pub menu_index: usize,
    /// Committed waveform; `None` until the first confirm.
    pub selected: Option<Waveform>,
    pub muted: bool,
    pub last_interaction_ms: u32,
    menu_timeout_ms: u32,
}

impl DeviceState {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            ui_mode: UiMode::Menu,
            menu_index: 0,
            selected: None,
            muted: true,
            last_interaction_ms: 0,
            menu_timeout_ms: config.menu_timeout_ms,
        }
    }

    /// `true` when the bridge should drive the buzzer.
    pub fn is_audible(&self) -> bool {
        !self.muted && self.selected.is_some()
    }

    /// Encoder moved to `position`.
    ///
    /// Always returns the UI to the selector, even from `Playing`.
    pub fn on_encoder_moved(&mut self, position: i32, now_ms: u32) {
        self.menu_index = (position.unsigned_abs() % WAVEFORM_COUNT as u32) as usize;
        self.ui_mode = UiMode::Menu;
        self.last_interaction_ms = now_ms;
    }

    /// Short press: commit the highlighted waveform and start playing.
    pub fn on_confirm(&mut self) {
        self.selected = Waveform::from_index(self.menu_index);
        self.ui_mode = UiMode::Playing;
    }

    /// Long press: flip mute. The UI mode is left alone.
    pub fn on_mute_toggle(&mut self) {
        self.muted = !self.muted;
    }

    /// Auto-dismiss the selector after `menu_timeout_ms` of inactivity.
    ///
    /// Only happens once a waveform has been selected; with nothing to
    /// play the selector stays up. Returns `true` on transition.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        if self.ui_mode != UiMode::Menu || self.selected.is_none() {
            return false;
        }
        if now_ms.wrapping_sub(self.last_interaction_ms) > self.menu_timeout_ms {
            self.ui_mode = UiMode::Playing;
            return true;
        }
        false
    }

    /// `true` when the display should show the selector.
    pub fn shows_selector(&self) -> bool {
        self.ui_mode == UiMode::Menu || self.selected.is_none()
    }

    /// Freeze the state for the display renderer.
    ///
    /// The shown frequency is the nominal pitch mapping: 350–2000 Hz for the
    /// tonal waveforms, 350–5000 Hz for noise.
    pub fn snapshot(&self, pitch: u16, config: &ControlConfig) -> DeviceSnapshot {
        let top = match self.selected {
            Some(Waveform::Noise) => config.noise_max_ceiling_hz,
            _ => config.max_frequency_hz,
        };
        let frequency_hz = map_range(
            i32::from(pitch),
            0,
            i32::from(ADC_MAX),
            config.min_frequency_hz as i32,
            top as i32,
        );
        DeviceSnapshot {
            ui_mode: self.ui_mode,
            menu_index: self.menu_index,
            selected: self.selected,
            muted: self.muted,
            pitch,
            frequency_hz: frequency_hz.max(0) as u32,
        }
    }
}
