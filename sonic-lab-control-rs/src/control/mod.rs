//! Real-time control loop for a single-board sound toy.
//!
//! This module fuses four asynchronous input sources into one coherent
//! [`DeviceState`] and drives a PWM tone peripheral from it:
//!
//! - a quadrature **encoder** whose falling edges are counted from
//!   interrupt context ([`EncoderTracker`]),
//! - a **push button** classified into short and long presses
//!   ([`InputDisambiguator`]),
//! - two noisy **potentiometers** averaged ([`read_stable`]) and gated by
//!   hysteresis and a lock window ([`SignalConditioner`]),
//! - a rate-limited **display** refresh ([`RefreshGate`]).
//!
//! # Data flow
//!
//! ```text
//! encoder ISR ──► EncoderTracker ──► PositionWatcher ─┐
//! button pin ───► InputDisambiguator ─────────────────┼─► DeviceState ──► DeviceSnapshot ──► display
//! pot pins ─────► read_stable ──► SignalConditioner ──┴─► AudioBridge ──► TonePeripheral
//! ```
//!
//! [`DeviceContext`] owns every piece of main-loop state and runs one
//! iteration per [`DeviceContext::run_cycle()`] call. Only the
//! [`EncoderTracker`] is shared with interrupt context.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. Hardware is reached through small traits
//! ([`AnalogInput`], [`ControlInputs`], [`TonePeripheral`]) plus
//! [`embedded_hal::delay::DelayNs`] and [`rand_core::RngCore`], so the
//! whole loop runs on the host under test with fake peripherals. The
//! optional `defmt` feature enables structured logging.

mod audio;
mod button;
mod conditioner;
mod config;
mod context;
mod encoder;
mod pwm;
mod sampler;
mod snapshot;
mod state;

pub use audio::{map_range, AudioBridge, AudioOutputState, TonePeripheral, FEEDBACK_DUTY};
pub use button::{ButtonEvent, FeedbackTone, InputDisambiguator};
pub use conditioner::{PotChannel, SignalConditioner};
pub use config::ControlConfig;
pub use context::{ControlInputs, CycleReport, DeviceContext};
pub use encoder::{EncoderTracker, PositionWatcher};
pub use pwm::PwmTimings;
pub use sampler::{read_stable, AnalogInput, Pot};
pub use snapshot::{DeviceSnapshot, RefreshGate};
pub use state::{DeviceState, UiMode, Waveform, WAVEFORM_COUNT};

/// Full-scale value of the 12-bit potentiometer ADC readings.
pub const ADC_MAX: u16 = 4095;
