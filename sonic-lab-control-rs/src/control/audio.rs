//! Translation of conditioned pot values into tone peripheral commands.
//!
//! The bridge keeps a small write-suppression cache ([`AudioOutputState`])
//! so the peripheral only hears about a frequency or duty when it actually
//! changes, or when a `force_update` is pending after a mute toggle,
//! confirm, or feedback tone.

use rand_core::RngCore;

use super::button::FeedbackTone;
use super::config::ControlConfig;
use super::state::Waveform;
use super::ADC_MAX;

/// Duty used for feedback beeps (50 % of the 8-bit range).
pub const FEEDBACK_DUTY: u8 = 128;

/// Tone generator seam: a PWM channel with independently settable
/// frequency and 8-bit duty.
///
/// Writes are assumed to always succeed. `set_duty(0)` is silence.
pub trait TonePeripheral {
    fn set_frequency(&mut self, frequency_hz: u32);
    fn set_duty(&mut self, duty: u8);
}

/// Last values written to the peripheral. `None` means "unknown", which
/// forces the next write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioOutputState {
    pub last_frequency_hz: Option<u32>,
    pub last_duty: Option<u8>,
}

/// Linear re-mapping with integer truncation toward zero.
///
/// `in_min == in_max` maps everything to `out_min`.
///
/// ```
/// use sonic_lab::control::map_range;
///
/// assert_eq!(map_range(0, 0, 4095, 350, 2000), 350);
/// assert_eq!(map_range(4095, 0, 4095, 350, 2000), 2000);
/// assert_eq!(map_range(2048, 0, 4095, 0, 127), 63);
/// ```
pub fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    let scaled = i64::from(x - in_min) * i64::from(out_max - out_min) / i64::from(in_max - in_min);
    scaled as i32 + out_min
}

/// Drives a [`TonePeripheral`] from pitch/tone values and the selected
/// waveform.
pub struct AudioBridge<T, R> {
    peripheral: T,
    rng: R,
    output: AudioOutputState,
    force_update: bool,
    config: ControlConfig,
}

impl<T, R> AudioBridge<T, R>
where
    T: TonePeripheral,
    R: RngCore,
{
    pub fn new(peripheral: T, rng: R, config: &ControlConfig) -> Self {
        Self {
            peripheral,
            rng,
            output: AudioOutputState::default(),
            force_update: false,
            config: *config,
        }
    }

    /// Write-suppression cache contents.
    pub fn output(&self) -> AudioOutputState {
        self.output
    }

    /// `true` if the next [`apply()`](Self::apply) will write unconditionally.
    pub fn force_pending(&self) -> bool {
        self.force_update
    }

    /// Make the next [`apply()`](Self::apply) write even unchanged values.
    pub fn request_force_update(&mut self) {
        self.force_update = true;
    }

    pub fn peripheral(&self) -> &T {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut T {
        &mut self.peripheral
    }

    /// Target frequency for the tonal waveforms, clamped to the floor.
    pub fn frequency_for(&self, pitch: u16) -> u32 {
        let f = map_range(
            i32::from(pitch),
            0,
            i32::from(ADC_MAX),
            self.config.min_frequency_hz as i32,
            self.config.max_frequency_hz as i32,
        );
        f.max(self.config.min_frequency_hz as i32) as u32
    }

    /// Target duty for the tonal waveforms.
    pub fn duty_for(&self, tone: u16) -> u8 {
        let d = map_range(
            i32::from(tone),
            0,
            i32::from(ADC_MAX),
            0,
            i32::from(self.config.max_duty),
        );
        d.clamp(0, i32::from(u8::MAX)) as u8
    }

    /// Upper bound of the noise frequency band, never below the floor.
    pub fn noise_ceiling(&self, pitch: u16) -> u32 {
        let floor = self.config.noise_floor_hz as i32;
        let c = map_range(
            i32::from(pitch),
            0,
            i32::from(ADC_MAX),
            floor,
            self.config.noise_max_ceiling_hz as i32,
        );
        c.max(floor) as u32
    }

    /// Apply conditioned values if anything changed or a force is pending.
    ///
    /// `changed` is the conditioner's verdict for this cycle. Returns `true`
    /// if the update ran (whether or not it ended up writing).
    pub fn apply(&mut self, waveform: Waveform, pitch: u16, tone: u16, changed: bool) -> bool {
        if !changed && !self.force_update {
            return false;
        }

        match waveform {
            Waveform::Noise => self.apply_noise(pitch),
            Waveform::Square | Waveform::Saw | Waveform::Triangle => {
                let frequency = self.frequency_for(pitch);
                let duty = self.duty_for(tone);
                self.write_frequency(frequency);
                self.write_duty(duty);
            }
        }

        self.force_update = false;
        true
    }

    /// Drop the output to duty 0, once.
    ///
    /// Repeated calls while already silent issue no writes.
    pub fn silence(&mut self) {
        if self.output.last_duty != Some(0) {
            self.peripheral.set_duty(0);
            self.output.last_duty = Some(0);
            #[cfg(feature = "defmt")]
            defmt::debug!("audio: silenced");
        }
    }

    /// Start a feedback beep. The caller waits `tone.duration_ms`, then
    /// calls [`end_feedback()`](Self::end_feedback).
    pub fn begin_feedback(&mut self, tone: FeedbackTone) {
        self.peripheral.set_frequency(tone.frequency_hz);
        self.peripheral.set_duty(FEEDBACK_DUTY);
    }

    /// Stop a feedback beep and invalidate the cached frequency so the next
    /// update restores the playing tone.
    pub fn end_feedback(&mut self) {
        self.peripheral.set_duty(0);
        self.output.last_duty = Some(0);
        self.output.last_frequency_hz = None;
        self.force_update = true;
    }

    // Noise: random duty in 0..=255 and random frequency in
    // floor..=ceiling, re-drawn every update.
    fn apply_noise(&mut self, pitch: u16) {
        let floor = self.config.noise_floor_hz;
        let ceiling = self.noise_ceiling(pitch);
        let duty = (self.rng.next_u32() & 0xFF) as u8;
        let span = ceiling - floor + 1;
        let frequency = floor + self.rng.next_u32() % span;

        self.peripheral.set_duty(duty);
        self.peripheral.set_frequency(frequency);
        self.output.last_duty = Some(duty);
        self.output.last_frequency_hz = Some(frequency);
    }

    fn write_frequency(&mut self, frequency: u32) {
        if self.force_update || self.output.last_frequency_hz != Some(frequency) {
            self.peripheral.set_frequency(frequency);
            self.output.last_frequency_hz = Some(frequency);
            #[cfg(feature = "defmt")]
            defmt::debug!("audio: frequency {} Hz", frequency);
        }
    }

    fn write_duty(&mut self, duty: u8) {
        if self.force_update || self.output.last_duty != Some(duty) {
            self.peripheral.set_duty(duty);
            self.output.last_duty = Some(duty);
            #[cfg(feature = "defmt")]
            defmt::debug!("audio: duty {}", duty);
        }
    }
}
