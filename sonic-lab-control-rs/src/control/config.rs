/// Timing windows and mapping ranges for the control loop.
///
/// Every numeric policy of the loop lives here so that tests and board
/// revisions can tune them without touching library source.
/// [`ControlConfig::default()`] reproduces the shipped firmware values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    // ── Encoder ──────────────────────────────────────────────────────
    /// Minimum spacing between accepted encoder edges. Default: 10 ms.
    pub encoder_debounce_ms: u32,

    // ── Button ───────────────────────────────────────────────────────
    /// Releases seen this soon after the press edge are contact bounce.
    /// Default: 5 ms.
    pub button_settle_ms: u32,
    /// A press held longer than this fires a mute toggle. Default: 800 ms.
    pub long_press_ms: u32,

    // ── Potentiometers ───────────────────────────────────────────────
    /// Raw samples averaged per stable reading. Default: 32.
    pub sample_count: u32,
    /// Delay between raw samples. Default: 10 µs.
    pub sample_interval_us: u32,
    /// Minimum change (exclusive) accepted outside the lock window. Default: 4.
    pub hysteresis: u16,
    /// Grace window after an accepted pitch move. Default: 500 ms.
    pub lock_timeout_ms: u32,

    // ── UI ───────────────────────────────────────────────────────────
    /// Idle time after which the selector dismisses itself. Default: 10 s.
    pub menu_timeout_ms: u32,
    /// Minimum spacing between display refreshes. Default: 33 ms (~30 Hz).
    pub display_period_ms: u32,

    // ── Audio mapping ────────────────────────────────────────────────
    /// Frequency at pitch 0 for the tonal waveforms. Default: 350 Hz.
    pub min_frequency_hz: u32,
    /// Frequency at full-scale pitch for the tonal waveforms. Default: 2000 Hz.
    pub max_frequency_hz: u32,
    /// Lowest frequency of the noise burst. Default: 600 Hz.
    pub noise_floor_hz: u32,
    /// Noise ceiling at full-scale pitch. Default: 5000 Hz.
    pub noise_max_ceiling_hz: u32,
    /// Duty at full-scale tone. Default: 127 (half of the 8-bit range).
    pub max_duty: u8,
}

impl ControlConfig {
    /// Shipped firmware values, usable in `const`/`static` initialisers.
    pub const DEFAULT: Self = Self {
        encoder_debounce_ms: 10,
        button_settle_ms: 5,
        long_press_ms: 800,
        sample_count: 32,
        sample_interval_us: 10,
        hysteresis: 4,
        lock_timeout_ms: 500,
        menu_timeout_ms: 10_000,
        display_period_ms: 33,
        min_frequency_hz: 350,
        max_frequency_hz: 2000,
        noise_floor_hz: 600,
        noise_max_ceiling_hz: 5000,
        max_duty: 127,
    };
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
