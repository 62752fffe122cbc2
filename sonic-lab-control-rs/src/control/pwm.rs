//! Divider/top arithmetic for driving a buzzer from a variable-frequency
//! PWM slice with an 8-bit duty scale.
//!
//! A PWM slice counts `0..=top` at `clock / divider`. Audio-range
//! frequencies need a `top` well above 255 at 150 MHz, so duty is kept on
//! an 8-bit scale and projected onto whatever `top` the frequency needs.

/// Largest integer clock divider of the slice.
const MAX_DIVIDER: u32 = 255;

/// Counter period and divider for one output frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTimings {
    /// Integer clock divider, `1..=255`.
    pub divider: u8,
    /// Counter wrap value; the period is `top + 1` ticks.
    pub top: u16,
}

impl PwmTimings {
    /// Pick the smallest divider that lets `top` fit in 16 bits.
    ///
    /// `frequency_hz` of 0 is treated as 1 Hz. Frequencies below what the
    /// slice can reach saturate at the longest period.
    ///
    /// ```
    /// use sonic_lab::control::PwmTimings;
    ///
    /// let t = PwmTimings::for_frequency(150_000_000, 2000);
    /// assert_eq!(t.divider, 2);
    /// assert_eq!(t.top, 37_499);
    /// ```
    pub fn for_frequency(clock_hz: u32, frequency_hz: u32) -> Self {
        let frequency = u64::from(frequency_hz.max(1));
        let clock = u64::from(clock_hz);
        let period_ticks = clock / frequency;

        let divider = period_ticks
            .div_ceil(u64::from(u16::MAX) + 1)
            .clamp(1, u64::from(MAX_DIVIDER));
        let top = (period_ticks / divider)
            .saturating_sub(1)
            .min(u64::from(u16::MAX));

        Self {
            divider: divider as u8,
            top: top as u16,
        }
    }

    /// Output frequency these timings actually produce.
    pub fn frequency_hz(&self, clock_hz: u32) -> u32 {
        clock_hz / (u32::from(self.divider) * (u32::from(self.top) + 1))
    }

    /// Compare value for an 8-bit duty: `duty / 256` of the period.
    pub fn compare_for_duty(&self, duty: u8) -> u16 {
        ((u32::from(duty) * (u32::from(self.top) + 1)) >> 8) as u16
    }
}
