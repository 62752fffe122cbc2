//! Hysteresis and lock-window gating for the potentiometer streams.
//!
//! Raw pot noise produces audible warble if applied directly, while plain
//! hysteresis makes slow deliberate turns feel sticky. Pitch therefore gets
//! a grace window: after any move larger than the hysteresis, small deltas
//! are tracked too until the window closes. Tone uses hysteresis only.

use super::config::ControlConfig;

/// Conditioning state for one potentiometer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PotChannel {
    /// Latest stable reading, applied or not.
    pub raw_value: u16,
    /// Value currently driving the output. Only changes when approved.
    pub last_applied: u16,
    /// Timestamp of the last move that exceeded the hysteresis.
    pub last_movement_ms: u32,
}

impl PotChannel {
    fn exceeds(&self, value: u16, hysteresis: u16) -> bool {
        value.abs_diff(self.last_applied) > hysteresis
    }
}

/// Update policy for the pitch and tone pots.
#[derive(Debug, Clone, Copy)]
pub struct SignalConditioner {
    pub pitch: PotChannel,
    pub tone: PotChannel,
    hysteresis: u16,
    lock_timeout_ms: u32,
}

impl SignalConditioner {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            pitch: PotChannel::default(),
            tone: PotChannel::default(),
            hysteresis: config.hysteresis,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }

    /// Adopt boot-time readings as the applied values.
    pub fn seed(&mut self, pitch: u16, tone: u16) {
        self.pitch.raw_value = pitch;
        self.pitch.last_applied = pitch;
        self.tone.raw_value = tone;
        self.tone.last_applied = tone;
    }

    /// Offer a new pitch reading. Returns `true` if it was applied.
    ///
    /// - delta above the hysteresis: applied, lock window restarted;
    /// - otherwise, while `now_ms - last_movement_ms < lock_timeout_ms`:
    ///   applied, window unchanged;
    /// - otherwise held.
    pub fn condition_pitch(&mut self, value: u16, now_ms: u32) -> bool {
        let channel = &mut self.pitch;
        channel.raw_value = value;

        if channel.exceeds(value, self.hysteresis) {
            channel.last_applied = value;
            channel.last_movement_ms = now_ms;
            return true;
        }

        if now_ms.wrapping_sub(channel.last_movement_ms) < self.lock_timeout_ms {
            channel.last_applied = value;
            return true;
        }

        false
    }

    /// Offer a new tone reading. Returns `true` if it was applied.
    pub fn condition_tone(&mut self, value: u16) -> bool {
        let channel = &mut self.tone;
        channel.raw_value = value;

        if channel.exceeds(value, self.hysteresis) {
            channel.last_applied = value;
            return true;
        }
        false
    }

    /// Applied pitch value.
    pub fn pitch(&self) -> u16 {
        self.pitch.last_applied
    }

    /// Applied tone value.
    pub fn tone(&self) -> u16 {
        self.tone.last_applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Conditioner seeded at 2000/2000 with the lock window long expired.
    fn settled() -> (SignalConditioner, u32) {
        let mut c = SignalConditioner::new(&ControlConfig::default());
        c.seed(2000, 2000);
        (c, 10_000)
    }

    // ── Pitch hysteresis ─────────────────────────────────────────────

    #[test]
    fn small_pitch_delta_outside_window_is_held() {
        let (mut c, now) = settled();
        assert!(!c.condition_pitch(2003, now));
        assert_eq!(c.pitch(), 2000);
        assert_eq!(c.pitch.raw_value, 2003);
    }

    #[test]
    fn delta_equal_to_hysteresis_is_held() {
        let (mut c, now) = settled();
        assert!(!c.condition_pitch(2004, now));
        assert!(!c.condition_pitch(1996, now));
        assert_eq!(c.pitch(), 2000);
    }

    #[test]
    fn large_pitch_delta_is_applied_immediately() {
        let (mut c, now) = settled();
        assert!(c.condition_pitch(2005, now));
        assert_eq!(c.pitch(), 2005);
        assert_eq!(c.pitch.last_movement_ms, now);
    }

    #[test]
    fn large_downward_delta_is_applied() {
        let (mut c, now) = settled();
        assert!(c.condition_pitch(1990, now));
        assert_eq!(c.pitch(), 1990);
    }

    // ── Pitch lock window ────────────────────────────────────────────

    #[test]
    fn small_deltas_track_inside_lock_window() {
        let (mut c, t) = settled();
        assert!(c.condition_pitch(2100, t));
        assert!(c.condition_pitch(2101, t + 100));
        assert!(c.condition_pitch(2099, t + 499));
        assert_eq!(c.pitch(), 2099);
    }

    #[test]
    fn small_delta_after_window_is_rejected() {
        let (mut c, t) = settled();
        assert!(c.condition_pitch(2100, t));
        assert!(!c.condition_pitch(2102, t + 501));
        assert_eq!(c.pitch(), 2100);
    }

    #[test]
    fn window_closes_at_exactly_lock_timeout() {
        let (mut c, t) = settled();
        assert!(c.condition_pitch(2100, t));
        assert!(!c.condition_pitch(2101, t + 500));
    }

    #[test]
    fn small_deltas_do_not_extend_window() {
        let (mut c, t) = settled();
        assert!(c.condition_pitch(2100, t));
        assert!(c.condition_pitch(2101, t + 400));
        assert!(!c.condition_pitch(2102, t + 600));
        assert_eq!(c.pitch.last_movement_ms, t);
    }

    #[test]
    fn large_move_restarts_window() {
        let (mut c, t) = settled();
        assert!(c.condition_pitch(2100, t));
        assert!(c.condition_pitch(2200, t + 450));
        assert!(c.condition_pitch(2201, t + 900));
    }

    // ── Tone ─────────────────────────────────────────────────────────

    #[test]
    fn tone_uses_hysteresis_only() {
        let (mut c, _) = settled();
        assert!(!c.condition_tone(2003));
        assert!(c.condition_tone(2005));
        // No grace window for tone.
        assert!(!c.condition_tone(2006));
        assert_eq!(c.tone(), 2005);
    }

    // ── Seeding ──────────────────────────────────────────────────────

    #[test]
    fn seed_sets_applied_values() {
        let mut c = SignalConditioner::new(&ControlConfig::default());
        c.seed(123, 456);
        assert_eq!(c.pitch(), 123);
        assert_eq!(c.tone(), 456);
    }
}
