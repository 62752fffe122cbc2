//! Averaged analog reads for the potentiometers.

use embedded_hal::delay::DelayNs;

use super::config::ControlConfig;

/// Potentiometer channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pot {
    /// Primary expressive control: frequency / noise bandwidth.
    Pitch,
    /// Secondary control: PWM duty.
    Tone,
}

/// Instantaneous analog read primitive.
///
/// Implementations return a raw 12-bit sample in `0..=4095`. Reads are
/// assumed to always succeed at the hardware level.
pub trait AnalogInput {
    fn read_raw(&mut self, pot: Pot) -> u16;
}

/// Take `config.sample_count` consecutive samples spaced
/// `config.sample_interval_us` apart and return their truncated mean.
///
/// Blocks the caller for roughly `sample_count * sample_interval_us`
/// (~320 µs with the defaults).
///
/// # Example
///
/// ```
/// use embedded_hal::delay::DelayNs;
/// use sonic_lab::control::{read_stable, AnalogInput, ControlConfig, Pot};
///
/// struct Fixed(u16);
/// impl AnalogInput for Fixed {
///     fn read_raw(&mut self, _pot: Pot) -> u16 { self.0 }
/// }
/// struct NoDelay;
/// impl DelayNs for NoDelay {
///     fn delay_ns(&mut self, _ns: u32) {}
/// }
///
/// let v = read_stable(&mut Fixed(1234), Pot::Pitch, &mut NoDelay, &ControlConfig::default());
/// assert_eq!(v, 1234);
/// ```
pub fn read_stable<A, D>(input: &mut A, pot: Pot, delay: &mut D, config: &ControlConfig) -> u16
where
    A: AnalogInput + ?Sized,
    D: DelayNs,
{
    let count = config.sample_count.max(1);
    let mut sum: u32 = 0;
    for _ in 0..count {
        sum += u32::from(input.read_raw(pot));
        delay.delay_us(config.sample_interval_us);
    }
    (sum / count) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed pattern of samples and counts reads.
    struct Pattern {
        samples: &'static [u16],
        reads: usize,
    }

    impl AnalogInput for Pattern {
        fn read_raw(&mut self, _pot: Pot) -> u16 {
            let v = self.samples[self.reads % self.samples.len()];
            self.reads += 1;
            v
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
        calls: usize,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
            self.calls += 1;
        }
    }

    #[test]
    fn averages_thirty_two_samples() {
        let mut adc = Pattern { samples: &[1000, 1004], reads: 0 };
        let mut delay = CountingDelay::default();
        let v = read_stable(&mut adc, Pot::Tone, &mut delay, &ControlConfig::default());
        assert_eq!(v, 1002);
        assert_eq!(adc.reads, 32);
    }

    #[test]
    fn mean_truncates() {
        // (0 + 0 + 0 + 3) / 4 = 0.75 → 0
        let mut adc = Pattern { samples: &[0, 0, 0, 3], reads: 0 };
        let config = ControlConfig {
            sample_count: 4,
            ..ControlConfig::default()
        };
        let v = read_stable(&mut adc, Pot::Pitch, &mut CountingDelay::default(), &config);
        assert_eq!(v, 0);
    }

    #[test]
    fn full_scale_does_not_overflow() {
        let mut adc = Pattern { samples: &[4095], reads: 0 };
        let v = read_stable(
            &mut adc,
            Pot::Pitch,
            &mut CountingDelay::default(),
            &ControlConfig::default(),
        );
        assert_eq!(v, 4095);
    }

    #[test]
    fn waits_between_every_sample() {
        let mut adc = Pattern { samples: &[7], reads: 0 };
        let mut delay = CountingDelay::default();
        read_stable(&mut adc, Pot::Pitch, &mut delay, &ControlConfig::default());
        assert_eq!(delay.calls, 32);
        assert_eq!(delay.total_ns, 32 * 10_000);
    }
}
