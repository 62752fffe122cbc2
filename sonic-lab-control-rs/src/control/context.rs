//! The owned state of the control loop and one iteration of it.

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use super::audio::{AudioBridge, TonePeripheral};
use super::button::{ButtonEvent, InputDisambiguator};
use super::conditioner::SignalConditioner;
use super::config::ControlConfig;
use super::encoder::PositionWatcher;
use super::sampler::{read_stable, AnalogInput, Pot};
use super::snapshot::{DeviceSnapshot, RefreshGate};
use super::state::DeviceState;

/// Board-side inputs polled by [`DeviceContext::run_cycle()`].
pub trait ControlInputs: AnalogInput {
    /// Monotonic milliseconds since boot (wrapping).
    fn now_ms(&mut self) -> u32;
    /// Logical button level, `true` while held.
    fn button_pressed(&mut self) -> bool;
    /// Current encoder position as published by the edge handler.
    fn encoder_position(&mut self) -> i32;
}

/// What one cycle produced for the outside world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Button event handled this cycle, if any.
    pub event: Option<ButtonEvent>,
    /// Snapshot to hand to the display, when a refresh is due.
    pub display: Option<DeviceSnapshot>,
    /// `true` if the audio bridge ran an update this cycle.
    pub audio_updated: bool,
}

/// Every piece of main-loop state, in one place.
///
/// Only the encoder counter lives outside (it is shared with interrupt
/// context); the context sees it through [`ControlInputs::encoder_position()`].
pub struct DeviceContext<T, R> {
    config: ControlConfig,
    state: DeviceState,
    button: InputDisambiguator,
    encoder: PositionWatcher,
    conditioner: SignalConditioner,
    audio: AudioBridge<T, R>,
    display_gate: RefreshGate,
}

impl<T, R> DeviceContext<T, R>
where
    T: TonePeripheral,
    R: RngCore,
{
    pub fn new(config: ControlConfig, tone: T, rng: R) -> Self {
        Self {
            state: DeviceState::new(&config),
            button: InputDisambiguator::new(&config),
            encoder: PositionWatcher::new(),
            conditioner: SignalConditioner::new(&config),
            audio: AudioBridge::new(tone, rng, &config),
            display_gate: RefreshGate::new(config.display_period_ms),
            config,
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn conditioner(&self) -> &SignalConditioner {
        &self.conditioner
    }

    pub fn audio(&self) -> &AudioBridge<T, R> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioBridge<T, R> {
        &mut self.audio
    }

    /// Current display snapshot.
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.state.snapshot(self.conditioner.pitch(), &self.config)
    }

    /// Boot step: adopt the current pot positions and silence the output.
    ///
    /// After this the peripheral's first command has been duty 0, before
    /// any tone has been requested.
    pub fn begin<I, D>(&mut self, inputs: &mut I, delay: &mut D) -> DeviceSnapshot
    where
        I: ControlInputs,
        D: DelayNs,
    {
        let pitch = read_stable(inputs, Pot::Pitch, delay, &self.config);
        let tone = read_stable(inputs, Pot::Tone, delay, &self.config);
        self.conditioner.seed(pitch, tone);
        self.audio.silence();

        #[cfg(feature = "defmt")]
        defmt::info!("control: seeded pitch={} tone={}", pitch, tone);

        self.snapshot()
    }

    /// Run one loop iteration.
    ///
    /// Order: button → encoder → menu timeout → display gate → audio.
    /// Feedback tones block on `delay` for their duration, as does the pot
    /// sampling.
    pub fn run_cycle<I, D>(&mut self, inputs: &mut I, delay: &mut D) -> CycleReport
    where
        I: ControlInputs,
        D: DelayNs,
    {
        let mut report = CycleReport::default();

        // ── A. Button ────────────────────────────────────────────────
        let pressed = inputs.button_pressed();
        let now = inputs.now_ms();
        let event = self.button.update(pressed, now);
        if let Some(event) = event {
            self.handle_button(event, delay);
        }
        report.event = event;

        // ── B. UI ────────────────────────────────────────────────────
        let position = inputs.encoder_position();
        let now = inputs.now_ms();
        if let Some(position) = self.encoder.poll(position) {
            self.state.on_encoder_moved(position, now);
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "encoder: position={} menu_index={}",
                position,
                self.state.menu_index
            );
        }

        if self.state.tick(now) {
            #[cfg(feature = "defmt")]
            defmt::debug!("menu: timed out, playing");
        }

        if self.display_gate.ready(now, event.is_some()) {
            report.display = Some(self.snapshot());
        }

        // ── C. Audio ─────────────────────────────────────────────────
        match self.state.selected {
            Some(waveform) if !self.state.muted => {
                let pitch = read_stable(inputs, Pot::Pitch, delay, &self.config);
                let tone = read_stable(inputs, Pot::Tone, delay, &self.config);
                let now = inputs.now_ms();

                let pitch_changed = self.conditioner.condition_pitch(pitch, now);
                let tone_changed = self.conditioner.condition_tone(tone);

                report.audio_updated = self.audio.apply(
                    waveform,
                    self.conditioner.pitch(),
                    self.conditioner.tone(),
                    pitch_changed || tone_changed,
                );
            }
            _ => self.audio.silence(),
        }

        report
    }

    fn handle_button<D: DelayNs>(&mut self, event: ButtonEvent, delay: &mut D) {
        match event {
            ButtonEvent::MuteToggle => {
                self.state.on_mute_toggle();
                #[cfg(feature = "defmt")]
                defmt::info!("button: mute {}", self.state.muted);
            }
            ButtonEvent::Confirm => {
                self.state.on_confirm();
                #[cfg(feature = "defmt")]
                defmt::info!("button: selected {}", self.state.selected);
            }
        }

        let tone = event.feedback_tone();
        self.audio.begin_feedback(tone);
        delay.delay_ms(tone.duration_ms);
        self.audio.end_feedback();
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::super::audio::test_support::{Command, RecordingTone, XorShift};
    use super::super::state::{UiMode, Waveform};
    use super::*;

    // ── Fakes ────────────────────────────────────────────────────────

    /// Millisecond clock shared by the fake board and the fake delay.
    #[derive(Default)]
    struct Clock {
        ns: Cell<u64>,
    }

    impl Clock {
        fn ms(&self) -> u32 {
            (self.ns.get() / 1_000_000) as u32
        }

        fn advance_ms(&self, ms: u32) {
            self.ns.set(self.ns.get() + u64::from(ms) * 1_000_000);
        }
    }

    struct FakeDelay<'a> {
        clock: &'a Clock,
    }

    impl DelayNs for FakeDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.clock.ns.set(self.clock.ns.get() + u64::from(ns));
        }
    }

    struct FakeBoard<'a> {
        clock: &'a Clock,
        button: bool,
        position: i32,
        pitch: u16,
        tone: u16,
    }

    impl AnalogInput for FakeBoard<'_> {
        fn read_raw(&mut self, pot: Pot) -> u16 {
            match pot {
                Pot::Pitch => self.pitch,
                Pot::Tone => self.tone,
            }
        }
    }

    impl ControlInputs for FakeBoard<'_> {
        fn now_ms(&mut self) -> u32 {
            self.clock.ms()
        }

        fn button_pressed(&mut self) -> bool {
            self.button
        }

        fn encoder_position(&mut self) -> i32 {
            self.position
        }
    }

    type Ctx = DeviceContext<RecordingTone, XorShift>;

    fn context() -> Ctx {
        DeviceContext::new(ControlConfig::default(), RecordingTone::default(), XorShift(7))
    }

    fn board(clock: &Clock) -> FakeBoard<'_> {
        FakeBoard {
            clock,
            button: false,
            position: 0,
            pitch: 2000,
            tone: 2000,
        }
    }

    /// Run cycles for `ms` milliseconds of fake time, one cycle per ms.
    fn run_for(ctx: &mut Ctx, b: &mut FakeBoard<'_>, delay: &mut FakeDelay<'_>, ms: u32) {
        let end = b.clock.ms() + ms;
        while b.clock.ms() < end {
            ctx.run_cycle(b, delay);
            b.clock.advance_ms(1);
        }
    }

    /// Short press: hold 100 ms then release.
    fn click(ctx: &mut Ctx, b: &mut FakeBoard<'_>, delay: &mut FakeDelay<'_>) {
        b.button = true;
        run_for(ctx, b, delay, 100);
        b.button = false;
        run_for(ctx, b, delay, 1);
    }

    /// Long press: hold 1 s then release.
    fn long_press(ctx: &mut Ctx, b: &mut FakeBoard<'_>, delay: &mut FakeDelay<'_>) {
        b.button = true;
        run_for(ctx, b, delay, 1000);
        b.button = false;
        run_for(ctx, b, delay, 1);
    }

    fn commands(ctx: &Ctx) -> &[Command] {
        ctx.audio().peripheral().commands.as_slice()
    }

    // ── Boot ─────────────────────────────────────────────────────────

    #[test]
    fn boot_silences_before_any_tone() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();

        ctx.begin(&mut b, &mut delay);
        assert_eq!(commands(&ctx), &[Command::Duty(0)]);
        assert!(ctx.state().muted);
        assert_eq!(ctx.state().selected, None);

        run_for(&mut ctx, &mut b, &mut delay, 50);
        // Still muted and unselected: no further writes at all.
        assert_eq!(commands(&ctx), &[Command::Duty(0)]);
    }

    #[test]
    fn first_command_is_silence_even_without_begin() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();

        run_for(&mut ctx, &mut b, &mut delay, 5);
        assert_eq!(commands(&ctx).first(), Some(&Command::Duty(0)));
        assert_eq!(commands(&ctx).len(), 1);
    }

    #[test]
    fn begin_seeds_conditioner() {
        let clock = Clock::default();
        let mut b = board(&clock);
        b.pitch = 1234;
        b.tone = 42;
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();

        let snap = ctx.begin(&mut b, &mut delay);
        assert_eq!(ctx.conditioner().pitch(), 1234);
        assert_eq!(ctx.conditioner().tone(), 42);
        assert_eq!(snap.pitch, 1234);
    }

    // ── Selection and playing ────────────────────────────────────────

    #[test]
    fn confirm_selects_plays_feedback_and_refreshes() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        b.position = 2;
        run_for(&mut ctx, &mut b, &mut delay, 10);
        assert_eq!(ctx.state().menu_index, 2);

        b.button = true;
        run_for(&mut ctx, &mut b, &mut delay, 100);
        b.button = false;
        let before = clock.ms();
        let report = ctx.run_cycle(&mut b, &mut delay);

        assert_eq!(report.event, Some(ButtonEvent::Confirm));
        assert!(report.display.is_some());
        assert_eq!(ctx.state().selected, Some(Waveform::Triangle));
        assert_eq!(ctx.state().ui_mode, UiMode::Playing);
        // Blocked for the 50 ms confirm beep.
        assert!(clock.ms() - before >= 50);
        assert!(commands(&ctx).contains(&Command::Frequency(2000)));
        // Still muted, so the tone was not started after the beep.
        assert_eq!(commands(&ctx).last(), Some(&Command::Duty(0)));
    }

    #[test]
    fn unmute_then_play_writes_mapped_tone() {
        let clock = Clock::default();
        let mut b = board(&clock);
        b.pitch = 4095;
        b.tone = 4095;
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        click(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);
        assert!(!ctx.state().muted);

        let out = ctx.audio().output();
        assert_eq!(out.last_frequency_hz, Some(2000));
        assert_eq!(out.last_duty, Some(127));
    }

    #[test]
    fn steady_pots_cause_no_peripheral_churn() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);
        click(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);

        let before = commands(&ctx).len();
        run_for(&mut ctx, &mut b, &mut delay, 2000);
        assert_eq!(commands(&ctx).len(), before);
    }

    #[test]
    fn pitch_jitter_is_held_after_lock_window() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);
        click(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);
        run_for(&mut ctx, &mut b, &mut delay, 1000);

        b.pitch = 2003;
        run_for(&mut ctx, &mut b, &mut delay, 5);
        assert_eq!(ctx.conditioner().pitch(), 2000);

        b.pitch = 2100;
        run_for(&mut ctx, &mut b, &mut delay, 5);
        assert_eq!(ctx.conditioner().pitch(), 2100);
    }

    // ── Mute ─────────────────────────────────────────────────────────

    #[test]
    fn long_press_toggles_mute_without_confirm() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        b.button = true;
        let mut events = 0;
        let end = clock.ms() + 1000;
        while clock.ms() < end {
            let r = ctx.run_cycle(&mut b, &mut delay);
            if let Some(e) = r.event {
                assert_eq!(e, ButtonEvent::MuteToggle);
                events += 1;
            }
            clock.advance_ms(1);
        }
        b.button = false;
        let r = ctx.run_cycle(&mut b, &mut delay);
        assert_eq!(r.event, None);
        assert_eq!(events, 1);
        assert!(!ctx.state().muted);
        assert_eq!(ctx.state().selected, None);
        assert!(commands(&ctx).contains(&Command::Frequency(500)));
    }

    #[test]
    fn muting_while_playing_silences_once() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);
        click(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);
        assert!(ctx.state().muted);

        let before = commands(&ctx).len();
        run_for(&mut ctx, &mut b, &mut delay, 500);
        assert_eq!(commands(&ctx).len(), before);
        assert_eq!(ctx.audio().output().last_duty, Some(0));
    }

    // ── Encoder / menu ───────────────────────────────────────────────

    #[test]
    fn encoder_move_while_playing_reverts_to_menu() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);
        click(&mut ctx, &mut b, &mut delay);
        assert_eq!(ctx.state().ui_mode, UiMode::Playing);

        b.position = -5;
        ctx.run_cycle(&mut b, &mut delay);
        assert_eq!(ctx.state().ui_mode, UiMode::Menu);
        assert_eq!(ctx.state().menu_index, 1);
    }

    #[test]
    fn menu_times_out_back_to_playing() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);
        click(&mut ctx, &mut b, &mut delay);

        b.position = 1;
        ctx.run_cycle(&mut b, &mut delay);
        assert_eq!(ctx.state().ui_mode, UiMode::Menu);

        clock.advance_ms(10_001);
        ctx.run_cycle(&mut b, &mut delay);
        assert_eq!(ctx.state().ui_mode, UiMode::Playing);
        // Timeout does not change the committed waveform.
        assert_eq!(ctx.state().selected, Some(Waveform::Square));
    }

    #[test]
    fn menu_without_selection_never_times_out() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        b.position = 3;
        ctx.run_cycle(&mut b, &mut delay);
        clock.advance_ms(30_000);
        ctx.run_cycle(&mut b, &mut delay);
        assert_eq!(ctx.state().ui_mode, UiMode::Menu);
        assert!(ctx.snapshot().shows_selector());
    }

    // ── Display gate ─────────────────────────────────────────────────

    #[test]
    fn display_refresh_is_rate_limited() {
        let clock = Clock::default();
        let mut b = board(&clock);
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        let mut refreshes = 0;
        let end = clock.ms() + 1000;
        while clock.ms() < end {
            if ctx.run_cycle(&mut b, &mut delay).display.is_some() {
                refreshes += 1;
            }
            clock.advance_ms(1);
        }
        assert!(refreshes <= 30, "{} refreshes in one second", refreshes);
        assert!(refreshes >= 25);
    }

    // ── Noise ────────────────────────────────────────────────────────

    #[test]
    fn noise_mode_stays_in_band() {
        let clock = Clock::default();
        let mut b = board(&clock);
        b.pitch = 0;
        let mut delay = FakeDelay { clock: &clock };
        let mut ctx = context();
        ctx.begin(&mut b, &mut delay);

        b.position = 3;
        run_for(&mut ctx, &mut b, &mut delay, 5);
        click(&mut ctx, &mut b, &mut delay);
        long_press(&mut ctx, &mut b, &mut delay);
        assert_eq!(ctx.state().selected, Some(Waveform::Noise));

        // Sweep the pitch pot so every cycle updates.
        for step in 0..50u16 {
            b.pitch = step * 80;
            run_for(&mut ctx, &mut b, &mut delay, 1);
            if let Some(f) = ctx.audio().output().last_frequency_hz {
                let ceiling = ctx.audio().noise_ceiling(ctx.conditioner().pitch());
                assert!((600..=ceiling).contains(&f));
            }
        }
    }
}
