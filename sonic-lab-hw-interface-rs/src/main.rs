//! sonic-lab-hw-interface
//!
//! Firmware for the Sonic Lab sound toy on the Raspberry Pi Pico 2. Wires the
//! control and display library crates to the board:
//!
//! 1. The encoder DT line falls. A task on a high-priority interrupt
//!    executor samples CLK and counts the detent in the shared
//!    [`EncoderTracker`].
//! 2. The control task runs [`DeviceContext::run_cycle`] in a tight loop:
//!    button, encoder, menu timeout, display gate, then the buzzer.
//! 3. Whenever the display gate opens, the snapshot is published on
//!    [`DISPLAY_SIGNAL`] and the OLED task redraws it.
//!
//! # Pin assignments
//!
//! | Signal       | Pin         | Notes                     |
//! |--------------|-------------|---------------------------|
//! | I2C0 SDA     | GP4         | SSD1306 128×32 at 0x3C    |
//! | I2C0 SCL     | GP5         |                           |
//! | Encoder CLK  | GP6         | input                     |
//! | Encoder DT   | GP7         | falling-edge source       |
//! | Button SW    | GP15        | pull-up, active low       |
//! | Pitch pot    | GP26 / ADC0 |                           |
//! | Tone pot     | GP27 / ADC1 |                           |
//! | Buzzer       | GP16        | PWM slice 0, channel A    |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::adc::{self, Adc};
use embassy_rp::block::ImageDef;
use embassy_rp::clocks::{clk_sys_freq, RoscRng};
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::bind_interrupts;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

use sonic_lab::control::{
    AnalogInput, ControlConfig, ControlInputs, DeviceContext, DeviceSnapshot, EncoderTracker, Pot,
    PwmTimings, TonePeripheral,
};
use sonic_lab_oled_display_rs::driver::DEFAULT_ADDRESS;
use sonic_lab_oled_display_rs::{
    display_update_task, render_splash, DisplayConfig, OledDriver, SplashStage,
};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

/// Runs the encoder task above thread mode so edges preempt the control loop.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Encoder position, written by `encoder_task`, read by the control loop.
static ENCODER: EncoderTracker = EncoderTracker::new(ControlConfig::DEFAULT.encoder_debounce_ms);

/// Latest snapshot for the OLED task. Newer snapshots overwrite older ones.
static DISPLAY_SIGNAL: Signal<CriticalSectionRawMutex, DeviceSnapshot> = Signal::new();

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

type OledI2c = I2c<'static, I2C0, i2c::Async>;

// ---------------------------------------------------------------------------
// Board adapters
// ---------------------------------------------------------------------------

/// Buzzer on one PWM channel: frequency picks divider and `top`, the 8-bit
/// duty is projected onto `top`.
struct PwmBuzzer {
    pwm: Pwm<'static>,
    config: pwm::Config,
    timings: PwmTimings,
    duty: u8,
}

impl PwmBuzzer {
    fn new(pwm: Pwm<'static>, config: pwm::Config) -> Self {
        Self {
            pwm,
            timings: PwmTimings {
                divider: 1,
                top: config.top,
            },
            config,
            duty: 0,
        }
    }

    fn apply(&mut self) {
        self.config.divider = self.timings.divider.into();
        self.config.top = self.timings.top;
        self.config.compare_a = self.timings.compare_for_duty(self.duty);
        self.pwm.set_config(&self.config);
    }
}

impl TonePeripheral for PwmBuzzer {
    fn set_frequency(&mut self, frequency_hz: u32) {
        self.timings = PwmTimings::for_frequency(clk_sys_freq(), frequency_hz);
        self.apply();
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty = duty;
        self.apply();
    }
}

/// Pots, button and clock as seen by the control loop.
struct Board {
    adc: Adc<'static, adc::Blocking>,
    pitch: adc::Channel<'static>,
    tone: adc::Channel<'static>,
    button: Input<'static>,
    /// Last good reading per pot; returned if a conversion fails.
    last: [u16; 2],
}

impl AnalogInput for Board {
    fn read_raw(&mut self, pot: Pot) -> u16 {
        let (channel, slot) = match pot {
            Pot::Pitch => (&mut self.pitch, 0),
            Pot::Tone => (&mut self.tone, 1),
        };
        match self.adc.blocking_read(channel) {
            Ok(value) => {
                self.last[slot] = value;
                value
            }
            Err(_) => self.last[slot],
        }
    }
}

impl ControlInputs for Board {
    fn now_ms(&mut self) -> u32 {
        Instant::now().as_millis() as u32
    }

    fn button_pressed(&mut self) -> bool {
        self.button.is_low()
    }

    fn encoder_position(&mut self) -> i32 {
        ENCODER.position()
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `display_update_task` so it can
/// be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn oled_task(driver: OledDriver<OledI2c>, config: DisplayConfig) {
    display_update_task(driver, &DISPLAY_SIGNAL, config).await;
}

/// Falling edges on DT, counted with the CLK level at the edge.
#[embassy_executor::task]
async fn encoder_task(clk: Input<'static>, mut dt: Input<'static>) {
    info!("Encoder task started");
    loop {
        dt.wait_for_falling_edge().await;
        let now = Instant::now().as_millis() as u32;
        ENCODER.on_falling_edge(clk.is_high(), dt.is_high(), now);
    }
}

/// Main control loop. Blocking waits (pot sampling, feedback beeps) use a
/// busy-wait delay, as in the rest of the loop; `yield_now` lets the
/// display task run between cycles.
#[embassy_executor::task]
async fn control_task(mut ctx: DeviceContext<PwmBuzzer, RoscRng>, mut board: Board) {
    let mut delay = Delay;

    let snapshot = ctx.begin(&mut board, &mut delay);
    DISPLAY_SIGNAL.signal(snapshot);
    info!("--- SYSTEM READY ---");

    loop {
        let report = ctx.run_cycle(&mut board, &mut delay);
        if let Some(snapshot) = report.display {
            DISPLAY_SIGNAL.signal(snapshot);
        }
        yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("sonic-lab-hw-interface starting");

    // Let the supply settle before talking to the display.
    Timer::after_millis(100).await;

    // ── Display ───────────────────────────────────────────────────────────────

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_5, // SCL
        p.PIN_4, // SDA
        Irqs,
        i2c::Config::default(),
    );
    let mut oled = OledDriver::new(i2c, DEFAULT_ADDRESS);
    let display_config = DisplayConfig::default();

    // No display, no toy: halt here rather than run blind.
    if let Err(e) = oled.init().await {
        error!("OLED init failed: {}", e);
        loop {
            cortex_m::asm::wfi();
        }
    }
    info!("OLED initialised");

    for stage in SplashStage::ALL {
        oled.clear_buffer();
        if let Some(display) = oled.display_mut() {
            if render_splash(display, stage, &display_config).is_err() {
                warn!("Splash render failed");
            }
        }
        if let Err(e) = oled.flush().await {
            warn!("Splash flush failed: {}", e);
        }
        Timer::after_millis(stage.hold_ms()).await;
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    let button = Input::new(p.PIN_15, Pull::Up);
    let clk = Input::new(p.PIN_6, Pull::None);
    let dt = Input::new(p.PIN_7, Pull::None);

    let board = Board {
        adc: Adc::new_blocking(p.ADC, adc::Config::default()),
        pitch: adc::Channel::new_pin(p.PIN_26, Pull::None),
        tone: adc::Channel::new_pin(p.PIN_27, Pull::None),
        button,
        last: [0; 2],
    };

    // ── Buzzer ────────────────────────────────────────────────────────────────

    // Start silent: compare 0 until the control loop asks for a tone.
    let mut pwm_config = pwm::Config::default();
    pwm_config.compare_a = 0;
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config.clone());
    let buzzer = PwmBuzzer::new(pwm, pwm_config);

    let ctx = DeviceContext::new(ControlConfig::default(), buzzer, RoscRng);

    // ── Spawn tasks ───────────────────────────────────────────────────────────

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner_high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(spawner_high.spawn(encoder_task(clk, dt)));

    unwrap!(spawner.spawn(oled_task(oled, display_config)));
    unwrap!(spawner.spawn(control_task(ctx, board)));

    info!("All tasks spawned");
}
