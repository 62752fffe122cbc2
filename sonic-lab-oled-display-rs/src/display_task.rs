//! Display update task.
//!
//! [`display_update_task`] sleeps on a [`Signal`] fed by the control loop,
//! turns each [`DeviceSnapshot`] into a [`Screen`], and flushes the frame
//! only when the screen actually changed.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal_async::i2c::I2c;
use sonic_lab::control::DeviceSnapshot;

use crate::driver::OledDriver;
use crate::layout::{render_screen, DisplayConfig, Screen};

// ── Display update task ──────────────────────────────────────────────────

/// Snapshot-driven display loop.
///
/// This is a regular `async fn`, **not** an Embassy `#[task]`. Callers wrap
/// it in a thin concrete task since Embassy tasks cannot be generic:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn oled_task(
///     driver: OledDriver<MyConcreteI2cType>,
///     snapshots: &'static Signal<CriticalSectionRawMutex, DeviceSnapshot>,
///     config: DisplayConfig,
/// ) {
///     display_update_task(driver, snapshots, config).await;
/// }
/// ```
///
/// The driver must already be initialised; a failed `init()` is fatal and
/// handled by the caller before this task is spawned.
///
/// # Control flow
///
/// 1. Wait for the next snapshot. Only the newest one is kept by the
///    signal, so a slow flush never builds a backlog.
/// 2. Build the [`Screen`] and skip it if it matches the previous frame.
/// 3. Clear, render, flush.
/// 4. Hold off until one refresh period has passed since the last flush.
///
/// Render and flush failures are logged and the next snapshot is awaited.
#[allow(clippy::needless_pass_by_value)] // config is small and consumed
pub async fn display_update_task<I2C>(
    mut driver: OledDriver<I2C>,
    snapshots: &'static Signal<CriticalSectionRawMutex, DeviceSnapshot>,
    config: DisplayConfig,
) where
    I2C: I2c,
{
    #[cfg(feature = "defmt")]
    defmt::info!("Display task started");

    let period = Duration::from_millis(config.update_period_ms());
    let mut last_screen: Option<Screen> = None;

    loop {
        let snapshot = snapshots.wait().await;
        let screen = Screen::from_snapshot(&snapshot, &config);

        if last_screen == Some(screen) {
            continue;
        }

        driver.clear_buffer();
        let Some(display) = driver.display_mut() else {
            #[cfg(feature = "defmt")]
            defmt::error!("Display not initialised");
            return;
        };
        if render_screen(display, &screen, &config).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Render failed");
            continue;
        }

        let flushed_at = Instant::now();
        if let Err(_e) = driver.flush().await {
            #[cfg(feature = "defmt")]
            defmt::warn!("Flush failed: {}", _e);
            continue;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Display: {}", screen);

        last_screen = Some(screen);
        Timer::at(flushed_at + period).await;
    }
}
