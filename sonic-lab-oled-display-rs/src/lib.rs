//! Async OLED display driver and screens for the Sonic Lab SSD1306 (128×32).
//!
//! This crate provides [`OledDriver`], a wrapper around the [`ssd1306`]
//! crate in async buffered-graphics mode, the [`Screen`] layouts that turn
//! a [`DeviceSnapshot`] into pixels, and (with the `task` feature)
//! [`display_update_task`], which waits for snapshots published by the
//! control loop and flushes changed frames to the display.
//!
//! # Quick Start
//!
//! ```ignore
//! use sonic_lab_oled_display_rs::{display_update_task, DisplayConfig, OledDriver};
//!
//! // In your Embassy main (after a successful `oled.init()`):
//! spawner.spawn(oled_task(oled, &DISPLAY_SIGNAL, DisplayConfig::default())).unwrap();
//!
//! // Thin task wrapper (Embassy tasks cannot be generic):
//! #[embassy_executor::task]
//! async fn oled_task(
//!     driver: OledDriver<MyI2cType>,
//!     snapshots: &'static Signal<CriticalSectionRawMutex, DeviceSnapshot>,
//!     config: DisplayConfig,
//! ) {
//!     display_update_task(driver, snapshots, config).await;
//! }
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`].
//! - **`task`**: [`display_update_task`] (pulls in `embassy-sync` and
//!   `embassy-time`).
//!
//! [`DeviceSnapshot`]: sonic_lab::control::DeviceSnapshot

#![no_std]

#[cfg(feature = "task")]
pub mod display_task;
pub mod driver;
pub mod error;
pub mod layout;

// ── Re-exports for convenience ───────────────────────────────────────────

#[cfg(feature = "task")]
pub use display_task::display_update_task;
pub use driver::OledDriver;
pub use error::OledError;
pub use layout::{render_screen, render_splash, DisplayConfig, Screen, SplashStage};
