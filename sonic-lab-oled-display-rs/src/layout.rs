//! Display layout types and rendering logic.
//!
//! This module defines [`DisplayConfig`], the [`Screen`] derived from a
//! [`DeviceSnapshot`], and the [`render_screen`] / [`render_splash`]
//! functions that draw a frame using `embedded-graphics`.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_6X10, FONT_9X15_BOLD},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, Polyline, PrimitiveStyle, Rectangle, Triangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use heapless::String;
use sonic_lab::control::{map_range, DeviceSnapshot, Waveform, ADC_MAX, WAVEFORM_COUNT};

// ── DisplayConfig ────────────────────────────────────────────────────────

/// Configuration for the display layout and update task.
///
/// All layout geometry lives here. [`DisplayConfig::default()`] reproduces
/// the stock 128×32 layout refreshed at 30 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Maximum refresh rate in Hz. Default: 30.
    pub update_frequency_hz: u32,

    // ── Layout geometry ──────────────────────────────────────────────
    /// Total display width in pixels. Default: 128.
    pub display_width: u32,
    /// Total display height in pixels. Default: 32.
    pub display_height: u32,
    /// Top of the large text line (selector item, mute banner). Default: 12.
    pub large_text_y: i32,
    /// Top-left corner of the waveform icon. Default: (2, 14).
    pub icon_origin: Point,
    /// Outline of the pitch bar. Default: 90×14 at (30, 14).
    pub bar_outline: Rectangle,
    /// Gap between the bar outline and its fill. Default: 2.
    pub bar_inset: u32,
    /// Fill width at full-scale pitch. Default: 86.
    pub bar_fill_max: u32,
    /// Row of the selector page dots. Default: 30.
    pub dots_y: i32,
    /// Horizontal pitch of the page dots. Default: 10.
    pub dot_spacing: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            update_frequency_hz: 30,
            display_width: 128,
            display_height: 32,
            large_text_y: 12,
            icon_origin: Point::new(2, 14),
            bar_outline: Rectangle::new(Point::new(30, 14), Size::new(90, 14)),
            bar_inset: 2,
            bar_fill_max: 86,
            dots_y: 30,
            dot_spacing: 10,
        }
    }
}

impl DisplayConfig {
    /// Convert the configured frequency to a timer period in milliseconds.
    pub fn update_period_ms(&self) -> u64 {
        1000 / self.update_frequency_hz.max(1) as u64
    }

    fn centre_x(&self) -> i32 {
        self.display_width as i32 / 2
    }
}

// ── Screen ───────────────────────────────────────────────────────────────

/// One of the three full-screen layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Inverted full-screen "MUTE" banner. Takes priority over everything.
    Muted,
    /// Waveform selector with the highlighted entry.
    Selector { menu_index: usize },
    /// Play screen: name, frequency readout, icon and pitch bar.
    Playing {
        waveform: Waveform,
        frequency_hz: u32,
        bar_width: u32,
    },
}

impl Screen {
    /// Pick the layout for a snapshot.
    ///
    /// ```
    /// use sonic_lab::control::{ControlConfig, DeviceState};
    /// use sonic_lab_oled_display_rs::{DisplayConfig, Screen};
    ///
    /// let config = ControlConfig::default();
    /// let snap = DeviceState::new(&config).snapshot(0, &config);
    /// // Boot state is muted.
    /// assert_eq!(Screen::from_snapshot(&snap, &DisplayConfig::default()), Screen::Muted);
    /// ```
    pub fn from_snapshot(snapshot: &DeviceSnapshot, config: &DisplayConfig) -> Self {
        if snapshot.muted {
            return Screen::Muted;
        }
        match snapshot.selected {
            Some(waveform) if !snapshot.shows_selector() => {
                let bar_width = map_range(
                    i32::from(snapshot.pitch),
                    0,
                    i32::from(ADC_MAX),
                    0,
                    config.bar_fill_max as i32,
                );
                Screen::Playing {
                    waveform,
                    frequency_hz: snapshot.frequency_hz,
                    bar_width: bar_width.clamp(0, config.bar_fill_max as i32) as u32,
                }
            }
            _ => Screen::Selector {
                menu_index: snapshot.menu_index,
            },
        }
    }
}

// ── Splash ───────────────────────────────────────────────────────────────

/// Boot splash, drawn in three cumulative steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SplashStage {
    /// Border only.
    Frame,
    /// Border and title.
    Title,
    /// Border, title and version line.
    Full,
}

impl SplashStage {
    pub const ALL: [SplashStage; 3] = [SplashStage::Frame, SplashStage::Title, SplashStage::Full];

    /// How long the stage stays up before the next one is drawn.
    pub fn hold_ms(self) -> u64 {
        match self {
            SplashStage::Frame => 200,
            SplashStage::Title => 500,
            SplashStage::Full => 1500,
        }
    }
}

pub const SPLASH_TITLE: &str = "SONIC LAB";
pub const SPLASH_SUBTITLE: &str = "v3.8 SafeMode";

// ── Rendering ────────────────────────────────────────────────────────────

fn small(color: BinaryColor) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(&FONT_6X10, color)
}

fn large(color: BinaryColor) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(&FONT_9X15_BOLD, color)
}

/// Draw `text` with its top edge at `position.y`.
fn draw_text<D>(
    display: &mut D,
    text: &str,
    position: Point,
    style: MonoTextStyle<'static, BinaryColor>,
    alignment: Alignment,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let text_style = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(text, position, style, text_style).draw(display)?;
    Ok(())
}

/// Render the boot splash up to `stage`.
pub fn render_splash<D>(display: &mut D, stage: SplashStage, config: &DisplayConfig) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(
        Point::zero(),
        Size::new(config.display_width, config.display_height),
    )
    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
    .draw(display)?;

    if stage == SplashStage::Frame {
        return Ok(());
    }
    draw_text(
        display,
        SPLASH_TITLE,
        Point::new(config.centre_x(), 5),
        large(BinaryColor::On),
        Alignment::Center,
    )?;

    if stage == SplashStage::Title {
        return Ok(());
    }
    draw_text(
        display,
        SPLASH_SUBTITLE,
        Point::new(config.centre_x(), 22),
        small(BinaryColor::On),
        Alignment::Center,
    )
}

/// Render a [`Screen`] into a cleared display buffer.
///
/// # Layout
///
/// ```text
/// Selector                               Playing
/// ┌──────────────────────────────┐       ┌──────────────────────────────┐
/// │        - SELECT MODE -       │       │SAW                    1200 Hz│
/// │ ◄       TRIANGLE          ►  │       │/|/|  ┌──────────────────────┐│
/// │          ·  ·  ▬  ·          │       │      │██████████            ││
/// └──────────────────────────────┘       └──────────────────────────────┘
/// ```
pub fn render_screen<D>(display: &mut D, screen: &Screen, config: &DisplayConfig) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match *screen {
        Screen::Muted => render_muted(display, config),
        Screen::Selector { menu_index } => render_selector(display, menu_index, config),
        Screen::Playing {
            waveform,
            frequency_hz,
            bar_width,
        } => render_playing(display, waveform, frequency_hz, bar_width, config),
    }
}

fn render_muted<D>(display: &mut D, config: &DisplayConfig) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(
        Point::zero(),
        Size::new(config.display_width, config.display_height),
    )
    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
    .draw(display)?;

    draw_text(
        display,
        "MUTE",
        Point::new(config.centre_x(), 9),
        large(BinaryColor::Off),
        Alignment::Center,
    )
}

fn render_selector<D>(display: &mut D, menu_index: usize, config: &DisplayConfig) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let centre = config.centre_x();
    let width = config.display_width as i32;
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);

    draw_text(
        display,
        "- SELECT MODE -",
        Point::new(centre, 0),
        small(BinaryColor::On),
        Alignment::Center,
    )?;

    let name = Waveform::from_index(menu_index).map_or("", Waveform::name);
    draw_text(
        display,
        name,
        Point::new(centre, config.large_text_y),
        large(BinaryColor::On),
        Alignment::Center,
    )?;

    // Scroll arrows.
    Triangle::new(Point::new(4, 20), Point::new(10, 14), Point::new(10, 26))
        .into_styled(fill)
        .draw(display)?;
    Triangle::new(
        Point::new(width - 4, 20),
        Point::new(width - 10, 14),
        Point::new(width - 10, 26),
    )
    .into_styled(fill)
    .draw(display)?;

    // Page dots: a dash for the highlighted entry, a single pixel otherwise.
    let start = centre - (WAVEFORM_COUNT as i32 * config.dot_spacing) / 2;
    for i in 0..WAVEFORM_COUNT {
        let x = start + i as i32 * config.dot_spacing;
        if i == menu_index {
            Rectangle::new(Point::new(x, config.dots_y), Size::new(6, 2))
                .into_styled(fill)
                .draw(display)?;
        } else {
            Pixel(Point::new(x + 2, config.dots_y), BinaryColor::On).draw(display)?;
        }
    }
    Ok(())
}

fn render_playing<D>(
    display: &mut D,
    waveform: Waveform,
    frequency_hz: u32,
    bar_width: u32,
    config: &DisplayConfig,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text(
        display,
        waveform.name(),
        Point::zero(),
        small(BinaryColor::On),
        Alignment::Left,
    )?;

    let mut buf: String<16> = String::new();
    let _ = write!(buf, "{} Hz", frequency_hz);
    draw_text(
        display,
        buf.as_str(),
        Point::new(config.display_width as i32, 0),
        small(BinaryColor::On),
        Alignment::Right,
    )?;

    draw_wave_icon(display, waveform, config.icon_origin)?;

    config
        .bar_outline
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)?;

    let inset = config.bar_inset;
    let fill_height = config.bar_outline.size.height.saturating_sub(2 * inset);
    if bar_width > 0 {
        Rectangle::new(
            config.bar_outline.top_left + Point::new(inset as i32, inset as i32),
            Size::new(bar_width.min(config.bar_fill_max), fill_height),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(display)?;
    }
    Ok(())
}

const SQUARE_ICON: [Point; 6] = [
    Point::new(0, 10),
    Point::new(5, 10),
    Point::new(5, 2),
    Point::new(15, 2),
    Point::new(15, 10),
    Point::new(20, 10),
];

const SAW_ICON: [Point; 5] = [
    Point::new(0, 10),
    Point::new(10, 2),
    Point::new(10, 10),
    Point::new(20, 2),
    Point::new(20, 10),
];

const TRIANGLE_ICON: [Point; 5] = [
    Point::new(0, 10),
    Point::new(5, 2),
    Point::new(10, 10),
    Point::new(15, 2),
    Point::new(20, 10),
];

/// 21 px wide line drawing of the waveform shape.
fn draw_wave_icon<D>(display: &mut D, waveform: Waveform, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    let outline: &[Point] = match waveform {
        Waveform::Square => &SQUARE_ICON,
        Waveform::Saw => &SAW_ICON,
        Waveform::Triangle => &TRIANGLE_ICON,
        Waveform::Noise => {
            // Fixed comb of vertical strokes.
            for i in (0..20).step_by(2) {
                let height = (i % 5) * 2 + 2;
                let offset = if i % 3 == 0 { 4 } else { 8 };
                Line::new(Point::new(i, offset), Point::new(i, offset + height))
                    .translate(origin)
                    .into_styled(stroke)
                    .draw(display)?;
            }
            return Ok(());
        }
    };

    Polyline::new(outline)
        .translate(origin)
        .into_styled(stroke)
        .draw(display)?;
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────
