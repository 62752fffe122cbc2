//! Interrupt-driven quadrature encoder position tracking.
//!
//! [`EncoderTracker`] is written from the edge handler and read from the
//! main loop. Both fields are single machine words stored with relaxed
//! atomics: there is one producer and one consumer, and the consumer only
//! asks "did it change since I last looked", so no lock is taken.

use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// Shared encoder position counter with timestamp debounce.
///
/// Designed to live in a `static` and be touched from interrupt context:
///
/// ```
/// use sonic_lab::control::EncoderTracker;
///
/// static ENCODER: EncoderTracker = EncoderTracker::new(10);
///
/// // Edge handler: CLK high, DT low → clockwise.
/// assert!(ENCODER.on_falling_edge(true, false, 100));
/// // Bounce 3 ms later is ignored.
/// assert!(!ENCODER.on_falling_edge(true, false, 103));
/// assert_eq!(ENCODER.position(), 1);
/// ```
pub struct EncoderTracker {
    /// Net accepted detents, positive = clockwise.
    position: AtomicI32,
    /// Timestamp (ms) of the last accepted edge.
    last_edge_ms: AtomicU32,
    /// Minimum spacing between accepted edges.
    debounce_ms: u32,
}

impl EncoderTracker {
    /// Create a tracker at position 0 with the given debounce window.
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            position: AtomicI32::new(0),
            last_edge_ms: AtomicU32::new(0),
            debounce_ms,
        }
    }

    /// Handle one falling edge of the DT line.
    ///
    /// `clk_high` and `dt_high` are the line levels sampled inside the
    /// handler. Differing levels step the position up, equal levels step it
    /// down. Edges arriving `debounce_ms` or less after the previously
    /// accepted edge are dropped.
    ///
    /// Returns `true` if the edge was accepted.
    pub fn on_falling_edge(&self, clk_high: bool, dt_high: bool, now_ms: u32) -> bool {
        let last = self.last_edge_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(last) <= self.debounce_ms {
            return false;
        }

        let step = if clk_high != dt_high { 1 } else { -1 };
        let position = self.position.load(Ordering::Relaxed);
        self.position
            .store(position.wrapping_add(step), Ordering::Relaxed);
        self.last_edge_ms.store(now_ms, Ordering::Relaxed);
        true
    }

    /// Current net position.
    pub fn position(&self) -> i32 {
        self.position.load(Ordering::Relaxed)
    }

    /// Timestamp of the last accepted edge.
    pub fn last_edge_ms(&self) -> u32 {
        self.last_edge_ms.load(Ordering::Relaxed)
    }
}

/// Main-loop side of the encoder: remembers the last position it saw.
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionWatcher {
    last_seen: i32,
}

impl PositionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(position)` if it differs from the last one seen.
    pub fn poll(&mut self, position: i32) -> Option<i32> {
        if position == self.last_seen {
            return None;
        }
        self.last_seen = position;
        Some(position)
    }
}
