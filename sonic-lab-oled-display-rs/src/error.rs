//! Error types for the OLED display driver.

use display_interface::DisplayError;

/// Errors that can occur during OLED display operations.
///
/// Bus errors reach us already wrapped in [`DisplayError`] by `ssd1306`, so
/// this enum is non-generic.
#[derive(Debug)]
pub enum OledError {
    /// Display interface error (wraps I2C and other bus-level failures).
    Display(DisplayError),
    /// The panel did not acknowledge the initialisation sequence.
    InitializationFailed,
    /// An operation was attempted before [`OledDriver::init()`](crate::OledDriver::init)
    /// succeeded.
    NotInitialized,
}

impl From<DisplayError> for OledError {
    fn from(e: DisplayError) -> Self {
        OledError::Display(e)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for OledError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::Display(_e) => defmt::write!(f, "Display interface error"),
            OledError::InitializationFailed => defmt::write!(f, "Initialization failed"),
            OledError::NotInitialized => defmt::write!(f, "Not initialized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error_converts() {
        let e: OledError = DisplayError::BusWriteError.into();
        assert!(matches!(e, OledError::Display(DisplayError::BusWriteError)));
    }
}
