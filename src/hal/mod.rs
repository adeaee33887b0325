//! Hardware Abstraction Layer for RustVoiceRecorder.
//!
//! Capability traits the pipeline calls. Business logic stays in the core
//! modules and only sees these seams; ESP-IDF bindings live in [`esp`].
//!
//! Buttons and LEDs use `embedded_hal::digital` directly, debounce waits use
//! `embedded_hal::delay::DelayNs`.

pub mod ssd1306;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use ssd1306::{Ssd1306, Ssd1306Error, SSD1306_ADDR};

/// Capability failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HalError {
    /// ADC conversion failed
    #[error("analog read failed")]
    AnalogRead,
    /// PWM duty or enable write failed
    #[error("pulse output write failed")]
    PulseOutput,
    /// Button or LED pin access failed
    #[error("gpio access failed")]
    Gpio,
    /// Periodic trigger could not be armed or cancelled
    #[error("periodic trigger error")]
    Timer,
    /// Display bus error
    #[error("display bus error")]
    Display,
}

impl HalError {
    /// Short code for the status line
    pub fn code(&self) -> &'static str {
        match self {
            Self::AnalogRead => "E01",
            Self::PulseOutput => "E02",
            Self::Gpio => "E03",
            Self::Timer => "E04",
            Self::Display => "E05",
        }
    }
}

/// Single-channel ADC.
///
/// No buffering: every call converts once, the caller oversamples.
pub trait AnalogInput {
    /// One 12-bit conversion in `[0, 4095]`.
    fn read(&mut self) -> Result<u16, HalError>;
}

/// PWM audio output with `WRAP = 4095`.
pub trait PulseOutput {
    /// Set the duty level in `[0, WRAP]`.
    fn set_level(&mut self, level: u16) -> Result<(), HalError>;

    /// Start or stop the PWM. Disabled means the pin is driven low.
    fn enable(&mut self, on: bool) -> Result<(), HalError>;
}

/// Recurring callback source driving the capture tick.
///
/// Fixed-rate: each firing is scheduled from the previous firing, not from
/// when the callback finished. The callback itself is bound when the
/// concrete trigger is built.
pub trait PeriodicTrigger {
    /// Start firing every `period_us` microseconds.
    ///
    /// Returns the period actually scheduled, which is longer when the
    /// timer cannot go as fast as asked.
    fn arm(&mut self, period_us: u64) -> Result<u64, HalError>;

    /// Stop firing. Calling it on a stopped trigger is fine.
    fn disarm(&mut self) -> Result<(), HalError>;
}

/// Monotonic microsecond clock.
pub trait Clock {
    fn now_us(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// GPIO assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Microphone, ADC1 channel
    pub mic_pin: i32,
    /// PWM audio out
    pub pwm_pin: i32,
    /// Record button (active low)
    pub button_record: i32,
    /// Play button (active low)
    pub button_play: i32,
    /// Recording indicator
    pub led_record: i32,
    /// Playback indicator
    pub led_play: i32,
    pub i2c_sda: i32,
    pub i2c_scl: i32,
}

impl Default for PinConfig {
    #[cfg(not(feature = "esp32p4"))]
    fn default() -> Self {
        Self {
            mic_pin: 1,
            pwm_pin: 10,
            button_record: 5,
            button_play: 6,
            led_record: 13,
            led_play: 11,
            i2c_sda: 14,
            i2c_scl: 15,
        }
    }

    #[cfg(feature = "esp32p4")]
    fn default() -> Self {
        Self {
            mic_pin: 16,
            pwm_pin: 10,
            button_record: 5,
            button_play: 6,
            led_record: 13,
            led_play: 11,
            i2c_sda: 7,
            i2c_scl: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(feature = "esp32p4"))]
    fn test_esp32s3_pin_map() {
        let pins = PinConfig::default();
        assert_eq!(pins.mic_pin, 1);
        assert_eq!((pins.i2c_sda, pins.i2c_scl), (14, 15));
    }

    #[test]
    #[cfg(feature = "esp32p4")]
    fn test_esp32p4_pin_map() {
        let pins = PinConfig::default();
        assert_eq!(pins.mic_pin, 16);
        assert_eq!((pins.i2c_sda, pins.i2c_scl), (7, 8));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            HalError::AnalogRead.code(),
            HalError::PulseOutput.code(),
            HalError::Gpio.code(),
            HalError::Timer.code(),
            HalError::Display.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(codes[i + 1..].iter().all(|b| a != b));
        }
    }
}
