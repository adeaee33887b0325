//! Module: config
//!
//! Purpose: Fixed configuration for the recorder pipeline.
//!
//! Architecture:
//! - Compile-time constants size the static audio buffer (no growable storage)
//! - `RecorderConfig` bundles the tunables the controllers read at runtime
//! - Host tests build reduced configs (low sample rates) with small buffers
//!
//! Safety: Safe. Plain `Copy` data, no interior mutability.

/// Sampling rate in Hz.
pub const SAMPLE_RATE: u32 = 22_000;

/// Length of one capture session in seconds.
pub const DURATION_SECONDS: u32 = 2;

/// Audio buffer capacity in samples.
pub const CAPACITY: usize = (SAMPLE_RATE * DURATION_SECONDS) as usize;

/// PWM counter wrap (12-bit resolution).
pub const PWM_WRAP: u16 = 4095;

/// Half of the PWM range. Samples live in `[-HALF_SCALE, HALF_SCALE - 1]`.
pub const HALF_SCALE: i16 = (PWM_WRAP / 2) as i16;

/// Midpoint of the 12-bit ADC/PWM scale.
pub const DC_OFFSET: u16 = 2047;

/// Integer gain applied after DC removal.
pub const GAIN: i32 = 2;

/// High-pass coefficient used during capture.
pub const HPF_ALPHA: f32 = 0.95;

/// Low-pass coefficient used during playback.
pub const LPF_BETA: f32 = 0.85;

/// Raw ADC reads averaged per sample.
pub const OVERSAMPLE: u32 = 4;

/// Input poll period of the main loop.
pub const POLL_PERIOD_MS: u32 = 10;

/// Quiet time after an accepted button press.
pub const DEBOUNCE_MS: u32 = 500;

/// LEDC carrier frequency. 12-bit resolution at 80 MHz APB tops out near 19.5 kHz.
pub const PWM_FREQUENCY_HZ: u32 = 19_500;

/// Status display geometry (SSD1306 128x64).
pub const DISPLAY_WIDTH: usize = 128;
pub const DISPLAY_HEIGHT: usize = 64;

/// Runtime view of the recorder tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderConfig {
    /// Samples per second for both capture and playback
    pub sample_rate: u32,
    /// Capture session length limit
    pub duration_seconds: u32,
    /// Gain applied to the DC-centered reading
    pub gain: i32,
    /// High-pass coefficient (capture)
    pub hpf_alpha: f32,
    /// Low-pass coefficient (playback)
    pub lpf_beta: f32,
    /// Raw reads averaged into one sample
    pub oversample: u32,
    /// Main loop poll period
    pub poll_period_ms: u32,
    /// Delay after an accepted button press
    pub debounce_ms: u32,
}

impl RecorderConfig {
    /// Firmware defaults.
    pub const DEFAULT: Self = Self {
        sample_rate: SAMPLE_RATE,
        duration_seconds: DURATION_SECONDS,
        gain: GAIN,
        hpf_alpha: HPF_ALPHA,
        lpf_beta: LPF_BETA,
        oversample: OVERSAMPLE,
        poll_period_ms: POLL_PERIOD_MS,
        debounce_ms: DEBOUNCE_MS,
    };

    /// Same tunables at a different sample rate (host tests).
    pub const fn with_sample_rate(sample_rate: u32) -> Self {
        let mut config = Self::DEFAULT;
        config.sample_rate = sample_rate;
        config
    }

    /// Interval between samples: `1_000_000 / sample_rate` µs.
    #[inline]
    pub const fn sample_period_us(&self) -> u64 {
        1_000_000 / self.sample_rate as u64
    }

    /// Wall-time limit of a capture session.
    #[inline]
    pub const fn duration_us(&self) -> u64 {
        self.duration_seconds as u64 * 1_000_000
    }

    /// Samples a full-length session produces.
    #[inline]
    pub const fn capacity(&self) -> usize {
        (self.sample_rate * self.duration_seconds) as usize
    }

    /// Capture progress fires every tenth of the buffer.
    #[inline]
    pub const fn capture_progress_step(&self, capacity: usize) -> usize {
        let step = capacity / 10;
        if step == 0 { 1 } else { step }
    }

    /// Playback progress fires every tenth of a second of audio.
    #[inline]
    pub const fn playback_progress_step(&self) -> usize {
        let step = (self.sample_rate / 10) as usize;
        if step == 0 { 1 } else { step }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Global firmware configuration.
pub const CONFIG: RecorderConfig = RecorderConfig::DEFAULT;
