//! Per-sample conditioning between the ADC and the buffer
//!
//! Order is fixed: DC removal, integer gain, high-pass, truncate, clip.

use super::filter::HighPass;
use super::{Sample, SAMPLE_MAX, SAMPLE_MIN};
use crate::config::{RecorderConfig, DC_OFFSET, PWM_WRAP};

/// Turns an oversampled ADC average into a centered sample.
///
/// Deterministic for a given filter state and input sequence, no
/// allocation, constant time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConditioner {
    gain: i32,
    hpf: HighPass,
}

impl SampleConditioner {
    /// # Arguments
    /// * `gain` - Integer gain after DC removal (2 in firmware)
    /// * `alpha` - High-pass coefficient (0.95 in firmware)
    pub const fn new(gain: i32, alpha: f32) -> Self {
        Self {
            gain,
            hpf: HighPass::new(alpha),
        }
    }

    pub const fn from_config(config: &RecorderConfig) -> Self {
        Self::new(config.gain, config.hpf_alpha)
    }

    /// Condition one raw average in `[0, 4095]`.
    #[inline]
    pub fn condition(&mut self, raw_avg: u16) -> Sample {
        let centered = raw_avg as i32 - DC_OFFSET as i32;
        let gained = centered * self.gain;
        clip_sample(self.hpf.process(gained))
    }

    /// Zero the filter history (capture session start).
    #[inline]
    pub fn reset(&mut self) {
        self.hpf.reset();
    }

    #[inline]
    pub fn filter(&self) -> &HighPass {
        &self.hpf
    }
}

/// Truncate toward zero and clip to `[-HALF_SCALE, HALF_SCALE - 1]`.
#[inline]
pub fn clip_sample(value: f32) -> Sample {
    // `as` saturates, so huge or NaN values land in range too
    (value as i32).clamp(SAMPLE_MIN as i32, SAMPLE_MAX as i32) as Sample
}

/// Re-bias a filtered playback value into the PWM range `[0, WRAP]`.
#[inline]
pub fn to_output_level(value: f32) -> u16 {
    ((value + DC_OFFSET as f32) as i32).clamp(0, PWM_WRAP as i32) as u16
}
