//! Audio path: conditioning, filtering and sample storage
//!
//! Architecture:
//! - Capture: 4x oversampled ADC -> DC removal -> gain -> high-pass -> clip
//! - Storage: fixed-capacity buffer, filled once then replayed
//! - Playback: low-pass -> DC offset -> clip to PWM range

pub mod buffer;
pub mod conditioner;
pub mod filter;

pub use buffer::{AudioBuffer, RenderSnapshot};
pub use conditioner::{clip_sample, to_output_level, SampleConditioner};
pub use filter::{HighPass, LowPass};

/// Centered audio amplitude in `[-HALF_SCALE, HALF_SCALE - 1]`.
pub type Sample = i16;

/// Lowest valid sample value.
pub const SAMPLE_MIN: Sample = -crate::config::HALF_SCALE;

/// Highest valid sample value.
pub const SAMPLE_MAX: Sample = crate::config::HALF_SCALE - 1;
