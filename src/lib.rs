//! # RustVoiceRecorder
//!
//! Single-channel microphone recorder with PWM playback.
//!
//! ## Architecture
//!
//! Two execution contexts share one [`Shared`] object:
//! - Periodic trigger: [`CaptureController::on_tick`] samples, conditions
//!   and stores one sample per period
//! - Main loop: [`InputLoop`] polls the buttons and runs
//!   [`PlaybackController::run_playback`] to completion
//!
//! At most one session runs at a time. The atomic [`SessionCell`] decides,
//! no mutex is involved. Hardware is reached through the capability traits
//! in [`hal`].

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate alloc;

pub mod audio;
pub mod capture;
pub mod config;
pub mod controller;
pub mod display;
pub mod fault;
pub mod hal;
pub mod logging;
pub mod playback;
pub mod session;
pub mod shared;

pub use audio::{AudioBuffer, RenderSnapshot, Sample, SampleConditioner};
pub use capture::{CaptureController, CaptureEnd};
pub use config::{RecorderConfig, CONFIG};
pub use controller::{CaptureControl, InputLoop, PlaybackControl, PollOutcome};
pub use display::{StatusLine, StatusPresenter};
pub use fault::{FaultCode, FaultState};
pub use hal::{AnalogInput, Clock, HalError, PeriodicTrigger, PulseOutput};
pub use playback::{PlaybackController, PlaybackReport};
pub use session::{SessionCell, SessionState};
pub use shared::Shared;
