//! Fault bookkeeping for the recorder.
//!
//! Hardware failures never leave the recorder stuck: the session that hit
//! them ends through its normal completion path and the state goes back to
//! `Idle`. What is kept here is the evidence, so the main loop can log it
//! and the status line can show it.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::hal::HalError;

/// Fault codes indicating which capability failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// ADC read failed during a capture tick. Capture ended early.
    AnalogRead = 1,

    /// PWM level or enable write failed. Playback ended early.
    PulseOutput = 2,

    /// Button or LED pin access failed.
    Gpio = 3,

    /// Periodic trigger could not be armed or disarmed.
    Timer = 4,

    /// Status display bus error.
    Display = 5,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::AnalogRead,
            2 => FaultCode::PulseOutput,
            3 => FaultCode::Gpio,
            4 => FaultCode::Timer,
            5 => FaultCode::Display,
            _ => FaultCode::None,
        }
    }
}

impl From<HalError> for FaultCode {
    fn from(err: HalError) -> Self {
        match err {
            HalError::AnalogRead => FaultCode::AnalogRead,
            HalError::PulseOutput => FaultCode::PulseOutput,
            HalError::Gpio => FaultCode::Gpio,
            HalError::Timer => FaultCode::Timer,
            HalError::Display => FaultCode::Display,
        }
    }
}

/// Thread-safe fault state.
///
/// Written from either execution context, read by the main loop.
///
/// # Usage
///
/// ```ignore
/// if let Err(err) = adc.read() {
///     shared.fault.set(err.into(), buffer.len() as u32);
///     // end the session normally
/// }
///
/// // In main loop:
/// if shared.fault.count() != last_seen {
///     log::warn!("fault {:?}", shared.fault.snapshot());
/// }
/// ```
pub struct FaultState {
    /// True until acknowledged by the main loop.
    active: AtomicBool,

    /// Most recent fault code.
    code: AtomicU8,

    /// Context for the fault (sample index where it happened).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record a fault and bump the counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Record a capability error.
    #[inline]
    pub fn record(&self, err: HalError, data: u32) {
        self.set(err.into(), data);
    }

    /// Check if an unacknowledged fault exists.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Most recent fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Acknowledge the fault. The counter keeps its history.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Get a snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
