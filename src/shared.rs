//! State visible to both execution contexts.
//!
//! The capture trigger and the main loop share exactly one object. Nothing
//! in it is locked: the session cell arbitrates who may touch the buffer,
//! everything else is atomic.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::audio::AudioBuffer;
use crate::fault::FaultState;
use crate::logging::LogStream;
use crate::session::{SessionCell, SessionState};

/// Session, buffer, faults and the RT log stream.
///
/// Lives in a `static` on the device; tests build it on the stack with a
/// small `N`.
///
/// Only the controller that won a session moves it back to `Idle`. A
/// cancelled playback stays `Playing` until its run has returned, so no
/// capture can clear the buffer under a playback that is still reading it.
pub struct Shared<const N: usize> {
    pub session: SessionCell,
    pub buffer: AudioBuffer<N>,
    pub fault: FaultState,
    pub log: LogStream,
    stop_playback: AtomicBool,
    /// Period the last capture was actually sampled at (µs), 0 if none
    capture_period_us: AtomicU32,
}

impl<const N: usize> Shared<N> {
    pub const fn new() -> Self {
        Self {
            session: SessionCell::new(),
            buffer: AudioBuffer::new(),
            fault: FaultState::new(),
            log: LogStream::new(),
            stop_playback: AtomicBool::new(false),
            capture_period_us: AtomicU32::new(0),
        }
    }

    /// Current session state
    #[inline]
    pub fn state(&self) -> SessionState {
        self.session.get()
    }

    /// Ask a running playback to stop.
    ///
    /// Playback notices before its next sample and goes through the normal
    /// completion path, which returns the session to `Idle`. Returns
    /// `false` if nothing was playing.
    #[inline]
    pub fn cancel_playback(&self) -> bool {
        if !self.session.is(SessionState::Playing) {
            return false;
        }
        self.stop_playback.store(true, Ordering::Release);
        true
    }

    /// A stop was requested for the current playback.
    #[inline]
    pub fn playback_stop_requested(&self) -> bool {
        self.stop_playback.load(Ordering::Acquire)
    }

    /// Forget any stop request (playback session start and end).
    #[inline]
    pub fn clear_playback_stop(&self) {
        self.stop_playback.store(false, Ordering::Release);
    }

    /// Record the sample period the capture trigger was armed with.
    #[inline]
    pub fn set_capture_period_us(&self, period_us: u64) {
        let period = u32::try_from(period_us).unwrap_or(u32::MAX);
        self.capture_period_us.store(period, Ordering::Release);
    }

    /// Sample period of the buffered recording, if one was captured.
    #[inline]
    pub fn capture_period_us(&self) -> Option<u64> {
        match self.capture_period_us.load(Ordering::Acquire) {
            0 => None,
            period => Some(period as u64),
        }
    }
}

impl<const N: usize> Default for Shared<N> {
    fn default() -> Self {
        Self::new()
    }
}
