//! Session state shared by the capture trigger and the main loop.
//!
//! Atomic state cell: `Idle`, `Recording` or `Playing`. Transitions are
//! compare-exchange, so the "am I idle?" check and the state change are a
//! single step and two contexts can never both start a session.

use core::sync::atomic::{AtomicU8, Ordering};

/// Top-level recorder state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing running, buttons accepted
    Idle = 0,
    /// Capture trigger armed, buffer being filled
    Recording = 1,
    /// Main loop draining the buffer to the PWM output
    Playing = 2,
}

impl SessionState {
    /// Convert from u8
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Recording,
            2 => Self::Playing,
            _ => Self::Idle,
        }
    }

    /// Short label for status lines and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing => "playing",
        }
    }
}

impl From<u8> for SessionState {
    fn from(v: u8) -> Self {
        Self::from_u8(v)
    }
}

impl From<SessionState> for u8 {
    fn from(s: SessionState) -> Self {
        s as u8
    }
}

/// Thread-safe session state
pub struct SessionCell {
    state: AtomicU8,
}

impl SessionCell {
    /// Create new cell (starts at Idle)
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
        }
    }

    /// Get current state
    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Check for a specific state
    #[inline]
    pub fn is(&self, state: SessionState) -> bool {
        self.get() == state
    }

    /// Move `Idle -> target`.
    ///
    /// Returns `false` (and changes nothing) when any session is already
    /// active. Requesting `Idle` is rejected.
    #[inline]
    pub fn try_begin(&self, target: SessionState) -> bool {
        if target == SessionState::Idle {
            return false;
        }
        self.state
            .compare_exchange(
                SessionState::Idle as u8,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move `current -> Idle`.
    ///
    /// Returns `false` when the state was not `current`. Only the
    /// controller that won the session calls this.
    #[inline]
    pub fn finish(&self, current: SessionState) -> bool {
        self.state
            .compare_exchange(
                current as u8,
                SessionState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let cell = SessionCell::new();
        assert_eq!(cell.get(), SessionState::Idle);
    }

    #[test]
    fn test_sessions_are_exclusive() {
        let cell = SessionCell::new();
        assert!(cell.try_begin(SessionState::Recording));
        assert!(!cell.try_begin(SessionState::Playing));
        assert!(!cell.try_begin(SessionState::Recording));
        assert_eq!(cell.get(), SessionState::Recording);

        assert!(!cell.finish(SessionState::Playing));
        assert!(cell.finish(SessionState::Recording));
        assert!(cell.try_begin(SessionState::Playing));
    }

    #[test]
    fn test_begin_idle_rejected() {
        let cell = SessionCell::new();
        assert!(!cell.try_begin(SessionState::Idle));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(SessionState::Idle.as_str(), "idle");
        assert_eq!(SessionState::Recording.as_str(), "recording");
        assert_eq!(SessionState::Playing.as_str(), "playing");
    }

    #[test]
    fn test_unknown_raw_value_maps_to_idle() {
        assert_eq!(SessionState::from_u8(7), SessionState::Idle);
        assert_eq!(u8::from(SessionState::Playing), 2);
    }
}
