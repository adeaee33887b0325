//! Top-level input loop.
//!
//! # State machine
//!
//! ```text
//!            record button               play button (buffer non-empty)
//!   Idle ─────────────────▶ Recording   Idle ─────────────────▶ Playing
//!    ▲                          │         ▲                         │
//!    └──── time up / full ──────┘         └── done / cancelled ─────┘
//! ```
//!
//! Requests in any other state are ignored. While `Playing` the loop calls
//! the whole playback run synchronously and does not poll the buttons.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::config::RecorderConfig;
use crate::hal::HalError;
use crate::logging::forward_to_log;
use crate::playback::PlaybackReport;
use crate::session::SessionState;
use crate::shared::Shared;

/// Main-loop side of capture.
///
/// Implemented by the capture controller, and on the device by the handle
/// that locks it.
pub trait CaptureControl {
    /// Start a session; `false` if the request was ignored.
    fn start_capture(&mut self) -> bool;
}

/// Main-loop side of playback.
pub trait PlaybackControl {
    /// Request a session; `false` if the request was ignored.
    fn start_playback(&mut self) -> bool;

    /// Run a requested session to completion.
    fn run_playback(&mut self) -> Option<PlaybackReport>;
}

impl<C: CaptureControl + ?Sized> CaptureControl for &mut C {
    fn start_capture(&mut self) -> bool {
        (**self).start_capture()
    }
}

impl<P: PlaybackControl + ?Sized> PlaybackControl for &mut P {
    fn start_playback(&mut self) -> bool {
        (**self).start_playback()
    }

    fn run_playback(&mut self) -> Option<PlaybackReport> {
        (**self).run_playback()
    }
}

/// What one poll iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Record button was down
    pub record_pressed: bool,
    /// Capture session started
    pub capture_started: bool,
    /// Play button was down
    pub play_pressed: bool,
    /// Playback session requested
    pub playback_started: bool,
    /// Playback run performed in this iteration
    pub playback: Option<PlaybackReport>,
}

/// Polls the two buttons and arbitrates record/play requests.
///
/// Buttons are active low.
pub struct InputLoop<'a, const N: usize, C, PB, BR, BP, D> {
    shared: &'a Shared<N>,
    config: RecorderConfig,
    capture: C,
    playback: PB,
    record_button: BR,
    play_button: BP,
    delay: D,
    faults_seen: u32,
}

impl<'a, const N: usize, C, PB, BR, BP, D> InputLoop<'a, N, C, PB, BR, BP, D>
where
    C: CaptureControl,
    PB: PlaybackControl,
    BR: InputPin,
    BP: InputPin,
    D: DelayNs,
{
    pub fn new(
        shared: &'a Shared<N>,
        config: RecorderConfig,
        capture: C,
        playback: PB,
        record_button: BR,
        play_button: BP,
        delay: D,
    ) -> Self {
        Self {
            shared,
            config,
            capture,
            playback,
            record_button,
            play_button,
            delay,
            faults_seen: 0,
        }
    }

    /// Current top-level state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// One loop iteration: buttons, playback, log drain, poll delay.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        if Self::pressed(self.shared, &mut self.record_button) {
            let state = self.shared.state();
            outcome.record_pressed = true;
            outcome.capture_started = self.capture.start_capture();
            log::debug!(
                "record button while {}: accepted={}",
                state.as_str(),
                outcome.capture_started
            );
            self.delay.delay_ms(self.config.debounce_ms);
        }

        if Self::pressed(self.shared, &mut self.play_button) {
            let state = self.shared.state();
            outcome.play_pressed = true;
            outcome.playback_started = self.playback.start_playback();
            log::debug!(
                "play button while {}: accepted={}",
                state.as_str(),
                outcome.playback_started
            );
            self.delay.delay_ms(self.config.debounce_ms);
        }

        if self.shared.state() == SessionState::Playing {
            outcome.playback = self.playback.run_playback();
        }

        forward_to_log(&self.shared.log);
        self.report_faults();

        self.delay.delay_ms(self.config.poll_period_ms);
        outcome
    }

    /// Poll forever.
    pub fn run(&mut self) -> ! {
        log::info!("input loop running");
        loop {
            self.poll();
        }
    }

    /// Active-low read. A failed read counts as "not pressed".
    fn pressed(shared: &Shared<N>, pin: &mut impl InputPin) -> bool {
        match pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                shared.fault.record(HalError::Gpio, 0);
                false
            }
        }
    }

    fn report_faults(&mut self) {
        let snapshot = self.shared.fault.snapshot();
        if snapshot.count != self.faults_seen {
            log::warn!(
                "fault {:?} (data {}), {} since boot",
                snapshot.code,
                snapshot.data,
                snapshot.count
            );
            self.faults_seen = snapshot.count;
            self.shared.fault.clear();
        }
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    pub fn playback_mut(&mut self) -> &mut PB {
        &mut self.playback
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn record_button_mut(&mut self) -> &mut BR {
        &mut self.record_button
    }

    pub fn play_button_mut(&mut self) -> &mut BP {
        &mut self.play_button
    }
}
