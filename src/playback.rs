//! Playback controller: drains the buffer to the PWM output.
//!
//! Runs to completion inside the main loop. Sample spacing is self-paced
//! by busy-waiting on the clock; no trigger is involved and drift is not
//! corrected. Spacing is the period the recording was captured at, which
//! is the configured one unless the capture trigger had to slow down.

use core::hint::spin_loop;

use embedded_hal::digital::OutputPin;

use crate::audio::{to_output_level, LowPass};
use crate::config::{RecorderConfig, DC_OFFSET};
use crate::controller::PlaybackControl;
use crate::display::{StatusLine, StatusPresenter, LINE_DETAIL, LINE_STATE};
use crate::hal::{Clock, HalError, PulseOutput};
use crate::session::SessionState;
use crate::shared::Shared;

/// Outcome of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Samples written to the output
    pub emitted: usize,
    /// Samples that were available
    pub total: usize,
    /// Stopped early by [`Shared::cancel_playback`]
    pub cancelled: bool,
    /// Output failure that ended the session
    pub fault: Option<HalError>,
}

impl PlaybackReport {
    /// Every captured sample was emitted
    pub fn is_complete(&self) -> bool {
        self.emitted == self.total && self.fault.is_none()
    }
}

/// Playback controller
///
/// Owns the PWM output and the playback LED.
pub struct PlaybackController<'a, const N: usize, O, L, K, P> {
    shared: &'a Shared<N>,
    config: RecorderConfig,
    output: O,
    led: L,
    clock: K,
    presenter: P,
    lpf: LowPass,
}

impl<'a, const N: usize, O, L, K, P> PlaybackController<'a, N, O, L, K, P>
where
    O: PulseOutput,
    L: OutputPin,
    K: Clock,
    P: StatusPresenter,
{
    pub fn new(
        shared: &'a Shared<N>,
        config: RecorderConfig,
        output: O,
        led: L,
        clock: K,
        presenter: P,
    ) -> Self {
        Self {
            shared,
            lpf: LowPass::new(config.lpf_beta),
            config,
            output,
            led,
            clock,
            presenter,
        }
    }

    /// Request playback.
    ///
    /// No-op (returns `false`) when a session is active or nothing has been
    /// captured yet.
    pub fn start_playback(&mut self) -> bool {
        if self.shared.buffer.is_empty() {
            return false;
        }
        if !self.shared.session.try_begin(SessionState::Playing) {
            return false;
        }
        self.shared.clear_playback_stop();
        log::info!("playback requested: {} samples", self.shared.buffer.len());
        true
    }

    /// Play the captured samples. Blocks until done or cancelled.
    ///
    /// Returns `None` when no playback was requested. Whatever ends the
    /// session, the output is returned to the DC level, then disabled, and
    /// the state goes back to `Idle`.
    pub fn run_playback(&mut self) -> Option<PlaybackReport> {
        if !self.shared.session.is(SessionState::Playing) {
            return None;
        }

        let total = self.shared.buffer.len();
        let period_us = self
            .shared
            .capture_period_us()
            .unwrap_or(self.config.sample_period_us());
        let step = self.config.playback_progress_step();

        self.lpf.reset();
        let mut fault = self.enable_output().err();
        self.set_led(true);
        self.presenter.show_text(LINE_STATE, "Playing...");
        log::info!("playback start: {} samples at {} us", total, period_us);

        let mut emitted = 0;
        let mut last_us = self.clock.now_us();
        while fault.is_none() && emitted < total && !self.shared.playback_stop_requested() {
            while self.clock.now_us().wrapping_sub(last_us) < period_us {
                spin_loop();
            }
            last_us = self.clock.now_us();

            let Some(sample) = self.shared.buffer.get(emitted) else {
                break;
            };
            let level = to_output_level(self.lpf.process(sample as f32));
            if let Err(err) = self.output.set_level(level) {
                fault = Some(err);
                break;
            }
            emitted += 1;

            if emitted % step == 0 {
                self.report_progress(emitted, total);
            }
        }

        if let Some(err) = fault {
            self.shared.fault.record(err, emitted as u32);
            log::warn!("playback aborted after {} samples: {}", emitted, err);
        }
        let cancelled = fault.is_none() && emitted < total;

        self.silence();
        self.set_led(false);

        let line = StatusLine::format(format_args!("{}/{} samples", emitted, total));
        match fault {
            Some(err) => {
                let label = StatusLine::format(format_args!("Error {}", err.code()));
                self.presenter.show_text(LINE_STATE, label.as_str());
            }
            None if cancelled => self.presenter.show_text(LINE_STATE, "Stopped"),
            None => self.presenter.show_text(LINE_STATE, "Playback done"),
        }
        self.presenter.show_text(LINE_DETAIL, line.as_str());

        // Last buffer access is above; only now may a capture start
        self.shared.clear_playback_stop();
        self.shared.session.finish(SessionState::Playing);
        log::info!("playback end: {} of {} samples, cancelled={}", emitted, total, cancelled);

        Some(PlaybackReport {
            emitted,
            total,
            cancelled,
            fault,
        })
    }

    fn enable_output(&mut self) -> Result<(), HalError> {
        self.output.set_level(DC_OFFSET)?;
        self.output.enable(true)
    }

    /// DC level first (no click), then PWM off with the pin low.
    fn silence(&mut self) {
        let result = self
            .output
            .set_level(DC_OFFSET)
            .and_then(|_| self.output.enable(false));
        if let Err(err) = result {
            self.shared.fault.record(err, 0);
            log::warn!("output not silenced: {}", err);
        }
    }

    fn report_progress(&mut self, emitted: usize, total: usize) {
        let percent = (emitted as u64 * 100) / total as u64;
        let line = StatusLine::format(format_args!("PLAY {}%", percent));
        self.presenter.show_text(LINE_DETAIL, line.as_str());
        self.presenter
            .show_waveform(&self.shared.buffer.snapshot(emitted));
    }

    fn set_led(&mut self, on: bool) {
        let result = if on { self.led.set_high() } else { self.led.set_low() };
        if result.is_err() {
            self.shared.fault.record(HalError::Gpio, 0);
        }
    }

    /// Low-pass history (zero at session start)
    pub fn filter(&self) -> &LowPass {
        &self.lpf
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

impl<'a, const N: usize, O, L, K, P> PlaybackControl for PlaybackController<'a, N, O, L, K, P>
where
    O: PulseOutput,
    L: OutputPin,
    K: Clock,
    P: StatusPresenter,
{
    fn start_playback(&mut self) -> bool {
        PlaybackController::start_playback(self)
    }

    fn run_playback(&mut self) -> Option<PlaybackReport> {
        PlaybackController::run_playback(self)
    }
}
