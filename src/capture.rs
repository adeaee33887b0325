//! Capture controller: periodic sampling into the audio buffer.
//!
//! # Contexts
//!
//! ```text
//! main loop                      periodic trigger
//! ─────────                      ────────────────
//! start_capture()                on_tick() every 1e6/SAMPLE_RATE µs
//!   Idle -> Recording              4x ADC -> condition -> push
//!   arm trigger                    progress every capacity/10
//!                                  time up / full -> Idle, disarm
//! ```
//!
//! The tick never blocks and never calls the `log` facade; it logs through
//! the RT stream in [`Shared`].
//!
//! A tick that overruns its period simply delays the next one. Lost time is
//! not caught up: the session ends on wall time with fewer samples.

use embedded_hal::digital::OutputPin;

use crate::audio::SampleConditioner;
use crate::config::RecorderConfig;
use crate::controller::CaptureControl;
use crate::display::{StatusLine, StatusPresenter, LINE_DETAIL, LINE_STATE};
use crate::hal::{AnalogInput, Clock, HalError, PeriodicTrigger};
use crate::session::SessionState;
use crate::shared::Shared;
use crate::{rt_debug, rt_error, rt_info, rt_warn};

/// ADC full scale; readings above it are treated as full scale.
const ADC_MAX: u16 = 4095;

/// Why a capture session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEnd {
    /// Session duration elapsed
    TimeUp,
    /// Buffer reached capacity
    BufferFull,
    /// ADC read failed mid-session
    AnalogFault,
}

impl CaptureEnd {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimeUp => "time up",
            Self::BufferFull => "buffer full",
            Self::AnalogFault => "adc fault",
        }
    }
}

/// Capture controller
///
/// Owns the ADC, the periodic trigger and the record LED. `start_capture`
/// runs in the main loop, `on_tick` in the trigger context; on the device
/// both reach the controller through one mutex, so they never overlap.
pub struct CaptureController<'a, const N: usize, A, T, L, K, P> {
    shared: &'a Shared<N>,
    config: RecorderConfig,
    adc: A,
    trigger: T,
    led: L,
    clock: K,
    presenter: P,
    conditioner: SampleConditioner,
    /// Session start timestamp (µs)
    started_us: u64,
    /// Samples between progress updates
    progress_step: usize,
    last_end: Option<CaptureEnd>,
}

impl<'a, const N: usize, A, T, L, K, P> CaptureController<'a, N, A, T, L, K, P>
where
    A: AnalogInput,
    T: PeriodicTrigger,
    L: OutputPin,
    K: Clock,
    P: StatusPresenter,
{
    /// Create a capture controller.
    ///
    /// # Arguments
    /// * `shared` - Session, buffer, faults and RT log shared with playback
    /// * `config` - Sample rate, duration, gain and filter coefficient
    /// * `adc` - Microphone channel
    /// * `trigger` - Periodic source whose callback calls [`on_tick`](Self::on_tick)
    /// * `led` - Recording indicator
    /// * `clock` - Monotonic µs clock for the duration limit
    /// * `presenter` - Status output
    pub fn new(
        shared: &'a Shared<N>,
        config: RecorderConfig,
        adc: A,
        trigger: T,
        led: L,
        clock: K,
        presenter: P,
    ) -> Self {
        Self {
            shared,
            conditioner: SampleConditioner::from_config(&config),
            progress_step: config.capture_progress_step(N),
            config,
            adc,
            trigger,
            led,
            clock,
            presenter,
            started_us: 0,
            last_end: None,
        }
    }

    /// Start a capture session.
    ///
    /// No-op (returns `false`) while a capture or playback is active.
    /// Otherwise resets cursor and filter, lights the LED and arms the
    /// trigger. If the trigger cannot be armed the session is rolled back.
    pub fn start_capture(&mut self) -> bool {
        if !self.shared.session.try_begin(SessionState::Recording) {
            return false;
        }

        // SAFETY: this controller holds `Recording`, so it is the only
        // producer. Playback only reads while it holds `Playing` and
        // returns the session after its last read.
        unsafe { self.shared.buffer.clear() };
        self.conditioner.reset();
        self.last_end = None;
        self.started_us = self.clock.now_us();

        self.set_led(true);
        self.presenter.show_text(LINE_STATE, "Recording...");
        self.presenter.show_text(LINE_DETAIL, "REC 0%");

        let period_us = self.config.sample_period_us();
        let granted_us = match self.trigger.arm(period_us) {
            Ok(granted) => granted,
            Err(err) => {
                self.shared.fault.record(err, 0);
                self.set_led(false);
                self.shared.session.finish(SessionState::Recording);
                self.show_error(err);
                rt_warn!(self.shared.log, self.started_us, "capture not armed: {}", err);
                return false;
            }
        };
        self.shared.set_capture_period_us(granted_us);

        if granted_us != period_us {
            rt_warn!(
                self.shared.log,
                self.started_us,
                "trigger period {} us instead of {} us",
                granted_us,
                period_us
            );
        }
        rt_info!(
            self.shared.log,
            self.started_us,
            "capture armed: {} us period, {} samples max",
            granted_us,
            N
        );
        true
    }

    /// One sampling period.
    ///
    /// Returns `true` while the trigger should keep firing. On `false` the
    /// trigger has already been disarmed.
    pub fn on_tick(&mut self) -> bool {
        let recording = self.shared.session.is(SessionState::Recording);
        if !recording || self.shared.buffer.is_full() {
            if recording {
                self.finish(CaptureEnd::BufferFull);
            } else {
                let _ = self.trigger.disarm();
            }
            return false;
        }

        let raw_avg = match self.read_oversampled() {
            Ok(avg) => avg,
            Err(err) => {
                let at = self.shared.buffer.len();
                self.shared.fault.record(err, at as u32);
                rt_error!(self.shared.log, self.clock.now_us(), "{} at sample {}", err, at);
                self.finish(CaptureEnd::AnalogFault);
                return false;
            }
        };

        let sample = self.conditioner.condition(raw_avg);
        // SAFETY: only the `Recording` holder ticks; the full check above
        // keeps the cursor inside capacity.
        unsafe { self.shared.buffer.push(sample) };

        let count = self.shared.buffer.len();
        if count % self.progress_step == 0 {
            self.report_progress(count);
        }

        let elapsed = self.clock.now_us().saturating_sub(self.started_us);
        if elapsed >= self.config.duration_us() {
            self.finish(CaptureEnd::TimeUp);
            return false;
        }
        if self.shared.buffer.is_full() {
            self.finish(CaptureEnd::BufferFull);
            return false;
        }

        true
    }

    /// Average of `oversample` consecutive reads (floor).
    fn read_oversampled(&mut self) -> Result<u16, HalError> {
        let reads = self.config.oversample.max(1);
        let mut sum = 0u32;
        for _ in 0..reads {
            sum += self.adc.read()?.min(ADC_MAX) as u32;
        }
        Ok((sum / reads) as u16)
    }

    fn report_progress(&mut self, count: usize) {
        let percent = (count as u64 * 100) / N as u64;
        let line = StatusLine::format(format_args!("REC {}%", percent));
        self.presenter.show_text(LINE_DETAIL, line.as_str());
        self.presenter
            .show_waveform(&self.shared.buffer.snapshot(count));
        rt_debug!(self.shared.log, self.clock.now_us(), "capture {}%", percent);
    }

    fn finish(&mut self, reason: CaptureEnd) {
        self.shared.session.finish(SessionState::Recording);
        if let Err(err) = self.trigger.disarm() {
            self.shared.fault.record(err, 0);
        }
        self.set_led(false);

        let count = self.shared.buffer.len();
        let line = StatusLine::format(format_args!("{} samples", count));
        match reason {
            CaptureEnd::AnalogFault => self.show_error(HalError::AnalogRead),
            _ => self.presenter.show_text(LINE_STATE, "Recorded"),
        }
        self.presenter.show_text(LINE_DETAIL, line.as_str());
        self.presenter
            .show_waveform(&self.shared.buffer.snapshot(count));

        rt_info!(
            self.shared.log,
            self.clock.now_us(),
            "capture done: {} samples ({})",
            count,
            reason.as_str()
        );
        self.last_end = Some(reason);
    }

    fn show_error(&mut self, err: HalError) {
        let line = StatusLine::format(format_args!("Error {}", err.code()));
        self.presenter.show_text(LINE_STATE, line.as_str());
    }

    fn set_led(&mut self, on: bool) {
        let result = if on { self.led.set_high() } else { self.led.set_low() };
        if result.is_err() {
            self.shared.fault.record(HalError::Gpio, 0);
        }
    }

    /// Reason the most recent session ended, `None` while one is running.
    pub fn last_end(&self) -> Option<CaptureEnd> {
        self.last_end
    }

    pub fn conditioner(&self) -> &SampleConditioner {
        &self.conditioner
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

impl<'a, const N: usize, A, T, L, K, P> CaptureControl for CaptureController<'a, N, A, T, L, K, P>
where
    A: AnalogInput,
    T: PeriodicTrigger,
    L: OutputPin,
    K: Clock,
    P: StatusPresenter,
{
    fn start_capture(&mut self) -> bool {
        CaptureController::start_capture(self)
    }
}
