//! Mock capabilities shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};

use rust_voice_recorder::audio::RenderSnapshot;
use rust_voice_recorder::config::RecorderConfig;
use rust_voice_recorder::hal::{AnalogInput, Clock, HalError, PeriodicTrigger, PulseOutput};
use rust_voice_recorder::StatusPresenter;

/// 1 kHz, 1 s sessions: 1000 samples, 1000 µs period, progress every 100.
pub const TEST_CONFIG: RecorderConfig = RecorderConfig {
    sample_rate: 1000,
    duration_seconds: 1,
    ..RecorderConfig::DEFAULT
};

pub const TEST_PERIOD_US: u64 = 1000;

/// Microsecond clock. Advances by hand, and optionally by `auto_step` on
/// every read so busy-wait loops terminate.
pub struct TestClock {
    now: Cell<u64>,
    auto_step: Cell<u64>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            auto_step: Cell::new(0),
        }
    }

    pub fn auto(step_us: u64) -> Self {
        let clock = Self::new();
        clock.set_auto_step(step_us);
        clock
    }

    pub fn set_auto_step(&self, step_us: u64) {
        self.auto_step.set(step_us);
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }

    /// Current time without advancing
    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for TestClock {
    fn now_us(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.auto_step.get());
        t
    }
}

/// ADC returning scripted readings, then a fallback value.
pub struct ScriptedAdc {
    values: VecDeque<u16>,
    fallback: u16,
    fail_at: Option<usize>,
    pub reads: usize,
}

impl ScriptedAdc {
    pub fn constant(value: u16) -> Self {
        Self {
            values: VecDeque::new(),
            fallback: value,
            fail_at: None,
            reads: 0,
        }
    }

    /// One entry per sample, each repeated for the 4 oversampled reads.
    pub fn groups(samples: &[u16], then: u16) -> Self {
        let mut adc = Self::constant(then);
        for &s in samples {
            for _ in 0..4 {
                adc.values.push_back(s);
            }
        }
        adc
    }

    pub fn raw(values: &[u16], then: u16) -> Self {
        let mut adc = Self::constant(then);
        adc.values.extend(values.iter().copied());
        adc
    }

    /// Read number `index` (0-based) and every later one fails.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl AnalogInput for ScriptedAdc {
    fn read(&mut self) -> Result<u16, HalError> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_at.is_some_and(|at| index >= at) {
            return Err(HalError::AnalogRead);
        }
        Ok(self.values.pop_front().unwrap_or(self.fallback))
    }
}

/// Trigger driven by hand: the test calls `on_tick` itself.
#[derive(Default)]
pub struct ManualTrigger {
    pub armed: bool,
    pub period_us: Option<u64>,
    pub arms: usize,
    pub disarms: usize,
    pub fail_arm: bool,
    /// Shortest period the trigger can run at; 0 means any
    pub min_period_us: u64,
}

impl ManualTrigger {
    pub fn failing() -> Self {
        Self {
            fail_arm: true,
            ..Self::default()
        }
    }

    /// Trigger that cannot fire faster than `min_period_us`.
    pub fn slowest(min_period_us: u64) -> Self {
        Self {
            min_period_us,
            ..Self::default()
        }
    }
}

impl PeriodicTrigger for ManualTrigger {
    fn arm(&mut self, period_us: u64) -> Result<u64, HalError> {
        if self.fail_arm {
            return Err(HalError::Timer);
        }
        let granted = period_us.max(self.min_period_us);
        self.armed = true;
        self.arms += 1;
        self.period_us = Some(granted);
        Ok(granted)
    }

    fn disarm(&mut self) -> Result<(), HalError> {
        self.armed = false;
        self.disarms += 1;
        Ok(())
    }
}

/// PWM output that records every level and enable change.
pub struct RecordingOutput<'a> {
    pub levels: Vec<u16>,
    pub level_times: Vec<u64>,
    pub enabled: bool,
    pub enable_history: Vec<bool>,
    clock: Option<&'a TestClock>,
    hook: Option<Box<dyn FnMut(usize) + 'a>>,
    fail_at: Option<usize>,
}

impl<'a> RecordingOutput<'a> {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            level_times: Vec::new(),
            enabled: false,
            enable_history: Vec::new(),
            clock: None,
            hook: None,
            fail_at: None,
        }
    }

    /// Timestamp each level write with `clock`.
    pub fn timed(clock: &'a TestClock) -> Self {
        let mut out = Self::new();
        out.clock = Some(clock);
        out
    }

    /// Run `hook(n)` after the n-th level write (1-based).
    pub fn with_hook(mut self, hook: impl FnMut(usize) + 'a) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Level write number `index` (0-based) fails.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Levels written while the output was enabled
    pub fn sample_levels(&self) -> &[u16] {
        // first write is the DC level before enabling, last is the silence
        if self.levels.len() < 2 {
            return &[];
        }
        &self.levels[1..self.levels.len() - 1]
    }
}

impl PulseOutput for RecordingOutput<'_> {
    fn set_level(&mut self, level: u16) -> Result<(), HalError> {
        if self.fail_at == Some(self.levels.len()) {
            self.fail_at = None;
            return Err(HalError::PulseOutput);
        }
        self.levels.push(level);
        if let Some(clock) = self.clock {
            self.level_times.push(clock.peek());
        }
        let n = self.levels.len();
        if let Some(hook) = self.hook.as_mut() {
            hook(n);
        }
        Ok(())
    }

    fn enable(&mut self, on: bool) -> Result<(), HalError> {
        self.enabled = on;
        self.enable_history.push(on);
        Ok(())
    }
}

/// Indicator LED
#[derive(Default)]
pub struct MockLed {
    pub high: bool,
    pub history: Vec<bool>,
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        self.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        self.history.push(true);
        Ok(())
    }
}

/// Active-low button with a scripted sequence of "pressed" reads.
#[derive(Default)]
pub struct MockButton {
    pressed: VecDeque<bool>,
    broken: bool,
    pub reads: usize,
}

impl MockButton {
    pub fn script(pressed: &[bool]) -> Self {
        Self {
            pressed: pressed.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, pressed: bool) {
        self.pressed.push_back(pressed);
    }
}

impl ErrorType for MockButton {
    type Error = digital::ErrorKind;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.reads += 1;
        if self.broken {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.pressed.pop_front().unwrap_or(false))
    }
}

/// Delay that only records what was asked for.
#[derive(Default)]
pub struct MockDelay {
    pub ms_calls: Vec<u32>,
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}

/// I2C bus that records writes.
#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub fail: bool,
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(i2c::ErrorKind::Other);
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// Presenter that keeps everything it was shown.
#[derive(Default)]
pub struct RecordingPresenter {
    pub texts: Vec<(u8, String)>,
    /// (cursor, total) per waveform call
    pub waveforms: Vec<(usize, usize)>,
}

impl RecordingPresenter {
    pub fn texts_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.texts
            .iter()
            .map(|(_, t)| t.as_str())
            .filter(|t| t.starts_with(prefix))
            .collect()
    }

    pub fn last_text(&self, line: u8) -> Option<&str> {
        self.texts
            .iter()
            .rev()
            .find(|(l, _)| *l == line)
            .map(|(_, t)| t.as_str())
    }
}

impl StatusPresenter for RecordingPresenter {
    fn show_text(&mut self, line: u8, text: &str) {
        self.texts.push((line, text.to_string()));
    }

    fn show_waveform(&mut self, snapshot: &RenderSnapshot<'_>) {
        self.waveforms.push((snapshot.cursor, snapshot.total()));
    }
}

use rust_voice_recorder::{CaptureController, PlaybackController, Shared};

pub type TestCapture<'a, const N: usize> =
    CaptureController<'a, N, ScriptedAdc, ManualTrigger, MockLed, &'a TestClock, RecordingPresenter>;

pub type TestPlayback<'a, 'o, const N: usize> =
    PlaybackController<'a, N, RecordingOutput<'o>, MockLed, &'a TestClock, RecordingPresenter>;

pub fn capture_with<'a, const N: usize>(
    shared: &'a Shared<N>,
    clock: &'a TestClock,
    adc: ScriptedAdc,
    trigger: ManualTrigger,
) -> TestCapture<'a, N> {
    CaptureController::new(
        shared,
        TEST_CONFIG,
        adc,
        trigger,
        MockLed::default(),
        clock,
        RecordingPresenter::default(),
    )
}

pub fn capture<'a, const N: usize>(
    shared: &'a Shared<N>,
    clock: &'a TestClock,
    adc: ScriptedAdc,
) -> TestCapture<'a, N> {
    capture_with(shared, clock, adc, ManualTrigger::default())
}

pub fn playback<'a, 'o, const N: usize>(
    shared: &'a Shared<N>,
    clock: &'a TestClock,
    output: RecordingOutput<'o>,
) -> TestPlayback<'a, 'o, N> {
    PlaybackController::new(
        shared,
        TEST_CONFIG,
        output,
        MockLed::default(),
        clock,
        RecordingPresenter::default(),
    )
}

/// Fire the trigger every `period_us` until the capture stops it.
///
/// Returns the number of ticks that fired.
pub fn drive_capture<const N: usize>(
    capture: &mut TestCapture<'_, N>,
    clock: &TestClock,
    period_us: u64,
) -> usize {
    let mut ticks = 0;
    loop {
        clock.advance(period_us);
        ticks += 1;
        if !capture.on_tick() {
            return ticks;
        }
        assert!(ticks < 1_000_000, "capture never terminated");
    }
}

/// Fill the buffer directly, as a finished capture would have.
pub fn preload<const N: usize>(shared: &Shared<N>, samples: &[i16]) {
    // SAFETY: called before any controller runs and before any slice of
    // the buffer is taken.
    unsafe {
        shared.buffer.clear();
        for &s in samples {
            assert!(shared.buffer.push(s));
        }
    }
}
