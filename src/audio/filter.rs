//! One-pole recursive filters
//!
//! Both keep their state between samples of one session only; controllers
//! call `reset()` when a session starts.

/// High-pass: `y[n] = α · (y[n-1] + x[n] - x[n-1])`
///
/// Removes whatever DC survives the fixed offset subtraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighPass {
    alpha: f32,
    prev_output: f32,
    prev_input: i32,
}

impl HighPass {
    pub const fn new(alpha: f32) -> Self {
        Self {
            alpha,
            prev_output: 0.0,
            prev_input: 0,
        }
    }

    /// Filter one centered, gained sample.
    #[inline]
    pub fn process(&mut self, input: i32) -> f32 {
        let output = self.alpha * (self.prev_output + input as f32 - self.prev_input as f32);
        self.prev_output = output;
        self.prev_input = input;
        output
    }

    /// Zero the history (session start).
    #[inline]
    pub fn reset(&mut self) {
        self.prev_output = 0.0;
        self.prev_input = 0;
    }

    /// Previous output and input, for inspection.
    #[inline]
    pub fn state(&self) -> (f32, i32) {
        (self.prev_output, self.prev_input)
    }
}

/// Low-pass: `y[n] = β · x[n] + (1 - β) · y[n-1]`
///
/// Smooths the PWM staircase on playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPass {
    beta: f32,
    prev_output: f32,
}

impl LowPass {
    pub const fn new(beta: f32) -> Self {
        Self {
            beta,
            prev_output: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.beta * input + (1.0 - self.beta) * self.prev_output;
        self.prev_output = output;
        output
    }

    #[inline]
    pub fn reset(&mut self) {
        self.prev_output = 0.0;
    }

    #[inline]
    pub fn state(&self) -> f32 {
        self.prev_output
    }
}
