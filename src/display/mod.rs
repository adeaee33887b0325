//! Status presentation: two text lines and a waveform.
//!
//! The controllers only talk to [`StatusPresenter`]. Actual glyph rendering
//! belongs to whatever implements it; this module provides the pieces that
//! are pure computation (line formatting, waveform decimation, bar raster).

pub mod oled;
pub mod waveform;

use core::fmt::{self, Write};

pub use crate::audio::RenderSnapshot;
pub use oled::OledPresenter;
pub use waveform::{column_heights, Framebuffer, FRAME_LEN};

/// Line for the session state ("Recording...", "Playing...").
pub const LINE_STATE: u8 = 0;

/// Line for progress and results.
pub const LINE_DETAIL: u8 = 1;

/// Maximum characters on one status line.
pub const MAX_LINE_LEN: usize = 24;

/// Receiver of status updates.
///
/// Called from both execution contexts (capture progress from the trigger,
/// playback progress from the main loop). Implementations must be quick and
/// must not fail loudly: status output is best effort.
pub trait StatusPresenter {
    /// Replace text line `line` (0 or 1).
    fn show_text(&mut self, line: u8, text: &str);

    /// Render the waveform around `snapshot.cursor`.
    fn show_waveform(&mut self, snapshot: &RenderSnapshot<'_>);
}

impl<P: StatusPresenter + ?Sized> StatusPresenter for &mut P {
    fn show_text(&mut self, line: u8, text: &str) {
        (**self).show_text(line, text)
    }

    fn show_waveform(&mut self, snapshot: &RenderSnapshot<'_>) {
        (**self).show_waveform(snapshot)
    }
}

/// Fixed-capacity text line, filled with `write!`.
///
/// Text past `MAX_LINE_LEN` bytes is cut at a char boundary.
#[derive(Clone, Copy)]
pub struct StatusLine {
    buf: [u8; MAX_LINE_LEN],
    len: usize,
}

impl StatusLine {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE_LEN],
            len: 0,
        }
    }

    /// Format a line in one go.
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut line = Self::new();
        let _ = line.write_fmt(args);
        line
    }

    pub fn as_str(&self) -> &str {
        // Only whole chars are ever copied in
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for StatusLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            let mut tmp = [0u8; 4];
            let encoded = c.encode_utf8(&mut tmp).as_bytes();
            if self.len + encoded.len() > MAX_LINE_LEN {
                break;
            }
            self.buf[self.len..self.len + encoded.len()].copy_from_slice(encoded);
            self.len += encoded.len();
        }
        Ok(())
    }
}

impl fmt::Debug for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
