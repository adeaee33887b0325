//! Waveform bars for the status display
//!
//! The sample range is decimated into one bar per display column:
//! `stride = total / width` (at least 1), column `x` shows the sample at
//! `(x * stride + cursor) % total`, bar height is `|s| * (H - 1) / HALF_SCALE`.

use crate::audio::RenderSnapshot;
use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH, HALF_SCALE};

/// Bytes in one SSD1306 frame (one bit per pixel, 8-row pages).
pub const FRAME_LEN: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;

/// Bar height per column, each in `[0, height - 1]`.
///
/// An empty snapshot (or zero height) gives all-zero columns.
pub fn column_heights<const W: usize>(snapshot: &RenderSnapshot<'_>, height: usize) -> [u8; W] {
    let mut columns = [0u8; W];
    let total = snapshot.total();
    if total == 0 || height == 0 || W == 0 {
        return columns;
    }

    let top = height - 1;
    let stride = (total / W).max(1);

    for (x, column) in columns.iter_mut().enumerate() {
        let pos = (x * stride + snapshot.cursor) % total;
        let magnitude = snapshot.samples[pos].unsigned_abs() as usize;
        let bar = (magnitude * top) / HALF_SCALE as usize;
        *column = bar.min(top).min(u8::MAX as usize) as u8;
    }

    columns
}

/// Monochrome frame in SSD1306 page layout.
///
/// Pixel `(x, y)` lives in byte `x + (y / 8) * WIDTH`, bit `y % 8`.
pub struct Framebuffer {
    bytes: [u8; FRAME_LEN],
}

impl Framebuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; FRAME_LEN],
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Light one pixel. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        self.bytes[x + (y / 8) * DISPLAY_WIDTH] |= 1 << (y % 8);
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        self.bytes[x + (y / 8) * DISPLAY_WIDTH] & (1 << (y % 8)) != 0
    }

    /// Draw one vertical bar per column, rows `0..=height`.
    pub fn draw_bars(&mut self, heights: &[u8]) {
        for (x, &h) in heights.iter().enumerate().take(DISPLAY_WIDTH) {
            for y in 0..=h as usize {
                self.set_pixel(x, y);
            }
        }
    }

    /// Clear, then draw the waveform for `snapshot`.
    pub fn render_waveform(&mut self, snapshot: &RenderSnapshot<'_>) {
        self.clear();
        let heights = column_heights::<DISPLAY_WIDTH>(snapshot, DISPLAY_HEIGHT);
        self.draw_bars(&heights);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}
