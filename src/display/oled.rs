//! Status presenter backed by the SSD1306 panel.
//!
//! Waveforms are rasterized and flushed over I2C. Text lines go to the log:
//! glyph rendering is left to an external font library.

use embedded_hal::i2c::I2c;

use super::waveform::Framebuffer;
use super::{RenderSnapshot, StatusPresenter};
use crate::hal::{HalError, Ssd1306};

pub struct OledPresenter<I> {
    i2c: I,
    panel: Ssd1306,
    frame: Framebuffer,
    bus_errors: u32,
}

impl<I: I2c> OledPresenter<I> {
    pub fn new(i2c: I, panel: Ssd1306) -> Self {
        Self {
            i2c,
            panel,
            frame: Framebuffer::new(),
            bus_errors: 0,
        }
    }

    /// Power up the panel and blank it.
    pub fn init(&mut self) -> Result<(), HalError> {
        self.panel.init(&mut self.i2c)?;
        self.frame.clear();
        self.panel.flush(&mut self.i2c, self.frame.as_bytes())?;
        Ok(())
    }

    /// Failed flushes since boot
    pub fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    /// Give the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> StatusPresenter for OledPresenter<I> {
    fn show_text(&mut self, line: u8, text: &str) {
        log::info!(target: "recorder::status", "[{}] {}", line, text);
    }

    fn show_waveform(&mut self, snapshot: &RenderSnapshot<'_>) {
        self.frame.render_waveform(snapshot);
        if self.panel.flush(&mut self.i2c, self.frame.as_bytes()).is_err() {
            self.bus_errors = self.bus_errors.saturating_add(1);
        }
    }
}
