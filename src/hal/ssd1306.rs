//! SSD1306 OLED driver
//!
//! Two-wire (I2C) control of a 128x64 monochrome panel. Only what the
//! status display needs: init, power, contrast and full-frame flush.
//! Reference: SSD1306 datasheet rev 1.1

use embedded_hal::i2c::I2c;

/// SSD1306 I2C address (SA0 = LOW)
pub const SSD1306_ADDR: u8 = 0x3C;

/// Control bytes preceding every I2C transfer
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

/// Data bytes per I2C transaction during flush
const FLUSH_CHUNK: usize = 32;

/// SSD1306 command opcodes
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_MULTIPLEX: u8 = 0xA8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_START_LINE: u8 = 0x40;
    pub const CHARGE_PUMP: u8 = 0x8D;
    pub const MEMORY_MODE: u8 = 0x20;
    pub const SEG_REMAP: u8 = 0xA1;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const RESUME_RAM: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
}

/// SSD1306 driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ssd1306Error {
    /// I2C communication error
    #[error("i2c transfer failed")]
    Bus,
    /// Frame does not match the panel geometry
    #[error("frame size does not match panel")]
    InvalidGeometry,
}

impl From<Ssd1306Error> for crate::hal::HalError {
    fn from(_: Ssd1306Error) -> Self {
        crate::hal::HalError::Display
    }
}

/// SSD1306 driver
///
/// Does not own the bus: every call borrows it, so the same I2C driver can
/// serve other devices.
pub struct Ssd1306 {
    address: u8,
    width: u8,
    height: u8,
    contrast: u8,
    powered: bool,
}

impl Ssd1306 {
    /// Create a driver for a `width x height` panel at `address`.
    pub fn new(address: u8, width: u8, height: u8) -> Result<Self, Ssd1306Error> {
        if width == 0 || width > 128 || height == 0 || height % 8 != 0 || height > 64 {
            return Err(Ssd1306Error::InvalidGeometry);
        }
        Ok(Self {
            address,
            width,
            height,
            contrast: 0xCF,
            powered: false,
        })
    }

    /// Bytes in one full frame (one bit per pixel, 8-pixel pages).
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.pages() as usize
    }

    fn pages(&self) -> u8 {
        self.height / 8
    }

    /// Run the power-up sequence and switch the panel on.
    pub fn init(&mut self, i2c: &mut impl I2c) -> Result<(), Ssd1306Error> {
        use cmd::*;

        let com_pins = if self.height == 64 { 0x12 } else { 0x02 };

        self.command(i2c, &[DISPLAY_OFF])?;
        self.command(i2c, &[SET_CLOCK_DIV, 0x80])?;
        self.command(i2c, &[SET_MULTIPLEX, self.height - 1])?;
        self.command(i2c, &[SET_DISPLAY_OFFSET, 0x00])?;
        self.command(i2c, &[SET_START_LINE])?;
        // Internal charge pump
        self.command(i2c, &[CHARGE_PUMP, 0x14])?;
        // Horizontal addressing: flush writes pages left to right
        self.command(i2c, &[MEMORY_MODE, 0x00])?;
        self.command(i2c, &[SEG_REMAP])?;
        self.command(i2c, &[COM_SCAN_DEC])?;
        self.command(i2c, &[SET_COM_PINS, com_pins])?;
        self.command(i2c, &[SET_CONTRAST, self.contrast])?;
        self.command(i2c, &[SET_PRECHARGE, 0xF1])?;
        self.command(i2c, &[SET_VCOM_DETECT, 0x40])?;
        self.command(i2c, &[RESUME_RAM])?;
        self.command(i2c, &[NORMAL_DISPLAY])?;
        self.command(i2c, &[DEACTIVATE_SCROLL])?;
        self.command(i2c, &[DISPLAY_ON])?;

        self.powered = true;
        Ok(())
    }

    /// Switch the panel on or off (RAM is kept).
    pub fn set_power(&mut self, i2c: &mut impl I2c, on: bool) -> Result<(), Ssd1306Error> {
        let op = if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF };
        self.command(i2c, &[op])?;
        self.powered = on;
        Ok(())
    }

    /// Set contrast (0-255)
    pub fn set_contrast(&mut self, i2c: &mut impl I2c, contrast: u8) -> Result<(), Ssd1306Error> {
        self.command(i2c, &[cmd::SET_CONTRAST, contrast])?;
        self.contrast = contrast;
        Ok(())
    }

    /// Write a full frame in page layout (byte `x + page * width`).
    pub fn flush(&mut self, i2c: &mut impl I2c, frame: &[u8]) -> Result<(), Ssd1306Error> {
        if frame.len() != self.frame_len() {
            return Err(Ssd1306Error::InvalidGeometry);
        }

        self.command(i2c, &[cmd::COLUMN_ADDR, 0, self.width - 1])?;
        self.command(i2c, &[cmd::PAGE_ADDR, 0, self.pages() - 1])?;

        let mut packet = [0u8; FLUSH_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in frame.chunks(FLUSH_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            i2c.write(self.address, &packet[..=chunk.len()])
                .map_err(|_| Ssd1306Error::Bus)?;
        }
        Ok(())
    }

    /// Check if the panel is switched on
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    fn command(&self, i2c: &mut impl I2c, bytes: &[u8]) -> Result<(), Ssd1306Error> {
        let mut packet = [0u8; 4];
        packet[0] = CONTROL_COMMAND;
        packet[1..=bytes.len()].copy_from_slice(bytes);
        i2c.write(self.address, &packet[..=bytes.len()])
            .map_err(|_| Ssd1306Error::Bus)
    }
}
