//! Waveform decimation, framebuffer layout and the SSD1306 panel

mod common;

use common::*;
use rust_voice_recorder::display::{column_heights, Framebuffer, OledPresenter, FRAME_LEN};
use rust_voice_recorder::hal::{Ssd1306, Ssd1306Error, SSD1306_ADDR};
use rust_voice_recorder::{HalError, RenderSnapshot, StatusLine, StatusPresenter};

fn snapshot(samples: &[i16], cursor: usize) -> RenderSnapshot<'_> {
    RenderSnapshot { samples, cursor }
}

#[test]
fn test_empty_snapshot_draws_nothing() {
    let heights = column_heights::<128>(&snapshot(&[], 0), 64);
    assert!(heights.iter().all(|&h| h == 0));
}

#[test]
fn test_full_scale_reaches_top_row() {
    let samples = [-2047i16; 256];
    let heights = column_heights::<128>(&snapshot(&samples, 0), 64);
    assert!(heights.iter().all(|&h| h == 63));

    let quiet = [0i16; 256];
    let heights = column_heights::<128>(&snapshot(&quiet, 0), 64);
    assert!(heights.iter().all(|&h| h == 0));
}

#[test]
fn test_decimation_uses_stride_and_cursor() {
    // 256 samples over 128 columns: stride 2
    let samples: Vec<i16> = (0..256).map(|i| if i % 2 == 0 { 2047 } else { 0 }).collect();

    let even = column_heights::<128>(&snapshot(&samples, 0), 64);
    assert!(even.iter().all(|&h| h == 63));

    // Cursor shifts the window onto the odd samples
    let odd = column_heights::<128>(&snapshot(&samples, 1), 64);
    assert!(odd.iter().all(|&h| h == 0));
}

#[test]
fn test_short_capture_wraps_around() {
    // Fewer samples than columns: stride 1, positions wrap modulo total
    let samples = [2047i16, 0, 0];
    let heights = column_heights::<8>(&snapshot(&samples, 2), 64);
    // x=0 -> pos 2, x=1 -> pos 0, x=2 -> pos 1, x=3 -> pos 2, x=4 -> pos 0
    assert_eq!(heights, [0, 63, 0, 0, 63, 0, 0, 63]);
}

#[test]
fn test_bar_height_scales_with_magnitude() {
    let samples = [1023i16];
    let heights = column_heights::<1>(&snapshot(&samples, 0), 64);
    // 1023 * 63 / 2047 = 31.48
    assert_eq!(heights, [31]);
}

#[test]
fn test_framebuffer_page_layout() {
    let mut frame = Framebuffer::new();
    frame.set_pixel(0, 0);
    frame.set_pixel(5, 9);
    frame.set_pixel(127, 63);
    frame.set_pixel(128, 0);
    frame.set_pixel(0, 64);

    let bytes = frame.as_bytes();
    assert_eq!(bytes.len(), FRAME_LEN);
    assert_eq!(bytes[0], 0b0000_0001);
    // page 1, bit 1
    assert_eq!(bytes[5 + 128], 0b0000_0010);
    assert_eq!(bytes[127 + 7 * 128], 0b1000_0000);
    assert_eq!(bytes.iter().filter(|&&b| b != 0).count(), 3);

    assert!(frame.pixel(5, 9));
    assert!(!frame.pixel(5, 8));
}

#[test]
fn test_bars_fill_from_row_zero() {
    let mut frame = Framebuffer::new();
    frame.draw_bars(&[3, 0, 10]);

    assert!((0..=3).all(|y| frame.pixel(0, y)));
    assert!(!frame.pixel(0, 4));
    assert!(frame.pixel(1, 0));
    assert!(!frame.pixel(1, 1));
    assert!((0..=10).all(|y| frame.pixel(2, y)));
    assert!(!frame.pixel(3, 0));
}

#[test]
fn test_status_line_truncates() {
    let line = StatusLine::format(format_args!("{}/{} samples", 44000, 44000));
    assert_eq!(line.as_str(), "44000/44000 samples");

    let long = StatusLine::format(format_args!("{}", "x".repeat(40)));
    assert_eq!(long.as_str().len(), 24);
}

#[test]
fn test_panel_geometry_checked() {
    assert!(Ssd1306::new(SSD1306_ADDR, 128, 64).is_ok());
    assert!(Ssd1306::new(SSD1306_ADDR, 128, 32).is_ok());
    assert_eq!(
        Ssd1306::new(SSD1306_ADDR, 128, 60).err(),
        Some(Ssd1306Error::InvalidGeometry)
    );
    assert_eq!(
        Ssd1306::new(SSD1306_ADDR, 0, 64).err(),
        Some(Ssd1306Error::InvalidGeometry)
    );
    assert_eq!(
        Ssd1306::new(SSD1306_ADDR, 128, 72).err(),
        Some(Ssd1306Error::InvalidGeometry)
    );
}

#[test]
fn test_panel_init_sequence() {
    let mut i2c = MockI2c::default();
    let mut panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();
    panel.init(&mut i2c).unwrap();

    assert!(panel.is_powered());
    assert!(i2c.writes.iter().all(|(addr, bytes)| *addr == 0x3C && bytes[0] == 0x00));
    assert_eq!(i2c.writes.first().unwrap().1, vec![0x00, 0xAE]);
    assert_eq!(i2c.writes.last().unwrap().1, vec![0x00, 0xAF]);
    assert!(i2c.writes.iter().any(|(_, b)| b == &[0x00, 0xA8, 63]));
    assert!(i2c.writes.iter().any(|(_, b)| b == &[0x00, 0x8D, 0x14]));
    assert!(i2c.writes.iter().any(|(_, b)| b == &[0x00, 0xDA, 0x12]));
}

#[test]
fn test_panel_flush_packets() {
    let mut i2c = MockI2c::default();
    let mut panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();

    let mut frame = [0u8; FRAME_LEN];
    frame[0] = 0xAA;
    frame[FRAME_LEN - 1] = 0x55;
    panel.flush(&mut i2c, &frame).unwrap();

    assert_eq!(i2c.writes[0].1, vec![0x00, 0x21, 0, 127]);
    assert_eq!(i2c.writes[1].1, vec![0x00, 0x22, 0, 7]);

    let data: Vec<&Vec<u8>> = i2c.writes[2..].iter().map(|(_, b)| b).collect();
    assert_eq!(data.len(), FRAME_LEN / 32);
    assert!(data.iter().all(|p| p.len() == 33 && p[0] == 0x40));
    assert_eq!(data[0][1], 0xAA);
    assert_eq!(data[data.len() - 1][32], 0x55);
}

#[test]
fn test_panel_rejects_wrong_frame_size() {
    let mut i2c = MockI2c::default();
    let mut panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();

    assert_eq!(
        panel.flush(&mut i2c, &[0u8; 100]),
        Err(Ssd1306Error::InvalidGeometry)
    );
    assert!(i2c.writes.is_empty());
}

#[test]
fn test_panel_bus_error() {
    let mut i2c = MockI2c {
        fail: true,
        ..MockI2c::default()
    };
    let mut panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();

    let err = panel.init(&mut i2c).unwrap_err();
    assert_eq!(err, Ssd1306Error::Bus);
    assert!(!panel.is_powered());
    assert_eq!(HalError::from(err), HalError::Display);
    assert_eq!(HalError::Display.code(), "E05");
}

#[test]
fn test_contrast_and_power() {
    let mut i2c = MockI2c::default();
    let mut panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();

    panel.set_contrast(&mut i2c, 0x10).unwrap();
    assert_eq!(panel.contrast(), 0x10);
    panel.set_power(&mut i2c, true).unwrap();
    assert!(panel.is_powered());
    panel.set_power(&mut i2c, false).unwrap();
    assert!(!panel.is_powered());

    assert_eq!(i2c.writes.len(), 3);
    assert_eq!(i2c.writes[2].1, vec![0x00, 0xAE]);
}

#[test]
fn test_oled_presenter_flushes_waveform() {
    let panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();
    let mut oled = OledPresenter::new(MockI2c::default(), panel);
    oled.init().unwrap();

    let samples = [2047i16; 128];
    oled.show_waveform(&snapshot(&samples, 0));
    oled.show_text(0, "Recording...");

    assert_eq!(oled.bus_errors(), 0);
    assert!((0..64).all(|y| oled.frame().pixel(0, y)));

    let i2c = oled.release();
    // init (17 commands + blank frame) and one waveform frame
    let frame_writes = 2 + FRAME_LEN / 32;
    assert_eq!(i2c.writes.len(), 17 + 2 * frame_writes);
}

#[test]
fn test_oled_presenter_counts_bus_errors() {
    let panel = Ssd1306::new(SSD1306_ADDR, 128, 64).unwrap();
    let mut oled = OledPresenter::new(
        MockI2c {
            fail: true,
            ..MockI2c::default()
        },
        panel,
    );

    assert_eq!(oled.init(), Err(HalError::Display));

    let samples = [100i16; 10];
    oled.show_waveform(&snapshot(&samples, 0));
    oled.show_waveform(&snapshot(&samples, 5));
    assert_eq!(oled.bus_errors(), 2);
}
