//! LED strip buffer, section layout and color math
//!
//! The strip is mounted around the table in four runs (two long sides, two
//! short sides). The trailing pixels of the reel are left dark.

use crate::BoardError;
use crate::config;
use core::ops::Range;
use log::warn;
use smart_leds::{RGB8, SmartLedsWrite, brightness};

pub const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
pub const WHITE: RGB8 = RGB8 { r: 255, g: 255, b: 255 };

/// A contiguous run of pixels animated as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub len: usize,
}

impl Section {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Index of the last pixel in the section
    pub const fn end(&self) -> usize {
        self.start + self.len - 1
    }

    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// 120 cm + 70 cm + 120 cm + 70 cm
pub const SECTIONS: [Section; 4] = [
    Section::new(0, 72),
    Section::new(72, 42),
    Section::new(114, 72),
    Section::new(186, 42),
];

/// Pixels covered by the sections
pub const USED_LEDS: usize = 228;

/// Remainder of the reel, always dark
pub const UNUSED: Range<usize> = USED_LEDS..config::NUM_LEDS;

/// First pixel of section `index`, 0 if there is no such section
pub fn section_start(index: usize) -> usize {
    SECTIONS.get(index).map_or(0, |s| s.start)
}

/// Last pixel of section `index`, 0 if there is no such section
pub fn section_end(index: usize) -> usize {
    SECTIONS.get(index).map_or(0, Section::end)
}

/// Pixel count of section `index`, 0 if there is no such section
pub fn section_len(index: usize) -> usize {
    SECTIONS.get(index).map_or(0, |s| s.len)
}

/// Brightness of a pixel `position` in a triangular wave centered at `center`.
///
/// Full intensity at the center, falling linearly to zero at half the
/// `width` away. Anything further is unlit.
pub fn wave_intensity(position: usize, center: usize, width: usize) -> u8 {
    let half = width / 2;
    let distance = position.abs_diff(center);
    if distance > half {
        return 0;
    }
    if half == 0 {
        return 255;
    }
    (255 * (half - distance) / half) as u8
}

/// Per-channel linear mix: 0 gives `a`, 255 gives `b`
pub fn blend_colors(a: RGB8, b: RGB8, amount: u8) -> RGB8 {
    let mix = |x: u8, y: u8| {
        ((x as u16 * (255 - amount as u16) + y as u16 * amount as u16) / 255) as u8
    };
    RGB8 {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
    }
}

/// Scale a color toward black; 255 keeps it, 0 turns it off
pub fn scale_color(color: RGB8, intensity: u8) -> RGB8 {
    let scale = |c: u8| ((c as u16 * (intensity as u16 + 1)) >> 8) as u8;
    RGB8 {
        r: scale(color.r),
        g: scale(color.g),
        b: scale(color.b),
    }
}

fn is_lit(color: RGB8) -> bool {
    color != BLACK
}

/// Frame buffer for the strip plus its global brightness
pub struct LedStrip {
    pixels: [RGB8; config::NUM_LEDS],
    brightness: u8,
    frame_pending: bool,
}

impl Default for LedStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl LedStrip {
    pub fn new() -> Self {
        Self {
            pixels: [BLACK; config::NUM_LEDS],
            brightness: config::DEFAULT_BRIGHTNESS,
            frame_pending: false,
        }
    }

    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    /// Color of pixel `index`, black outside the strip
    pub fn pixel(&self, index: usize) -> RGB8 {
        self.pixels.get(index).copied().unwrap_or(BLACK)
    }

    /// Set pixel `index`; out of range writes are dropped
    pub fn set_pixel(&mut self, index: usize, color: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    /// Add a wave contribution: empty pixels take the color, lit pixels are
    /// mixed half and half with it
    pub fn overlay_pixel(&mut self, index: usize, color: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = if is_lit(*pixel) {
                blend_colors(*pixel, color, 128)
            } else {
                color
            };
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [BLACK; config::NUM_LEDS];
    }

    pub fn fill_section(&mut self, index: usize, color: RGB8) {
        if let Some(section) = SECTIONS.get(index) {
            self.pixels[section.range()].fill(color);
        }
    }

    /// Fill every section, leaving the unused tail dark
    pub fn fill_sections(&mut self, color: RGB8) {
        for index in 0..SECTIONS.len() {
            self.fill_section(index, color);
        }
    }

    /// Darken a section by `amount` (255 = off)
    pub fn fade_section(&mut self, index: usize, amount: u8) {
        if let Some(section) = SECTIONS.get(index) {
            for pixel in &mut self.pixels[section.range()] {
                *pixel = scale_color(*pixel, 255 - amount);
            }
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, level: u8) {
        if self.brightness != level {
            self.brightness = level;
            self.frame_pending = true;
        }
    }

    /// Mark the buffer as a finished frame for the next flush
    pub fn show(&mut self) {
        self.frame_pending = true;
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Write the pending frame to the hardware.
    ///
    /// Returns `Ok(false)` when there was nothing to send. A rejected frame
    /// stays pending so the next flush retries it.
    pub fn flush<W>(&mut self, writer: &mut W) -> Result<bool, BoardError>
    where
        W: SmartLedsWrite<Color = RGB8>,
        W::Error: core::fmt::Debug,
    {
        if !self.frame_pending {
            return Ok(false);
        }

        match writer.write(brightness(self.pixels.iter().copied(), self.brightness)) {
            Ok(()) => {
                self.frame_pending = false;
                Ok(true)
            }
            Err(e) => {
                warn!("[LED] Strip write failed: {:?}", e);
                Err(BoardError::LedError)
            }
        }
    }
}
