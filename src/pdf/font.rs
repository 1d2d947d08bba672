//! Times-Roman, one of the 14 standard PDF fonts.
//!
//! Standard fonts need no embedded font program; viewers supply them. We only
//! need the AFM advance widths to measure text, and a WinAnsi encoder to turn
//! Rust strings into the single-byte strings the font expects.

use lopdf::{Dictionary, Object};

use crate::layout::FontMetrics;

/// Advance widths for WinAnsi codes 32..=126, in 1/1000 em.
const ASCII_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // '0'..'9'
    278, 278, 564, 564, 564, 444, 921, // ':'..'@'
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667,
    556, 611, 722, 722, 944, 722, 722, 611, // 'A'..'Z'
    333, 278, 333, 469, 500, 333, // '['..'`'
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333,
    389, 278, 500, 500, 722, 500, 500, 444, // 'a'..'z'
    480, 200, 480, 541, // '{'..'~'
];

/// Width used for anything outside the ASCII table.
const DEFAULT_WIDTH: u16 = 500;

/// Substitute for characters WinAnsi cannot represent.
const REPLACEMENT: u8 = b'?';

#[derive(Debug, Clone, Copy, Default)]
pub struct TimesRoman;

impl TimesRoman {
    pub const BASE_FONT: &'static str = "Times-Roman";

    /// Font dictionary to register in a page's `/Resources /Font`.
    pub fn dictionary() -> Dictionary {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(Self::BASE_FONT.as_bytes().to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        font
    }

    fn glyph_width(ch: char) -> u16 {
        match ch {
            ' '..='~' => ASCII_WIDTHS[ch as usize - 32],
            _ => DEFAULT_WIDTH,
        }
    }

    /// Encode text as WinAnsi bytes. Latin-1 maps straight through, the
    /// typographic quotes and dashes get their cp1252 codes, everything else
    /// becomes `?`.
    pub fn encode(text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| match ch {
                ' '..='~' => ch as u8,
                '\u{a0}'..='\u{ff}' => ch as u32 as u8,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201c}' => 0x93,
                '\u{201d}' => 0x94,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{20ac}' => 0x80,
                _ => REPLACEMENT,
            })
            .collect()
    }
}

impl FontMetrics for TimesRoman {
    fn width_of_text_at_size(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(Self::glyph_width(ch))).sum();
        units as f32 * font_size / 1000.0
    }
}
