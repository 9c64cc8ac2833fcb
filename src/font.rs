use crate::error::ReportError;
use crate::types::Pt;
use std::fs;
use std::path::Path;

/// The engine renders everything in two faces. Body text and table cells use
/// the regular face, headings and labels the bold one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// Horizontal advances in 1/1000 em for the WinAnsi range the reports use,
/// plus the vertical metrics that define line height. Extracted once at
/// registration; no face is re-parsed during layout.
#[derive(Debug, Clone)]
pub(crate) struct FaceMetrics {
    first_char: u8,
    widths: Vec<u16>,
    missing_width: u16,
    ascent: i16,
    descent: i16,
    line_gap: i16,
}

impl FaceMetrics {
    fn builtin(widths: &[u16]) -> Self {
        Self {
            first_char: 32,
            widths: widths.to_vec(),
            missing_width: widths[0],
            ascent: 718,
            descent: -207,
            line_gap: 225,
        }
    }

    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale_u16 = |value: u16| -> u16 {
            let scaled = (value as u32 * 1000 + units_per_em as u32 / 2) / units_per_em as u32;
            scaled.min(u16::MAX as u32) as u16
        };
        let scale_i16 = |value: i16| -> i16 {
            let scaled = (value as i32 * 1000) / units_per_em as i32;
            scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        };

        let first_char = 32u8;
        let last_char = 126u8;
        let mut widths = Vec::with_capacity((last_char - first_char + 1) as usize);
        for code in first_char..=last_char {
            let advance = face
                .glyph_index(code as char)
                .and_then(|id| face.glyph_hor_advance(id))
                .map(scale_u16)
                .unwrap_or(0);
            widths.push(advance);
        }
        let missing_width = widths[0];

        Self {
            first_char,
            widths,
            missing_width,
            ascent: scale_i16(face.ascender()),
            descent: scale_i16(face.descender()),
            line_gap: scale_i16(face.line_gap()),
        }
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let code = ch as u32;
        let first = self.first_char as u32;
        let last = first + self.widths.len() as u32 - 1;
        if code < first || code > last {
            return self.missing_width;
        }
        self.widths[(code - first) as usize]
    }

    fn measure(&self, font_size: Pt, text: &str) -> Pt {
        let mut total_units: i32 = 0;
        for ch in text.chars() {
            total_units = total_units.saturating_add(self.advance_for_char(ch) as i32);
        }
        if total_units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn line_height(&self, font_size: Pt) -> Pt {
        let height_1000 = self.ascent as i32 - self.descent as i32 + self.line_gap as i32;
        if height_1000 <= 0 {
            return font_size;
        }
        font_size.mul_ratio(height_1000, 1000)
    }
}

/// Text measurement for both layout and the sinks. Defaults to builtin
/// Helvetica metrics so layout is deterministic with zero configuration;
/// a TTF/OTF face may be registered per style to override them.
#[derive(Debug)]
pub struct FontRegistry {
    regular: FaceMetrics,
    bold: FaceMetrics,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            regular: FaceMetrics::builtin(&HELVETICA_WIDTHS),
            bold: FaceMetrics::builtin(&HELVETICA_BOLD_WIDTHS),
        }
    }

    pub fn register_font_file(
        &mut self,
        style: FontStyle,
        path: impl AsRef<Path>,
    ) -> Result<(), ReportError> {
        let data = fs::read(path.as_ref())?;
        self.register_font_bytes(style, &data)
    }

    pub fn register_font_bytes(&mut self, style: FontStyle, data: &[u8]) -> Result<(), ReportError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|err| ReportError::Font(format!("unparseable font face: {}", err)))?;
        let metrics = FaceMetrics::from_face(&face);
        match style {
            FontStyle::Regular => self.regular = metrics,
            FontStyle::Bold => self.bold = metrics,
        }
        Ok(())
    }

    fn metrics(&self, style: FontStyle) -> &FaceMetrics {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub fn measure_text_width(&self, style: FontStyle, font_size: Pt, text: &str) -> Pt {
        self.metrics(style).measure(font_size, text)
    }

    pub fn line_height(&self, style: FontStyle, font_size: Pt) -> Pt {
        self.metrics(style).line_height(font_size)
    }
}

// Helvetica AFM advances for chars 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722,
    667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222,
    500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334,
    584,
];

// Helvetica-Bold AFM advances for chars 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722, 722, 667,
    611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556,
    278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_width_of_known_string() {
        let fonts = FontRegistry::new();
        // "Hi" in Helvetica: H=722, i=222 -> 944/1000 em at 10pt = 9.44pt
        let width = fonts.measure_text_width(FontStyle::Regular, Pt::from_i32(10), "Hi");
        assert_eq!(width.to_milli_i64(), 9_440);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let fonts = FontRegistry::new();
        let size = Pt::from_i32(12);
        let regular = fonts.measure_text_width(FontStyle::Regular, size, "Incident report");
        let bold = fonts.measure_text_width(FontStyle::Bold, size, "Incident report");
        assert!(bold > regular);
    }

    #[test]
    fn out_of_range_chars_use_missing_width() {
        let fonts = FontRegistry::new();
        let size = Pt::from_i32(10);
        let fallback = fonts.measure_text_width(FontStyle::Regular, size, "\u{00e9}");
        let space = fonts.measure_text_width(FontStyle::Regular, size, " ");
        assert_eq!(fallback, space);
    }

    #[test]
    fn line_height_tracks_font_size() {
        let fonts = FontRegistry::new();
        let small = fonts.line_height(FontStyle::Regular, Pt::from_i32(10));
        let large = fonts.line_height(FontStyle::Regular, Pt::from_i32(20));
        assert_eq!(large.to_milli_i64(), small.to_milli_i64() * 2);
        // builtin metrics put a line at 1.15em
        assert_eq!(small.to_milli_i64(), 11_500);
    }
}
