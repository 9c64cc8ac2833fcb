use crate::assets::ImageAsset;
use crate::font::{FontRegistry, FontStyle};
use crate::report::MetricRow;
use crate::text;
use crate::types::{Color, Pt};
use chrono::{DateTime, NaiveDate, Utc};

// Fixed type scale of the report theme.
pub(crate) const HEADING_SIZE: f32 = 14.0;
pub(crate) const BODY_SIZE: f32 = 10.5;
pub(crate) const TABLE_FONT_SIZE: f32 = 9.5;
pub(crate) const TABLE_HEADER_HEIGHT: f32 = 22.0;
pub(crate) const TABLE_ROW_HEIGHT: f32 = 18.0;
pub(crate) const QR_GLYPH_SIZE: f32 = 80.0;
pub(crate) const QR_CAPTION_SIZE: f32 = 8.5;
pub(crate) const SMALL_SIZE: f32 = 9.0;
pub(crate) const SIGNATURE_HEIGHT: f32 = 64.0;

// Vertical padding inside the evidence composite: title line, expiry line,
// glyph, url caption, and the gaps between them.
pub(crate) const QR_BLOCK_HEIGHT: f32 =
    8.0 + 16.0 + 13.0 + 6.0 + QR_GLYPH_SIZE + 6.0 + 12.0 + 8.0;

/// The closed vocabulary of report content. Every variant the engine can lay
/// out is here; a new variant forces every placer and both sinks through an
/// exhaustive match.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Heading {
        text: String,
        color: Color,
    },
    Paragraph {
        text: String,
    },
    Table {
        rows: Vec<MetricRow>,
        header_color: Color,
    },
    Image {
        asset: ImageAsset,
    },
    QrEvidence {
        title: String,
        expires_at: DateTime<Utc>,
        qr: ImageAsset,
        url: String,
    },
    Signature {
        name: String,
        date: NaiveDate,
    },
}

impl ContentBlock {
    /// Intrinsic height at the given content width. For images this may
    /// exceed one page; the splitter handles that case.
    pub fn measure(&self, content_width: Pt, fonts: &FontRegistry) -> Pt {
        match self {
            ContentBlock::Heading { text, .. } => text::wrap(
                text,
                content_width,
                Pt::from_f32(HEADING_SIZE),
                FontStyle::Bold,
                fonts,
            )
            .height(),
            ContentBlock::Paragraph { text } => text::wrap(
                text,
                content_width,
                Pt::from_f32(BODY_SIZE),
                FontStyle::Regular,
                fonts,
            )
            .height(),
            ContentBlock::Table { rows, .. } => {
                Pt::from_f32(TABLE_HEADER_HEIGHT) + Pt::from_f32(TABLE_ROW_HEIGHT) * rows.len() as i32
            }
            ContentBlock::Image { asset } => asset.scaled_height(content_width),
            ContentBlock::QrEvidence { .. } => Pt::from_f32(QR_BLOCK_HEIGHT),
            ContentBlock::Signature { .. } => Pt::from_f32(SIGNATURE_HEIGHT),
        }
    }

    /// Whether the block may be sliced across a page boundary. Only images
    /// scroll across pages; everything else is atomic.
    pub fn splittable(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }

    /// Gap to the following block. Not part of the block's own rect.
    pub(crate) fn spacing_after(&self) -> Pt {
        match self {
            ContentBlock::Heading { .. } => Pt::from_f32(4.0),
            ContentBlock::Paragraph { .. } => Pt::from_f32(10.0),
            ContentBlock::Table { .. } => Pt::from_f32(12.0),
            ContentBlock::Image { .. } => Pt::from_f32(12.0),
            ContentBlock::QrEvidence { .. } => Pt::from_f32(10.0),
            ContentBlock::Signature { .. } => Pt::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontRegistry {
        FontRegistry::new()
    }

    fn png(width: u32, height: u32) -> ImageAsset {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("encode png");
        ImageAsset::from_bytes(out).expect("asset")
    }

    #[test]
    fn table_height_is_header_plus_rows() {
        let block = ContentBlock::Table {
            rows: vec![
                MetricRow::new("Patrols", "42"),
                MetricRow::new("Incidents", "3"),
                MetricRow::new("Alarms", "0"),
            ],
            header_color: Color::BLACK,
        };
        let height = block.measure(Pt::from_i32(500), &fonts());
        assert_eq!(
            height.to_milli_i64(),
            (TABLE_HEADER_HEIGHT as i64 + 3 * TABLE_ROW_HEIGHT as i64) * 1000
        );
    }

    #[test]
    fn image_height_scales_with_aspect() {
        let block = ContentBlock::Image {
            asset: png(200, 100),
        };
        let height = block.measure(Pt::from_i32(400), &fonts());
        assert_eq!(height.to_milli_i64(), 200_000);
    }

    #[test]
    fn evidence_height_is_fixed() {
        let a = ContentBlock::QrEvidence {
            title: "Dock camera".to_string(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
            qr: png(64, 64),
            url: "https://evidence.example.com/x".to_string(),
        };
        let b = ContentBlock::QrEvidence {
            title: "A much longer evidence title that would wrap if it could".to_string(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
            qr: png(64, 64),
            url: "https://evidence.example.com/y".to_string(),
        };
        let width = Pt::from_i32(500);
        assert_eq!(a.measure(width, &fonts()), b.measure(width, &fonts()));
    }

    #[test]
    fn paragraph_height_grows_with_narrower_width() {
        let block = ContentBlock::Paragraph {
            text: "the guard walked the full perimeter twice and logged both rounds".to_string(),
        };
        let wide = block.measure(Pt::from_i32(500), &fonts());
        let narrow = block.measure(Pt::from_i32(120), &fonts());
        assert!(narrow > wide);
    }

    #[test]
    fn only_images_split() {
        let image = ContentBlock::Image {
            asset: png(10, 10),
        };
        let table = ContentBlock::Table {
            rows: vec![MetricRow::new("a", "b")],
            header_color: Color::BLACK,
        };
        assert!(image.splittable());
        assert!(!table.splittable());
    }
}
