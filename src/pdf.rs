use crate::assets::ImageAsset;
use crate::block;
use crate::canvas::{Canvas, Command, Page};
use crate::error::ReportError;
use crate::font::FontStyle;
use crate::page::{LayoutResult, PlacedBlock, PlacedContent};
use crate::types::{Color, Pt, Rect};
use lopdf::{Dictionary, Document as PdfDocument, Object, Stream, dictionary};
use std::collections::BTreeMap;

/// Raster parameters for embedded images. Layout is identical across
/// qualities; only these knobs differ between the standard and compressed
/// export variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterQuality {
    pub jpeg_quality: u8,
    pub max_image_dim: Option<u32>,
}

impl RasterQuality {
    pub fn standard() -> Self {
        Self {
            jpeg_quality: 88,
            max_image_dim: None,
        }
    }

    pub fn compressed() -> Self {
        Self {
            jpeg_quality: 45,
            max_image_dim: Some(1200),
        }
    }
}

const GRAY_TEXT: Color = Color {
    r: 0.42,
    g: 0.45,
    b: 0.50,
};
const RULE_GRAY: Color = Color {
    r: 0.82,
    g: 0.84,
    b: 0.86,
};
const ZEBRA: Color = Color {
    r: 0.953,
    g: 0.957,
    b: 0.965,
};
const ROW_TEXT: Color = Color {
    r: 0.12,
    g: 0.16,
    b: 0.22,
};

/// Serialize one layout into a single PDF buffer. Pure consumer: every
/// position comes from the `LayoutResult`; this function only draws.
pub fn render_pdf(layout: &LayoutResult, quality: &RasterQuality) -> Result<Vec<u8>, ReportError> {
    let (pages, images) = build_pages(layout);
    write_document(&pages, &images, quality)
}

/// Translate placed blocks into draw commands, collecting every distinct
/// image asset for embedding.
fn build_pages(layout: &LayoutResult) -> (Vec<Page>, BTreeMap<String, ImageAsset>) {
    let mut canvas = Canvas::new(layout.page_size);
    let mut images = BTreeMap::new();

    for page in 1..=layout.page_count {
        if let Some(background) = &layout.background {
            let rect = Rect {
                x: Pt::ZERO,
                y: Pt::ZERO,
                width: layout.page_size.width,
                height: layout.page_size.height,
            };
            canvas.push(Command::SaveState);
            canvas.push(Command::SetOpacity(background.opacity));
            draw_image(&mut canvas, &mut images, &background.asset, rect);
            canvas.push(Command::RestoreState);
        }
        for placed in layout.blocks_on_page(page) {
            draw_block(&mut canvas, &mut images, placed);
        }
        canvas.show_page();
    }

    (canvas.finish(), images)
}

fn draw_image(
    canvas: &mut Canvas,
    images: &mut BTreeMap<String, ImageAsset>,
    asset: &ImageAsset,
    rect: Rect,
) {
    if asset.data().is_empty() {
        // undecodable placeholder fallback: a flat gray box
        canvas.push(Command::FillRect {
            rect,
            color: Color::rgb8(229, 231, 235),
        });
        return;
    }
    let resource_id = asset.resource_id();
    images.entry(resource_id.clone()).or_insert_with(|| asset.clone());
    canvas.push(Command::Image { resource_id, rect });
}

fn draw_lines(
    canvas: &mut Canvas,
    lines: &[String],
    rect: Rect,
    font_size: Pt,
    line_height: Pt,
    style: FontStyle,
    color: Color,
) {
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        canvas.push(Command::Text {
            x: rect.x,
            y: rect.y + line_height * i as i32 + baseline_offset(line_height),
            text: line.clone(),
            style,
            size: font_size,
            color,
        });
    }
}

// Baseline sits at ~81% of the line box for the Helvetica metrics in use.
fn baseline_offset(line_height: Pt) -> Pt {
    line_height.mul_ratio(81, 100)
}

fn draw_block(canvas: &mut Canvas, images: &mut BTreeMap<String, ImageAsset>, placed: &PlacedBlock) {
    let rect = placed.rect;
    match &placed.content {
        PlacedContent::Heading {
            lines,
            color,
            font_size,
            line_height,
        } => {
            draw_lines(canvas, lines, rect, *font_size, *line_height, FontStyle::Bold, *color);
        }
        PlacedContent::Paragraph {
            lines,
            font_size,
            line_height,
        } => {
            draw_lines(
                canvas,
                lines,
                rect,
                *font_size,
                *line_height,
                FontStyle::Regular,
                ROW_TEXT,
            );
        }
        PlacedContent::Table { rows, header_color } => {
            draw_table(canvas, rect, rows, *header_color);
        }
        PlacedContent::ImageSlice {
            asset,
            offset_y,
            full_height,
        } => {
            canvas.push(Command::SaveState);
            canvas.push(Command::ClipRect { rect });
            draw_image(
                canvas,
                images,
                asset,
                Rect {
                    x: rect.x,
                    y: rect.y + *offset_y,
                    width: rect.width,
                    height: *full_height,
                },
            );
            canvas.push(Command::RestoreState);
        }
        PlacedContent::QrEvidence {
            title,
            expiry_label,
            qr,
            url,
        } => {
            draw_evidence(canvas, images, rect, title, expiry_label, qr, url);
        }
        PlacedContent::Signature { name, date_label } => {
            draw_signature(canvas, rect, name, date_label);
        }
        PlacedContent::PageHeader {
            title,
            subtitle,
            logo_left,
            logo_right,
        } => {
            draw_page_header(canvas, images, rect, title, subtitle, logo_left, logo_right);
        }
        PlacedContent::PageFooter {
            timestamp,
            org_line,
            page_label,
        } => {
            draw_page_footer(canvas, rect, timestamp, org_line, page_label);
        }
    }
}

fn draw_table(canvas: &mut Canvas, rect: Rect, rows: &[crate::report::MetricRow], header_color: Color) {
    let pad = Pt::from_f32(8.0);
    let header_h = Pt::from_f32(block::TABLE_HEADER_HEIGHT);
    let row_h = Pt::from_f32(block::TABLE_ROW_HEIGHT);
    let font = Pt::from_f32(block::TABLE_FONT_SIZE);
    let value_x = rect.x + rect.width.mul_ratio(62, 100);

    canvas.push(Command::FillRect {
        rect: Rect {
            height: header_h,
            ..rect
        },
        color: header_color,
    });
    let header_baseline = rect.y + header_h.mul_ratio(68, 100);
    canvas.push(Command::Text {
        x: rect.x + pad,
        y: header_baseline,
        text: "Metric".to_string(),
        style: FontStyle::Bold,
        size: font,
        color: Color::WHITE,
    });
    canvas.push(Command::Text {
        x: value_x,
        y: header_baseline,
        text: "Value".to_string(),
        style: FontStyle::Bold,
        size: font,
        color: Color::WHITE,
    });

    for (i, row) in rows.iter().enumerate() {
        let row_top = rect.y + header_h + row_h * i as i32;
        if i % 2 == 1 {
            canvas.push(Command::FillRect {
                rect: Rect {
                    y: row_top,
                    height: row_h,
                    ..rect
                },
                color: ZEBRA,
            });
        }
        let baseline = row_top + row_h.mul_ratio(68, 100);
        canvas.push(Command::Text {
            x: rect.x + pad,
            y: baseline,
            text: row.label.clone(),
            style: FontStyle::Regular,
            size: font,
            color: ROW_TEXT,
        });
        canvas.push(Command::Text {
            x: value_x,
            y: baseline,
            text: row.value.clone(),
            style: FontStyle::Regular,
            size: font,
            color: ROW_TEXT,
        });
    }
    canvas.push(Command::StrokeRect {
        rect,
        color: RULE_GRAY,
        width: Pt::from_f32(0.75),
    });
}

fn draw_evidence(
    canvas: &mut Canvas,
    images: &mut BTreeMap<String, ImageAsset>,
    rect: Rect,
    title: &str,
    expiry_label: &str,
    qr: &ImageAsset,
    url: &str,
) {
    let pad = Pt::from_f32(8.0);
    canvas.push(Command::StrokeRect {
        rect,
        color: RULE_GRAY,
        width: Pt::from_f32(0.75),
    });
    canvas.push(Command::Text {
        x: rect.x + pad,
        y: rect.y + pad + Pt::from_f32(12.0),
        text: title.to_string(),
        style: FontStyle::Bold,
        size: Pt::from_f32(11.0),
        color: ROW_TEXT,
    });
    canvas.push(Command::Text {
        x: rect.x + pad,
        y: rect.y + pad + Pt::from_f32(26.0),
        text: expiry_label.to_string(),
        style: FontStyle::Regular,
        size: Pt::from_f32(block::SMALL_SIZE),
        color: GRAY_TEXT,
    });
    let glyph = Pt::from_f32(block::QR_GLYPH_SIZE);
    draw_image(
        canvas,
        images,
        qr,
        Rect {
            x: rect.x + pad,
            y: rect.y + pad + Pt::from_f32(35.0),
            width: glyph,
            height: glyph,
        },
    );
    canvas.push(Command::Text {
        x: rect.x + pad,
        y: rect.y + pad + Pt::from_f32(35.0) + glyph + Pt::from_f32(12.0),
        text: url.to_string(),
        style: FontStyle::Regular,
        size: Pt::from_f32(block::QR_CAPTION_SIZE),
        color: GRAY_TEXT,
    });
}

fn draw_signature(canvas: &mut Canvas, rect: Rect, name: &str, date_label: &str) {
    let rule_y = rect.y + Pt::from_f32(40.0);
    let rule_width = rect.width.min(Pt::from_f32(200.0));
    canvas.push(Command::Text {
        x: rect.x,
        y: rule_y - Pt::from_f32(5.0),
        text: name.to_string(),
        style: FontStyle::Regular,
        size: Pt::from_f32(block::BODY_SIZE),
        color: ROW_TEXT,
    });
    canvas.push(Command::Line {
        x1: rect.x,
        y1: rule_y,
        x2: rect.x + rule_width,
        y2: rule_y,
        color: ROW_TEXT,
        width: Pt::from_f32(0.75),
    });
    canvas.push(Command::Text {
        x: rect.x,
        y: rule_y + Pt::from_f32(14.0),
        text: format!("Signature - {}", date_label),
        style: FontStyle::Regular,
        size: Pt::from_f32(block::SMALL_SIZE),
        color: GRAY_TEXT,
    });
}

fn draw_page_header(
    canvas: &mut Canvas,
    images: &mut BTreeMap<String, ImageAsset>,
    rect: Rect,
    title: &str,
    subtitle: &str,
    logo_left: &Option<ImageAsset>,
    logo_right: &Option<ImageAsset>,
) {
    let logo_h = Pt::from_f32(34.0);
    let mut text_x = rect.x;
    if let Some(logo) = logo_left {
        let logo_w = logo_width(logo, logo_h);
        draw_image(
            canvas,
            images,
            logo,
            Rect {
                x: rect.x,
                y: rect.y,
                width: logo_w,
                height: logo_h,
            },
        );
        text_x = rect.x + logo_w + Pt::from_f32(10.0);
    }
    if let Some(logo) = logo_right {
        let logo_w = logo_width(logo, logo_h);
        draw_image(
            canvas,
            images,
            logo,
            Rect {
                x: rect.right() - logo_w,
                y: rect.y,
                width: logo_w,
                height: logo_h,
            },
        );
    }
    canvas.push(Command::Text {
        x: text_x,
        y: rect.y + Pt::from_f32(16.0),
        text: title.to_string(),
        style: FontStyle::Bold,
        size: Pt::from_f32(13.0),
        color: ROW_TEXT,
    });
    if !subtitle.is_empty() {
        canvas.push(Command::Text {
            x: text_x,
            y: rect.y + Pt::from_f32(30.0),
            text: subtitle.to_string(),
            style: FontStyle::Regular,
            size: Pt::from_f32(block::SMALL_SIZE),
            color: GRAY_TEXT,
        });
    }
    let rule_y = rect.bottom() - Pt::from_f32(6.0);
    canvas.push(Command::Line {
        x1: rect.x,
        y1: rule_y,
        x2: rect.right(),
        y2: rule_y,
        color: RULE_GRAY,
        width: Pt::from_f32(1.0),
    });
}

fn logo_width(logo: &ImageAsset, height: Pt) -> Pt {
    height
        .mul_ratio(logo.width().max(1) as i32, logo.height().max(1) as i32)
        .min(Pt::from_f32(110.0))
}

fn draw_page_footer(canvas: &mut Canvas, rect: Rect, timestamp: &str, org_line: &str, page_label: &str) {
    canvas.push(Command::Line {
        x1: rect.x,
        y1: rect.y + Pt::from_f32(4.0),
        x2: rect.right(),
        y2: rect.y + Pt::from_f32(4.0),
        color: RULE_GRAY,
        width: Pt::from_f32(1.0),
    });
    let baseline = rect.y + Pt::from_f32(17.0);
    let small = Pt::from_f32(8.5);
    canvas.push(Command::Text {
        x: rect.x,
        y: baseline,
        text: format!("Generated {}", timestamp),
        style: FontStyle::Regular,
        size: small,
        color: GRAY_TEXT,
    });
    if !org_line.is_empty() {
        canvas.push(Command::Text {
            x: rect.x + rect.width.mul_ratio(38, 100),
            y: baseline,
            text: org_line.to_string(),
            style: FontStyle::Regular,
            size: small,
            color: GRAY_TEXT,
        });
    }
    canvas.push(Command::Text {
        x: rect.right() - Pt::from_f32(62.0),
        y: baseline,
        text: page_label.to_string(),
        style: FontStyle::Regular,
        size: small,
        color: GRAY_TEXT,
    });
}

fn write_document(
    pages: &[Page],
    images: &BTreeMap<String, ImageAsset>,
    quality: &RasterQuality,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let f1 = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let f2 = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = Dictionary::new();
    let mut embedded: Vec<String> = Vec::new();
    for (resource_id, asset) in images {
        if let Some((jpeg, width, height)) = encode_jpeg(asset, quality) {
            let stream_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            ));
            xobjects.set(resource_id.as_bytes(), Object::Reference(stream_id));
            embedded.push(resource_id.clone());
        } else {
            log::warn!("dropping undecodable image resource {}", resource_id);
        }
    }

    let mut gstates = Dictionary::new();
    for name in collect_alpha_names(pages) {
        let (gs_name, alpha) = name;
        let gs_id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => alpha,
            "CA" => alpha,
        });
        gstates.set(gs_name.as_bytes(), Object::Reference(gs_id));
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => f1, "F2" => f2 },
        "XObject" => xobjects,
        "ExtGState" => gstates,
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = content_stream(page, &embedded);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(page.size.width.to_f32()),
                Object::Real(page.size.height.to_f32()),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("guardpress"),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|err| ReportError::Sink(format!("pdf serialization: {}", err)))?;
    Ok(out)
}

fn collect_alpha_names(pages: &[Page]) -> Vec<(String, f32)> {
    let mut names: Vec<(String, f32)> = Vec::new();
    for page in pages {
        for command in &page.commands {
            if let Command::SetOpacity(alpha) = command {
                let clamped = alpha.clamp(0.0, 1.0);
                let name = alpha_name(clamped);
                if !names.iter().any(|(n, _)| *n == name) {
                    names.push((name, clamped));
                }
            }
        }
    }
    names
}

fn alpha_name(alpha: f32) -> String {
    format!("GSa{}", (alpha * 1000.0).round() as i32)
}

fn encode_jpeg(asset: &ImageAsset, quality: &RasterQuality) -> Option<(Vec<u8>, u32, u32)> {
    use image::ImageEncoder;

    let decoded = image::load_from_memory(asset.data()).ok()?;
    let decoded = match quality.max_image_dim {
        Some(max) if decoded.width().max(decoded.height()) > max => decoded.thumbnail(max, max),
        _ => decoded,
    };
    let rgb = flatten_onto_white(&decoded);
    let (width, height) = rgb.dimensions();
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.jpeg_quality);
    encoder
        .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .ok()?;
    Some((out, width, height))
}

// JPEG has no alpha; composite transparent pixels over white instead of
// letting them collapse to black.
fn flatten_onto_white(decoded: &image::DynamicImage) -> image::RgbImage {
    if !decoded.color().has_alpha() {
        return decoded.to_rgb8();
    }
    let rgba = decoded.to_rgba8();
    let mut out = image::RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

fn content_stream(page: &Page, embedded: &[String]) -> Vec<u8> {
    let page_height = page.size.height;
    let mut out = String::new();
    for command in &page.commands {
        match command {
            Command::SaveState => out.push_str("q\n"),
            Command::RestoreState => out.push_str("Q\n"),
            Command::SetOpacity(alpha) => {
                out.push_str(&format!("/{} gs\n", alpha_name(alpha.clamp(0.0, 1.0))));
            }
            Command::ClipRect { rect } => {
                out.push_str(&format!(
                    "{} {} {} {} re W n\n",
                    fmt(rect.x),
                    fmt(page_height - rect.bottom()),
                    fmt(rect.width),
                    fmt(rect.height)
                ));
            }
            Command::FillRect { rect, color } => {
                out.push_str(&format!(
                    "{} rg {} {} {} {} re f\n",
                    fmt_color(*color),
                    fmt(rect.x),
                    fmt(page_height - rect.bottom()),
                    fmt(rect.width),
                    fmt(rect.height)
                ));
            }
            Command::StrokeRect { rect, color, width } => {
                out.push_str(&format!(
                    "{} RG {} w {} {} {} {} re S\n",
                    fmt_color(*color),
                    fmt(*width),
                    fmt(rect.x),
                    fmt(page_height - rect.bottom()),
                    fmt(rect.width),
                    fmt(rect.height)
                ));
            }
            Command::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                out.push_str(&format!(
                    "{} RG {} w {} {} m {} {} l S\n",
                    fmt_color(*color),
                    fmt(*width),
                    fmt(*x1),
                    fmt(page_height - *y1),
                    fmt(*x2),
                    fmt(page_height - *y2)
                ));
            }
            Command::Text {
                x,
                y,
                text,
                style,
                size,
                color,
            } => {
                let font = match style {
                    FontStyle::Regular => "F1",
                    FontStyle::Bold => "F2",
                };
                out.push_str(&format!(
                    "BT /{} {} Tf {} rg {} {} Td ({}) Tj ET\n",
                    font,
                    fmt(*size),
                    fmt_color(*color),
                    fmt(*x),
                    fmt(page_height - *y),
                    escape_text(text)
                ));
            }
            Command::Image { resource_id, rect } => {
                if !embedded.iter().any(|id| id == resource_id) {
                    continue;
                }
                out.push_str(&format!(
                    "q {} 0 0 {} {} {} cm /{} Do Q\n",
                    fmt(rect.width),
                    fmt(rect.height),
                    fmt(rect.x),
                    fmt(page_height - rect.bottom()),
                    resource_id
                ));
            }
        }
    }
    out.into_bytes()
}

fn fmt(value: Pt) -> String {
    format!("{:.2}", value.to_f32())
}

fn fmt_color(color: Color) -> String {
    format!("{:.3} {:.3} {:.3}", color.r, color.g, color.b)
}

// WinAnsi string literal: escape the delimiters, replace anything outside
// the printable Latin range.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(ch),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::font::FontRegistry;
    use crate::page::PageConfig;
    use crate::report::{Branding, DayEntry, MetricRow, ReportDocument, ResolvedAssets, SignatureSpec};
    use chrono::{DateTime, NaiveDate, Utc};

    fn generated_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-07T18:30:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    fn png_asset(width: u32, height: u32) -> ImageAsset {
        // patterned pixels so the quality knob actually changes the byte size
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                ((x * 7 + y * 3) % 256) as u8,
                ((x * 13 + y * 5) % 256) as u8,
                ((x + y * 11) % 256) as u8,
            ])
        });
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("encode png");
        ImageAsset::from_bytes(out).expect("asset")
    }

    fn sample_layout() -> LayoutResult {
        let doc = ReportDocument {
            client_name: "Acme".to_string(),
            report_date: NaiveDate::from_ymd_opt(2026, 8, 7).expect("date"),
            branding: Branding::new("Acme - Site 4"),
            metrics: vec![MetricRow::new("Patrols", "42"), MetricRow::new("Incidents", "3")],
            chart: None,
            days: vec![DayEntry {
                day: "Monday".to_string(),
                content: "Quiet shift with two full patrols. ".repeat(30),
                security_code: None,
            }],
            notes: String::new(),
            evidence: Vec::new(),
            signature: SignatureSpec {
                name: "J. Alvarez".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 8, 7).expect("date"),
            },
        };
        let assets = ResolvedAssets {
            chart: Some(png_asset(640, 1800)),
            ..ResolvedAssets::default()
        };
        assemble(&doc, &assets, &PageConfig::default(), &FontRegistry::new(), generated_at())
            .expect("layout")
    }

    #[test]
    fn produces_a_pdf_header_and_image_resources() {
        let layout = sample_layout();
        let bytes = render_pdf(&layout, &RasterQuality::standard()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/XObject"));
        assert!(text.contains("/DCTDecode"));
        assert!(text.contains("/Helvetica"));
    }

    #[test]
    fn page_count_matches_layout() {
        let layout = sample_layout();
        let bytes = render_pdf(&layout, &RasterQuality::standard()).expect("pdf");
        let reloaded = PdfDocument::load_mem(&bytes).expect("parse back");
        assert_eq!(reloaded.get_pages().len() as u32, layout.page_count);
    }

    #[test]
    fn compressed_variant_is_smaller() {
        let layout = sample_layout();
        let standard = render_pdf(&layout, &RasterQuality::standard()).expect("standard");
        let compressed = render_pdf(&layout, &RasterQuality::compressed()).expect("compressed");
        assert!(
            compressed.len() < standard.len(),
            "compressed {} >= standard {}",
            compressed.len(),
            standard.len()
        );
    }

    #[test]
    fn escape_handles_pdf_delimiters() {
        assert_eq!(escape_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_text("caf\u{00e9}"), "caf?");
    }

    #[test]
    fn identical_assets_embed_once() {
        let layout = sample_layout();
        let (_, images) = build_pages(&layout);
        // the chart is sliced across pages but embeds as a single resource
        assert_eq!(images.len(), 1);
    }
}
