use crate::assets::ImageAsset;
use crate::block;
use crate::page::{LayoutResult, PlacedContent};
use crate::types::{Color, Pt, Rect, Size};
use base64::Engine;

/// The on-screen rendering of one layout: N same-size page containers with
/// absolutely positioned fragments. Pure consumer of `LayoutResult`; it
/// renders pre-wrapped lines and pre-computed rects, nothing else.
#[derive(Debug, Clone)]
pub struct PreviewDocument {
    pub page_size: Size,
    pub pages: Vec<PreviewPage>,
}

#[derive(Debug, Clone)]
pub struct PreviewPage {
    pub number: u32,
    pub blocks: Vec<PreviewBlock>,
}

/// One absolutely positioned fragment inside a page container.
#[derive(Debug, Clone)]
pub struct PreviewBlock {
    pub rect: Rect,
    pub html: String,
}

impl PreviewDocument {
    /// Markup for a single page container, for the preview's paging controls.
    pub fn page_html(&self, number: u32) -> Option<String> {
        self.pages
            .iter()
            .find(|page| page.number == number)
            .map(|page| self.container_html(page))
    }

    /// All pages stacked, for the "full document" preview mode.
    pub fn to_html(&self) -> String {
        let mut out = String::from(
            "<div class=\"report-preview\" style=\"display:flex;flex-direction:column;gap:16px\">\n",
        );
        for page in &self.pages {
            out.push_str(&self.container_html(page));
            out.push('\n');
        }
        out.push_str("</div>");
        out
    }

    fn container_html(&self, page: &PreviewPage) -> String {
        let mut out = format!(
            "<div class=\"report-page\" data-page=\"{}\" style=\"position:relative;overflow:hidden;\
             background:#fff;width:{:.2}pt;height:{:.2}pt;font-family:Helvetica,Arial,sans-serif\">",
            page.number,
            self.page_size.width.to_f32(),
            self.page_size.height.to_f32()
        );
        for block in &page.blocks {
            out.push_str(&block.html);
        }
        out.push_str("</div>");
        out
    }
}

pub fn render_preview(layout: &LayoutResult) -> PreviewDocument {
    let mut pages = Vec::with_capacity(layout.page_count as usize);
    for number in 1..=layout.page_count {
        let mut blocks = Vec::new();
        if let Some(background) = &layout.background {
            let rect = Rect {
                x: Pt::ZERO,
                y: Pt::ZERO,
                width: layout.page_size.width,
                height: layout.page_size.height,
            };
            blocks.push(PreviewBlock {
                rect,
                html: format!(
                    "<img src=\"{}\" style=\"{};opacity:{:.3};object-fit:cover\" alt=\"\">",
                    data_url(&background.asset),
                    abs_style(rect),
                    background.opacity.clamp(0.0, 1.0)
                ),
            });
        }
        for placed in layout.blocks_on_page(number) {
            blocks.push(PreviewBlock {
                rect: placed.rect,
                html: block_html(&placed.content, placed.rect),
            });
        }
        pages.push(PreviewPage { number, blocks });
    }
    PreviewDocument {
        page_size: layout.page_size,
        pages,
    }
}

fn abs_style(rect: Rect) -> String {
    format!(
        "position:absolute;left:{:.2}pt;top:{:.2}pt;width:{:.2}pt;height:{:.2}pt",
        rect.x.to_f32(),
        rect.y.to_f32(),
        rect.width.to_f32(),
        rect.height.to_f32()
    )
}

fn text_lines_html(lines: &[String], font_size: Pt, line_height: Pt, weight: &str, color: &str) -> String {
    let mut out = format!(
        "<div style=\"font-size:{:.2}pt;line-height:{:.2}pt;font-weight:{};color:{};white-space:pre\">",
        font_size.to_f32(),
        line_height.to_f32(),
        weight,
        color
    );
    for line in lines {
        if line.is_empty() {
            out.push_str("<div>&nbsp;</div>");
        } else {
            out.push_str(&format!("<div>{}</div>", escape_html(line)));
        }
    }
    out.push_str("</div>");
    out
}

fn block_html(content: &PlacedContent, rect: Rect) -> String {
    match content {
        PlacedContent::Heading {
            lines,
            color,
            font_size,
            line_height,
        } => format!(
            "<div style=\"{}\">{}</div>",
            abs_style(rect),
            text_lines_html(lines, *font_size, *line_height, "bold", &color.to_css())
        ),
        PlacedContent::Paragraph {
            lines,
            font_size,
            line_height,
        } => format!(
            "<div style=\"{}\">{}</div>",
            abs_style(rect),
            text_lines_html(lines, *font_size, *line_height, "normal", "rgb(31, 41, 56)")
        ),
        PlacedContent::Table { rows, header_color } => table_html(rect, rows, *header_color),
        PlacedContent::ImageSlice {
            asset,
            offset_y,
            full_height,
        } => format!(
            "<div style=\"{};overflow:hidden\"><img src=\"{}\" style=\"position:absolute;\
             left:0;top:{:.2}pt;width:{:.2}pt;height:{:.2}pt\" alt=\"\"></div>",
            abs_style(rect),
            data_url(asset),
            offset_y.to_f32(),
            rect.width.to_f32(),
            full_height.to_f32()
        ),
        PlacedContent::QrEvidence {
            title,
            expiry_label,
            qr,
            url,
        } => format!(
            "<div style=\"{};border:0.75pt solid rgb(209,214,219);box-sizing:border-box;padding:8pt\">\
             <div style=\"font-size:11pt;font-weight:bold;color:rgb(31,41,56)\">{}</div>\
             <div style=\"font-size:{}pt;color:rgb(107,114,128)\">{}</div>\
             <img src=\"{}\" style=\"width:{}pt;height:{}pt;margin-top:6pt\" alt=\"QR\">\
             <div style=\"font-size:{}pt;color:rgb(107,114,128)\">{}</div></div>",
            abs_style(rect),
            escape_html(title),
            block::SMALL_SIZE,
            escape_html(expiry_label),
            data_url(qr),
            block::QR_GLYPH_SIZE,
            block::QR_GLYPH_SIZE,
            block::QR_CAPTION_SIZE,
            escape_html(url)
        ),
        PlacedContent::Signature { name, date_label } => format!(
            "<div style=\"{}\"><div style=\"font-size:{}pt;color:rgb(31,41,56);margin-top:24pt\">{}</div>\
             <div style=\"border-top:0.75pt solid rgb(31,41,56);width:200pt\"></div>\
             <div style=\"font-size:{}pt;color:rgb(107,114,128)\">Signature - {}</div></div>",
            abs_style(rect),
            block::BODY_SIZE,
            escape_html(name),
            block::SMALL_SIZE,
            escape_html(date_label)
        ),
        PlacedContent::PageHeader {
            title,
            subtitle,
            logo_left,
            logo_right,
        } => {
            let mut inner = String::new();
            if let Some(logo) = logo_left {
                inner.push_str(&format!(
                    "<img src=\"{}\" style=\"height:34pt\" alt=\"logo\">",
                    data_url(logo)
                ));
            }
            inner.push_str(&format!(
                "<div style=\"margin-left:10pt\"><div style=\"font-size:13pt;font-weight:bold;\
                 color:rgb(31,41,56)\">{}</div><div style=\"font-size:{}pt;\
                 color:rgb(107,114,128)\">{}</div></div>",
                escape_html(title),
                block::SMALL_SIZE,
                escape_html(subtitle)
            ));
            if let Some(logo) = logo_right {
                inner.push_str(&format!(
                    "<img src=\"{}\" style=\"height:34pt;margin-left:auto\" alt=\"logo\">",
                    data_url(logo)
                ));
            }
            format!(
                "<div style=\"{};display:flex;align-items:flex-start;\
                 border-bottom:1pt solid rgb(209,214,219)\">{}</div>",
                abs_style(rect),
                inner
            )
        }
        PlacedContent::PageFooter {
            timestamp,
            org_line,
            page_label,
        } => format!(
            "<div style=\"{};display:flex;justify-content:space-between;align-items:center;\
             border-top:1pt solid rgb(209,214,219);font-size:8.5pt;color:rgb(107,114,128)\">\
             <span>Generated {}</span><span>{}</span><span>{}</span></div>",
            abs_style(rect),
            escape_html(timestamp),
            escape_html(org_line),
            escape_html(page_label)
        ),
    }
}

fn table_html(rect: Rect, rows: &[crate::report::MetricRow], header_color: Color) -> String {
    let mut out = format!(
        "<div style=\"{};font-size:{}pt\">",
        abs_style(rect),
        block::TABLE_FONT_SIZE
    );
    out.push_str(&format!(
        "<div style=\"height:{}pt;background:{};color:#fff;font-weight:bold;display:flex;\
         align-items:center\"><span style=\"padding-left:8pt;width:62%\">Metric</span>\
         <span>Value</span></div>",
        block::TABLE_HEADER_HEIGHT,
        header_color.to_css()
    ));
    for (i, row) in rows.iter().enumerate() {
        let zebra = if i % 2 == 1 {
            "background:rgb(243,244,246);"
        } else {
            ""
        };
        out.push_str(&format!(
            "<div style=\"height:{}pt;{}display:flex;align-items:center;color:rgb(31,41,56)\">\
             <span style=\"padding-left:8pt;width:62%\">{}</span><span>{}</span></div>",
            block::TABLE_ROW_HEIGHT,
            zebra,
            escape_html(&row.label),
            escape_html(&row.value)
        ));
    }
    out.push_str("</div>");
    out
}

fn data_url(asset: &ImageAsset) -> String {
    let mime = match image::guess_format(asset.data()) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "image/png",
    };
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(asset.data())
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
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

    fn sample_layout() -> LayoutResult {
        let doc = ReportDocument {
            client_name: "Acme".to_string(),
            report_date: NaiveDate::from_ymd_opt(2026, 8, 7).expect("date"),
            branding: Branding::new("Acme <Night & Day>"),
            metrics: vec![MetricRow::new("Patrols", "42")],
            chart: None,
            days: (0..6)
                .map(|i| DayEntry {
                    day: format!("Day {}", i + 1),
                    content: "Walked the yard and checked all seals. ".repeat(40),
                    security_code: None,
                })
                .collect(),
            notes: String::new(),
            evidence: Vec::new(),
            signature: SignatureSpec {
                name: "J. Alvarez".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 8, 7).expect("date"),
            },
        };
        let generated_at = DateTime::parse_from_rfc3339("2026-08-07T18:30:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        assemble(
            &doc,
            &ResolvedAssets::default(),
            &PageConfig::default(),
            &FontRegistry::new(),
            generated_at,
        )
        .expect("layout")
    }

    #[test]
    fn one_container_per_layout_page() {
        let layout = sample_layout();
        let preview = render_preview(&layout);
        assert_eq!(preview.pages.len(), layout.page_count as usize);
        let html = preview.to_html();
        for page in 1..=layout.page_count {
            assert!(html.contains(&format!("data-page=\"{}\"", page)));
        }
    }

    #[test]
    fn blocks_keep_their_layout_positions() {
        let layout = sample_layout();
        let preview = render_preview(&layout);
        let first_content = layout
            .placed
            .iter()
            .find(|p| p.source.is_some())
            .expect("content block");
        let page = &preview.pages[(first_content.page - 1) as usize];
        assert!(
            page.blocks.iter().any(|b| b.rect == first_content.rect),
            "preview lost a block rect"
        );
        let html = preview.page_html(first_content.page).expect("page html");
        assert!(html.contains(&format!("top:{:.2}pt", first_content.rect.y.to_f32())));
    }

    #[test]
    fn page_html_is_per_page_and_bounded() {
        let layout = sample_layout();
        let preview = render_preview(&layout);
        assert!(preview.page_html(1).is_some());
        assert!(preview.page_html(layout.page_count + 1).is_none());
    }

    #[test]
    fn titles_are_escaped() {
        let layout = sample_layout();
        let preview = render_preview(&layout);
        let html = preview.to_html();
        assert!(html.contains("Acme &lt;Night &amp; Day&gt;"));
        assert!(!html.contains("<Night"));
    }

    #[test]
    fn footer_page_labels_render() {
        let layout = sample_layout();
        let preview = render_preview(&layout);
        let html = preview.to_html();
        assert!(html.contains(&format!("Page 1 of {}", layout.page_count)));
    }
}
