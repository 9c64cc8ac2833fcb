use crate::assets::ImageAsset;
use crate::block::{self, ContentBlock};
use crate::error::ReportError;
use crate::font::{FontRegistry, FontStyle};
use crate::page::{
    LayoutResult, LayoutWarning, PageBackground, PageConfig, PageState, PlacedBlock, PlacedContent,
};
use crate::report::{ReportDocument, ResolvedAssets};
use crate::text;
use crate::types::{Pt, Rect};
use chrono::{DateTime, Utc};

/// Flatten the document, run the page/cursor machine over every block, then
/// synthesize one header and one footer placement per page. This is the only
/// place a break or wrap decision is made; both sinks replay the result.
pub fn assemble(
    doc: &ReportDocument,
    assets: &ResolvedAssets,
    config: &PageConfig,
    fonts: &FontRegistry,
    generated_at: DateTime<Utc>,
) -> Result<LayoutResult, ReportError> {
    let blocks = doc.flatten(assets);
    if blocks.is_empty() {
        return Err(ReportError::EmptyDocument);
    }

    let mut state = PageState::new(config);
    let mut placed = Vec::new();
    let mut warnings = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        match block {
            ContentBlock::Image { asset } => {
                place_image(&mut state, &mut placed, index, asset);
            }
            _ => place_atomic(&mut state, &mut placed, &mut warnings, index, block, fonts),
        }
        state.advance_clamped(block.spacing_after());
    }

    let page_count = state.page();
    synthesize_furniture(doc, assets, config, &mut placed, page_count, generated_at);

    Ok(LayoutResult {
        page_size: config.effective_size(),
        content: config.content_rect(),
        page_count,
        placed,
        warnings,
        background: assets.background.as_ref().map(|asset| PageBackground {
            asset: asset.clone(),
            opacity: doc
                .branding
                .background
                .as_ref()
                .map(|spec| spec.opacity.clamp(0.0, 1.0))
                .unwrap_or(1.0),
        }),
    })
}

/// The central break decision: measure, place if it fits, otherwise break
/// once and retry. A block taller than a full empty page is force-placed at
/// the content top with a non-fatal warning; content is never dropped.
fn place_atomic(
    state: &mut PageState,
    placed: &mut Vec<PlacedBlock>,
    warnings: &mut Vec<LayoutWarning>,
    index: usize,
    block: &ContentBlock,
    fonts: &FontRegistry,
) {
    let width = state.content().width;
    let height = block.measure(width, fonts);

    if height > state.remaining_height() && !state.at_page_top() {
        state.break_page();
    }

    let rect = Rect {
        x: state.content().x,
        y: state.cursor_y(),
        width,
        height,
    };
    if state.advance(height).is_ok() {
        placed.push(PlacedBlock {
            page: state.page(),
            rect,
            content: resolve_content(block, width, fonts),
            source: Some(index),
        });
        return;
    }

    // taller than one full page and not splittable
    let overflow = height - state.remaining_height();
    log::warn!(
        "block {} overflows an empty page by {:.1}pt; placing anyway",
        index,
        overflow.to_f32()
    );
    warnings.push(LayoutWarning::BlockOverflow {
        source: index,
        overflow,
    });
    state.force_advance(height);
    placed.push(PlacedBlock {
        page: state.page(),
        rect,
        content: resolve_content(block, width, fonts),
        source: Some(index),
    });
}

/// Images scroll across pages: each slice redraws the same asset shifted up
/// by the height already consumed, clipped to the slice rect. From a fresh
/// page this yields exactly `ceil(scaled_height / content_height)` slices.
fn place_image(
    state: &mut PageState,
    placed: &mut Vec<PlacedBlock>,
    index: usize,
    asset: &ImageAsset,
) {
    let width = state.content().width;
    let full_height = asset.scaled_height(width);

    if !state.remaining_height().is_positive() {
        state.break_page();
    }

    let mut consumed = Pt::ZERO;
    loop {
        let left = full_height - consumed;
        let available = state.remaining_height();
        let slice_height = left.min(available);
        placed.push(PlacedBlock {
            page: state.page(),
            rect: Rect {
                x: state.content().x,
                y: state.cursor_y(),
                width,
                height: slice_height,
            },
            content: PlacedContent::ImageSlice {
                asset: asset.clone(),
                offset_y: -consumed,
                full_height,
            },
            source: Some(index),
        });
        if left <= available {
            // final slice
            let _ = state.advance(slice_height);
            return;
        }
        consumed += available;
        state.break_page();
    }
}

fn resolve_content(block: &ContentBlock, width: Pt, fonts: &FontRegistry) -> PlacedContent {
    match block {
        ContentBlock::Heading { text, color } => {
            let size = Pt::from_f32(block::HEADING_SIZE);
            let wrapped = text::wrap(text, width, size, FontStyle::Bold, fonts);
            PlacedContent::Heading {
                lines: wrapped.lines,
                color: *color,
                font_size: size,
                line_height: wrapped.line_height,
            }
        }
        ContentBlock::Paragraph { text } => {
            let size = Pt::from_f32(block::BODY_SIZE);
            let wrapped = text::wrap(text, width, size, FontStyle::Regular, fonts);
            PlacedContent::Paragraph {
                lines: wrapped.lines,
                font_size: size,
                line_height: wrapped.line_height,
            }
        }
        ContentBlock::Table { rows, header_color } => PlacedContent::Table {
            rows: rows.clone(),
            header_color: *header_color,
        },
        ContentBlock::QrEvidence {
            title,
            expires_at,
            qr,
            url,
        } => PlacedContent::QrEvidence {
            title: title.clone(),
            expiry_label: format!("Expires {}", expires_at.format("%Y-%m-%d %H:%M UTC")),
            qr: qr.clone(),
            url: url.clone(),
        },
        ContentBlock::Signature { name, date } => PlacedContent::Signature {
            name: name.clone(),
            date_label: date.format("%Y-%m-%d").to_string(),
        },
        // images never reach resolve_content
        ContentBlock::Image { asset } => PlacedContent::ImageSlice {
            asset: asset.clone(),
            offset_y: Pt::ZERO,
            full_height: asset.scaled_height(width),
        },
    }
}

/// One repeating header and footer per page, added after the page count is
/// known. These are furniture, not input blocks; `source` stays `None`.
fn synthesize_furniture(
    doc: &ReportDocument,
    assets: &ResolvedAssets,
    config: &PageConfig,
    placed: &mut Vec<PlacedBlock>,
    page_count: u32,
    generated_at: DateTime<Utc>,
) {
    let timestamp = generated_at.format("%Y-%m-%d %H:%M UTC").to_string();
    for page in 1..=page_count {
        placed.push(PlacedBlock {
            page,
            rect: config.header_rect(),
            content: PlacedContent::PageHeader {
                title: doc.branding.title.clone(),
                subtitle: doc.branding.subtitle.clone(),
                logo_left: assets.logo_left.clone(),
                logo_right: assets.logo_right.clone(),
            },
            source: None,
        });
        placed.push(PlacedBlock {
            page,
            rect: config.footer_rect(),
            content: PlacedContent::PageFooter {
                timestamp: timestamp.clone(),
                org_line: doc.branding.org_line.clone(),
                page_label: format!("Page {} of {}", page, page_count),
            },
            source: None,
        });
    }
}
