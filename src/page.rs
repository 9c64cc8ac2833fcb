use crate::assets::ImageAsset;
use crate::report::MetricRow;
use crate::types::{Color, Margins, Pt, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Immutable page geometry. The body content rectangle excludes the repeating
/// header and footer bands, so synthesized page furniture can never collide
/// with flowed blocks.
#[derive(Debug, Clone, Copy)]
pub struct PageConfig {
    pub page_size: Size,
    pub margins: Margins,
    pub orientation: Orientation,
    pub header_height: Pt,
    pub footer_height: Pt,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all_mm(15.0),
            orientation: Orientation::Portrait,
            header_height: Pt::from_f32(54.0),
            footer_height: Pt::from_f32(30.0),
        }
    }
}

impl PageConfig {
    pub fn effective_size(&self) -> Size {
        match self.orientation {
            Orientation::Portrait => self.page_size,
            Orientation::Landscape => self.page_size.swapped(),
        }
    }

    pub fn content_width(&self) -> Pt {
        let size = self.effective_size();
        size.width - self.margins.left - self.margins.right
    }

    /// Body area between the header and footer bands.
    pub fn content_rect(&self) -> Rect {
        let size = self.effective_size();
        let top = self.margins.top + self.header_height;
        let bottom = size.height - self.margins.bottom - self.footer_height;
        Rect {
            x: self.margins.left,
            y: top,
            width: self.content_width(),
            height: (bottom - top).max(Pt::ZERO),
        }
    }

    pub fn header_rect(&self) -> Rect {
        Rect {
            x: self.margins.left,
            y: self.margins.top,
            width: self.content_width(),
            height: self.header_height,
        }
    }

    pub fn footer_rect(&self) -> Rect {
        let size = self.effective_size();
        Rect {
            x: self.margins.left,
            y: size.height - self.margins.bottom - self.footer_height,
            width: self.content_width(),
            height: self.footer_height,
        }
    }
}

/// Placement refused: the block does not fit in the remaining page height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoesNotFit;

/// The only mutable layout state: current page index and write cursor. Every
/// placer threads this value; nothing else decides where content goes.
#[derive(Debug, Clone)]
pub struct PageState {
    page: u32,
    cursor_y: Pt,
    content: Rect,
}

impl PageState {
    pub fn new(config: &PageConfig) -> Self {
        let content = config.content_rect();
        Self {
            page: 1,
            cursor_y: content.y,
            content,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn cursor_y(&self) -> Pt {
        self.cursor_y
    }

    pub fn content(&self) -> Rect {
        self.content
    }

    pub fn remaining_height(&self) -> Pt {
        (self.content.bottom() - self.cursor_y).max(Pt::ZERO)
    }

    /// True when nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.cursor_y <= self.content.y
    }

    pub fn advance(&mut self, height: Pt) -> Result<(), DoesNotFit> {
        if height > self.remaining_height() {
            return Err(DoesNotFit);
        }
        self.cursor_y += height;
        Ok(())
    }

    /// Forced placement for the overflow tie-break: the cursor may end past
    /// the content bottom.
    pub fn force_advance(&mut self, height: Pt) {
        self.cursor_y += height;
    }

    /// Inter-block spacing; clamped so spacing alone never overruns the page.
    pub fn advance_clamped(&mut self, height: Pt) {
        self.cursor_y = (self.cursor_y + height).min(self.content.bottom().max(self.cursor_y));
    }

    pub fn break_page(&mut self) {
        self.page += 1;
        self.cursor_y = self.content.y;
    }
}

/// Render-ready content: the mirror of `ContentBlock` with every layout
/// decision already taken (wrapped lines, slice offsets, footer labels).
/// Sinks draw these mechanically.
#[derive(Debug, Clone)]
pub enum PlacedContent {
    Heading {
        lines: Vec<String>,
        color: Color,
        font_size: Pt,
        line_height: Pt,
    },
    Paragraph {
        lines: Vec<String>,
        font_size: Pt,
        line_height: Pt,
    },
    Table {
        rows: Vec<MetricRow>,
        header_color: Color,
    },
    /// One vertical window onto an image. `offset_y` is zero or negative:
    /// the asset is drawn shifted up by the height consumed on earlier pages
    /// and clipped to this slice's rect.
    ImageSlice {
        asset: ImageAsset,
        offset_y: Pt,
        full_height: Pt,
    },
    QrEvidence {
        title: String,
        expiry_label: String,
        qr: ImageAsset,
        url: String,
    },
    Signature {
        name: String,
        date_label: String,
    },
    PageHeader {
        title: String,
        subtitle: String,
        logo_left: Option<ImageAsset>,
        logo_right: Option<ImageAsset>,
    },
    PageFooter {
        timestamp: String,
        org_line: String,
        page_label: String,
    },
}

#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub page: u32,
    pub rect: Rect,
    pub content: PlacedContent,
    /// Index into the flattened input list; `None` for synthesized header
    /// and footer placements.
    pub source: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    /// A single block was taller than a full empty page and was force-placed.
    BlockOverflow { source: usize, overflow: Pt },
}

/// The single source of truth both sinks consume. Positions are final;
/// neither sink re-derives a break or a wrap.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub page_size: Size,
    pub content: Rect,
    pub page_count: u32,
    pub placed: Vec<PlacedBlock>,
    pub warnings: Vec<LayoutWarning>,
    pub background: Option<PageBackground>,
}

/// Branding background painted under every page's content by both sinks.
#[derive(Debug, Clone)]
pub struct PageBackground {
    pub asset: ImageAsset,
    pub opacity: f32,
}

impl LayoutResult {
    pub fn blocks_on_page(&self, page: u32) -> impl Iterator<Item = &PlacedBlock> {
        self.placed.iter().filter(move |block| block.page == page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rect_excludes_furniture_bands() {
        let config = PageConfig::default();
        let content = config.content_rect();
        let header = config.header_rect();
        let footer = config.footer_rect();
        assert_eq!(content.y, header.bottom());
        assert_eq!(content.bottom(), footer.y);
        assert!(!content.intersects_vertically(header));
        assert!(!content.intersects_vertically(footer));
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let config = PageConfig {
            orientation: Orientation::Landscape,
            ..PageConfig::default()
        };
        let size = config.effective_size();
        assert!(size.width > size.height);
    }

    #[test]
    fn advance_refuses_overflow() {
        let config = PageConfig::default();
        let mut state = PageState::new(&config);
        let almost_all = state.remaining_height() - Pt::from_i32(10);
        state.advance(almost_all).expect("fits");
        assert_eq!(state.advance(Pt::from_i32(20)), Err(DoesNotFit));
        // cursor unchanged after a refusal
        assert_eq!(state.remaining_height().to_milli_i64(), 10_000);
    }

    #[test]
    fn break_page_resets_cursor_and_increments_index() {
        let config = PageConfig::default();
        let mut state = PageState::new(&config);
        state.advance(Pt::from_i32(100)).expect("fits");
        state.break_page();
        assert_eq!(state.page(), 2);
        assert!(state.at_page_top());
        assert_eq!(state.cursor_y(), config.content_rect().y);
    }

    #[test]
    fn force_advance_may_pass_the_bottom() {
        let config = PageConfig::default();
        let mut state = PageState::new(&config);
        let over = state.remaining_height() + Pt::from_i32(50);
        state.force_advance(over);
        assert_eq!(state.remaining_height(), Pt::ZERO);
        assert!(state.cursor_y() > config.content_rect().bottom());
    }
}
