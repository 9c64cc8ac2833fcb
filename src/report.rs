use crate::assets::{ImageAsset, ImageSource};
use crate::block::ContentBlock;
use crate::types::Color;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One label/value pair of the metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

impl MetricRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Branding handed over by the client/theme UI. Logos and background are
/// optional; colors default to the stock report theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branding {
    pub title: String,
    pub subtitle: String,
    pub org_line: String,
    pub accent: Color,
    pub table_header: Color,
    pub logo_left: Option<ImageSource>,
    pub logo_right: Option<ImageSource>,
    pub background: Option<BackgroundSpec>,
}

impl Branding {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            org_line: String::new(),
            accent: Color::rgb8(30, 58, 95),
            table_header: Color::rgb8(30, 58, 95),
            logo_left: None,
            logo_right: None,
            background: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundSpec {
    pub source: ImageSource,
    pub opacity: f32,
}

/// One day of free-text activity. The security code, when present, is folded
/// into the day heading so an entry stays exactly one heading/paragraph pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: String,
    pub content: String,
    pub security_code: Option<String>,
}

impl DayEntry {
    pub(crate) fn heading_text(&self) -> String {
        match &self.security_code {
            Some(code) => format!("{} - Code {}", self.day, code),
            None => self.day.clone(),
        }
    }
}

/// A video-evidence pointer. The QR glyph is generated by a collaborator
/// from `target_url`; the engine only places it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub title: String,
    pub expires_at: DateTime<Utc>,
    pub target_url: String,
    pub qr: ImageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSpec {
    pub name: String,
    pub date: NaiveDate,
}

/// The immutable input snapshot for one generation pass. Built fresh from UI
/// state by the caller, consumed once, never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub client_name: String,
    pub report_date: NaiveDate,
    pub branding: Branding,
    pub metrics: Vec<MetricRow>,
    pub chart: Option<ImageSource>,
    pub days: Vec<DayEntry>,
    pub notes: String,
    pub evidence: Vec<EvidenceItem>,
    pub signature: SignatureSpec,
}

/// Every image slot of the document, resolved ahead of layout so the
/// assembler stays synchronous and pure.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    pub logo_left: Option<ImageAsset>,
    pub logo_right: Option<ImageAsset>,
    pub background: Option<ImageAsset>,
    pub chart: Option<ImageAsset>,
    pub evidence_qr: Vec<ImageAsset>,
}

impl ReportDocument {
    /// Flatten the sections into the canonical block order: lead heading,
    /// metrics table, chart image, per-day heading/paragraph pairs, notes,
    /// evidence items, signature. The repeating header/footer are *not* part
    /// of this list; the assembler synthesizes them per page.
    pub(crate) fn flatten(&self, assets: &ResolvedAssets) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();

        if !self.branding.title.trim().is_empty() {
            blocks.push(ContentBlock::Heading {
                text: self.branding.title.clone(),
                color: self.branding.accent,
            });
        }

        if !self.metrics.is_empty() {
            blocks.push(ContentBlock::Table {
                rows: self.metrics.clone(),
                header_color: self.branding.table_header,
            });
        }

        if let Some(chart) = &assets.chart {
            blocks.push(ContentBlock::Image {
                asset: chart.clone(),
            });
        }

        for day in &self.days {
            blocks.push(ContentBlock::Heading {
                text: day.heading_text(),
                color: self.branding.accent,
            });
            blocks.push(ContentBlock::Paragraph {
                text: day.content.clone(),
            });
        }

        if !self.notes.trim().is_empty() {
            blocks.push(ContentBlock::Heading {
                text: "Compliance Notes".to_string(),
                color: self.branding.accent,
            });
            blocks.push(ContentBlock::Paragraph {
                text: self.notes.clone(),
            });
        }

        for (index, item) in self.evidence.iter().enumerate() {
            let qr = assets
                .evidence_qr
                .get(index)
                .cloned()
                .unwrap_or_else(ImageAsset::placeholder);
            blocks.push(ContentBlock::QrEvidence {
                title: item.title.clone(),
                expires_at: item.expires_at,
                qr,
                url: item.target_url.clone(),
            });
        }

        if !self.signature.name.trim().is_empty() {
            blocks.push(ContentBlock::Signature {
                name: self.signature.name.clone(),
                date: self.signature.date,
            });
        }

        blocks
    }
}
