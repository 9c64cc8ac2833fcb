mod assemble;
mod assets;
mod block;
mod canvas;
mod error;
mod export;
mod font;
mod page;
mod pdf;
mod preview;
mod readiness;
mod report;
mod text;
mod types;

pub use assemble::assemble;
pub use assets::{ImageAsset, ImageSource};
pub use block::ContentBlock;
pub use canvas::{Canvas, Command, Page};
pub use error::ReportError;
pub use export::{ExportArtifact, ExportMode, GenerationGuard, report_filename};
pub use font::{FontRegistry, FontStyle};
pub use page::{
    LayoutResult, LayoutWarning, Orientation, PageBackground, PageConfig, PageState, PlacedBlock,
    PlacedContent,
};
pub use pdf::{RasterQuality, render_pdf};
pub use preview::{PreviewBlock, PreviewDocument, PreviewPage, render_preview};
pub use readiness::{ReadinessGate, ReadinessOutcome, SurfaceSnapshot, VisualSurface};
pub use report::{
    BackgroundSpec, Branding, DayEntry, EvidenceItem, MetricRow, ReportDocument, ResolvedAssets,
    SignatureSpec,
};
pub use text::{WrappedText, wrap};
pub use types::{Color, Margins, Pt, Rect, Size};

use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;

/// Everything one generation pass returns: the single layout both sinks
/// consumed, the downloadable document(s), the on-screen preview, and the
/// readiness diagnostic when a gate ran.
#[derive(Debug)]
pub struct GenerationOutput {
    pub layout: LayoutResult,
    pub documents: Vec<ExportArtifact>,
    pub preview: PreviewDocument,
    pub readiness: Option<ReadinessOutcome>,
}

/// Outcome of a trigger-style generation request.
#[derive(Debug)]
pub enum Trigger {
    Completed(Box<GenerationOutput>),
    /// A pass was already in flight or inside the cooldown; nothing ran.
    Coalesced,
}

/// The engine façade: owns the page geometry, fonts, readiness gate and
/// regeneration guard. One instance serves many documents; each generation
/// pass is an independent pure transform.
pub struct ReportEngine {
    config: PageConfig,
    fonts: FontRegistry,
    gate: ReadinessGate,
    guard: GenerationGuard,
    mode: ExportMode,
    asset_timeout: Duration,
    standard_quality: RasterQuality,
    compressed_quality: RasterQuality,
}

impl ReportEngine {
    pub fn builder() -> ReportEngineBuilder {
        ReportEngineBuilder::new()
    }

    /// Full pipeline: resolve assets, assemble once, render both sinks.
    pub async fn generate(&self, doc: &ReportDocument) -> Result<GenerationOutput, ReportError> {
        self.run(doc, None).await
    }

    /// Wait for the external visual surface first, then generate. A timed-out
    /// gate is not a failure; the outcome is attached as a diagnostic.
    pub async fn generate_when_ready(
        &self,
        doc: &ReportDocument,
        surface: &mut impl VisualSurface,
    ) -> Result<GenerationOutput, ReportError> {
        let outcome = self.gate.wait(surface).await;
        self.run(doc, Some(outcome)).await
    }

    /// Trigger-style entry for UI event handlers: coalesces while a pass is
    /// in flight or the cooldown has not elapsed.
    pub async fn request_generation(
        &self,
        doc: &ReportDocument,
    ) -> Result<Trigger, ReportError> {
        let Some(_permit) = self.guard.try_begin() else {
            log::debug!("generation trigger coalesced");
            return Ok(Trigger::Coalesced);
        };
        let output = self.run(doc, None).await?;
        Ok(Trigger::Completed(Box::new(output)))
    }

    async fn run(
        &self,
        doc: &ReportDocument,
        readiness: Option<ReadinessOutcome>,
    ) -> Result<GenerationOutput, ReportError> {
        let assets = self.resolve_assets(doc).await;
        let layout = assemble(doc, &assets, &self.config, &self.fonts, Utc::now())?;
        let preview = render_preview(&layout);
        let documents = self.render_documents(doc, &layout)?;
        Ok(GenerationOutput {
            layout,
            documents,
            preview,
            readiness,
        })
    }

    async fn resolve_assets(&self, doc: &ReportDocument) -> ResolvedAssets {
        let timeout = self.asset_timeout;
        let logo_left = load_optional(doc.branding.logo_left.as_ref(), timeout).await;
        let logo_right = load_optional(doc.branding.logo_right.as_ref(), timeout).await;
        let background = load_optional(
            doc.branding.background.as_ref().map(|spec| &spec.source),
            timeout,
        )
        .await;
        let chart = load_optional(doc.chart.as_ref(), timeout).await;
        let mut evidence_qr = Vec::with_capacity(doc.evidence.len());
        for item in &doc.evidence {
            evidence_qr.push(assets::resolve_with_timeout(item.qr.clone(), timeout).await);
        }

        ResolvedAssets {
            logo_left,
            logo_right,
            background,
            chart,
            evidence_qr,
        }
    }

    fn render_documents(
        &self,
        doc: &ReportDocument,
        layout: &LayoutResult,
    ) -> Result<Vec<ExportArtifact>, ReportError> {
        let artifact = |bytes: Vec<u8>, compressed: bool| ExportArtifact {
            filename: report_filename(&doc.client_name, doc.report_date, compressed),
            bytes,
            compressed,
        };
        match self.mode {
            ExportMode::Standard => {
                let bytes = render_pdf(layout, &self.standard_quality)?;
                Ok(vec![artifact(bytes, false)])
            }
            ExportMode::Compressed => {
                let bytes = render_pdf(layout, &self.compressed_quality)?;
                Ok(vec![artifact(bytes, true)])
            }
            ExportMode::Both => {
                // one layout, two raster qualities
                let (standard, compressed) = rayon::join(
                    || render_pdf(layout, &self.standard_quality),
                    || render_pdf(layout, &self.compressed_quality),
                );
                Ok(vec![artifact(standard?, false), artifact(compressed?, true)])
            }
        }
    }
}

async fn load_optional(source: Option<&ImageSource>, timeout: Duration) -> Option<ImageAsset> {
    match source {
        Some(source) => Some(assets::resolve_with_timeout(source.clone(), timeout).await),
        None => None,
    }
}

pub struct ReportEngineBuilder {
    config: PageConfig,
    font_files: Vec<(FontStyle, PathBuf)>,
    gate: ReadinessGate,
    cooldown: Duration,
    mode: ExportMode,
    asset_timeout: Duration,
    standard_quality: RasterQuality,
    compressed_quality: RasterQuality,
}

impl Default for ReportEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: PageConfig::default(),
            font_files: Vec::new(),
            gate: ReadinessGate::default(),
            cooldown: Duration::from_secs(2),
            mode: ExportMode::default(),
            asset_timeout: Duration::from_secs(5),
            standard_quality: RasterQuality::standard(),
            compressed_quality: RasterQuality::compressed(),
        }
    }

    pub fn page_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn register_font_file(mut self, style: FontStyle, path: impl Into<PathBuf>) -> Self {
        self.font_files.push((style, path.into()));
        self
    }

    pub fn readiness_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn export_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn asset_timeout(mut self, timeout: Duration) -> Self {
        self.asset_timeout = timeout;
        self
    }

    pub fn raster_qualities(mut self, standard: RasterQuality, compressed: RasterQuality) -> Self {
        self.standard_quality = standard;
        self.compressed_quality = compressed;
        self
    }

    pub fn build(self) -> Result<ReportEngine, ReportError> {
        if !self.config.content_rect().height.is_positive() {
            return Err(ReportError::InvalidConfiguration(
                "margins and furniture bands leave no content height".to_string(),
            ));
        }
        let mut fonts = FontRegistry::new();
        for (style, path) in &self.font_files {
            fonts.register_font_file(*style, path)?;
        }
        Ok(ReportEngine {
            config: self.config,
            fonts,
            gate: self.gate,
            guard: GenerationGuard::new(self.cooldown),
            mode: self.mode,
            asset_timeout: self.asset_timeout,
            standard_quality: self.standard_quality,
            compressed_quality: self.compressed_quality,
        })
    }
}
