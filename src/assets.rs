use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where an image comes from. The UI hands over whichever form it has;
/// resolution normalizes all of them into an [`ImageAsset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    File(PathBuf),
    DataUrl(String),
}

/// A decoded, measured image. `data` keeps the original encoded bytes; the
/// sinks decode on demand. Identical bytes share a fingerprint so the PDF
/// sink embeds them once.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    fingerprint: [u8; 8],
    placeholder: bool,
}

// Placeholder keeps the default 4:3 aspect the reports assume for charts.
const PLACEHOLDER_WIDTH: u32 = 600;
const PLACEHOLDER_HEIGHT: u32 = 450;

impl ImageAsset {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, String> {
        let (width, height) = image::load_from_memory(&data)
            .map(|img| (img.width(), img.height()))
            .map_err(|err| format!("undecodable image: {}", err))?;
        if width == 0 || height == 0 {
            return Err("image has a zero dimension".to_string());
        }
        let fingerprint = fingerprint(&data);
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            fingerprint,
            placeholder: false,
        })
    }

    /// The gray crossed box substituted when a source cannot be loaded in
    /// time. Layout continues with a known aspect ratio instead of failing
    /// the generation.
    pub fn placeholder() -> Self {
        let data = placeholder_png().unwrap_or_default();
        let fingerprint = fingerprint(&data);
        Self {
            data: Arc::new(data),
            width: PLACEHOLDER_WIDTH,
            height: PLACEHOLDER_HEIGHT,
            fingerprint,
            placeholder: true,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn resource_id(&self) -> String {
        let mut id = String::with_capacity(18);
        id.push_str("Im");
        for byte in self.fingerprint {
            id.push_str(&format!("{:02x}", byte));
        }
        id
    }

    /// Height after scaling the natural size to `width`, preserving aspect.
    pub fn scaled_height(&self, width: crate::types::Pt) -> crate::types::Pt {
        width.mul_ratio(self.height as i32, self.width.max(1) as i32)
    }
}

fn fingerprint(data: &[u8]) -> [u8; 8] {
    let digest = Sha256::digest(data);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    prefix
}

fn placeholder_png() -> Option<Vec<u8>> {
    let mut pixmap = tiny_skia::Pixmap::new(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT)?;
    pixmap.fill(tiny_skia::Color::from_rgba8(229, 231, 235, 255));

    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(156, 163, 175, 255);
    paint.anti_alias = true;

    let w = PLACEHOLDER_WIDTH as f32;
    let h = PLACEHOLDER_HEIGHT as f32;
    let mut pb = tiny_skia::PathBuilder::new();
    pb.move_to(0.0, 0.0);
    pb.line_to(w, h);
    pb.move_to(w, 0.0);
    pb.line_to(0.0, h);
    pb.push_rect(tiny_skia::Rect::from_xywh(2.0, 2.0, w - 4.0, h - 4.0)?);
    let path = pb.finish()?;

    let stroke = tiny_skia::Stroke {
        width: 4.0,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, tiny_skia::Transform::identity(), None);
    pixmap.encode_png().ok()
}

/// Resolve a source into a decoded asset. Never fails: a broken source logs
/// a warning and yields the placeholder, per the recovery policy.
pub fn resolve(source: &ImageSource) -> ImageAsset {
    let bytes = match source {
        ImageSource::Bytes(data) => Ok(data.clone()),
        ImageSource::File(path) => {
            std::fs::read(path).map_err(|err| format!("read {}: {}", path.display(), err))
        }
        ImageSource::DataUrl(url) => decode_data_url(url),
    };
    match bytes.and_then(ImageAsset::from_bytes) {
        Ok(asset) => asset,
        Err(reason) => {
            log::warn!("image asset unavailable, substituting placeholder: {}", reason);
            ImageAsset::placeholder()
        }
    }
}

/// Bounded asset load: decode happens off the async thread and is abandoned
/// at the timeout, yielding the placeholder instead of blocking generation.
pub async fn resolve_with_timeout(source: ImageSource, timeout: Duration) -> ImageAsset {
    let load = tokio::task::spawn_blocking(move || resolve(&source));
    match tokio::time::timeout(timeout, load).await {
        Ok(Ok(asset)) => asset,
        Ok(Err(join_err)) => {
            log::warn!("asset load task failed: {}", join_err);
            ImageAsset::placeholder()
        }
        Err(_elapsed) => {
            log::warn!("asset load timed out after {:?}, substituting placeholder", timeout);
            ImageAsset::placeholder()
        }
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, String> {
    let payload = url
        .split_once("base64,")
        .map(|(_, tail)| tail)
        .ok_or_else(|| "data url without base64 payload".to_string())?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| format!("base64 decode: {}", err))
}
