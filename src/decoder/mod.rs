//! Multi-strategy barcode extraction from photographed labels.
//!
//! Real-world label photos rarely decode on the first try, so the decoder
//! runs a fixed cascade of preprocessing strategies over the grayscale base
//! image, attempting a decode after each one and stopping at the first hit.
//! Every strategy starts from the same base; later strategies never chain
//! off earlier transforms. Each attempt looks for both linear (EAN-13/UPC-A
//! scanlines) and matrix (QR) symbols.

pub mod linear;
pub mod preprocess;

use linear::RowScanOptions;
pub use preprocess::GrayBuffer;
use tracing::debug;

/// One transform-then-attempt step of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessStrategy {
    /// Decode the grayscale image as-is.
    Direct,
    /// 5x5 Gaussian smoothing against sensor noise and slight defocus.
    GaussianBlur,
    /// Otsu global threshold for washed-out but bimodal photos.
    OtsuThreshold,
    /// 3x3 morphological closing to heal pinholes in bars and modules.
    MorphologicalClose,
}

impl PreprocessStrategy {
    /// Fixed attempt order; cheap and most general first.
    pub const CASCADE: [PreprocessStrategy; 4] = [
        PreprocessStrategy::Direct,
        PreprocessStrategy::GaussianBlur,
        PreprocessStrategy::OtsuThreshold,
        PreprocessStrategy::MorphologicalClose,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PreprocessStrategy::Direct => "direct",
            PreprocessStrategy::GaussianBlur => "gaussian_blur",
            PreprocessStrategy::OtsuThreshold => "otsu_threshold",
            PreprocessStrategy::MorphologicalClose => "morph_close",
        }
    }

    fn apply(self, base: &GrayBuffer) -> GrayBuffer {
        match self {
            PreprocessStrategy::Direct => base.clone(),
            PreprocessStrategy::GaussianBlur => base.gaussian_blur(),
            PreprocessStrategy::OtsuThreshold => base.otsu_binarize(),
            PreprocessStrategy::MorphologicalClose => base.close(),
        }
    }
}

/// A decoded symbol payload and the strategy that surfaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub code: String,
    pub strategy: PreprocessStrategy,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("image could not be parsed as a raster image: {source}")]
    InvalidImage {
        #[source]
        source: image::ImageError,
    },
    #[error("image has zero width or height")]
    EmptyImage,
    /// Internal decoder breakage, distinct from the legitimate
    /// nothing-found result.
    #[error("internal decoder failure: {0}")]
    Internal(String),
}

impl DecodeError {
    /// True for malformed input (caller-correctable), false for internal
    /// failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidImage { .. } | DecodeError::EmptyImage
        )
    }
}

/// Candidate symbol with its raster anchor. Linear hits anchor at the start
/// of their scanline; QR grids anchor at their top-left corner.
struct Symbol {
    text: String,
    x: u32,
    y: u32,
}

/// Extract the first machine-readable code from encoded image bytes.
///
/// `Ok(None)` is the legitimate "no code in this photo" outcome; errors are
/// reserved for unreadable input and internal failures. The input buffer is
/// never mutated or persisted.
pub fn decode(bytes: &[u8]) -> Result<Option<Detection>, DecodeError> {
    let parsed = image::load_from_memory(bytes)
        .map_err(|source| DecodeError::InvalidImage { source })?;
    let gray = parsed.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }

    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let base = GrayBuffer::new(width, height, gray.into_raw()).ok_or_else(|| {
        DecodeError::Internal("pixel buffer does not match image dimensions".to_string())
    })?;

    Ok(run_cascade(&base, detect_symbols))
}

/// Walk the cascade, short-circuiting on the first strategy with a hit.
/// When a strategy finds several symbols, the top-left-most anchor wins
/// (row first, then column); selection is positional, never by payload.
fn run_cascade<F>(base: &GrayBuffer, attempt: F) -> Option<Detection>
where
    F: Fn(&GrayBuffer) -> Vec<Symbol>,
{
    for strategy in PreprocessStrategy::CASCADE {
        let processed = strategy.apply(base);
        let mut symbols = attempt(&processed);
        if symbols.is_empty() {
            continue;
        }
        symbols.sort_by_key(|symbol| (symbol.y, symbol.x));
        let chosen = symbols.remove(0);
        debug!(strategy = strategy.label(), code = %chosen.text, "symbol decoded");
        return Some(Detection {
            code: chosen.text,
            strategy,
        });
    }
    None
}

/// One decode attempt: linear scanlines plus QR grid detection.
fn detect_symbols(image: &GrayBuffer) -> Vec<Symbol> {
    let mut symbols = Vec::new();

    for hit in linear::scan(image, &RowScanOptions::default()) {
        symbols.push(Symbol {
            text: hit.text,
            x: 0,
            y: hit.row as u32,
        });
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width(),
        image.height(),
        |x, y| image.pixel(x, y),
    );
    for grid in prepared.detect_grids() {
        if let Ok((_, content)) = grid.decode() {
            let corner = grid.bounds[0];
            symbols.push(Symbol {
                text: content,
                x: corner.x.max(0) as u32,
                y: corner.y.max(0) as u32,
            });
        }
    }

    symbols
}
