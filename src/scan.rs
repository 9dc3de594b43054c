//! Sequences one scan request: decode the photo, resolve the product,
//! score it, derive the coarse classifications, attach recommendations,
//! and record the analytics event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{AnalyticsSink, ScanEvent};
use crate::catalog::{CatalogLookup, Product};
use crate::decoder::{self, DecodeError, Detection};
use crate::recommend::{self, Alternative};
use crate::scoring::{self, EcoScore, ScoreError};

/// Coarse packaging verdict derived from the recyclable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PackagingClass {
    #[serde(rename = "Recyclable")]
    Recyclable,
    #[serde(rename = "Non-recyclable")]
    NonRecyclable,
}

impl PackagingClass {
    fn of(product: &Product) -> Self {
        if product.attributes.flag("recyclable") {
            Self::Recyclable
        } else {
            Self::NonRecyclable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recyclable => "Recyclable",
            Self::NonRecyclable => "Non-recyclable",
        }
    }
}

/// Coarse carbon verdict. The score doubles as the carbon proxy: a product
/// scoring at least 3 reads as low impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CarbonFootprint {
    Low,
    High,
}

impl CarbonFootprint {
    fn from_score(score: EcoScore) -> Self {
        if score.value() >= 3 {
            Self::Low
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::High => "High",
        }
    }
}

/// The catalog record plus everything one scan derives from it. The
/// underlying product is embedded untouched; derived fields ride alongside.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,
    pub ecoscore: EcoScore,
    pub packaging: PackagingClass,
    pub carbon_footprint: CarbonFootprint,
    pub sustainability_tips: Vec<String>,
    pub scan_timestamp: DateTime<Utc>,
}

/// Composed outcome of a successful scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub product: ScoredProduct,
    pub alternatives: Vec<Alternative>,
    pub barcode: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Legitimate negative: the cascade exhausted without finding a symbol.
    #[error("no barcode detected - try a clearer photo with better lighting")]
    NoBarcodeDetected,
    /// The upload was not a readable raster image.
    #[error("uploaded image could not be read: {0}")]
    InvalidImage(#[source] DecodeError),
    /// The decoder broke mid-flight; nothing the caller did wrong.
    #[error("image processing failed: {0}")]
    Processing(#[source] DecodeError),
    /// Catalog data bug: a resolved product that cannot be scored.
    #[error(transparent)]
    InvalidProduct(#[from] ScoreError),
}

/// Stateless request pipeline over the injected collaborators.
pub struct ScanPipeline {
    catalog: Arc<dyn CatalogLookup>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl ScanPipeline {
    pub fn new(catalog: Arc<dyn CatalogLookup>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { catalog, analytics }
    }

    /// Run one scan. The image buffer lives only for this call; ownership
    /// drops it on every exit path.
    pub fn scan(&self, image: &[u8], caller: &str) -> Result<ScanResult, ScanError> {
        let Detection { code, strategy } = match decoder::decode(image) {
            Ok(Some(detection)) => detection,
            Ok(None) => return Err(ScanError::NoBarcodeDetected),
            Err(err) if err.is_invalid_input() => return Err(ScanError::InvalidImage(err)),
            Err(err) => return Err(ScanError::Processing(err)),
        };

        // A catalog miss is not an error: fall back to the generic record so
        // every decoded code still yields a scored result.
        let product = self.catalog.lookup(&code).unwrap_or_else(Product::unknown);

        let score = scoring::score(&product)?;
        let packaging = PackagingClass::of(&product);
        let carbon_footprint = CarbonFootprint::from_score(score);
        let alternatives = recommend::alternatives(&product);
        let sustainability_tips = recommend::tips(&product, score);
        let scan_timestamp = Utc::now();

        let event = ScanEvent {
            code: code.clone(),
            product_name: product.name.clone(),
            category: product.category.clone(),
            ecoscore: score.value(),
            caller: caller.to_string(),
            recorded_at: scan_timestamp,
        };
        if let Err(err) = self.analytics.record(event) {
            warn!(error = %err, "analytics record failed; scan continues");
        }

        info!(
            code = %code,
            product = %product.name,
            score = %score,
            strategy = strategy.label(),
            "scan complete"
        );

        let message = format!("Successfully scanned {}", product.name);
        Ok(ScanResult {
            product: ScoredProduct {
                product,
                ecoscore: score,
                packaging,
                carbon_footprint,
                sustainability_tips,
                scan_timestamp,
            },
            alternatives,
            barcode: code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsError, InMemoryAnalytics};
    use crate::catalog::StaticCatalog;
    use crate::decoder::linear;

    fn pipeline_with(analytics: Arc<dyn AnalyticsSink>) -> ScanPipeline {
        ScanPipeline::new(Arc::new(StaticCatalog::standard()), analytics)
    }

    fn barcode_png(digits: &str) -> Vec<u8> {
        let row = linear::synthesize_row(digits, 3);
        let width = row.len() as u32;
        let mut img = image::GrayImage::new(width, 48);
        for y in 0..48 {
            for (x, &value) in row.iter().enumerate() {
                img.put_pixel(x as u32, y, image::Luma([value]));
            }
        }
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .expect("png encodes");
        bytes
    }

    fn blank_png() -> Vec<u8> {
        let img = image::GrayImage::from_pixel(64, 64, image::Luma([255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .expect("png encodes");
        bytes
    }

    #[test]
    fn known_code_scans_to_a_full_result() {
        let analytics = Arc::new(InMemoryAnalytics::new());
        let pipeline = pipeline_with(analytics.clone());

        let result = pipeline
            .scan(&barcode_png("036000291452"), "kiosk-1")
            .expect("scan succeeds");

        assert_eq!(result.barcode, "036000291452");
        assert_eq!(
            result.product.product.name,
            "Head & Shoulders Classic Clean Shampoo"
        );
        assert_eq!(result.product.ecoscore.value(), 2);
        assert_eq!(result.product.packaging, PackagingClass::Recyclable);
        assert_eq!(result.product.carbon_footprint, CarbonFootprint::High);
        assert!(!result.product.sustainability_tips.is_empty());
        assert_eq!(result.alternatives.len(), 2);
        assert!(result.message.contains("Head & Shoulders"));
    }

    #[test]
    fn unknown_code_degrades_to_the_generic_product() {
        let pipeline = pipeline_with(Arc::new(InMemoryAnalytics::new()));

        let result = pipeline
            .scan(&barcode_png("4006381333931"), "kiosk-1")
            .expect("unknown codes still produce a result");

        assert_eq!(result.product.product.name, "Generic Product");
        assert_eq!(result.product.product.category, "Miscellaneous");
        assert_eq!(result.product.ecoscore.value(), 1);
        assert_eq!(result.product.carbon_footprint, CarbonFootprint::High);
        assert_eq!(result.alternatives.len(), 1);
        assert!(result.alternatives[0].ecoscore.value() >= 4);
    }

    #[test]
    fn blank_image_is_a_no_barcode_result_not_an_error() {
        let pipeline = pipeline_with(Arc::new(InMemoryAnalytics::new()));
        let err = pipeline
            .scan(&blank_png(), "kiosk-1")
            .expect_err("nothing to decode");
        assert!(matches!(err, ScanError::NoBarcodeDetected));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_image() {
        let pipeline = pipeline_with(Arc::new(InMemoryAnalytics::new()));
        let err = pipeline
            .scan(b"not an image at all", "kiosk-1")
            .expect_err("unparseable upload");
        assert!(matches!(err, ScanError::InvalidImage(_)));
    }

    #[test]
    fn successful_scans_are_recorded_for_the_caller() {
        let analytics = Arc::new(InMemoryAnalytics::new());
        let pipeline = pipeline_with(analytics.clone());

        pipeline
            .scan(&barcode_png("036000291452"), "kiosk-7")
            .expect("scan succeeds");

        let summary = analytics.summary();
        assert_eq!(summary.total_scans, 1);
        let tally = analytics.caller_tally("kiosk-7").expect("tally present");
        assert_eq!(tally.total_scans, 1);
        assert_eq!(tally.eco_points, 20);
    }

    #[test]
    fn analytics_failure_never_fails_the_scan() {
        struct BrokenSink;
        impl AnalyticsSink for BrokenSink {
            fn record(&self, _event: ScanEvent) -> Result<(), AnalyticsError> {
                Err(AnalyticsError::Transport("sink offline".to_string()))
            }
        }

        let pipeline = pipeline_with(Arc::new(BrokenSink));
        let result = pipeline.scan(&barcode_png("036000291452"), "kiosk-1");
        assert!(result.is_ok());
    }
}
