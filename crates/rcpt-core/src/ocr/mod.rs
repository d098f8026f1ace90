//! OCR seam: image in, plain text out.
//!
//! Text recognition itself is delegated to an [`OcrEngine`]. With the `native`
//! feature, [`PureOcrEngine`] runs PaddleOCR models through `pure-onnx-ocr`.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::OcrError;
use crate::extract::{Extraction, ItemExtractor, OcrTextExtractor};

/// Anything that can turn a receipt image into text.
pub trait OcrEngine {
    /// Engine name for logs and metadata.
    fn name(&self) -> &str;

    /// Recognize the text in an image, one receipt line per text line.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError>;
}

/// Text recognized from one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Recognized text, lines in reading order.
    pub text: String,

    /// Number of text lines.
    pub line_count: usize,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    fn center_y(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (min_y + max_y) / 2.0
    }
}

/// Join text boxes into lines in reading order.
///
/// Boxes whose vertical centers lie within half a `line_height` of a line's
/// first box belong to that line; a line's boxes are joined left to right
/// with single spaces, so an item name and its price end up on one line.
pub fn join_reading_order(mut boxes: Vec<TextBox>, line_height: f32) -> Vec<String> {
    boxes.retain(|b| !b.text.trim().is_empty());
    boxes.sort_by(|a, b| {
        a.center_y()
            .partial_cmp(&b.center_y())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<Vec<TextBox>> = Vec::new();
    let mut anchor = f32::NEG_INFINITY;

    for text_box in boxes {
        let y = text_box.center_y();
        match lines.last_mut() {
            Some(line) if (y - anchor).abs() <= line_height / 2.0 => line.push(text_box),
            _ => {
                anchor = y;
                lines.push(vec![text_box]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| {
                a.rect()
                    .0
                    .partial_cmp(&b.rect().0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            line.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Result of scanning one receipt image.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    /// Items found in the recognized text.
    pub extraction: Extraction,

    /// Text returned by the engine (empty on failure).
    pub raw_text: String,

    /// User-facing message when OCR was unavailable or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Total processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ScanOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run OCR on an image and extract line items from the text.
///
/// A missing engine or an OCR failure yields an empty extraction with an
/// error message instead of propagating.
pub fn scan_image(
    engine: Option<&dyn OcrEngine>,
    image: &DynamicImage,
    extractor: &OcrTextExtractor,
) -> ScanOutcome {
    let start = Instant::now();

    let Some(engine) = engine else {
        let error = OcrError::Unavailable("no OCR engine configured".to_string());
        warn!("{}", error);
        return ScanOutcome {
            error: Some(error.to_string()),
            ..Default::default()
        };
    };

    let (width, height) = image.dimensions();
    info!("Scanning {}x{} image with {}", width, height, engine.name());

    match engine.recognize(image) {
        Ok(output) => {
            let extraction = extractor.extract(&output.text);
            info!(
                "Recognized {} lines, extracted {} items",
                output.line_count,
                extraction.items.len()
            );
            ScanOutcome {
                extraction,
                raw_text: output.text,
                error: None,
                processing_time_ms: start.elapsed().as_millis() as u64,
            }
        }
        Err(e) => {
            warn!("Error processing image: {}", e);
            ScanOutcome {
                error: Some(format!("Error processing image: {}", e)),
                processing_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(Result<String, String>);

    impl OcrEngine for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError> {
            match &self.0 {
                Ok(text) => Ok(OcrOutput {
                    text: text.clone(),
                    line_count: text.lines().count(),
                    processing_time_ms: 0,
                    image_size: image.dimensions(),
                }),
                Err(msg) => Err(OcrError::Recognition(msg.clone())),
            }
        }
    }

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 40.0, y, x + 40.0, y + 12.0, x, y + 12.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_join_reading_order_merges_rows() {
        let boxes = vec![
            text_box(200.0, 42.0, "$2.49"),
            text_box(10.0, 10.0, "CORNER STORE"),
            text_box(10.0, 40.0, "Milk"),
            text_box(10.0, 70.0, "Eggs"),
            text_box(200.0, 71.0, "3.10"),
            text_box(100.0, 40.0, " "),
        ];

        let lines = join_reading_order(boxes, 20.0);
        assert_eq!(lines, vec!["CORNER STORE", "Milk $2.49", "Eggs 3.10"]);
    }

    #[test]
    fn test_scan_extracts_items() {
        let engine = FixedText(Ok("Milk .... $4.99\nTOTAL $4.99".to_string()));
        let image = DynamicImage::new_rgb8(8, 8);

        let outcome = scan_image(Some(&engine as &dyn OcrEngine), &image, &OcrTextExtractor::new());
        assert!(outcome.is_ok());
        assert_eq!(outcome.extraction.items.len(), 1);
        assert_eq!(outcome.extraction.items[0].name, "Milk");
    }

    #[test]
    fn test_scan_failure_yields_empty_result() {
        let engine = FixedText(Err("model crashed".to_string()));
        let image = DynamicImage::new_rgb8(8, 8);

        let outcome = scan_image(Some(&engine as &dyn OcrEngine), &image, &OcrTextExtractor::new());
        assert!(outcome.extraction.is_empty());
        assert_eq!(
            outcome.error.as_deref(),
            Some("Error processing image: text recognition failed: model crashed")
        );
    }

    #[test]
    fn test_scan_without_engine() {
        let image = DynamicImage::new_rgb8(8, 8);
        let outcome = scan_image(None, &image, &OcrTextExtractor::new());

        assert!(outcome.extraction.is_empty());
        assert!(outcome.error.unwrap().contains("unavailable"));
    }
}
