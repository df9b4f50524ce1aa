//! Wire types for the OCR engine contract.

use serde::{Deserialize, Serialize};

/// Decoded OCR engine response.
///
/// `text` is the full extracted text; `details` carries one entry per
/// recognized line and may be absent or empty depending on the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Full extracted text, lines joined with newlines.
    pub text: String,
    /// Per-line recognition details, in reading order.
    #[serde(default)]
    pub details: Vec<TextLine>,
}

/// One recognized text line with its location in the source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Recognized text for this line.
    pub text: String,
    /// Bounding rectangle as x1, y1, x2, y2 in image pixels.
    pub bbox: [f32; 4],
}

/// Engine execution environment, from `/api/device-info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    /// Human-readable device description, e.g. "GPU: NVIDIA A10 (24.0GB)".
    pub device: String,
    /// Whether the engine reports GPU execution.
    #[serde(default)]
    pub is_gpu: bool,
}

impl DeviceReport {
    /// Static report used when the engine cannot be reached.
    pub fn cpu_fallback() -> Self {
        Self {
            device: "CPU (default)".to_string(),
            is_gpu: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_engine_response_with_details() {
        let raw = r#"{
            "text": "hello\nworld",
            "details": [
                {"text": "hello", "bbox": [1.0, 2.0, 30.5, 12.0]},
                {"text": "world", "bbox": [1.0, 14.0, 32.0, 24.0]}
            ]
        }"#;
        let output: OcrOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(output.text, "hello\nworld");
        assert_eq!(output.details.len(), 2);
        assert_eq!(output.details[0].bbox, [1.0, 2.0, 30.5, 12.0]);
    }

    #[test]
    fn details_are_optional() {
        let output: OcrOutput = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert!(output.details.is_empty());
    }

    #[test]
    fn device_report_ignores_extra_fields() {
        let raw = r#"{"device": "GPU: A10", "is_gpu": true, "batch_sizes": {"recognition": "512"}}"#;
        let report: DeviceReport = serde_json::from_str(raw).unwrap();
        assert!(report.is_gpu);
        assert_eq!(report.device, "GPU: A10");
    }
}
