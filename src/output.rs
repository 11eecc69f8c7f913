//! Result types returned by [`crate::ImageOcr::run`].

use crate::pipeline::classify::SourceKind;
use crate::pipeline::sniff::ImageFormat;
use serde::Serialize;

/// The outcome of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Text the recognition engine read. Serialised as `result`.
    #[serde(rename = "result")]
    pub text: String,
    pub source: SourceKind,
    pub format: ImageFormat,
    /// Raster dimensions handed to the engine.
    pub width: u32,
    pub height: u32,
    pub stats: PredictionStats,
}

/// Timing and size figures for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionStats {
    /// Bytes after fetching or base64 decoding.
    pub payload_bytes: usize,
    pub fetch_ms: u64,
    pub raster_ms: u64,
    pub recognize_ms: u64,
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_text_as_result() {
        let p = Prediction {
            text: "x7Kp".into(),
            source: SourceKind::Inline,
            format: ImageFormat::Svg,
            width: 120,
            height: 40,
            stats: PredictionStats::default(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["result"], "x7Kp");
        assert_eq!(json["source"], "inline");
        assert_eq!(json["format"], "svg");
        assert_eq!(json["stats"]["total_ms"], 0);
    }
}
