//! Configuration for a single image-to-text run.
//!
//! All behaviour is controlled through [`OcrConfig`], built via
//! [`OcrConfigBuilder`]. The pipeline stages read only the fields they need:
//! the fetcher reads the download timeout, the rasterizer reads
//! [`RasterConfig`], and the vision recognizer reads the model and sampling
//! settings.

use crate::error::OcrError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for an image-to-text run.
///
/// # Example
/// ```rust
/// use img2text::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .download_timeout_secs(5)
///     .svg_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, 5);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Timeout for the remote GET, in seconds. Default: 10.
    pub download_timeout_secs: u64,

    /// Timeout for a single vision-engine call, in seconds. Default: 30.
    pub api_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the vision engine. Default: 0.0.
    ///
    /// Transcription wants the single most likely reading, not variety.
    pub temperature: f32,

    /// Maximum tokens the vision engine may generate. Default: 64.
    ///
    /// CAPTCHA-style images carry a handful of characters; a small cap stops
    /// a chatty model from wandering off into explanations.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses the built-in transcription prompt.
    pub system_prompt: Option<String>,

    /// SVG rasterisation options.
    pub raster: RasterConfig,
}

/// How SVG input is rendered to pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    /// Uniform scale applied to the SVG's intrinsic size. Range 0.1–16. Default: 1.0.
    pub svg_scale: f32,

    /// Background painted under the SVG, as RGB. Default: white.
    ///
    /// `None` keeps the transparent canvas. Most CAPTCHA SVGs draw dark
    /// glyphs without a background rect, which reads as black-on-black once
    /// a consumer drops the alpha channel.
    pub svg_background: Option<[u8; 3]>,

    /// Load system fonts so `<text>` elements render. Default: true.
    pub load_system_fonts: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            svg_scale: 1.0,
            svg_background: Some([255, 255, 255]),
            load_system_fonts: true,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 10,
            api_timeout_secs: 30,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 64,
            system_prompt: None,
            raster: RasterConfig::default(),
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("raster", &self.raster)
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn svg_scale(mut self, scale: f32) -> Self {
        self.config.raster.svg_scale = scale.clamp(0.1, 16.0);
        self
    }

    pub fn svg_background(mut self, rgb: Option<[u8; 3]>) -> Self {
        self.config.raster.svg_background = rgb;
        self
    }

    pub fn load_system_fonts(mut self, v: bool) -> Self {
        self.config.raster.load_system_fonts = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(OcrError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if !c.raster.svg_scale.is_finite() {
            return Err(OcrError::InvalidConfig(format!(
                "SVG scale must be finite, got {}",
                c.raster.svg_scale
            )));
        }
        Ok(self.config)
    }
}

/// Parse a `#rrggbb` / `rrggbb` colour, or `none` / `transparent`.
///
/// Returns `Ok(None)` for the transparent keywords.
pub fn parse_background(s: &str) -> Result<Option<[u8; 3]>, OcrError> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "none" | "transparent" => return Ok(None),
        "white" => return Ok(Some([255, 255, 255])),
        "black" => return Ok(Some([0, 0, 0])),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(&s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(OcrError::InvalidConfig(format!(
            "Invalid background colour '{s}': expected #rrggbb, white, black or none"
        )));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| OcrError::InvalidConfig(format!("Invalid background colour: {e}")))
    };
    Ok(Some([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = OcrConfig::default();
        assert_eq!(c.download_timeout_secs, 10);
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.raster.svg_scale, 1.0);
        assert_eq!(c.raster.svg_background, Some([255, 255, 255]));
    }

    #[test]
    fn builder_clamps() {
        let c = OcrConfig::builder()
            .temperature(5.0)
            .svg_scale(100.0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.raster.svg_scale, 16.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = OcrConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, OcrError::InvalidConfig(_)));
    }

    #[test]
    fn background_parsing() {
        assert_eq!(parse_background("none").unwrap(), None);
        assert_eq!(parse_background("Transparent").unwrap(), None);
        assert_eq!(parse_background("#ff8000").unwrap(), Some([255, 128, 0]));
        assert_eq!(parse_background("000000").unwrap(), Some([0, 0, 0]));
        assert!(parse_background("#fff").is_err());
        assert!(parse_background("#gg0000").is_err());
    }

    #[test]
    fn debug_omits_prompt_text() {
        let dbg = format!("{:?}", OcrConfig::default());
        assert!(dbg.contains("download_timeout_secs"));
        assert!(!dbg.contains("system_prompt"));
    }
}
