//! Vision-LLM recognizer: the default OCR engine.
//!
//! Wraps an `edgequake-llm` provider behind the [`Recognizer`] trait. One
//! image, one chat call, no retry. The call is bounded by
//! `api_timeout_secs`; a timed-out or failed call is an engine error, which
//! the OCR invoker turns into a recognition error.
//!
//! Models sometimes answer `The text is "x7Kp".` or wrap the answer in a
//! fence despite the prompt. [`clean_prediction`] peels those off and keeps
//! the last non-empty line, which is where the actual reading ends up.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::pipeline::encode::encode_image;
use crate::pipeline::recognize::{EngineError, Recognizer};
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, USER_INSTRUCTION};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// OCR engine backed by a vision-capable chat model.
pub struct VisionRecognizer {
    provider: Arc<dyn LLMProvider>,
    name: String,
    system_prompt: String,
    options: CompletionOptions,
    api_timeout: Duration,
}

impl VisionRecognizer {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &OcrConfig) -> Self {
        Self {
            provider,
            name: engine_name(config),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            api_timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Resolve a provider from `config` and the environment, then wrap it.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl Recognizer for VisionRecognizer {
    async fn recognize(&self, image: &DynamicImage) -> Result<String, EngineError> {
        let start = Instant::now();
        let image_data = encode_image(image)?;

        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images(USER_INSTRUCTION, vec![image_data]),
        ];

        let call = self.provider.chat(&messages, Some(&self.options));
        let response = timeout(self.api_timeout, call).await.map_err(|_| {
            format!("vision call timed out after {}s", self.api_timeout.as_secs())
        })??;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let text = clean_prediction(&response.content);
        if text.is_empty() {
            return Err(format!("model returned no text (raw reply: {:?})", response.content).into());
        }
        info!("{} read {} chars", self.name, text.chars().count());
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn engine_name(config: &OcrConfig) -> String {
    match (&config.provider_name, &config.model) {
        (Some(p), Some(m)) => format!("{p}/{m}"),
        (Some(p), None) => p.clone(),
        (None, Some(m)) => m.clone(),
        (None, None) => "vision-llm".to_string(),
    }
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &OcrConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Strip fences and quotes; keep the last non-empty line.
pub fn clean_prediction(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .unwrap_or_default();

    // A period is sentence punctuation only after a closing quote:
    // `The text is "x7Kp".` → `x7Kp`, while a bare `ab1.` keeps its dot.
    let sentence = line.strip_suffix('.').unwrap_or(line);
    let unquoted = match sentence.rsplit_once(['"', '\'', '`']) {
        Some((before, after)) if after.trim().is_empty() => before
            .rsplit_once(['"', '\'', '`'])
            .map(|(_, inner)| inner)
            .unwrap_or(before),
        _ => line,
    };
    unquoted.trim().to_string()
}

/// Resolve the LLM provider.
///
/// A pre-built `config.provider` is used as is. Otherwise a provider named
/// in the config or in `EDGEQUAKE_LLM_PROVIDER` is created with the
/// configured model (or `EDGEQUAKE_MODEL`, or a small default vision model).
/// With no name anywhere, `ProviderFactory::from_env` picks one from
/// whichever API key is set.
pub fn resolve_provider(config: &OcrConfig) -> Result<Arc<dyn LLMProvider>, OcrError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some((name, model)) = named_provider(config, |key| std::env::var(key).ok()) {
        debug!("Creating vision provider {}/{}", name, model);
        return ProviderFactory::create_llm_provider(&name, &model).map_err(|e| {
            OcrError::ProviderNotConfigured {
                provider: name,
                hint: e.to_string(),
            }
        });
    }

    if let Some(ref model) = config.model {
        warn!("Model '{}' ignored: no provider named, auto-detecting", model);
    }
    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| OcrError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider found in the environment ({e}).\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY, or pass --provider."
            ),
        })?;

    info!("Auto-detected LLM provider from environment");
    Ok(provider)
}

/// Provider name and model when one is named explicitly; `env` looks up
/// variables so the precedence can be checked without touching the process.
fn named_provider(
    config: &OcrConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<(String, String)> {
    let set = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let name = config
        .provider_name
        .clone()
        .or_else(|| set("EDGEQUAKE_LLM_PROVIDER"))?;
    let model = config
        .model
        .clone()
        .or_else(|| set("EDGEQUAKE_MODEL"))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    Some((name, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&OcrConfig::default());
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(64));
    }

    #[test]
    fn clean_plain_answer() {
        assert_eq!(clean_prediction("x7Kp"), "x7Kp");
        assert_eq!(clean_prediction("  x7Kp \n"), "x7Kp");
    }

    #[test]
    fn clean_fenced_answer() {
        assert_eq!(clean_prediction("```\nab12\n```"), "ab12");
        assert_eq!(clean_prediction("```text\nab12\n```\n"), "ab12");
    }

    #[test]
    fn clean_takes_last_line() {
        assert_eq!(clean_prediction("Sure, here it is:\n\nQw3r"), "Qw3r");
    }

    #[test]
    fn clean_strips_quotes() {
        assert_eq!(clean_prediction("The text is \"x7Kp\"."), "x7Kp");
        assert_eq!(clean_prediction("'ab12'"), "ab12");
        assert_eq!(clean_prediction("`ab12`"), "ab12");
    }

    #[test]
    fn clean_keeps_a_trailing_dot_that_was_read() {
        assert_eq!(clean_prediction("ab1."), "ab1.");
        assert_eq!(clean_prediction("x.y.z."), "x.y.z.");
        assert_eq!(clean_prediction("The text is \"ab1.\"."), "ab1.");
        assert_eq!(clean_prediction("'q9.'"), "q9.");
    }

    #[test]
    fn clean_empty() {
        assert_eq!(clean_prediction(""), "");
        assert_eq!(clean_prediction("\n\n```\n```"), "");
    }

    #[test]
    fn config_provider_wins_over_environment() {
        let config = OcrConfig::builder()
            .provider_name("anthropic")
            .build()
            .unwrap();
        let env = |key: &str| match key {
            "EDGEQUAKE_LLM_PROVIDER" => Some("ollama".to_string()),
            "EDGEQUAKE_MODEL" => Some("llava".to_string()),
            _ => None,
        };
        assert_eq!(
            named_provider(&config, env),
            Some(("anthropic".to_string(), "llava".to_string()))
        );
    }

    #[test]
    fn environment_names_provider_and_model() {
        let env = |key: &str| match key {
            "EDGEQUAKE_LLM_PROVIDER" => Some("ollama".to_string()),
            _ => None,
        };
        assert_eq!(
            named_provider(&OcrConfig::default(), env),
            Some(("ollama".to_string(), DEFAULT_MODEL.to_string()))
        );
    }

    #[test]
    fn blank_environment_falls_through_to_auto_detection() {
        let env = |_: &str| Some("  ".to_string());
        assert_eq!(named_provider(&OcrConfig::default(), env), None);
        assert_eq!(named_provider(&OcrConfig::default(), |_| None), None);
    }

    #[test]
    fn engine_names() {
        let config = OcrConfig::builder()
            .provider_name("openai")
            .model("gpt-4.1-mini")
            .build()
            .unwrap();
        assert_eq!(engine_name(&config), "openai/gpt-4.1-mini");
        assert_eq!(engine_name(&OcrConfig::default()), "vision-llm");
    }
}
