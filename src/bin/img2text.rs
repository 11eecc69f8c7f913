//! CLI binary for img2text.
//!
//! A thin shim over the library crate: maps flags to `OcrConfig`, runs the
//! pipeline once, prints the prediction on stdout. Any failure is reported
//! as one `Error:` line on stderr with exit status 1.

use anyhow::{Context, Result};
use clap::Parser;
use img2text::config::parse_background;
use img2text::{ImageOcr, OcrConfig, OcrError};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn red(s: &str) -> String {
    if io::stderr().is_terminal() {
        format!("\x1b[31m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Remote image (content type decides the format, then the extension)
  img2text https://example.com/captcha.svg

  # Inline base64 (format sniffed from magic bytes, SVG if unrecognised)
  img2text iVBORw0KGgoAAAANSUhEUgAA...

  # Data URI, optionally percent-encoded as a whole
  img2text 'data:image/svg+xml;base64,PHN2ZyB4bWxucz0i...'
  img2text 'data%3Aimage%2Fpng%3Bbase64%2CiVBORw0KGgo...'

  # JSON output: {"result": "...", "source": ..., "format": ..., ...}
  img2text --json https://example.com/captcha.png

SUPPORTED FORMATS:
  png, jpeg/jpg, svg (rendered to pixels before recognition)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter (overrides --verbose / --quiet)
"#;

/// Read the text in an image given as a URL or an inline base64 string.
#[derive(Parser, Debug)]
#[command(
    name = "img2text",
    version,
    about = "Read the text in an image given as a URL or an inline base64 string",
    long_about = "Resolve an image URL or inline base64 / data-URI payload, sniff its real \
format, render SVG to pixels, and read the text with a vision LLM. Built for CAPTCHA-style \
images: short, distorted text on a small canvas.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image URL, raw base64, or data:image/<subtype>;base64,<payload>.
    input: String,

    /// HTTP fetch timeout in seconds.
    #[arg(long, env = "IMG2TEXT_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Vision call timeout in seconds.
    #[arg(long, env = "IMG2TEXT_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IMG2TEXT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "IMG2TEXT_MAX_TOKENS", default_value_t = 64)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "IMG2TEXT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Scale factor applied when rendering SVG (0.1–16).
    #[arg(long, env = "IMG2TEXT_SVG_SCALE", default_value_t = 1.0)]
    svg_scale: f32,

    /// Background under SVG renders: #rrggbb, white, black, or none.
    #[arg(long, env = "IMG2TEXT_SVG_BACKGROUND", default_value = "white")]
    svg_background: String,

    /// Do not load system fonts for SVG <text> elements.
    #[arg(long)]
    no_system_fonts: bool,

    /// Print the prediction as a JSON object instead of a bare line.
    #[arg(long, env = "IMG2TEXT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "IMG2TEXT_QUIET")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries only the prediction; every log line goes to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", red("Error:"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    // Checked before provider setup so a blank argument never needs an API key.
    if cli.input.trim().is_empty() {
        return Err(OcrError::EmptyInput.into());
    }

    let config = build_config(cli).await?;
    let ocr = ImageOcr::from_config(config).context("Failed to set up the OCR engine")?;

    let prediction = ocr.run(&cli.input).await?;

    if cli.json {
        let json =
            serde_json::to_string(&prediction).context("Failed to serialise prediction")?;
        println!("{json}");
    } else {
        println!("{}", prediction.text);
    }
    Ok(())
}

/// Map CLI args to `OcrConfig`.
async fn build_config(cli: &Cli) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .download_timeout_secs(cli.timeout)
        .api_timeout_secs(cli.api_timeout)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .svg_scale(cli.svg_scale)
        .svg_background(parse_background(&cli.svg_background)?)
        .load_system_fonts(!cli.no_system_fonts);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_map_to_config() {
        let cli = Cli::try_parse_from(["img2text", "aGVsbG8="]).unwrap();
        let config = tokio_test::block_on(build_config(&cli)).unwrap();
        assert_eq!(config.download_timeout_secs, 10);
        assert_eq!(config.raster.svg_background, Some([255, 255, 255]));
        assert!(config.raster.load_system_fonts);
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(Cli::try_parse_from(["img2text"]).is_err());
    }

    #[test]
    fn bad_background_is_rejected() {
        let cli =
            Cli::try_parse_from(["img2text", "--svg-background", "mauve", "aGVsbG8="]).unwrap();
        assert!(tokio_test::block_on(build_config(&cli)).is_err());
    }
}
