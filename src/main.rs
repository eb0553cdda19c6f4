//! dreamscape - describe a dream, answer a few questions, get an analysis
//! and a panorama to explore.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use dreamscape::adapters::ai::GeminiProvider;
use dreamscape::adapters::export::LocalFileExporter;
use dreamscape::application::DreamController;
use dreamscape::cli::{self, Args, Console};
use dreamscape::config::{AppConfig, LogFormat, OutputConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.output);
    config.validate().context("invalid configuration")?;

    let gemini = config
        .ai
        .gemini()
        .context("GEMINI_API_KEY is required")?;
    let provider = Arc::new(GeminiProvider::new(gemini)?);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.dir.clone());
    let exporter = LocalFileExporter::new(output_dir);

    tracing::info!(
        text_model = %config.ai.text_model,
        image_model = %config.ai.image_model,
        output_dir = %exporter.output_dir().display(),
        "dreamscape starting"
    );

    let mut controller = DreamController::new(provider).with_questions(!args.skip_questions);
    let mut console = Console::new();

    cli::run(&args, &mut controller, &exporter, &mut console).await
}

/// Logs go to stderr so they never interleave with the dialogue on stdout.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(output: &OutputConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&output.log_level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match output.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
