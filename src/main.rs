//! Headless front-end: one-shot resize/re-encode/save through the remote
//! transform service, using the same parameter model as the interactive
//! session.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result, ensure};
use bytes::Bytes;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use image_studio::{
    HttpServiceConfig, HttpTransformService, ParameterStore, SourceImage, TransformParameters,
    TransformService,
};

/// Resize, re-encode, and save an image through the transform service.
#[derive(Parser, Debug)]
#[command(name = "image-studio", version, about)]
struct Cli {
    /// Source image (jpeg, png, or webp)
    input: PathBuf,

    /// Output file; defaults to the input name with a _compressed or
    /// _nobg suffix
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Transform service base URL
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    /// Target width in pixels (height follows unless --unlock-aspect)
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels (width follows unless --unlock-aspect)
    #[arg(long)]
    height: Option<u32>,

    /// Uniform scale percentage (1-100)
    #[arg(long, conflicts_with_all = ["width", "height"])]
    scale: Option<u32>,

    /// Output format: jpeg, png, or webp (defaults to the source format)
    #[arg(long)]
    format: Option<String>,

    /// Quality (1-100)
    #[arg(long, default_value_t = 80)]
    quality: u32,

    /// Let width and height move independently
    #[arg(long)]
    unlock_aspect: bool,

    /// Remove the background (forces PNG output)
    #[arg(long)]
    remove_background: bool,
}

fn default_output(input: &Path, params: &TransformParameters) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let suffix = if params.remove_background {
        "_nobg"
    } else {
        "_compressed"
    };
    input.with_file_name(format!("{stem}{suffix}.{}", params.format.primary_extension()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let raw = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let source = SourceImage::from_bytes(Bytes::from(raw))?;
    info!(
        "Loaded {}: {}x{} {} ({} bytes)",
        cli.input.display(),
        source.native_width(),
        source.native_height(),
        source.mime_type(),
        source.byte_size()
    );

    let mut store = ParameterStore::new(&source);
    store.set_keep_aspect_ratio(!cli.unlock_aspect)?;
    store.set_quality(cli.quality)?;
    if let Some(format) = cli.format.as_deref() {
        store.set_format(format.parse()?)?;
    }
    if let Some(scale) = cli.scale {
        store.set_scale(scale)?;
    }
    if let Some(width) = cli.width {
        store.set_width(width)?;
    }
    if let Some(height) = cli.height {
        store.set_height(height)?;
    }

    let service = HttpTransformService::with_config(HttpServiceConfig::new(cli.url.as_str()))?;

    if cli.remove_background {
        let features = service.features().await?;
        ensure!(
            features.background_removal,
            "The service at {} was deployed without background removal",
            cli.url
        );
        store.set_remove_background(true)?;
    }

    let params = store.current();
    info!(
        "Requesting {}x{} {} q{}{}",
        params.target_width,
        params.target_height,
        params.format,
        params.quality,
        if params.remove_background {
            " (background removal)"
        } else {
            ""
        }
    );

    let file = service.download(&source, &params).await?;

    let output = cli
        .output
        .unwrap_or_else(|| default_output(&cli.input, &params));
    tokio::fs::write(&output, &file)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} ({} bytes)", output.display(), file.len());

    Ok(())
}
