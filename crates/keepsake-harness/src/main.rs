#![forbid(unsafe_code)]

//! `keepsake-proof`: render a persisted preview to a PNG proof.
//!
//! # Running
//!
//! ```sh
//! cargo run -p keepsake-harness -- \
//!     --template pet-memorial.json \
//!     --snapshot order-1042.json \
//!     --photo photo=luna.jpg@50% 30% \
//!     --output proof.png
//! ```
//!
//! Set `KEEPSAKE_LOG=debug` for per-frame detail.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use keepsake_core::Viewport;
use keepsake_core::logging::{self, LogFormat};
use keepsake_harness::{HarnessError, PhotoSpec, ProofJob};
use keepsake_runtime::RenderConfig;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "keepsake-proof", version, about = "Render a memorial preview to a PNG proof")]
struct Cli {
    /// Template descriptor JSON.
    #[arg(long)]
    template: PathBuf,
    /// Persisted preview snapshot JSON.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Photo for a region as REGION=PATH, optionally suffixed with @X% Y%.
    #[arg(long = "photo", value_parser = parse_photo)]
    photos: Vec<PhotoSpec>,
    /// Container width in layout pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    /// Device pixels per layout pixel.
    #[arg(long, default_value_t = 2.0)]
    device_scale: f64,
    /// Product SKU whose print size sets the aspect ratio (e.g. framed-11x14).
    #[arg(long)]
    sku: Option<String>,
    /// Watermark text drawn across the proof.
    #[arg(long, default_value = keepsake_render::PROOF_WATERMARK)]
    watermark: String,
    /// Omit the watermark.
    #[arg(long, conflicts_with = "watermark")]
    no_watermark: bool,
    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
    /// Where to write the PNG.
    #[arg(long, short, default_value = "proof.png")]
    output: PathBuf,
}

fn parse_photo(input: &str) -> Result<PhotoSpec, String> {
    PhotoSpec::parse(input).map_err(|err| err.to_string())
}

fn run(cli: Cli) -> Result<(), HarnessError> {
    let watermark = (!cli.no_watermark).then_some(cli.watermark);
    let mut job = ProofJob::load(
        &cli.template,
        cli.snapshot.as_deref(),
        &cli.photos,
        Viewport::new(cli.width, cli.device_scale),
    )?
    .with_config(RenderConfig::default().with_watermark(watermark));
    if let Some(sku) = cli.sku {
        job = job.with_sku(sku);
    }
    let proof = job.render()?;
    proof.write(&cli.output)?;
    println!(
        "{} ({}x{}, layout {})",
        cli.output.display(),
        proof.width,
        proof.height,
        proof.layout
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init("info", format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "proof failed");
            eprintln!("keepsake-proof: {err}");
            ExitCode::FAILURE
        }
    }
}
