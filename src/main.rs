use anyhow::Context;
use clap::Parser;
use image::ImageFormat;
use std::path::PathBuf;

use stonecrack::{CrackDetector, DetectionResult, DetectorConfig, SessionId, UploadStore};

#[derive(Parser)]
#[command(name = "stonecrack")]
#[command(about = "Check a photographed stone surface for cracks")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON detector config; missing fields use the defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the annotated image here (format from the extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep the upload and its result in this directory
    #[arg(long, value_name = "DIR")]
    uploads: Option<PathBuf>,

    /// Pin the score reported for crack-free surfaces
    #[arg(long)]
    seed: Option<u64>,

    /// Low Canny threshold of the crack edge detector
    #[arg(long)]
    low: Option<f32>,

    /// High Canny threshold of the crack edge detector
    #[arg(long)]
    high: Option<f32>,

    /// Smallest accepted crack area in px² (exclusive)
    #[arg(long)]
    min_area: Option<f64>,

    /// Largest accepted crack area in px² (exclusive)
    #[arg(long)]
    max_area: Option<f64>,

    /// Confidence scale applied to the cracked fraction of the image
    #[arg(long)]
    scale: Option<f64>,

    /// Re-run detection on the cached image before reporting
    #[arg(long)]
    rescan: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn detector_config(&self) -> anyhow::Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::load(path)?,
            None => DetectorConfig::default(),
        };

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(low) = self.low {
            config.edges.low_threshold = low;
        }
        if let Some(high) = self.high {
            config.edges.high_threshold = high;
        }
        if let Some(min_area) = self.min_area {
            config.contours.min_area = min_area;
        }
        if let Some(max_area) = self.max_area {
            config.contours.max_area = max_area;
        }
        if let Some(scale) = self.scale {
            config.confidence.scale = scale;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let detector = CrackDetector::new(args.detector_config()?)?;

    let bytes = tokio::fs::read(&args.image_path)
        .await
        .with_context(|| format!("Failed to read image {:?}", args.image_path))?;
    tracing::info!(path = ?args.image_path, bytes = bytes.len(), "loaded image");

    let session = SessionId::new();
    let mut result = detector.analyze_bytes(&bytes, session)?;
    if args.rescan {
        result = detector.rescan(session)?;
    }

    if let Some(output) = &args.output {
        let format = ImageFormat::from_path(output)
            .with_context(|| format!("Unknown output format for {:?}", output))?;
        let encoded = result.encode_annotated(format)?;
        tokio::fs::write(output, encoded)
            .await
            .with_context(|| format!("Failed to write annotated image {:?}", output))?;
        tracing::info!(path = ?output, "wrote annotated image");
    }

    if let Some(dir) = &args.uploads {
        let store = UploadStore::open(dir).await?;
        let upload = store.store_bytes(session, &bytes).await?;
        let stored_result = store.store_result(&upload, &result.annotated_image).await?;
        tracing::info!(
            upload = %upload.file_name,
            result = %stored_result.file_name,
            "stored upload and result"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary())?);
    } else {
        print_report(&result, args.verbose);
    }

    Ok(())
}

fn print_report(result: &DetectionResult, verbose: bool) {
    println!("\n=== Crack Detection Results ===");

    if !result.material.is_stone() {
        println!("Not a stone surface; nothing analyzed.");
    } else if result.crack_detected {
        println!("Cracks detected: {}", result.crack_count);
    } else {
        println!("No cracks detected.");
    }
    println!("Confidence: {:.1}%", result.confidence);
    println!(
        "Processing time: {:.1} ms",
        result.processing_time.as_secs_f64() * 1000.0
    );

    if verbose {
        println!("\nTexture energy: {:.1}", result.texture_energy);
        println!("Edge density: {:.4}", result.edge_density);
        if !result.crack_boxes.is_empty() {
            println!("\nCrack regions:");
            for (i, bbox) in result.crack_boxes.iter().enumerate() {
                println!("  Crack {} at ({}, {}) - {}x{}",
                        i + 1, bbox.x, bbox.y, bbox.width, bbox.height);
            }
            println!("Total crack area: {:.0} px²", result.total_crack_area);
        }
    }
}
