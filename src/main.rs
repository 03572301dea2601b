use anyhow::{Context, Result};
use clap::Parser;
use everyday_studio::app::{KeyboardInputHandler, Studio};
use everyday_studio::export::{ExportPipeline, ExportState};
use everyday_studio::face::ExternalLandmarkProvider;
use everyday_studio::media::MediaIndex;
use everyday_studio::sink::default_encoder_factory;
use everyday_studio::{Cursor, StudioConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "everyday-studio")]
#[command(about = "Face-stabilized everyday timelapse builder")]
#[command(version)]
#[command(long_about = "Builds a timelapse video from years of daily photos. Every photo is \
aligned on the detected face so eyes stay centered, level and equally sized, then encoded \
into one video, optionally with a soundtrack.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "everyday.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Export once without the interactive studio
    #[arg(long, help = "Export the whole dataset and exit")]
    export: bool,

    /// Override the dataset root
    #[arg(long, value_name = "PATH", help = "Dataset root folder (overrides dataset.path)")]
    dataset: Option<String>,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    // Needed before logging starts, the log directory lives in the config
    let mut config = StudioConfig::load_from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    if let Some(dataset) = &args.dataset {
        config.dataset.path = dataset.clone();
    }

    let _log_guard = init_logging(&args, &config)?;

    info!("Starting everyday studio v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
        }
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let provider = Arc::new(ExternalLandmarkProvider::from_config(&config.face).map_err(|e| {
        error!("Failed to set up face detector: {}", e);
        e
    })?);
    let encoders = default_encoder_factory().map_err(|e| {
        error!("Failed to set up video encoder: {}", e);
        e
    })?;

    let catalog = MediaIndex::from_config(&config.dataset)
        .load(&config.dataset.path)
        .await;
    info!("{}", catalog);
    let mut cursor = Cursor::open(catalog).await;

    if args.export {
        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling export");
                ctrl_c.cancel();
            }
        });

        let mut pipeline = ExportPipeline::new(&config, provider, encoders);
        let result = pipeline
            .run(&mut cursor, &cancel, |progress| {
                info!(
                    "Exported {}/{} ({:.0}%)",
                    progress.current,
                    progress.total,
                    progress.percent()
                );
            })
            .await;

        return match result {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
            Err(e) if pipeline.state() == ExportState::Failed => {
                error!("Export failed: {}", e);
                std::process::exit(1);
            }
            Err(e) => {
                warn!("Nothing exported: {}", e);
                Ok(())
            }
        };
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let keyboard = KeyboardInputHandler::new(tx);
    keyboard.start().await?;

    let mut studio = Studio::new(&config, cursor, provider, encoders);
    let result = studio.run(&mut rx).await;

    keyboard.stop().await?;
    result?;

    info!("Everyday studio exited");
    Ok(())
}

fn init_logging(args: &Args, config: &StudioConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("everyday_studio={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "everyday-studio.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# Everyday Studio Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Every key can be overridden from the environment, e.g. EVERYDAY_VIDEO__FPS=24");
    println!();

    let default_config = r#"[dataset]
# Root folder; photos live in its immediate subfolders
path = "./media/images"
# Accepted extensions, matched case-insensitively
extensions = ["jpg", "jpeg", "png"]

[video]
# Working resolution every photo is resized to before alignment (width, height)
resolution = [640, 360]
# Output frame rate
fps = 30

[export]
# Output folder and base file name ({path}/{name}.avi, .mp4 once muxed)
path = "./export"
name = "every_day"
# Export desaturated frames
grayscale = true
# Draw landmarks and the center marker into exported frames
visuals = false
# Log progress and accept the cancel key while exporting
preview = true
# Upper bound for the audio mux step
mux_timeout_seconds = 300

[face]
# Detector backend: "landmarks68" or "bounding_box"
backend = "landmarks68"
# External detector and the model it loads
# detector_command = "/usr/local/bin/face-landmarks"
# model_path = "./models/shape_predictor_68_face_landmarks.dat"
# Upper bound for one detector run; a frame that times out is skipped
detector_timeout_seconds = 30
# Normalize face size
correction = true
# Target face width as a fraction of the frame (bounding_box backend)
correction_factor = 0.3
# Eye distance in pixels mapped to scale 1.0 (landmarks68 backend)
reference_eye_distance = 150.0
# Point moved onto the frame center: "eye_midpoint" or "nose_bridge"
anchor = "eye_midpoint"
# Show the corrected frame while browsing
preview_correction = true

[audio]
# Soundtrack file inside the audio directory (optional)
# track = "theme.mp3"
directory = "./media/sound"
# Media tool used to add the soundtrack
ffmpeg = "ffmpeg"

[display]
# Preview size (width, height)
resolution = [640, 360]
# JPEG refreshed with the current preview (optional)
# preview_path = "./preview.jpg"
# Log extra per-frame details
debug = false

[logging]
# Daily rolling log files (optional)
# directory = "./logs"
"#;

    println!("{}", default_config);
}
