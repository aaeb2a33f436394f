//! LabelScan - camera label scanning
//!
//! Recognizes printed label numbers in camera frames, keeps the ones inside
//! the scan box that match the selected label template and value range, and
//! hands the deduplicated list to a results screen.

mod analysis;
mod app;
mod capture;
mod config;
mod error;
mod notify;
mod scanner;
mod shared;
mod storage;
mod vision;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::analysis::TemplateType;
use crate::app::ScanApp;
use crate::capture::{CameraFeed, ReplayCamera};
use crate::config::{save_config, AppConfig};
use crate::notify::{Toast, ToastChannel, ToastKind};
use crate::shared::{Navigator, ResultsPayload, SessionInput};
use crate::vision::{load_replay, ReplayRecognizer};

/// LabelScan - scan a range of printed labels
#[derive(Parser, Debug)]
#[command(name = "labelscan")]
#[command(about = "Scan printed labels in a numeric range and list what was found")]
struct Args {
    /// First label value of the range
    #[arg(short, long)]
    start: String,

    /// Last label value of the range
    #[arg(short, long)]
    end: String,

    /// Label template type
    #[arg(short, long, value_enum, default_value = "polyboard")]
    template: TemplateType,

    /// Replay script (JSON) standing in for the camera and OCR engine
    #[arg(short, long)]
    replay: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = load_or_create_config(args.config.as_deref());
    init_logging(&config)?;

    info!("LabelScan starting...");
    info!("Configuration: {}", config_source);

    let script = load_replay(&args.replay)?;
    let camera = Arc::new(CameraFeed::new(script.camera));
    let recognizer = Arc::new(ReplayRecognizer::new(&script));
    let (notifier, toasts) = ToastChannel::new();
    let presenter = spawn_toast_presenter(toasts);

    let app = ScanApp::new(
        config.clone(),
        camera.clone(),
        recognizer,
        Arc::new(notifier),
        Arc::new(ResultsScreen),
    );

    let session = app.start_session(SessionInput::new(args.start, args.end, args.template))?;
    let session_id = session.id();

    let replay = ReplayCamera::new(script, config.capture.max_fps).spawn(camera.clone());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    while !replay.is_finished() {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, ending session");
                replay.stop();
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    }
    tokio::task::spawn_blocking(move || replay.join()).await?;
    if camera.error_count() > 0 {
        warn!("Camera reported {} runtime error(s) during the session", camera.error_count());
    }
    info!("Camera delivered {} frame(s)", camera.frames_delivered());

    session.stop_scanning().await;
    let payload = session.end().await;

    if config.general.save_results {
        match storage::get_data_dir() {
            Ok(dir) => {
                let path = dir.join(storage::results_file_name(session_id));
                match storage::save_results(&payload, &path) {
                    Ok(()) => info!("Results saved to {:?}", path),
                    Err(e) => warn!("Could not save results: {:#}", e),
                }
            }
            Err(e) => warn!("Could not determine data directory: {:#}", e),
        }
    }

    // Dropping the app closes the toast channel so the presenter exits
    drop(app);
    if presenter.join().is_err() {
        tracing::error!("Toast presenter thread panicked");
    }

    info!("LabelScan shutdown complete");
    Ok(())
}

/// Load configuration from file, writing the defaults on first run
fn load_or_create_config(explicit: Option<&Path>) -> (AppConfig, String) {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => storage::get_config_dir().ok().map(|dir| dir.join("config.toml")),
    };
    let Some(path) = path else {
        return (AppConfig::default(), "defaults (no config directory)".to_string());
    };

    if path.exists() {
        return match config::load_config(&path) {
            Ok(config) => (config, format!("loaded from {:?}", path)),
            Err(e) => (AppConfig::default(), format!("defaults ({:?} is invalid: {:#})", path, e)),
        };
    }

    let config = AppConfig::default();
    let source = match save_config(&config, &path) {
        Ok(()) => format!("defaults, written to {:?}", path),
        Err(e) => format!("defaults (could not write {:?}: {:#})", path, e),
    };
    (config, source)
}

/// Initialize logging; RUST_LOG overrides the configured level
fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Print toasts as they arrive, until every sender is gone
fn spawn_toast_presenter(toasts: Receiver<Toast>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for toast in toasts.iter() {
            match toast.kind {
                ToastKind::Success => println!("  [ok] {}", toast.message),
                ToastKind::Info => println!("  [..] {}", toast.message),
            }
        }
    })
}

/// Console results screen
struct ResultsScreen;

impl Navigator for ResultsScreen {
    fn navigate_to_results(&self, payload: ResultsPayload) {
        let (scanned, total) = payload.progress();
        println!();
        println!("Scanned {} of {} labels ({}..={})", scanned, total, payload.start_value, payload.end_value);
        for value in &payload.accepted_values {
            println!("  {}", value);
        }

        let missing = payload.missing_count();
        if missing > 0 {
            let listed: Vec<String> = payload.missing_values().take(50).map(|n| n.to_string()).collect();
            let more = missing.saturating_sub(listed.len() as u64);
            if more > 0 {
                println!("Missing: {} (and {} more)", listed.join(", "), more);
            } else {
                println!("Missing: {}", listed.join(", "));
            }
        }
    }
}
