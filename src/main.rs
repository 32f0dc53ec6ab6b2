use anyhow::{Context, Result};
use clap::Parser;
use screen_recorder::config::Overrides;
use screen_recorder::session::{format_elapsed, format_size_mb};
use screen_recorder::{
    Backends, Config, RecordingSessionController, SessionEvent, SyntheticDisplay,
    SyntheticEncoderFactory, SyntheticMicrophone,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Record the screen with optional microphone and system audio
#[derive(Debug, Parser)]
#[command(name = "screen-recorder", version)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/screen-recorder")]
    config: String,

    /// Seconds of recording, pauses excluded
    #[arg(long)]
    duration: Option<u64>,

    /// Record without microphone audio
    #[arg(long)]
    no_mic: bool,

    /// Record without system audio
    #[arg(long)]
    no_system_audio: bool,

    /// Directory the recording is saved to
    #[arg(long)]
    output: Option<String>,

    /// Pause after this many seconds of recording
    #[arg(long)]
    pause_after: Option<u64>,

    /// Length of the pause in seconds
    #[arg(long)]
    pause_for: Option<u64>,

    /// Print the final session snapshot as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            duration_secs: self.duration,
            no_mic: self.no_mic,
            no_system_audio: self.no_system_audio,
            download_dir: self.output.clone(),
            pause_after_secs: self.pause_after,
            pause_for_secs: self.pause_for,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "screen_recorder=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    cfg.apply_overrides(&args.overrides());

    info!("Screen Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Recording {}s (mic={}, system_audio={}) into {}",
        cfg.demo.duration_secs,
        cfg.recorder.mic_enabled,
        cfg.recorder.system_audio_enabled,
        cfg.output.download_dir().display()
    );

    let encoder = SyntheticEncoderFactory::timed(
        Duration::from_millis(cfg.demo.chunk_interval_ms.max(1)),
        cfg.demo.chunk_size_bytes,
    );
    let backends = Backends {
        display: Arc::new(SyntheticDisplay::new()),
        microphone: Arc::new(SyntheticMicrophone::new()),
        encoder: Arc::new(encoder),
    };
    let mut controller = RecordingSessionController::new(cfg.recorder.session_config(), backends);

    // Presentation layer: render progress from the event stream
    let mut events = controller.events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Tick { elapsed_seconds }) => {
                    println!("Recording: {}", format_elapsed(elapsed_seconds));
                }
                Ok(SessionEvent::Paused { elapsed_seconds }) => {
                    println!("Paused at {}", format_elapsed(elapsed_seconds));
                }
                Ok(SessionEvent::Resumed { .. }) => println!("Resumed"),
                Ok(SessionEvent::Error { message, .. }) => eprintln!("Error: {}", message),
                Ok(SessionEvent::Disposed) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} session events", skipped),
            }
        }
    });

    controller
        .start()
        .await
        .context("Failed to start recording")?;
    if let Some(preview) = controller.preview_stream() {
        info!("Live preview of {} track(s)", preview.tracks().len());
    }

    let total = Duration::from_secs(cfg.demo.duration_secs);
    match cfg.demo.pause_point() {
        Some(after) => {
            controller.run_for(Duration::from_secs(after)).await;
            controller.pause()?;
            controller
                .run_for(Duration::from_secs(cfg.demo.pause_for_secs))
                .await;
            controller.resume()?;
            controller
                .run_for(total - Duration::from_secs(after))
                .await;
        }
        None => {
            controller.run_for(total).await;
        }
    }

    let snapshot = controller.stop().await?;
    println!(
        "Duration: {}  Size: {}",
        snapshot.elapsed_display(),
        format_size_mb(snapshot.captured_bytes)
    );
    if snapshot.is_degraded() {
        warn!("Recording ended early; saving what was captured");
    }

    match controller.download() {
        Ok(request) => {
            let path = request.save_into(cfg.output.download_dir())?;
            println!("Saved {}", path.display());
        }
        Err(e) => warn!("Nothing to save: {}", e),
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    controller.reset()?;
    controller.dispose();
    drop(controller);
    printer.await.context("Event printer panicked")?;

    Ok(())
}
