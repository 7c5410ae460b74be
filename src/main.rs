use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use meetcap::capture::{CaptureBackendFactory, CaptureSource, StreamAcquirer};
use meetcap::delivery::{ArtifactConsumer, LocalDownload, MeetingUploader};
use meetcap::{create_router, AppState, Config, RecordingSession, SessionConfig};

#[derive(Parser)]
#[command(name = "meetcap")]
#[command(about = "Meeting recording capture service")]
struct Args {
    /// Path to the config file (without extension)
    #[arg(short, long, default_value = "config/meetcap")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let source = match cfg.capture.source.as_str() {
        "synthetic" => CaptureSource::Synthetic,
        "file" => match (&cfg.capture.display_path, &cfg.capture.microphone_path) {
            (Some(display), Some(microphone)) => CaptureSource::File {
                display_path: display.clone(),
                microphone_path: microphone.clone(),
            },
            _ => bail!("file capture source requires display_path and microphone_path"),
        },
        other => bail!("unknown capture source: {}", other),
    };

    let backend =
        CaptureBackendFactory::create(source, cfg.recording.sample_rate, cfg.recording.channels)?;
    info!(backend = backend.name(), "capture backend ready");

    let session_config = SessionConfig {
        timeslice: Duration::from_millis(cfg.recording.timeslice_ms),
        sample_rate: cfg.recording.sample_rate,
        channels: cfg.recording.channels,
        ..SessionConfig::default()
    };
    let session = Arc::new(Mutex::new(RecordingSession::new(
        session_config,
        StreamAcquirer::new(backend),
    )));

    let consumer: Arc<dyn ArtifactConsumer> = match &cfg.upload {
        Some(upload) => {
            info!(endpoint = %upload.endpoint, "recordings will be uploaded");
            Arc::new(MeetingUploader::new(
                upload.endpoint.clone(),
                cfg.recording.file_prefix.clone(),
            ))
        }
        None => {
            info!(dir = %cfg.recording.output_dir.display(), "recordings will be saved locally");
            Arc::new(LocalDownload::new(
                cfg.recording.output_dir.clone(),
                cfg.recording.file_prefix.clone(),
            ))
        }
    };

    let app = create_router(AppState::new(session, consumer));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!(%addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
