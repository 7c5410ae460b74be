use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub capture: CaptureConfig,
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interval between periodic fragment deliveries, in milliseconds
    pub timeslice_ms: u64,
    pub file_prefix: String,
    /// Where finished recordings go when no upload endpoint is set
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// "synthetic" or "file"
    pub source: String,
    #[serde(default)]
    pub display_path: Option<PathBuf>,
    #[serde(default)]
    pub microphone_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct UploadConfig {
    /// Meeting-creation endpoint that accepts multipart uploads
    pub endpoint: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
