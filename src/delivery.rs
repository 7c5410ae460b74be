use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::recorder::RecordingArtifact;

/// A consumer that takes ownership of a finished artifact.
#[async_trait::async_trait]
pub trait ArtifactConsumer: Send + Sync {
    async fn consume(&self, artifact: &RecordingArtifact) -> Result<()>;

    /// Consumer name for logging
    fn name(&self) -> &str;
}

/// Meeting record returned by the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Uploads the artifact as a multipart file to the meeting-creation
/// endpoint. The endpoint and its data model belong to the backend; this
/// client only consumes the contract.
pub struct MeetingUploader {
    client: reqwest::Client,
    endpoint: String,
    file_prefix: String,
}

impl MeetingUploader {
    pub fn new(endpoint: String, file_prefix: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            file_prefix,
        }
    }

    pub async fn upload(&self, artifact: &RecordingArtifact) -> Result<MeetingRecord> {
        let filename = artifact.filename(&self.file_prefix);

        let part = reqwest::multipart::Part::bytes(artifact.data().to_vec())
            .file_name(filename.clone())
            .mime_str(artifact.mime_type())
            .context("invalid artifact MIME type")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        info!(
            endpoint = %self.endpoint,
            filename = %filename,
            size = artifact.size(),
            "uploading recording"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("failed to upload recording")?
            .error_for_status()
            .context("meeting endpoint rejected the recording")?;

        let meeting: MeetingRecord = response
            .json()
            .await
            .context("failed to parse meeting record")?;

        info!(meeting_id = %meeting.id, "recording uploaded");

        Ok(meeting)
    }
}

#[async_trait::async_trait]
impl ArtifactConsumer for MeetingUploader {
    async fn consume(&self, artifact: &RecordingArtifact) -> Result<()> {
        self.upload(artifact).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "meeting-uploader"
    }
}

/// Writes the artifact to a local file when no backend consumer is
/// configured.
pub struct LocalDownload {
    output_dir: PathBuf,
    file_prefix: String,
}

impl LocalDownload {
    pub fn new(output_dir: PathBuf, file_prefix: String) -> Self {
        Self {
            output_dir,
            file_prefix,
        }
    }
}

#[async_trait::async_trait]
impl ArtifactConsumer for LocalDownload {
    async fn consume(&self, artifact: &RecordingArtifact) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .context("failed to create output directory")?;

        let path = self.output_dir.join(artifact.filename(&self.file_prefix));
        tokio::fs::write(&path, artifact.data())
            .await
            .with_context(|| format!("failed to write recording to {}", path.display()))?;

        info!(path = %path.display(), size = artifact.size(), "recording saved");

        Ok(())
    }

    fn name(&self) -> &str {
        "local-download"
    }
}
