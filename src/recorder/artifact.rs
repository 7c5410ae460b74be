use chrono::{DateTime, Utc};

/// The immutable output of a finished recording.
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    data: Vec<u8>,
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl RecordingArtifact {
    pub fn new(data: Vec<u8>, mime_type: String) -> Self {
        Self {
            data,
            mime_type,
            created_at: Utc::now(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Download filename: `<prefix>-<ISO8601 with colons replaced>.webm`.
    pub fn filename(&self, prefix: &str) -> String {
        format!(
            "{}-{}.{}",
            prefix,
            self.created_at.format("%Y-%m-%dT%H-%M-%S"),
            file_extension(&self.mime_type)
        )
    }
}

/// The known-good artifact MIME type for what was actually requested.
///
/// The encoder's reported MIME type is untrustworthy across platforms;
/// artifacts are always tagged from this table instead.
pub fn normalized_mime_type(has_video: bool) -> &'static str {
    if has_video {
        "video/webm"
    } else {
        "audio/webm"
    }
}

fn file_extension(mime_type: &str) -> &'static str {
    // Both audio and video artifacts ship as webm containers.
    let _ = mime_type;
    "webm"
}
