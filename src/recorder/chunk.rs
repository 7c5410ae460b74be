use tracing::{debug, info};

use crate::error::RecordingError;

use super::artifact::RecordingArtifact;

/// Ordered, append-only accumulator for recorded fragments.
///
/// Fragments are never reordered; zero-length fragments are dropped
/// silently. `finish` is idempotent: the first call assembles the
/// artifact (or reports `EmptyRecording`), every later call is a no-op.
pub struct ChunkAccumulator {
    chunks: Vec<Vec<u8>>,
    mime_type: String,
    finished: bool,
}

impl ChunkAccumulator {
    pub fn new(mime_type: String) -> Self {
        Self {
            chunks: Vec::new(),
            mime_type,
            finished: false,
        }
    }

    /// Append a fragment. Empty fragments are a no-op, not an error.
    pub fn push(&mut self, fragment: Vec<u8>) {
        if fragment.is_empty() {
            return;
        }
        if self.finished {
            debug!("fragment after finish, dropping");
            return;
        }
        self.chunks.push(fragment);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Assemble the artifact. Returns `None` on any call after the first.
    ///
    /// An empty chunk sequence is an `EmptyRecording` error, not a
    /// silently-returned empty artifact: it usually means the platform
    /// capture failed.
    pub fn finish(&mut self) -> Option<Result<RecordingArtifact, RecordingError>> {
        if self.finished {
            debug!("recording already stopped, skipping duplicate finish");
            return None;
        }
        self.finished = true;

        if self.chunks.is_empty() {
            return Some(Err(RecordingError::EmptyRecording));
        }

        let total: usize = self.chunks.iter().map(|c| c.len()).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            data.extend_from_slice(&chunk);
        }

        info!(size = total, mime_type = %self.mime_type, "recording completed");

        Some(Ok(RecordingArtifact::new(data, self.mime_type.clone())))
    }
}
