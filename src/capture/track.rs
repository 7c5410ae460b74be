use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::backend::AudioFrame;

/// Kind of media a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Lifecycle state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// A single media track.
///
/// Audio tracks carry a single-consumer frame feed; whichever component
/// takes the feed (mixer or recorder) becomes the sole reader. Video
/// tracks carry no in-process payload; they exist for stream composition
/// and MIME selection.
pub struct MediaTrack {
    id: Uuid,
    kind: TrackKind,
    label: String,
    state: Mutex<TrackState>,
    feed: Mutex<Option<mpsc::Receiver<AudioFrame>>>,
}

impl MediaTrack {
    pub fn audio(label: impl Into<String>, feed: mpsc::Receiver<AudioFrame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TrackKind::Audio,
            label: label.into(),
            state: Mutex::new(TrackState::Live),
            feed: Mutex::new(Some(feed)),
        }
    }

    pub fn video(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TrackKind::Video,
            label: label.into(),
            state: Mutex::new(TrackState::Live),
            feed: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> TrackState {
        *self.state.lock().unwrap()
    }

    pub fn is_ended(&self) -> bool {
        self.state() == TrackState::Ended
    }

    /// Stop the track. Stopping an already-stopped track is a no-op.
    ///
    /// Dropping the feed closes the frame channel, which signals any
    /// downstream reader that the source is gone.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == TrackState::Ended {
            return;
        }
        *state = TrackState::Ended;
        self.feed.lock().unwrap().take();
        debug!(track = %self.label, "track stopped");
    }

    /// Take the frame feed. Returns `None` if another component already
    /// holds it, or the track is video-only or ended.
    pub fn take_feed(&self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.feed.lock().unwrap().take()
    }
}

/// An ordered set of tracks owned by whichever component most recently
/// acquired it, until explicitly stopped.
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<std::sync::Arc<MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<std::sync::Arc<MediaTrack>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[std::sync::Arc<MediaTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> Vec<std::sync::Arc<MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.kind() == TrackKind::Audio)
            .cloned()
            .collect()
    }

    pub fn video_tracks(&self) -> Vec<std::sync::Arc<MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.kind() == TrackKind::Video)
            .cloned()
            .collect()
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Audio)
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Video)
    }

    /// Stop every track on the stream. Safe to call repeatedly.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}
