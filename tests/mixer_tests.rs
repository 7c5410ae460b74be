// Integration tests for the audio mixing graph
//
// These drive the mixer with real streams from the synthetic capture
// backend and verify both the mixed path and the union fallback.

use std::sync::Arc;
use std::time::Duration;

use meetcap::capture::{StreamAcquirer, SyntheticBackend, SyntheticConfig};
use meetcap::mixer::{AudioMixer, MixerConfig};

fn acquirer(config: SyntheticConfig) -> StreamAcquirer {
    StreamAcquirer::new(Arc::new(SyntheticBackend::new(config)))
}

#[tokio::test]
async fn test_combine_produces_single_mixed_audio_track() {
    let acquirer = acquirer(SyntheticConfig {
        frames_per_stream: 5,
        frame_duration_ms: 10,
        ..Default::default()
    });
    let screen = acquirer.acquire_screen_stream().await.unwrap();
    let mic = acquirer.acquire_mic_stream().await.unwrap();

    let mixer = AudioMixer::new(MixerConfig::default());
    let (outcome, context) = mixer.combine(&screen, &mic);

    assert!(outcome.is_mixed());
    assert!(context.is_some());

    let combined = outcome.stream();
    assert_eq!(combined.video_tracks().len(), 1);
    assert_eq!(combined.audio_tracks().len(), 1);

    context.unwrap().close();
}

#[tokio::test]
async fn test_mixed_track_carries_summed_samples() {
    // The synthetic backend emits constant-amplitude tones: 1000 for the
    // screen, 500 for the mic. Every mixed sample must therefore be one
    // of 500, 1000 or 1500 depending on buffer alignment.
    let acquirer = acquirer(SyntheticConfig {
        frames_per_stream: 5,
        frame_duration_ms: 10,
        ..Default::default()
    });
    let screen = acquirer.acquire_screen_stream().await.unwrap();
    let mic = acquirer.acquire_mic_stream().await.unwrap();

    let mixer = AudioMixer::new(MixerConfig::default());
    let (outcome, mut context) = mixer.combine(&screen, &mic);
    assert!(outcome.is_mixed());

    let mixed_track = outcome.stream().audio_tracks()[0].clone();
    let mut feed = mixed_track.take_feed().unwrap();

    let mut frames = 0;
    let mut saw_summed_sample = false;
    while let Ok(Some(frame)) = tokio::time::timeout(Duration::from_secs(2), feed.recv()).await {
        frames += 1;
        for sample in &frame.samples {
            assert!(
                matches!(*sample, 500 | 1000 | 1500),
                "unexpected mixed sample {}",
                sample
            );
            if *sample == 1500 {
                saw_summed_sample = true;
            }
        }
    }

    assert!(frames > 0, "mixed track produced no frames");
    assert!(saw_summed_sample, "no sample was the sum of both sources");

    if let Some(ctx) = context.as_mut() {
        ctx.close();
    }
}

#[tokio::test]
async fn test_fallback_unions_tracks_when_mixing_unavailable() {
    let acquirer = acquirer(SyntheticConfig::default());
    let screen = acquirer.acquire_screen_stream().await.unwrap();
    let mic = acquirer.acquire_mic_stream().await.unwrap();

    // Consuming the screen audio feed first makes the graph unbuildable.
    let taken = screen.audio_tracks()[0].take_feed();
    assert!(taken.is_some());

    let mixer = AudioMixer::new(MixerConfig::default());
    let (outcome, context) = mixer.combine(&screen, &mic);

    assert!(!outcome.is_mixed());
    assert!(context.is_none());

    // The fallback keeps both source audio tracks alive independently.
    let combined = outcome.stream();
    assert_eq!(combined.video_tracks().len(), 1);
    assert_eq!(combined.audio_tracks().len(), 2);
}

#[tokio::test]
async fn test_screen_without_audio_still_mixes_microphone() {
    let acquirer = acquirer(SyntheticConfig {
        display_audio: false,
        frames_per_stream: 3,
        frame_duration_ms: 10,
        ..Default::default()
    });
    let screen = acquirer.acquire_screen_stream().await.unwrap();
    let mic = acquirer.acquire_mic_stream().await.unwrap();

    assert_eq!(screen.audio_tracks().len(), 0);

    let mixer = AudioMixer::new(MixerConfig::default());
    let (outcome, context) = mixer.combine(&screen, &mic);

    // A stream with zero audio tracks is skipped, not a failure.
    assert!(outcome.is_mixed());
    assert_eq!(outcome.stream().audio_tracks().len(), 1);

    context.unwrap().close();
}
