mod common;

use anyhow::Result;
use common::ScriptedDevices;
use engagement_monitor::error::RecorderError;
use engagement_monitor::media::{
    FlushBehavior, MediaAcquisition, MediaConstraints, MediaDevices, SyntheticConfig,
    SyntheticDevices,
};
use engagement_monitor::recorder::{AudioRecorder, RecorderConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

async fn start_recorder(
    devices: Arc<dyn MediaDevices>,
) -> Result<(engagement_monitor::media::MediaSession, AudioRecorder)> {
    let session = MediaAcquisition::new(devices.clone())
        .acquire(&MediaConstraints::default())
        .await?;
    let recorder =
        AudioRecorder::start(devices.as_ref(), session.audio(), &RecorderConfig::default())?;
    Ok((session, recorder))
}

#[tokio::test(start_paused = true)]
async fn test_chunks_kept_in_arrival_order() -> Result<()> {
    let chunks = vec![b"first-".to_vec(), b"second-".to_vec(), b"third".to_vec()];
    let devices = Arc::new(ScriptedDevices::new(chunks));

    let (_session, recorder) = start_recorder(devices).await?;
    tokio::task::yield_now().await;

    let artifact = recorder.stop().await.expect("artifact");

    assert_eq!(artifact.data(), b"first-second-third");
    assert_eq!(artifact.chunk_count(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_chunks_means_no_artifact() -> Result<()> {
    let devices = Arc::new(ScriptedDevices::new(Vec::new()));

    let (_session, recorder) = start_recorder(devices).await?;
    assert!(recorder.stop().await.is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_missing_flush_falls_back_after_grace() -> Result<()> {
    let mut devices = ScriptedDevices::new(vec![vec![1, 2], vec![3, 4]]);
    devices.flushes = false;

    let (_session, recorder) = start_recorder(Arc::new(devices)).await?;
    tokio::task::yield_now().await;

    let started = Instant::now();
    let artifact = recorder.stop().await.expect("artifact");

    assert!(started.elapsed() >= RecorderConfig::default().flush_grace);
    assert_eq!(artifact.data(), &[1, 2, 3, 4]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_mime_falls_back_to_generic_container() -> Result<()> {
    let devices = Arc::new(ScriptedDevices::new(vec![vec![0]]));

    let (_session, recorder) = start_recorder(devices).await?;
    assert_eq!(recorder.mime_type(), "audio/webm");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_mime_falls_back_to_platform_default() -> Result<()> {
    let mut devices = ScriptedDevices::new(vec![vec![0]]);
    devices.supported.clear();

    let (_session, recorder) = start_recorder(Arc::new(devices)).await?;
    assert_eq!(recorder.mime_type(), "audio/ogg");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_recorder_emits_slices() -> Result<()> {
    let devices = Arc::new(SyntheticDevices::default());

    let (_session, recorder) = start_recorder(devices).await?;
    assert_eq!(recorder.mime_type(), "audio/L16;rate=16000;channels=1");

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(recorder.chunk_count(), 3);

    let artifact = recorder.stop().await.expect("artifact");

    // Three full one-second slices plus the half-second remainder
    assert_eq!(artifact.chunk_count(), 4);
    assert_eq!(artifact.len(), 3 * 32_000 + 16_000);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_recorder_without_flush() -> Result<()> {
    let devices = Arc::new(SyntheticDevices::new(SyntheticConfig {
        flush: FlushBehavior::Never,
        ..Default::default()
    }));

    let (_session, recorder) = start_recorder(devices).await?;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let artifact = recorder.stop().await.expect("artifact");
    assert_eq!(artifact.chunk_count(), 2);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recorder_unsupported() -> Result<()> {
    let devices = Arc::new(SyntheticDevices::new(SyntheticConfig {
        recorder_available: false,
        ..Default::default()
    }));

    let session = MediaAcquisition::new(devices.clone())
        .acquire(&MediaConstraints::default())
        .await?;

    let result =
        AudioRecorder::start(devices.as_ref(), session.audio(), &RecorderConfig::default());
    assert!(matches!(result, Err(RecorderError::Unsupported)));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_audio_track() -> Result<()> {
    let devices = Arc::new(SyntheticDevices::new(SyntheticConfig {
        with_audio: false,
        ..Default::default()
    }));

    let session = MediaAcquisition::new(devices.clone())
        .acquire(&MediaConstraints::default())
        .await?;

    let result =
        AudioRecorder::start(devices.as_ref(), session.audio(), &RecorderConfig::default());
    assert!(matches!(result, Err(RecorderError::NoAudioTrack)));
    assert_eq!(devices.recorders_created(), 0);

    Ok(())
}
