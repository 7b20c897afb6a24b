use anyhow::Result;
use engagement_monitor::engagement::SampleSource;
use engagement_monitor::recorder::AudioArtifact;
use engagement_monitor::remote::{RemoteEngagementService, SimulatedEngagementService};

#[tokio::test]
async fn test_session_round_trip() -> Result<()> {
    let service = SimulatedEngagementService::new();

    let session = service.create_session("Graph Theory").await?;
    assert!(session.session_id.starts_with("sim-"));
    assert_eq!(service.session_count(), 1);

    for _ in 0..3 {
        let sample = service.current_sample(&session.session_id).await?;
        assert_eq!(sample.source, SampleSource::Remote);
        assert!((sample.scores.total() - 100.0).abs() < 1e-6);
    }

    let artifact = AudioArtifact::new(vec![0; 3200], "audio/webm;codecs=opus", 2);
    let report = service.stop_session(&session.session_id, &artifact).await?;

    assert_eq!(report.session_id.as_deref(), Some(session.session_id.as_str()));
    assert_eq!(report.timeline_len(), 3);

    let data = report.engagement_data.expect("engagement data");
    let metadata = data.metadata.expect("metadata");
    assert_eq!(metadata.lecture_name.as_deref(), Some("Graph Theory"));
    assert_eq!(metadata.total_data_points, Some(3));

    let stats = data.summary_statistics.expect("summary");
    assert_eq!(stats.avg_scores.len(), 4);
    let total: f64 = stats.avg_scores.values().sum();
    assert!((total - 100.0).abs() < 0.1);

    assert_eq!(report.audio_file.unwrap()["format"], ".webm");
    assert_eq!(service.session_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let service = SimulatedEngagementService::new();
    let artifact = AudioArtifact::new(vec![1, 2], "audio/webm", 1);

    let err = service.stop_session("missing", &artifact).await.unwrap_err();
    assert!(err.is_session_not_found());

    let err = service.current_sample("missing").await.unwrap_err();
    assert!(err.is_session_not_found());
}

#[tokio::test]
async fn test_always_healthy() {
    let service = SimulatedEngagementService::new();
    assert!(service.health().await);
    assert_eq!(service.name(), "simulated");
}
