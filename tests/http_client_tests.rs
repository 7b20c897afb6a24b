use anyhow::Result;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use engagement_monitor::config::BackendConfig;
use engagement_monitor::error::RemoteError;
use engagement_monitor::recorder::AudioArtifact;
use engagement_monitor::remote::{AnalyticsClient, HttpEngagementService, RemoteEngagementService};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock backend saw on `/engagement/stop`
#[derive(Debug, Default, Clone)]
struct Upload {
    session_id: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

type Uploads = Arc<Mutex<Vec<Upload>>>;

async fn start_session(Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(body["lecture_name"], "Compilers");
    Json(json!({"success": true, "sessionId": "abc-123", "message": "started"}))
}

async fn current_sample(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "abc-123" => Json(json!({
            "scores": {"concentrated": 60, "engaged": 30, "confused": 20, "bored": 10},
            "state": "Concentrated",
            "emotion": "neutral",
            "confidence": 60
        }))
        .into_response(),
        "warming-up" => Json(json!({
            "scores": {"concentrated": 0, "engaged": 0, "confused": 0, "bored": 0},
            "state": "Starting...",
            "emotion": "neutral"
        }))
        .into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK.into_response()
        }
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "database down").into_response(),
        "silent" => StatusCode::BAD_GATEWAY.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Session not found"})),
        )
            .into_response(),
    }
}

async fn stop_session(State(uploads): State<Uploads>, mut multipart: Multipart) -> impl IntoResponse {
    let mut upload = Upload::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("session_id") => upload.session_id = field.text().await.ok(),
            Some("audio") => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            _ => {}
        }
    }

    let session_id = upload.session_id.clone().unwrap_or_default();
    uploads.lock().unwrap().push(upload);

    if session_id != "abc-123" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("Session not found: {}", session_id)})),
        )
            .into_response();
    }

    Json(json!({
        "success": true,
        "sessionId": session_id,
        "engagementData": {
            "metadata": {"lecture_name": "Compilers", "total_data_points": 2},
            "engagement_timeline": [
                {"timestamp": "2025-01-01T10:00:00", "elapsed_seconds": 0.0,
                 "scores": {"concentrated": 40, "engaged": 30, "confused": 20, "bored": 10}},
                {"timestamp": "2025-01-01T10:00:02", "elapsed_seconds": 2.0,
                 "scores": {"concentrated": 25, "engaged": 25, "confused": 25, "bored": 25}}
            ],
            "summary_statistics": {"avg_scores": {"concentrated": 32.5}, "key_moments": {}}
        },
        "transcript": [{"text": "hello", "start": 0.0}],
        "audioFile": {"exists": true, "format": ".wav"}
    }))
    .into_response()
}

async fn lecture_summary(Json(body): Json<Value>) -> impl IntoResponse {
    Json(json!({"session_id": body["session_id"], "summary": "Parsing and lexing"}))
}

async fn spawn_backend() -> Result<(String, Uploads)> {
    let uploads = Uploads::default();

    let app = Router::new()
        .route("/api/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/api/engagement/start", post(start_session))
        .route("/api/engagement/current/:id", get(current_sample))
        .route("/api/engagement/stop", post(stop_session))
        .route("/api/lecture/summary", post(lecture_summary))
        .with_state(uploads.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((format!("http://{}/api", addr), uploads))
}

/// Base URL where nothing is listening
async fn dead_backend() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/api", addr))
}

fn service(base_url: &str) -> Result<HttpEngagementService> {
    HttpEngagementService::new(&BackendConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_create_session_reads_camel_case_id() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;

    let session = service(&base_url)?.create_session("Compilers").await?;

    assert_eq!(session.session_id, "abc-123");
    assert_eq!(session.lecture_name, "Compilers");
    Ok(())
}

#[tokio::test]
async fn test_current_sample_is_validated_and_rescaled() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;
    let service = service(&base_url)?;

    let sample = service.current_sample("abc-123").await?;
    assert!((sample.scores.total() - 100.0).abs() < 1e-9);
    assert!((sample.scores.concentrated - 50.0).abs() < 1e-9);

    let err = service.current_sample("warming-up").await.unwrap_err();
    assert!(matches!(err, RemoteError::Parse(_)));

    Ok(())
}

#[tokio::test]
async fn test_error_bodies_json_and_plain_text() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;
    let service = service(&base_url)?;

    let err = service.current_sample("unknown").await.unwrap_err();
    assert!(err.is_session_not_found());

    match service.current_sample("broken").await.unwrap_err() {
        RemoteError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("unexpected error {:?}", other),
    }

    match service.current_sample("silent").await.unwrap_err() {
        RemoteError::Status { message, .. } => assert_eq!(message, "HTTP error! status: 502"),
        other => panic!("unexpected error {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_stop_uploads_pcm_as_wav() -> Result<()> {
    let (base_url, uploads) = spawn_backend().await?;

    let artifact = AudioArtifact::new(vec![0u8; 3200], "audio/L16;rate=16000;channels=1", 2);
    let report = service(&base_url)?
        .stop_session("abc-123", &artifact)
        .await?;

    assert_eq!(report.session_id.as_deref(), Some("abc-123"));
    assert_eq!(report.timeline_len(), 2);
    assert!(report.transcript.is_array());
    assert!(report.extra.contains_key("success"));

    let uploads = uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.session_id.as_deref(), Some("abc-123"));
    assert_eq!(upload.file_name.as_deref(), Some("recording.wav"));
    assert_eq!(upload.content_type.as_deref(), Some("audio/wav"));
    assert_eq!(&upload.bytes[..4], b"RIFF");
    assert!(upload.bytes.len() > 3200);

    Ok(())
}

#[tokio::test]
async fn test_stop_uploads_encoded_audio_unchanged() -> Result<()> {
    let (base_url, uploads) = spawn_backend().await?;

    let artifact = AudioArtifact::new(vec![7u8; 512], "audio/webm;codecs=opus", 3);
    service(&base_url)?.stop_session("abc-123", &artifact).await?;

    let upload = uploads.lock().unwrap()[0].clone();
    assert_eq!(upload.file_name.as_deref(), Some("recording.webm"));
    assert_eq!(upload.bytes, vec![7u8; 512]);

    Ok(())
}

#[tokio::test]
async fn test_stop_with_stale_session() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;

    let artifact = AudioArtifact::new(vec![1u8; 64], "audio/webm", 1);
    let err = service(&base_url)?
        .stop_session("expired-1", &artifact)
        .await
        .unwrap_err();

    assert!(err.is_session_not_found());
    assert_eq!(err.to_string(), "Session not found: expired-1");
    Ok(())
}

#[tokio::test]
async fn test_request_timeout() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;

    let mut config = BackendConfig {
        base_url,
        ..Default::default()
    };
    config.timeouts.current_sample_ms = 200;
    let service = HttpEngagementService::new(&config)?;

    let err = service.current_sample("slow").await.unwrap_err();
    assert!(matches!(err, RemoteError::Timeout));

    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend() -> Result<()> {
    let base_url = dead_backend().await?;
    let service = service(&base_url)?;

    let err = service.create_session("Compilers").await.unwrap_err();
    assert!(matches!(err, RemoteError::Unavailable(_)));
    assert!(!service.health().await);

    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;
    assert!(service(&base_url)?.health().await);
    Ok(())
}

#[tokio::test]
async fn test_analytics_passes_session_id() -> Result<()> {
    let (base_url, _) = spawn_backend().await?;

    let client = AnalyticsClient::new(&BackendConfig {
        base_url,
        ..Default::default()
    })?;

    let summary = client.lecture_summary("abc-123").await?;
    assert_eq!(summary["session_id"], "abc-123");
    assert_eq!(summary["summary"], "Parsing and lexing");

    Ok(())
}
