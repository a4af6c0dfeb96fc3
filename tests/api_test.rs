mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use rookery::domain::{Episode, JobStatus, JobType};
use rookery::infrastructure::audio::{
    FailingAudioProcessor, MockAudioProcessor, SlowAudioProcessor,
};

use helpers::{
    count_rows, get_json, multipart_body, multipart_content_type, spawn_app, wait_for_jobs_terminal,
    wait_for_stage, TestApp,
};

async fn mock_app() -> TestApp {
    spawn_app(Arc::new(MockAudioProcessor)).await
}

async fn seed_episode(app: &TestApp, title: &str, preprocess: JobStatus) -> String {
    let mut episode = Episode::new(title.to_string());
    episode.preprocess_status = preprocess;
    app.episodes.create(&episode, &[]).await.unwrap();
    episode.id.to_string()
}

async fn post_empty(router: &axum::Router, uri: &str) -> StatusCode {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let app = mock_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_request_without_id_when_any_endpoint_then_response_contains_request_id() {
    let app = mock_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn given_request_with_id_when_any_endpoint_then_response_echoes_request_id() {
    let app = mock_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-request-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-123"
    );
}

#[tokio::test]
async fn given_empty_database_when_listing_episodes_then_returns_empty_list() {
    let app = mock_app().await;

    let (status, json) = get_json(&app.router, "/v1/episodes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn given_no_files_when_creating_episode_then_bad_request_and_nothing_persisted() {
    let app = mock_app().await;

    let body = multipart_body(Some("Empty"), &[]);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_rows(&app.pool, "episodes").await, 0);
    assert_eq!(count_rows(&app.pool, "processing_jobs").await, 0);
}

#[tokio::test]
async fn given_unsupported_file_type_when_creating_episode_then_bad_request() {
    let app = mock_app().await;

    let body = multipart_body(Some("Bad"), &[("notes.txt", b"not audio")]);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_rows(&app.pool, "episodes").await, 0);
}

#[tokio::test]
async fn given_traversal_filename_when_creating_episode_then_bad_request() {
    let app = mock_app().await;

    let body = multipart_body(Some("Evil"), &[("..%2F..%2Fevil.wav", b"x")]);
    // The raw name still contains "..", which the validator rejects.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_rows(&app.pool, "episodes").await, 0);
}

#[tokio::test]
async fn given_uploaded_files_when_preprocessing_succeeds_then_episode_completes() {
    let app = mock_app().await;

    let body = multipart_body(
        Some("T"),
        &[
            ("GMT20250301-090000_Recording.wav", b"reference audio" as &[u8]),
            ("ep1-alice.wav", b"speaker audio"),
        ],
    );
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(created["title"], "T");
    assert_ne!(created["preprocess_status"], "COMPLETED");
    assert_eq!(created["postprocess_status"], "INIT");
    assert_eq!(created["metadata_status"], "INIT");
    assert_eq!(created["current_step"], 0);

    let id = created["id"].as_str().unwrap().to_string();
    let episode = wait_for_stage(&app.router, &id, "preprocess_status", "COMPLETED").await;
    assert_eq!(episode["current_step"], 1);

    // Exactly one processed track: the reference recording produces none.
    let episode_id = rookery::domain::EpisodeId::from_uuid(id.parse().unwrap());
    let processed = app
        .artifacts
        .list_processed_files(episode_id, JobType::Preprocess)
        .await
        .unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].filename, "ep1-alice.wav");
    let transcriptions = app.artifacts.list_transcriptions(episode_id).await.unwrap();
    assert_eq!(transcriptions.len(), 1);

    let (status, audios) = get_json(&app.router, &format!("/v1/episodes/{}/audios", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audios, serde_json::json!(["ep1-alice.wav"]));

    // Cascading delete: rows and on-disk artifacts all go.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/episodes/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, listed) = get_json(&app.router, "/v1/episodes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, serde_json::json!([]));

    for table in [
        "episodes",
        "source_files",
        "processed_files",
        "transcriptions",
        "metadata_files",
        "processing_jobs",
    ] {
        assert_eq!(count_rows(&app.pool, table).await, 0, "{} not empty", table);
    }
    let leftovers = app
        .media_store
        .list(
            episode_id,
            rookery::application::ports::MediaDir::Source,
            None,
        )
        .await
        .unwrap();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn given_failing_processor_when_preprocessing_then_stage_fails_with_message() {
    let app = spawn_app(Arc::new(FailingAudioProcessor::new("alignment blew up"))).await;

    let body = multipart_body(Some("Doomed"), &[("ep1-bob.wav", b"audio" as &[u8])]);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    wait_for_stage(&app.router, &id, "preprocess_status", "FAILED").await;

    let jobs = wait_for_jobs_terminal(&app.router, &id).await;
    let job = &jobs.as_array().unwrap()[0];
    assert_eq!(job["job_type"], "preprocess");
    assert_eq!(job["status"], "FAILED");
    let message = job["error_message"].as_str().unwrap();
    assert!(message.contains("alignment blew up"));

    assert_eq!(count_rows(&app.pool, "processed_files").await, 0);
}

#[tokio::test]
async fn given_incomplete_preprocess_when_initiating_postprocess_then_precondition_fails() {
    let app = mock_app().await;
    let id = seed_episode(&app, "Early", JobStatus::Init).await;

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/postprocess", id)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    // The rejected request must not leave a job row behind.
    assert_eq!(count_rows(&app.pool, "processing_jobs").await, 0);
}

#[tokio::test]
async fn given_completed_preprocess_when_running_remaining_stages_then_artifacts_served() {
    let app = mock_app().await;
    let id = seed_episode(&app, "Pipeline", JobStatus::Completed).await;

    // Artifact endpoints 404 until their owning stage completes.
    let (status, _) = get_json(&app.router, &format!("/v1/episodes/{}/srt", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_json(&app.router, &format!("/v1/episodes/{}/chapters", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/postprocess", id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let episode = wait_for_stage(&app.router, &id, "postprocess_status", "COMPLETED").await;
    assert_eq!(episode["current_step"], 2);

    let (status, _) = get_json(&app.router, &format!("/v1/episodes/{}/srt", id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(
        &app.router,
        &format!("/v1/episodes/{}/postprocessed-audio", id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/metadata", id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let episode = wait_for_stage(&app.router, &id, "metadata_status", "COMPLETED").await;
    assert_eq!(episode["current_step"], 3);

    let (status, _) = get_json(&app.router, &format!("/v1/episodes/{}/chapters", id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(&app.router, &format!("/v1/episodes/{}/show-notes", id)).await;
    assert_eq!(status, StatusCode::OK);

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/export", id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_jobs_terminal(&app.router, &id).await;

    let episode_id = rookery::domain::EpisodeId::from_uuid(id.parse().unwrap());
    let exported = app
        .artifacts
        .list_processed_files(episode_id, JobType::Export)
        .await
        .unwrap();
    assert_eq!(exported.len(), 1);
}

#[tokio::test]
async fn given_export_before_metadata_then_precondition_fails() {
    let app = mock_app().await;
    let id = seed_episode(&app, "Eager", JobStatus::Completed).await;

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/export", id)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count_rows(&app.pool, "processing_jobs").await, 0);
}

#[tokio::test]
async fn given_editor_state_when_patching_then_round_trips_unmodified() {
    let app = mock_app().await;
    let id = seed_episode(&app, "Editable", JobStatus::Completed).await;

    let editor_state = r#"{"tracks":[{"cut":[0.5,"𝔘nicode"],"note":"line\nbreak \"quoted\""}]}"#;
    let payload = serde_json::json!({ "editor_state": editor_state });

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/v1/episodes/{}", id))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, json) = get_json(&app.router, &format!("/v1/episodes/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["editor_state"].as_str().unwrap(), editor_state);
    assert_eq!(json["title"], "Editable");
}

#[tokio::test]
async fn given_title_update_when_patching_then_title_changes() {
    let app = mock_app().await;
    let id = seed_episode(&app, "Original Title", JobStatus::Completed).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/v1/episodes/{}", id))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"Updated Title"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, json) = get_json(&app.router, &format!("/v1/episodes/{}", id)).await;
    assert_eq!(json["title"], "Updated Title");
}

#[tokio::test]
async fn given_active_job_when_initiating_or_deleting_then_conflict() {
    let app = spawn_app(Arc::new(SlowAudioProcessor::new(Duration::from_secs(30)))).await;
    let id = seed_episode(&app, "Busy", JobStatus::Completed).await;

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/postprocess", id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Single-flight: a second stage start is refused while one is running.
    let status = post_empty(&app.router, &format!("/v1/episodes/{}/postprocess", id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/episodes/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn given_completed_stage_when_initiating_again_then_conflict() {
    let app = mock_app().await;
    let mut episode = Episode::new("Done".to_string());
    episode.preprocess_status = JobStatus::Completed;
    episode.postprocess_status = JobStatus::Completed;
    app.episodes.create(&episode, &[]).await.unwrap();

    let status = post_empty(
        &app.router,
        &format!("/v1/episodes/{}/postprocess", episode.id),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(count_rows(&app.pool, "processing_jobs").await, 0);
}

#[tokio::test]
async fn given_failed_preprocess_when_retrying_then_stage_completes() {
    let app = mock_app().await;
    let mut episode = Episode::new("Second Chance".to_string());
    episode.preprocess_status = JobStatus::Failed;
    let sources = vec![rookery::domain::SourceFile::new(
        episode.id,
        "ep1-dana.wav".to_string(),
    )];
    app.episodes.create(&episode, &sources).await.unwrap();
    app.media_store
        .save_source(episode.id, "ep1-dana.wav", b"audio")
        .await
        .unwrap();
    let id = episode.id.to_string();

    let status = post_empty(&app.router, &format!("/v1/episodes/{}/preprocess", id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    wait_for_stage(&app.router, &id, "preprocess_status", "COMPLETED").await;
}

#[tokio::test]
async fn given_unknown_episode_when_getting_then_not_found() {
    let app = mock_app().await;

    let (status, _) = get_json(
        &app.router,
        "/v1/episodes/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_invalid_episode_id_when_getting_then_bad_request() {
    let app = mock_app().await;

    let (status, _) = get_json(&app.router, "/v1/episodes/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_missing_title_when_creating_episode_then_title_defaults() {
    let app = mock_app().await;

    let body = multipart_body(None, &[("ep1-carol.wav", b"audio" as &[u8])]);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/episodes")
                .header("content-type", multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(!created["title"].as_str().unwrap().is_empty());
}
