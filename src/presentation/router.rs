use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    audio_file_handler, audios_handler, chapters_handler, create_episode_handler,
    delete_episode_handler, export_handler, get_episode_handler, health_handler,
    list_episodes_handler, list_jobs_handler, metadata_handler, postprocess_handler,
    postprocessed_audio_handler, preprocess_handler, show_notes_handler, srt_handler,
    update_episode_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let max_upload = state.settings.storage.max_upload_size_bytes as usize;

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/v1/episodes",
            get(list_episodes_handler).post(create_episode_handler),
        )
        .route(
            "/v1/episodes/{episode_id}",
            get(get_episode_handler)
                .patch(update_episode_handler)
                .delete(delete_episode_handler),
        )
        .route("/v1/episodes/{episode_id}/preprocess", post(preprocess_handler))
        .route(
            "/v1/episodes/{episode_id}/postprocess",
            post(postprocess_handler),
        )
        .route("/v1/episodes/{episode_id}/metadata", post(metadata_handler))
        .route("/v1/episodes/{episode_id}/export", post(export_handler))
        .route("/v1/episodes/{episode_id}/jobs", get(list_jobs_handler))
        .route("/v1/episodes/{episode_id}/audios", get(audios_handler))
        .route(
            "/v1/episodes/{episode_id}/audios/{filename}",
            get(audio_file_handler),
        )
        .route("/v1/episodes/{episode_id}/srt", get(srt_handler))
        .route(
            "/v1/episodes/{episode_id}/postprocessed-audio",
            get(postprocessed_audio_handler),
        )
        .route("/v1/episodes/{episode_id}/chapters", get(chapters_handler))
        .route(
            "/v1/episodes/{episode_id}/show-notes",
            get(show_notes_handler),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
