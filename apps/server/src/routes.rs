use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analyze, apis, explanation, sessions, transcript},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", get(analyze::status).post(analyze::analyze))
        .route("/generate-explanation", post(explanation::generate_explanation))
        .route("/ask-ai", post(explanation::ask_ai))
        .route("/fetch-transcript", post(transcript::fetch_transcript))
        .route("/check-apis", get(apis::check_apis))
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", axum::routing::delete(sessions::delete))
        .route("/sessions/:id/tick", post(sessions::tick))
        .route("/sessions/:id/explanations", get(sessions::explanations))
        .route("/sessions/:id/search", get(sessions::search))
        .route("/sessions/:id/ask", post(sessions::ask))
        .layer(
            ServiceBuilder::new()
                // Enables logging. Use `RUST_LOG=tower_http=debug`
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
