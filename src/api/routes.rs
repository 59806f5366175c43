use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{CookieSigner, COOKIE_NAME};
use crate::state::AppState;
use crate::web::templates;

type SharedState = Arc<AppState>;

/// Create the main router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_handler))
        .route("/reset", post(reset_handler))
        .route("/history", get(history_handler))
        .route("/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct AskRequest {
    /// Missing field reads as empty, which the tracker rejects the same
    /// way as an explicit empty string.
    #[serde(default)]
    question: String,
}

/// Session id from the request cookie, or a freshly minted one when the
/// cookie is absent or fails verification.
fn resolve_session(headers: &HeaderMap, signer: &CookieSigner) -> Uuid {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == COOKIE_NAME).then(|| signer.verify(value)).flatten()
            })
        })
        .unwrap_or_else(Uuid::new_v4)
}

/// Attaches the session cookie. Only endpoints that persist state call
/// this; `/stats` and `/history` never write a cookie.
fn with_session_cookie(mut response: Response, signer: &CookieSigner, id: Uuid) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        signer.mint(id)
    );
    response.headers_mut().insert(
        header::SET_COOKIE,
        // the value is our own uuid + hex, always valid ASCII
        HeaderValue::from_str(&cookie).expect("cookie value is ASCII"),
    );
    response
}

/// Main page: the bathtub UI rendered with the current session snapshot.
async fn index_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let id = resolve_session(&headers, state.signer());
    state.ensure_session(id).await;
    let snapshot = state.stats(id).await;
    let response = Html(templates::render_index(&snapshot)).into_response();
    with_session_cookie(response, state.signer(), id)
}

/// Ask a question, charge the bathtub, return the exchange report.
async fn ask_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::InvalidInput(rejection.body_text()).into_response(),
    };

    let id = resolve_session(&headers, state.signer());
    match state.ask(id, &request.question).await {
        Ok(report) => {
            let response = Json(report).into_response();
            with_session_cookie(response, state.signer(), id)
        }
        Err(err) => {
            if matches!(err, ApiError::Service(_)) {
                tracing::error!("ask failed: {err}");
            }
            err.into_response()
        }
    }
}

/// Drain the bathtub.
async fn reset_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let id = resolve_session(&headers, state.signer());
    let report = state.reset(id).await;
    let response = Json(report).into_response();
    with_session_cookie(response, state.signer(), id)
}

/// Conversation history in insertion order.
async fn history_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let id = resolve_session(&headers, state.signer());
    Json(state.history(id).await).into_response()
}

/// Current totals, no side effects.
async fn stats_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let id = resolve_session(&headers, state.signer());
    Json(state.stats(id).await).into_response()
}
