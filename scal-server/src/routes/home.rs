//! Dashboard and static bits.

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use tera::Context;

use crate::error::AppError;
use crate::pages;
use crate::routes::NoticeQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/ok", get(ok))
        .route("/health", get(health))
        .route("/globals.css", get(globals_css))
}

/// GET / - Counts from the cache, no upstream calls
async fn home(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let tz = state.config.tz();

    let mut context = Context::new();
    context.insert("metrics", &state.store.metrics());
    context.insert("marks", &state.store.marks().len());
    context.insert(
        "generated_at",
        &state
            .store
            .catalog_generated_at()
            .map(|at| at.with_timezone(&tz).format("%b %-d at %-I:%M %p").to_string()),
    );

    pages::render(&state.templates, "home.html", context, query.notice.as_deref())
}

/// GET /ok - Landing page after a mark link
async fn ok(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    pages::render(&state.templates, "ok.html", Context::new(), query.notice.as_deref())
}

async fn health() -> &'static str {
    "ok"
}

async fn globals_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], pages::GLOBALS_CSS)
}
