//! The reshaped feed, as ICS and as an HTML agenda.

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::info;

use scal_core::item::Item;
use scal_core::{Feed, ScalError};

use crate::error::AppError;
use crate::pages;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fetch", get(fetch))
        .route("/agenda", get(agenda))
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub url: Option<String>,
}

/// `?url=` wins over the configured export URL.
async fn load_feed(state: &AppState, query: FeedQuery) -> Result<Feed, AppError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| state.config.schoology.ics_url.clone())
        .ok_or_else(|| ScalError::InvalidInput("Pass ?url= or set SCHOOLOGY_ICS_URL".into()))?;

    Ok(state.feed_builder().fetch_and_build(&url).await?)
}

/// GET /fetch - The reshaped ICS feed
async fn fetch(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let feed = load_feed(&state, query).await?;
    let body = feed.to_ics()?;

    info!(items = feed.item_count(), bytes = body.len(), "Served feed");

    Ok(([(header::CONTENT_TYPE, "text/calendar; charset=utf-8")], body))
}

#[derive(Serialize)]
struct AgendaItem {
    time: String,
    symbol: &'static str,
    title: String,
    course: Option<String>,
    done: bool,
    toggle_url: Option<String>,
    edit_url: Option<String>,
}

#[derive(Serialize)]
struct AgendaDay {
    label: String,
    items: Vec<AgendaItem>,
}

fn agenda_item(item: &Item) -> AgendaItem {
    let occ = item.occurrence();
    let done = item.status.is_done();

    let toggle_url = item.kind.is_completable().then(|| {
        let action = if done { "unmark-done" } else { "mark-done" };
        format!("/api/{action}/{}?occ={occ}", item.id)
    });

    AgendaItem {
        time: item.start.format("%-I:%M %p").to_string(),
        symbol: item.summary_prefix(),
        title: item.title.clone(),
        course: item.course_short_name().map(str::to_string),
        done,
        toggle_url,
        edit_url: item
            .is_custom()
            .then(|| format!("/custom/edit/{}", item.id)),
    }
}

/// GET /agenda - The feed grouped by day
async fn agenda(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Html<String>, AppError> {
    let feed = load_feed(&state, query).await?;

    let days: Vec<AgendaDay> = feed
        .days()
        .iter()
        .map(|day| AgendaDay {
            label: day.date.format("%A, %B %-d").to_string(),
            items: day.items.iter().map(agenda_item).collect(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("name", feed.name.as_deref().unwrap_or("Agenda"));
    context.insert("days", &days);
    context.insert("passthrough", &feed.passthrough.len());

    pages::render(&state.templates, "agenda.html", context, None)
}
