//! Schoology REST client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use scal_core::config::{Credentials, ScalConfig};
use scal_core::error::{ScalError, ScalResult};
use scal_core::upstream::{EVENTS_PAGE_SIZE, Section, SubmissionCheck, Upstream, UpstreamEvent};

use crate::oauth::authorization_header;

/// Stop paging after this many pages even if they keep coming back full.
const MAX_EVENT_PAGES: usize = 100;

#[derive(Deserialize)]
struct SectionList {
    #[serde(default)]
    section: Vec<Section>,
}

pub struct SchoologyClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
    user_id: Option<String>,
}

impl SchoologyClient {
    /// Credentials are only needed for API calls; fetching the ICS export
    /// works without them.
    pub fn new(config: &ScalConfig) -> ScalResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.schoology.timeout_secs))
            .user_agent(concat!("scal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScalError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.schoology.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials().ok(),
            user_id: config.user_id().map(str::to_string),
        })
    }

    fn credentials(&self) -> ScalResult<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or(ScalError::MissingCredentials("SCHOOLOGY_KEY and SCHOOLOGY_SECRET"))
    }

    fn user_id(&self) -> ScalResult<&str> {
        self.user_id
            .as_deref()
            .ok_or(ScalError::MissingCredentials("SCHOOLOGY_UID"))
    }

    /// Signed GET. Returns the raw response so callers can handle 404s.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> ScalResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "Schoology request");

        self.http
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, authorization_header(self.credentials()?))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(send_error)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ScalResult<T> {
        let response = self.get(path, query).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScalError::Upstream {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ScalError::Serialization(format!("{path}: {e}")))
    }
}

/// Connection and timeout failures mean we're offline.
fn send_error(e: reqwest::Error) -> ScalError {
    if e.is_connect() || e.is_timeout() {
        ScalError::Offline(e.to_string())
    } else {
        ScalError::Request(e.to_string())
    }
}

/// Schoology sends flags as 0/1, "0"/"1" or booleans.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        _ => false,
    }
}

/// The events endpoint has used `event`, `events` and `data` for its list.
/// One page of `/users/{uid}/events`. `rows` counts every entry the API
/// sent, including ones that could not be read.
struct EventPage {
    rows: usize,
    events: Vec<UpstreamEvent>,
}

fn event_page(body: &Value) -> EventPage {
    let list = ["event", "events", "data"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_array));

    let Some(list) = list else {
        return EventPage {
            rows: 0,
            events: Vec::new(),
        };
    };

    let events = list
        .iter()
        .filter_map(|raw| match serde_json::from_value::<UpstreamEvent>(raw.clone()) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable event");
                None
            }
        })
        .collect();

    EventPage {
        rows: list.len(),
        events,
    }
}

fn submission_check(body: &Value) -> SubmissionCheck {
    let has_submission = body
        .get("revision")
        .and_then(Value::as_array)
        .is_some_and(|revisions| {
            revisions
                .iter()
                .any(|r| r.get("draft").is_some_and(|d| !truthy(d)))
        });

    let allowed = body.get("allow_submissions").is_none_or(truthy);

    SubmissionCheck {
        has_submission,
        submissions_disabled: !allowed,
    }
}

/// `webcal://` is just `https://` to anything that isn't a calendar app.
fn http_url(url: &str) -> String {
    match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

#[async_trait]
impl Upstream for SchoologyClient {
    #[instrument(skip(self))]
    async fn fetch_calendar(&self, url: &str) -> ScalResult<String> {
        let url = http_url(url);

        let response = self.http.get(&url).send().await.map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScalError::FeedUnavailable(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScalError::FeedUnavailable(e.to_string()))?;

        if body.trim().is_empty() {
            return Err(ScalError::FeedUnavailable("empty response".into()));
        }

        debug!(bytes = body.len(), "Fetched ICS export");
        Ok(body)
    }

    #[instrument(skip(self))]
    async fn sections(&self) -> ScalResult<Vec<Section>> {
        let path = format!("/users/{}/sections", self.user_id()?);
        let list: SectionList = self.get_json(&path, &[]).await?;

        debug!(count = list.section.len(), "Fetched sections");
        Ok(list.section)
    }

    #[instrument(skip(self))]
    async fn events(&self, from: NaiveDate, to: NaiveDate) -> ScalResult<Vec<UpstreamEvent>> {
        let path = format!("/users/{}/events", self.user_id()?);
        let mut events = Vec::new();

        for page in 0..MAX_EVENT_PAGES {
            let query = [
                ("start_date", from.format("%Y-%m-%d").to_string()),
                ("end_date", to.format("%Y-%m-%d").to_string()),
                ("start", (page * EVENTS_PAGE_SIZE).to_string()),
                ("limit", EVENTS_PAGE_SIZE.to_string()),
            ];
            let body: Value = self.get_json(&path, &query).await?;
            let page = event_page(&body);
            let done = page.rows < EVENTS_PAGE_SIZE;

            events.extend(page.events);
            if done {
                break;
            }
        }

        debug!(count = events.len(), "Fetched user events");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn submission(&self, section_id: &str, assignment_id: &str) -> ScalResult<SubmissionCheck> {
        let path = format!(
            "/sections/{section_id}/submissions/{assignment_id}/{}",
            self.user_id()?
        );
        let response = self.get(&path, &[]).await?;

        match response.status() {
            StatusCode::OK => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| ScalError::Serialization(format!("{path}: {e}")))?;
                Ok(submission_check(&body))
            }
            StatusCode::NOT_FOUND => Ok(SubmissionCheck {
                has_submission: false,
                submissions_disabled: true,
            }),
            status => Err(ScalError::Upstream {
                status: status.as_u16(),
                path,
            }),
        }
    }
}
