pub mod custom;
pub mod feed;
pub mod home;
pub mod marks;
pub mod settings;

use axum::response::Redirect;
use serde::Deserialize;

/// `?notice=` banner text carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// 303 back to `path` with a banner.
pub fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{path}?notice={}", urlencoding::encode(notice)))
}
