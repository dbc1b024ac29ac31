//! Embedded HTML templates.

use anyhow::Result;
use axum::response::Html;
use tera::{Context, Tera};

use crate::error::AppError;

pub const GLOBALS_CSS: &str = include_str!("../templates/globals.css");

const TEMPLATES: [(&str, &str); 10] = [
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("ok.html", include_str!("../templates/ok.html")),
    ("agenda.html", include_str!("../templates/agenda.html")),
    ("custom.html", include_str!("../templates/custom.html")),
    ("custom_fields.html", include_str!("../templates/custom_fields.html")),
    ("custom_edit.html", include_str!("../templates/custom_edit.html")),
    ("settings.html", include_str!("../templates/settings.html")),
    ("refresh.html", include_str!("../templates/refresh.html")),
    ("mark_overdue.html", include_str!("../templates/mark_overdue.html")),
];

pub fn load() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(tera)
}

/// Render a page. `notice` shows up as a banner above the content.
pub fn render(
    tera: &Tera,
    name: &str,
    mut context: Context,
    notice: Option<&str>,
) -> Result<Html<String>, AppError> {
    context.insert("notice", &notice.filter(|n| !n.is_empty()));
    Ok(Html(tera.render(name, &context)?))
}
