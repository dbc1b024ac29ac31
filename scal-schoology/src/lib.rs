//! Schoology API access for scal.
//!
//! `SchoologyClient` implements `scal_core::Upstream` against the REST API
//! at `api.schoology.com/v1` and fetches the per-user ICS export.

mod client;
mod oauth;

pub use client::SchoologyClient;
