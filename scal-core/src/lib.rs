//! Core of scal: reshaping a Schoology calendar feed.
//!
//! This crate is shared by the server and the CLI:
//! - `feed` turns an upstream ICS export into day buckets and back into ICS
//! - `store` keeps marks, custom events, settings and the upstream cache
//! - `upstream` is the trait the Schoology client implements

pub mod catalog;
pub mod config;
pub mod custom;
pub mod days;
pub mod error;
pub mod feed;
pub mod ics;
pub mod item;
pub mod links;
pub mod occurrence;
pub mod recurrence;
pub mod schedule;
pub mod status;
pub mod store;
pub mod upstream;

pub use config::ScalConfig;
pub use days::DayBucket;
pub use error::{ScalError, ScalResult};
pub use feed::{Feed, FeedBuilder};
pub use item::{Item, ItemKind, Status};
pub use store::Store;
pub use upstream::Upstream;
