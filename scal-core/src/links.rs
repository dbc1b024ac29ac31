//! Schoology link recognition.
//!
//! Feed entries reference their Schoology item only through a URL somewhere
//! in the component text. These patterns pull the id and kind back out.

use std::sync::LazyLock;

use regex::Regex;

use crate::ics::CalendarEvent;
use crate::item::ItemKind;

const ASSIGN_OR_EVENT: &str = r"(?P<scheme>https?)://[^/\s]*\.schoology\.com/(?P<type>assignment|event|assessment)/(?P<id>\d+)(?:[/?#]|$|\s)";

const DISCUSSION: &str = r"(?P<scheme>https?)://[^/\s]*\.schoology\.com/course/\d+/materials/discussion/(?:view/)?(?P<id>\d+)(?:[/?#]|$|\s)";

const ANY_ITEM: &str =
    r"(?P<scheme>https?)://[^/\s]*\.schoology\.com/(?P<type>[a-zA-Z_-]+)/(?P<id>\d+)(?:[/?#]|$|\s)";

static RE_ASSIGN_OR_EVENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){ASSIGN_OR_EVENT}")).expect("valid regex"));

static RE_DISCUSSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){DISCUSSION}")).expect("valid regex"));

static RE_ANY_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){ANY_ITEM}")).expect("valid regex"));

/// The ` - Link: <url>` trailers Schoology appends to descriptions.
static RE_LINK_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i) - Link: https?://[^/\s]*\.schoology\.com/\S*").expect("valid regex")
});

/// A Schoology reference found in an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: String,
    pub kind: ItemKind,
}

/// Look for an item reference in a single piece of text.
pub fn find_item_ref(text: &str) -> Option<ItemRef> {
    if let Some(caps) = RE_ASSIGN_OR_EVENT.captures(text) {
        return Some(ItemRef {
            id: caps["id"].to_string(),
            kind: ItemKind::from_link_type(&caps["type"]),
        });
    }

    if let Some(caps) = RE_DISCUSSION.captures(text) {
        return Some(ItemRef {
            id: caps["id"].to_string(),
            kind: ItemKind::Discussion,
        });
    }

    RE_ANY_ITEM.captures(text).map(|caps| ItemRef {
        id: caps["id"].to_string(),
        kind: ItemKind::from_link_type(&caps["type"]),
    })
}

/// Search URL, DESCRIPTION, SUMMARY and LOCATION in that order.
pub fn extract_item_ref(event: &CalendarEvent) -> Option<ItemRef> {
    [
        event.url.as_deref(),
        event.description.as_deref(),
        event.summary.as_deref(),
        event.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(find_item_ref)
}

/// Drop the link trailers from a description.
pub fn clean_description(description: &str) -> String {
    RE_LINK_TRAILER.replace_all(description, "").into_owned()
}
