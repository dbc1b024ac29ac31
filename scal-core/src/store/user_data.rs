//! `user_data.json`: manual marks, custom events and runtime settings.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::custom::CustomEvent;
use crate::schedule::parse_hhmm;

pub const USER_DATA_FILE: &str = "user_data.json";

/// Settings changed from the settings page. Unset values fall back to config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_events: Option<bool>,

    /// `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_start_time: Option<String>,
}

/// Settings with config defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub stack_events: bool,
    pub stack_start: NaiveTime,
}

impl Settings {
    pub fn resolve(&self, default_stack: bool, default_start: NaiveTime) -> EffectiveSettings {
        EffectiveSettings {
            stack_events: self.stack_events.unwrap_or(default_stack),
            stack_start: self
                .stack_start_time
                .as_deref()
                .and_then(parse_hhmm)
                .unwrap_or(default_start),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    /// Mark keys: a bare item id, or `<id>@<occurrence>`.
    #[serde(default, deserialize_with = "marks_from_map_or_list", serialize_with = "marks_as_map")]
    pub manual_done: BTreeSet<String>,

    #[serde(default, deserialize_with = "readable_custom_events")]
    pub custom_events: Vec<CustomEvent>,

    #[serde(default)]
    pub settings: Settings,
}

/// One bad entry only costs that entry, not the whole file.
fn readable_custom_events<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<CustomEvent>, D::Error> {
    let raw = Option::<Vec<serde_json::Value>>::deserialize(d)?.unwrap_or_default();

    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").cloned();
            match serde_json::from_value::<CustomEvent>(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(?id, error = %e, "Skipping unreadable custom event");
                    None
                }
            }
        })
        .collect())
}

/// Marks were stored as `{"id": true}`; very old files used a plain list.
fn marks_from_map_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(BTreeMap<String, bool>),
        List(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Map(map)) => map.into_iter().filter(|(_, v)| *v).map(|(k, _)| k).collect(),
        Some(Raw::List(list)) => list.into_iter().collect(),
        None => BTreeSet::new(),
    })
}

fn marks_as_map<S: serde::Serializer>(marks: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
    let map: BTreeMap<&str, bool> = marks.iter().map(|k| (k.as_str(), true)).collect();
    map.serialize(s)
}
