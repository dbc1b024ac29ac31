//! Occurrence tokens identify one dated instance of an item.
//!
//! A mark stored under `<id>@<token>` applies to that instance only; a mark
//! stored under the bare id applies to every instance.

use chrono::DateTime;
use chrono_tz::Tz;

const TOKEN_LEN: usize = 13;

/// Minute-precision local timestamp, e.g. `20250304T2359`.
pub fn occurrence_token(due: DateTime<Tz>) -> String {
    due.format("%Y%m%dT%H%M").to_string()
}

/// Trim a token from a query string to minute precision. Empty means none.
pub fn normalize_token(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.chars().take(TOKEN_LEN).collect())
}

pub fn mark_key(item_id: &str, token: Option<&str>) -> String {
    match token {
        Some(tok) => format!("{item_id}@{tok}"),
        None => item_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    #[test]
    fn test_token_uses_local_minutes() {
        let due = New_York.with_ymd_and_hms(2025, 3, 4, 23, 59, 30).unwrap();
        assert_eq!(occurrence_token(due), "20250304T2359");
    }

    #[test]
    fn test_normalize_truncates_seconds() {
        assert_eq!(
            normalize_token(Some("20250304T235930")),
            Some("20250304T2359".to_string())
        );
        assert_eq!(normalize_token(Some("  ")), None);
        assert_eq!(normalize_token(None), None);
    }

    #[test]
    fn test_mark_key_forms() {
        assert_eq!(mark_key("7001", None), "7001");
        assert_eq!(mark_key("7001", Some("20250304T2359")), "7001@20250304T2359");
    }
}
