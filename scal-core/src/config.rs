//! Runtime configuration.
//!
//! Layers, lowest priority first: built-in defaults, `~/.config/scal/config.toml`,
//! `SCAL__*` environment variables, then the flat variables the service has
//! always read (`SCHOOLOGY_KEY`, `COURSE_DUE_TIMES_JSON`, `PORT`, ...).

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ScalError, ScalResult};
use crate::schedule::parse_hhmm;

pub const DEFAULT_API_BASE: &str = "https://api.schoology.com/v1";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4588;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_stack_start() -> String {
    "08:25".to_string()
}

fn default_event_length() -> i64 {
    50
}

fn default_submission_max_age() -> i64 {
    60 * 60
}

fn default_days_back() -> i64 {
    60
}

fn default_days_forward() -> i64 {
    60
}

fn default_repeat_days() -> i64 {
    180
}

/// Credentials and endpoints for the Schoology REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoologyConfig {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub secret: Option<String>,

    /// Numeric Schoology user id, kept as a string.
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default = "default_api_base")]
    pub base_url: String,

    /// Feed served by `/fetch` when no `url` query parameter is given.
    #[serde(default)]
    pub ics_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SchoologyConfig {
    fn default() -> Self {
        Self {
            key: None,
            secret: None,
            user_id: None,
            base_url: default_api_base(),
            ics_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base for the links embedded in event descriptions. Set this when the
    /// server sits behind a reverse proxy.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

/// How far around "now" the feed and catalog look.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_days_back")]
    pub days_back: i64,

    #[serde(default = "default_days_forward")]
    pub days_forward: i64,

    /// Horizon for expanding repeating custom events.
    #[serde(default = "default_repeat_days")]
    pub repeat_days: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            days_forward: default_days_forward(),
            repeat_days: default_repeat_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalConfig {
    #[serde(default)]
    pub schoology: SchoologyConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub window: WindowConfig,

    /// Where `user_data.json` and `schoology_cache.json` live.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// IANA zone name. Falls back to the system zone, then UTC.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Course title substring to "HH:MM" due time.
    #[serde(default)]
    pub course_due_times: BTreeMap<String, String>,

    /// Default for the runtime stacking setting.
    #[serde(default = "default_true")]
    pub stack_events: bool,

    #[serde(default = "default_stack_start")]
    pub stack_start_time: String,

    #[serde(default = "default_event_length")]
    pub event_length_minutes: i64,

    #[serde(default = "default_submission_max_age")]
    pub submission_cache_max_age_secs: i64,

    #[serde(skip)]
    resolved_tz: Option<Tz>,
}

impl Default for ScalConfig {
    fn default() -> Self {
        Self {
            schoology: SchoologyConfig::default(),
            server: ServerConfig::default(),
            window: WindowConfig::default(),
            data_dir: None,
            timezone: None,
            course_due_times: BTreeMap::new(),
            stack_events: default_true(),
            stack_start_time: default_stack_start(),
            event_length_minutes: default_event_length(),
            submission_cache_max_age_secs: default_submission_max_age(),
            resolved_tz: None,
        }
    }
}

/// API key and secret for signing upstream requests.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

fn config_err(e: config::ConfigError) -> ScalError {
    ScalError::Config(e.to_string())
}

fn non_empty(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ScalConfig {
    pub fn config_path() -> ScalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScalError::Config("Could not determine config directory".into()))?
            .join("scal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `.env`, the config file and the process environment.
    pub fn load(path: Option<&Path>) -> ScalResult<Self> {
        dotenvy::dotenv().ok();

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        let vars: HashMap<String, String> = std::env::vars().collect();

        Self::from_sources(Some(&path), &vars)
    }

    /// Build a config from an optional file and an explicit variable map.
    pub fn from_sources(path: Option<&Path>, vars: &HashMap<String, String>) -> ScalResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCAL")
                .separator("__")
                .source(Some(vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect())),
        );

        builder = builder
            .set_override_option("schoology.key", non_empty(vars, "SCHOOLOGY_KEY"))
            .map_err(config_err)?
            .set_override_option("schoology.secret", non_empty(vars, "SCHOOLOGY_SECRET"))
            .map_err(config_err)?
            .set_override_option("schoology.user_id", non_empty(vars, "SCHOOLOGY_UID"))
            .map_err(config_err)?
            .set_override_option("schoology.ics_url", non_empty(vars, "SCHOOLOGY_ICS_URL"))
            .map_err(config_err)?
            .set_override_option("server.host", non_empty(vars, "HOST"))
            .map_err(config_err)?
            .set_override_option("server.port", non_empty(vars, "PORT"))
            .map_err(config_err)?
            .set_override_option(
                "stack_events",
                non_empty(vars, "STACK_EVENTS").map(|v| v == "1"),
            )
            .map_err(config_err)?;

        let mut config: ScalConfig = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;

        if let Some(raw) = non_empty(vars, "COURSE_DUE_TIMES_JSON") {
            let times: BTreeMap<String, String> = serde_json::from_str(&raw)
                .map_err(|e| ScalError::Config(format!("COURSE_DUE_TIMES_JSON: {e}")))?;
            config.course_due_times.extend(times);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> ScalResult<()> {
        if parse_hhmm(&self.stack_start_time).is_none() {
            return Err(ScalError::Config(format!(
                "stack_start_time must be HH:MM, got '{}'",
                self.stack_start_time
            )));
        }

        for (course, time) in &self.course_due_times {
            if parse_hhmm(time).is_none() {
                return Err(ScalError::Config(format!(
                    "Due time for '{course}' must be HH:MM, got '{time}'"
                )));
            }
        }

        if self.event_length_minutes <= 0 {
            return Err(ScalError::Config("event_length_minutes must be positive".into()));
        }

        self.resolved_tz = Some(match &self.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ScalError::Config(format!("Unknown timezone '{name}'")))?,
            None => system_tz(),
        });

        Ok(())
    }

    /// Pin the timezone without going through the loaders.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz.name().to_string());
        self.resolved_tz = Some(tz);
        self
    }

    pub fn tz(&self) -> Tz {
        self.resolved_tz.unwrap_or_else(system_tz)
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned()),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("scal"),
        }
    }

    pub fn credentials(&self) -> ScalResult<Credentials> {
        match (&self.schoology.key, &self.schoology.secret) {
            (Some(key), Some(secret)) => Ok(Credentials {
                key: key.clone(),
                secret: secret.clone(),
            }),
            _ => Err(ScalError::MissingCredentials("SCHOOLOGY_KEY and SCHOOLOGY_SECRET")),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.schoology.user_id.as_deref().filter(|u| !u.is_empty())
    }

    /// Base URL for links embedded in the feed.
    pub fn public_url(&self) -> String {
        match &self.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }

    pub fn default_stack_start(&self) -> NaiveTime {
        parse_hhmm(&self.stack_start_time).unwrap_or(NaiveTime::MIN)
    }

    pub fn event_length(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.event_length_minutes)
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> ScalResult<()> {
        let contents = format!(
            "\
# scal configuration

# [schoology]
# key = \"...\"
# secret = \"...\"
# user_id = \"12345678\"
# ics_url = \"https://example.schoology.com/calendar/feed/ical/...\"

# [server]
# host = \"{DEFAULT_HOST}\"
# port = {DEFAULT_PORT}
# public_url = \"https://scal.example.com\"

# timezone = \"America/Los_Angeles\"
# stack_events = true
# stack_start_time = \"08:25\"

# [course_due_times]
# \"AP Chemistry\" = \"08:00\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ScalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Render the effective config, secrets redacted.
    pub fn to_redacted_toml(&self) -> ScalResult<String> {
        let mut shown = self.clone();
        if shown.schoology.secret.is_some() {
            shown.schoology.secret = Some("********".into());
        }
        toml::to_string_pretty(&shown).map_err(|e| ScalError::Config(e.to_string()))
    }
}

fn system_tz() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_any_source() {
        let config = ScalConfig::from_sources(None, &HashMap::new()).unwrap();

        assert_eq!(config.server.port, 4588);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.schoology.base_url, DEFAULT_API_BASE);
        assert!(config.stack_events, "Stacking should default to on");
        assert_eq!(config.stack_start_time, "08:25");
        assert_eq!(config.window.days_back, 60);
        assert_eq!(config.window.repeat_days, 180);
        assert!(config.credentials().is_err(), "No credentials configured");
    }

    #[test]
    fn test_legacy_env_names_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[schoology]\nkey = \"from-file\"\nsecret = \"s\"\n\n[server]\nport = 9000\n",
        )
        .unwrap();

        let env = vars(&[
            ("SCHOOLOGY_KEY", "from-env"),
            ("SCHOOLOGY_UID", "424242"),
            ("STACK_EVENTS", "0"),
            ("COURSE_DUE_TIMES_JSON", r#"{"Chemistry": "08:00", "History": "14:30"}"#),
        ]);

        let config = ScalConfig::from_sources(Some(&path), &env).unwrap();

        assert_eq!(config.schoology.key.as_deref(), Some("from-env"));
        assert_eq!(config.schoology.secret.as_deref(), Some("s"));
        assert_eq!(config.user_id(), Some("424242"));
        assert_eq!(config.server.port, 9000, "File value should survive when env is silent");
        assert!(!config.stack_events);
        assert_eq!(config.course_due_times.get("History").map(String::as_str), Some("14:30"));
    }

    #[test]
    fn test_prefixed_env_reaches_nested_keys() {
        let env = vars(&[("SCAL__SERVER__PUBLIC_URL", "https://scal.example.com/")]);
        let config = ScalConfig::from_sources(None, &env).unwrap();

        assert_eq!(config.public_url(), "https://scal.example.com");
    }

    #[test]
    fn test_invalid_due_time_is_rejected() {
        let env = vars(&[("COURSE_DUE_TIMES_JSON", r#"{"Art": "noon"}"#)]);
        let err = ScalConfig::from_sources(None, &env).unwrap_err();

        assert!(
            err.to_string().contains("Art"),
            "Error should name the course. Got: {}",
            err
        );
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let env = vars(&[("SCAL__TIMEZONE", "Mars/Olympus_Mons")]);
        assert!(ScalConfig::from_sources(None, &env).is_err());
    }

    #[test]
    fn test_public_url_defaults_to_listen_address() {
        let config = ScalConfig::default();
        assert_eq!(config.public_url(), "http://127.0.0.1:4588");
    }
}
