//! # Settings Module
//!
//! Runtime settings read from the environment (and a `.env` file when
//! present). `Settings` is a plain value: it builds the configured
//! `BatchRunner` explicitly rather than through any global state.
//!
//! | Variable | Default |
//! |---|---|
//! | `SITE_URL` | `https://yourdomain.com` |
//! | `HTTP_TIMEOUT_SECS` | `10` |
//! | `CONNECT_TIMEOUT_SECS` | `10` |
//! | `MAX_REDIRECTS` | `5` |
//! | `OPENAI_API_KEY` | unset (scanning disabled) |
//! | `OPENAI_BASE_URL` | `https://api.openai.com` |
//! | `AI_MODEL` | `gpt-3.5-turbo` |
//! | `AI_SCAN_ENABLED` | `true` |
//! | `DATABASE_PATH` | `sitecheck.db` |
//! | `STATUS_PACING_MS` | `500` |
//! | `SCAN_PACING_MS` | `1000` |

use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info};

use crate::batch::{BatchConfig, BatchRunner};
use crate::checker::{CheckerConfig, DEFAULT_SITE_URL};
use crate::classifier::{
    Classifier, ClassifierConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiService,
};
use crate::error::{Error, Result};
use crate::store::Database;

/// Default database file
pub const DEFAULT_DATABASE_PATH: &str = "sitecheck.db";

/// Settings for one process run
#[derive(Clone)]
pub struct Settings {
    /// Operator's site, named in the user agent
    pub site_url: String,

    /// Overall per-request timeout for target sites
    pub http_timeout: Duration,

    /// Connect timeout for target sites
    pub connect_timeout: Duration,

    /// Redirects followed before giving up
    pub max_redirects: usize,

    /// Key for the classification service
    pub openai_api_key: Option<String>,

    /// Base URL of the classification service
    pub openai_base_url: String,

    /// Model used for classification
    pub ai_model: String,

    /// Master switch for content scans
    pub ai_scan_enabled: bool,

    /// Path of the libsql database file
    pub database_path: String,

    /// Delay between status-check items
    pub status_pacing: Duration,

    /// Delay between scan items
    pub scan_pacing: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("site_url", &self.site_url)
            .field("http_timeout", &self.http_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_redirects", &self.max_redirects)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("openai_base_url", &self.openai_base_url)
            .field("ai_model", &self.ai_model)
            .field("ai_scan_enabled", &self.ai_scan_enabled)
            .field("database_path", &self.database_path)
            .field("status_pacing", &self.status_pacing)
            .field("scan_pacing", &self.scan_pacing)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through a variable lookup
    ///
    /// Empty values count as unset. Malformed numbers and booleans are
    /// configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            site_url: get("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 10)?),
            connect_timeout: Duration::from_secs(parse_or(&get, "CONNECT_TIMEOUT_SECS", 10)?),
            max_redirects: parse_or(&get, "MAX_REDIRECTS", 5)?,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ai_model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ai_scan_enabled: match get("AI_SCAN_ENABLED") {
                Some(value) => parse_flag("AI_SCAN_ENABLED", &value)?,
                None => true,
            },
            database_path: get("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            status_pacing: Duration::from_millis(parse_or(&get, "STATUS_PACING_MS", 500)?),
            scan_pacing: Duration::from_millis(parse_or(&get, "SCAN_PACING_MS", 1000)?),
        })
    }

    /// Whether content scans can run: enabled and a key is present
    pub fn scan_enabled(&self) -> bool {
        self.ai_scan_enabled && self.openai_api_key.is_some()
    }

    /// HTTP policy for target sites
    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::builder()
            .timeout(self.http_timeout)
            .connect_timeout(self.connect_timeout)
            .max_redirects(self.max_redirects)
            .site_url(&self.site_url)
            .build()
    }

    /// Classifier settings
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::builder().model(self.ai_model.clone()).build()
    }

    /// Batch pacing and sizes
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            status_pacing: self.status_pacing,
            scan_pacing: self.scan_pacing,
            ..BatchConfig::default()
        }
    }

    /// The classifier, when scanning is enabled
    pub fn classifier(&self) -> Result<Option<Classifier<OpenAiService>>> {
        let Some(api_key) = self.openai_api_key.as_deref().filter(|_| self.ai_scan_enabled) else {
            return Ok(None);
        };

        let config = self.classifier_config();
        let service = OpenAiService::with_base_url(api_key, &self.openai_base_url, config.timeout)?;
        Ok(Some(Classifier::new(service, config)))
    }

    /// Open the database and assemble a runner
    pub async fn build_runner(&self) -> Result<BatchRunner<Database, OpenAiService>> {
        let store = Database::new_from_path(&self.database_path).await?;
        let runner = BatchRunner::new(store, &self.checker_config(), self.batch_config())?;

        match self.classifier()? {
            Some(classifier) => {
                info!(model = %self.ai_model, "AI scanning enabled");
                Ok(runner.with_classifier(classifier))
            }
            None => {
                info!("AI scanning disabled");
                Ok(runner)
            }
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|e| Error::Config(format!("{} must be a number, got {:?}: {}", key, value, e))),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be true or false, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.site_url, DEFAULT_SITE_URL);
        assert_eq!(settings.http_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_redirects, 5);
        assert_eq!(settings.ai_model, DEFAULT_MODEL);
        assert_eq!(settings.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(settings.status_pacing, Duration::from_millis(500));
        assert_eq!(settings.scan_pacing, Duration::from_secs(1));
        assert!(settings.ai_scan_enabled);
        assert!(!settings.scan_enabled());
        assert!(settings.classifier().unwrap().is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("SITE_URL", "https://links.example"),
            ("HTTP_TIMEOUT_SECS", "3"),
            ("MAX_REDIRECTS", "2"),
            ("OPENAI_API_KEY", "sk-test"),
            ("AI_MODEL", "gpt-4o-mini"),
            ("SCAN_PACING_MS", "0"),
        ])
        .unwrap();

        assert!(settings.scan_enabled());
        assert_eq!(settings.batch_config().scan_pacing, Duration::ZERO);
        assert_eq!(settings.classifier_config().model, "gpt-4o-mini");

        let checker = settings.checker_config();
        assert_eq!(checker.timeout, Duration::from_secs(3));
        assert_eq!(checker.max_redirects, 2);
        assert_eq!(checker.user_agent, "DirectoryBot/1.0 (+https://links.example)");
    }

    #[test]
    fn test_scan_switch_and_blank_key() {
        let disabled = settings(&[("OPENAI_API_KEY", "sk-test"), ("AI_SCAN_ENABLED", "off")]).unwrap();
        assert!(!disabled.scan_enabled());
        assert!(disabled.classifier().unwrap().is_none());

        let blank = settings(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert_eq!(blank.openai_api_key, None);
        assert!(!blank.scan_enabled());
    }

    #[test]
    fn test_malformed_values() {
        assert!(matches!(
            settings(&[("MAX_REDIRECTS", "many")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            settings(&[("AI_SCAN_ENABLED", "maybe")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = settings(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        let debug = format!("{:?}", settings);

        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_build_runner() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("runner.db").to_string_lossy().to_string();

        let settings = settings(&[("DATABASE_PATH", db_path.as_str()), ("OPENAI_API_KEY", "sk-test")]).unwrap();
        let runner = settings.build_runner().await.unwrap();

        assert!(runner.scan_enabled());
        assert_eq!(runner.config().status_pacing, Duration::from_millis(500));
    }
}
