use regex::Regex;

const DEFAULT_PORT: u16 = 9292;
const DEFAULT_STATUS_EVENTS: &str = "success,failure,error";

/// Global application configuration loaded from environment variables.
///
/// Username mapping entries (`SLACK_USERNAME_FOR_<HANDLE>`) are not held
/// here; the engine reads them once into its process-wide mapping.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Slack incoming-webhook URL every notification is POSTed to
    pub slack_webhook_url: String,

    /// Destination channel (e.g. `#dev`)
    pub slack_channel: String,

    /// Listen port (default: 9292)
    pub port: u16,

    /// Route the GitHub webhook is mounted on (default: `/`)
    pub webhook_path: String,

    /// Event categories to drop without notifying
    pub ignored_events: Vec<String>,

    /// Commit status states worth a notification
    pub status_events: Vec<String>,

    /// Commit status contexts must match this (default: match everything)
    pub status_contexts: Regex,

    /// Suppress the diff excerpt attachment on review comments
    pub hide_diffs: bool,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| {
            std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
        })?;

        tracing::info!(
            channel = %config.slack_channel,
            ignored_events = ?config.ignored_events,
            status_events = ?config.status_events,
            status_contexts = %config.status_contexts,
            hide_diffs = config.hide_diffs,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Build configuration from any variable source. `lookup` returns `None`
    /// for unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let webhook_path = lookup("WEBHOOK_PATH").unwrap_or_else(|| "/".to_string());
        if !webhook_path.starts_with('/') {
            anyhow::bail!("WEBHOOK_PATH must start with '/'");
        }

        let status_contexts = lookup("STATUS_CONTEXTS").unwrap_or_default();

        Ok(Self {
            slack_webhook_url: lookup("SLACK_WEBHOOK_URL")
                .ok_or_else(|| anyhow::anyhow!("SLACK_WEBHOOK_URL environment variable is required"))?,
            slack_channel: lookup("SLACK_CHANNEL")
                .ok_or_else(|| anyhow::anyhow!("SLACK_CHANNEL environment variable is required"))?,
            port: match lookup("PORT") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
                None => DEFAULT_PORT,
            },
            webhook_path,
            ignored_events: parse_list(&lookup("IGNORED_EVENTS").unwrap_or_default()),
            status_events: parse_list(
                &lookup("STATUS_EVENTS").unwrap_or_else(|| DEFAULT_STATUS_EVENTS.to_string()),
            ),
            status_contexts: Regex::new(&status_contexts)
                .map_err(|e| anyhow::anyhow!("STATUS_CONTEXTS is not a valid regex: {}", e))?,
            // Any value, even an empty one, turns diffs off.
            hide_diffs: lookup("HIDE_DIFFS").is_some(),
        })
    }

    /// Configuration with every optional setting at its default.
    pub fn with_defaults(slack_webhook_url: impl Into<String>, slack_channel: impl Into<String>) -> Self {
        Self {
            slack_webhook_url: slack_webhook_url.into(),
            slack_channel: slack_channel.into(),
            port: DEFAULT_PORT,
            webhook_path: "/".to_string(),
            ignored_events: Vec::new(),
            status_events: parse_list(DEFAULT_STATUS_EVENTS),
            status_contexts: Regex::new("").expect("empty regex is valid"),
            hide_diffs: false,
        }
    }
}

/// Split a comma-separated list, trimming whitespace around each entry and
/// dropping empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
