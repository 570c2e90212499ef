//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Base URL used when none is configured (local backend stack)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:54321";

/// Public key used when none is configured; requests will be rejected
pub const PLACEHOLDER_ANON_KEY: &str = "placeholder";

/// Client configuration for connecting to the RowRunner backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "https://project.example.co")
    pub backend_url: String,

    /// Public (anon) API key
    pub anon_key: String,

    /// Service-role key, required only for runner provisioning
    pub service_role_key: Option<String>,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Upper bound on the discovery events query
    pub query_timeout_ms: u64,

    /// Upper bound on a device location lookup
    pub location_timeout_ms: u64,

    /// Directory of the file-backed secure store
    pub session_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
}

impl ClientConfig {
    /// Create a configuration for the given backend with defaults elsewhere
    pub fn new(backend_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            anon_key: anon_key.into(),
            service_role_key: None,
            request_timeout_secs: 30,
            query_timeout_ms: 8_000,
            location_timeout_ms: 5_000,
            session_dir: PathBuf::from(".rowrunner"),
            log_level: "info".into(),
            log_dir: None,
        }
    }

    /// Load from environment variables (reads `.env` first if present)
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | ROWRUNNER_BACKEND_URL / EXPO_PUBLIC_SUPABASE_URL | http://localhost:54321 |
    /// | ROWRUNNER_ANON_KEY / EXPO_PUBLIC_SUPABASE_ANON_KEY | placeholder |
    /// | ROWRUNNER_SERVICE_ROLE_KEY | - |
    /// | ROWRUNNER_REQUEST_TIMEOUT_SECS | 30 |
    /// | ROWRUNNER_QUERY_TIMEOUT_MS | 8000 |
    /// | ROWRUNNER_LOCATION_TIMEOUT_MS | 5000 |
    /// | ROWRUNNER_SESSION_DIR | .rowrunner |
    /// | ROWRUNNER_LOG_LEVEL | info |
    /// | ROWRUNNER_LOG_DIR | - |
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let backend_url = env_any(&["ROWRUNNER_BACKEND_URL", "EXPO_PUBLIC_SUPABASE_URL"]);
        let anon_key = env_any(&["ROWRUNNER_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"]);
        if backend_url.is_none() || anon_key.is_none() {
            tracing::warn!(
                "Missing backend env vars: set ROWRUNNER_BACKEND_URL and ROWRUNNER_ANON_KEY"
            );
        }

        let defaults = Self::new(
            backend_url.unwrap_or_else(|| DEFAULT_BACKEND_URL.into()),
            anon_key.unwrap_or_else(|| PLACEHOLDER_ANON_KEY.into()),
        );

        Self {
            service_role_key: env_any(&["ROWRUNNER_SERVICE_ROLE_KEY"]),
            request_timeout_secs: env_parse("ROWRUNNER_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            query_timeout_ms: env_parse("ROWRUNNER_QUERY_TIMEOUT_MS")
                .unwrap_or(defaults.query_timeout_ms),
            location_timeout_ms: env_parse("ROWRUNNER_LOCATION_TIMEOUT_MS")
                .unwrap_or(defaults.location_timeout_ms),
            session_dir: env_any(&["ROWRUNNER_SESSION_DIR"])
                .map(PathBuf::from)
                .unwrap_or(defaults.session_dir.clone()),
            log_level: env_any(&["ROWRUNNER_LOG_LEVEL"]).unwrap_or(defaults.log_level.clone()),
            log_dir: env_any(&["ROWRUNNER_LOG_DIR"]),
            ..defaults
        }
    }

    /// Set the service-role key
    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the discovery query timeout
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the location lookup timeout
    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the secure store directory
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    fn base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Row API root: `{base}/rest/v1`
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base())
    }

    /// Auth API root: `{base}/auth/v1`
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base())
    }

    /// Callable functions root: `{base}/functions/v1`
    pub fn functions_url(&self) -> String {
        format!("{}/functions/v1", self.base())
    }

    /// Realtime websocket endpoint (`ws://` or `wss://`)
    pub fn realtime_url(&self) -> Result<url::Url, url::ParseError> {
        let mut url = url::Url::parse(&format!("{}/realtime/v1/websocket", self.base()))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always a valid scheme change
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", "1.0.0");
        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL, PLACEHOLDER_ANON_KEY)
    }
}

fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.query_timeout(), Duration::from_millis(8000));
        assert_eq!(config.location_timeout(), Duration::from_millis(5000));
        assert!(config.service_role_key.is_none());
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ClientConfig::new("https://demo.example.co/", "anon");
        assert_eq!(config.rest_url(), "https://demo.example.co/rest/v1");
        assert_eq!(config.auth_url(), "https://demo.example.co/auth/v1");
        assert_eq!(config.functions_url(), "https://demo.example.co/functions/v1");

        let ws = config.realtime_url().unwrap();
        assert_eq!(ws.scheme(), "wss");
        assert_eq!(ws.path(), "/realtime/v1/websocket");
        assert!(ws.query().unwrap().contains("apikey=anon"));
    }

    #[test]
    fn test_realtime_url_plain_http() {
        let config = ClientConfig::new("http://localhost:54321", "k");
        assert_eq!(config.realtime_url().unwrap().scheme(), "ws");
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_service_role_key("svc")
            .with_timeout(5)
            .with_query_timeout(Duration::from_millis(50))
            .with_session_dir("/tmp/rr");
        assert_eq!(config.service_role_key.as_deref(), Some("svc"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.query_timeout_ms, 50);
        assert_eq!(config.session_dir, PathBuf::from("/tmp/rr"));
    }
}
