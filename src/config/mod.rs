//! Configuration handling for the application.
//!
//! Everything is read from environment variables with development defaults,
//! so the proxy starts with no setup at all. Values that must parse (numbers,
//! the JSON source table) are rejected with a `ConfigError` rather than
//! silently replaced.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable names. Keeping them public lets tests and deployment
/// scripts refer to them without retyping the strings.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CACHE_TTL_SECS: &str = "FEED_CACHE_TTL_SECS";
pub const ENV_REFRESH_SECS: &str = "FEED_REFRESH_SECS";
pub const ENV_FEED_SOURCES: &str = "FEED_SOURCES";
pub const ENV_TLS_EXEMPT_HOSTS: &str = "TLS_EXEMPT_HOSTS";
pub const ENV_RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";

/// Default development values used when environment variables are absent.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_REFRESH_SECS: u64 = 600;
const DEFAULT_TLS_EXEMPT_HOSTS: &str = "feedburner.com,pcmag.com";
const DEFAULT_RATE_LIMIT_MAX: u32 = 60;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// A feed the background refresher keeps warm. The `id` doubles as the
/// source tag on items normalized from that feed's URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    cache_ttl_secs: u64,
    refresh_secs: u64,
    sources: Vec<FeedSource>,
    tls_exempt_hosts: Vec<String>,
    rate_limit_max: u32,
    rate_limit_window_secs: u64,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let cache_ttl_secs = read_u64(ENV_CACHE_TTL_SECS, DEFAULT_CACHE_TTL_SECS)?;
        let refresh_secs = read_u64(ENV_REFRESH_SECS, DEFAULT_REFRESH_SECS)?;
        let sources = match env::var(ENV_FEED_SOURCES) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| ConfigError::InvalidValue {
                field: ENV_FEED_SOURCES,
                reason: err.to_string(),
            })?,
            Err(_) => default_sources(),
        };
        let tls_exempt_hosts = env::var(ENV_TLS_EXEMPT_HOSTS)
            .map(|raw| parse_host_list(&raw))
            .unwrap_or_else(|_| parse_host_list(DEFAULT_TLS_EXEMPT_HOSTS));
        let rate_limit_max = read_u64(ENV_RATE_LIMIT_MAX, u64::from(DEFAULT_RATE_LIMIT_MAX))?
            .try_into()
            .map_err(|_| ConfigError::InvalidValue {
                field: ENV_RATE_LIMIT_MAX,
                reason: "value does not fit in u32".to_string(),
            })?;
        let rate_limit_window_secs =
            read_u64(ENV_RATE_LIMIT_WINDOW_SECS, DEFAULT_RATE_LIMIT_WINDOW_SECS)?;

        Ok(Self {
            bind_addr,
            cache_ttl_secs,
            refresh_secs,
            sources,
            tls_exempt_hosts,
            rate_limit_max,
            rate_limit_window_secs,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// How long a cached feed stays fresh. Zero disables caching.
    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs
    }
    /// Seconds between background refresh sweeps. Zero disables the refresher.
    pub fn refresh_secs(&self) -> u64 {
        self.refresh_secs
    }
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
    /// Feeds the background refresher keeps warm.
    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }
    /// Hosts (and their subdomains) fetched without TLS certificate
    /// verification. An explicit list so every exemption stays auditable.
    pub fn tls_exempt_hosts(&self) -> &[String] {
        &self.tls_exempt_hosts
    }
    /// Requests allowed per client per window. Zero disables rate limiting.
    pub fn rate_limit_max(&self) -> u32 {
        self.rate_limit_max
    }
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn with_refresh_secs(mut self, secs: u64) -> Self {
        self.refresh_secs = secs;
        self
    }

    pub fn with_sources(mut self, sources: Vec<FeedSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_tls_exempt_hosts(mut self, hosts: Vec<String>) -> Self {
        self.tls_exempt_hosts = hosts;
        self
    }

    pub fn with_rate_limit(mut self, max: u32, window_secs: u64) -> Self {
        self.rate_limit_max = max;
        self.rate_limit_window_secs = window_secs;
        self
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        // not `Default` impl yet to keep explicit semantics
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            refresh_secs: DEFAULT_REFRESH_SECS,
            sources: default_sources(),
            tls_exempt_hosts: parse_host_list(DEFAULT_TLS_EXEMPT_HOSTS),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

fn read_u64(field: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(field) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field,
            reason: format!("expected a non-negative integer, got {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Comma-separated host list. Entries are lowercased and blanks dropped.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource {
            id: "verge".to_string(),
            name: "The Verge".to_string(),
            url: "https://www.theverge.com/rss/index.xml".to_string(),
        },
        FeedSource {
            id: "wired".to_string(),
            name: "WIRED".to_string(),
            url: "https://www.wired.com/feed/rss".to_string(),
        },
        FeedSource {
            id: "techcrunch".to_string(),
            name: "TechCrunch".to_string(),
            url: "https://techcrunch.com/feed/".to_string(),
        },
    ]
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_BIND_ADDR,
            ENV_CACHE_TTL_SECS,
            ENV_REFRESH_SECS,
            ENV_FEED_SOURCES,
            ENV_TLS_EXEMPT_HOSTS,
            ENV_RATE_LIMIT_MAX,
            ENV_RATE_LIMIT_WINDOW_SECS,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.bind_addr(), super::DEFAULT_BIND_ADDR);
        assert_eq!(cfg.cache_ttl_secs(), super::DEFAULT_CACHE_TTL_SECS);
        assert_eq!(cfg.refresh_secs(), super::DEFAULT_REFRESH_SECS);
        assert_eq!(cfg.sources().len(), 3);
        assert_eq!(cfg.sources()[0].id, "verge");
        assert_eq!(cfg.tls_exempt_hosts(), ["feedburner.com", "pcmag.com"]);
        assert_eq!(cfg.rate_limit_max(), super::DEFAULT_RATE_LIMIT_MAX);
        assert_eq!(cfg.rate_limit_window(), Duration::from_secs(60));
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_BIND_ADDR, "0.0.0.0:9000");
            env::set_var(ENV_CACHE_TTL_SECS, "30");
            env::set_var(ENV_REFRESH_SECS, "0");
            env::set_var(
                ENV_FEED_SOURCES,
                r#"[{"id":"hn","name":"Hacker News","url":"https://news.ycombinator.com/rss"}]"#,
            );
            env::set_var(ENV_TLS_EXEMPT_HOSTS, "Legacy.Example.COM, ,other.test");
            env::set_var(ENV_RATE_LIMIT_MAX, "5");
            env::set_var(ENV_RATE_LIMIT_WINDOW_SECS, "10");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.cache_ttl_secs(), 30);
        assert_eq!(cfg.refresh_secs(), 0);
        assert_eq!(
            cfg.sources(),
            [FeedSource {
                id: "hn".to_string(),
                name: "Hacker News".to_string(),
                url: "https://news.ycombinator.com/rss".to_string(),
            }]
        );
        assert_eq!(cfg.tls_exempt_hosts(), ["legacy.example.com", "other.test"]);
        assert_eq!(cfg.rate_limit_max(), 5);
        assert_eq!(cfg.rate_limit_window(), Duration::from_secs(10));
        clear_env();
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_CACHE_TTL_SECS, "soon");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_CACHE_TTL_SECS));
        clear_env();
    }

    #[test]
    fn rejects_malformed_sources_json() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FEED_SOURCES, "[{not json");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_FEED_SOURCES));
        clear_env();
    }

    #[test]
    fn builders_replace_fields() {
        let cfg = Config::default()
            .with_bind_addr("127.0.0.1:0")
            .with_cache_ttl_secs(1)
            .with_refresh_secs(0)
            .with_sources(vec![])
            .with_tls_exempt_hosts(vec!["relaxed.test".to_string()])
            .with_rate_limit(2, 1);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:0");
        assert_eq!(cfg.cache_ttl_secs(), 1);
        assert!(cfg.sources().is_empty());
        assert_eq!(cfg.tls_exempt_hosts(), ["relaxed.test"]);
        assert_eq!(cfg.rate_limit_max(), 2);
        assert_eq!(cfg.rate_limit_window(), Duration::from_secs(1));
    }
}
