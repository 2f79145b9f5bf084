use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "secretsanta=info";

/// `RUST_LOG` when it is set and parses, otherwise `secretsanta=info`.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    /// Origin reveal links are built from, without a trailing slash.
    pub public_url: String,
    pub key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://secretsanta.db?mode=rwc".to_owned(),
            max_connections: 16,
            bind_addr: "0.0.0.0:8080".to_owned(),
            public_url: "http://localhost:8080".to_owned(),
            key_prefix: "secretsanta:".to_owned(),
        }
    }
}

impl Config {
    /// Reads `.env` and the process environment; anything unset keeps its default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS={max} is not a number"))?;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("PUBLIC_URL") {
            config.public_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(prefix) = lookup("KEY_PREFIX") {
            config.key_prefix = prefix;
        }

        Ok(config)
    }

    pub fn reveal_link(&self, participant_id: &str) -> String {
        format!("{}/reveal/{participant_id}", self.public_url)
    }
}
