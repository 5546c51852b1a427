//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration. The response cache falls back to memory without it.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Forum engine behavior.
    #[serde(default)]
    pub forum: ForumConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Log every SQL statement through `tracing`.
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// What happens when no forum permission row matches any of a user's groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDefault {
    /// Posting is allowed (fail-open). Matches historical forum behavior.
    #[default]
    Allow,
    /// Posting is denied unless a permission row grants it.
    Deny,
}

impl PermissionDefault {
    /// The boolean decision this default stands for.
    #[must_use]
    pub const fn allows(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Which events notify forum-level subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumFanout {
    /// Forum subscribers hear about new topics only.
    #[default]
    NewTopics,
    /// Forum subscribers hear about new topics and every reply.
    AllActivity,
}

/// Forum engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Decision when no permission row matches.
    #[serde(default)]
    pub default_permission: PermissionDefault,
    /// Name of the forum restricted to moderator and admin groups.
    #[serde(default = "default_announcement_forum")]
    pub announcement_forum_name: String,
    /// Forum-level subscription fan-out policy.
    #[serde(default)]
    pub forum_fanout: ForumFanout,
    /// Minimum search query length in characters.
    #[serde(default = "default_search_min_query_len")]
    pub search_min_query_len: usize,
    /// Attempts made when a write hits a unique-constraint race.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Response cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Default page size for listings.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            default_permission: PermissionDefault::default(),
            announcement_forum_name: default_announcement_forum(),
            forum_fanout: ForumFanout::default(),
            search_min_query_len: default_search_min_query_len(),
            retry_attempts: default_retry_attempts(),
            cache_ttl_secs: default_cache_ttl(),
            page_size: default_page_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_connect_timeout() -> u64 {
    10
}

fn default_redis_prefix() -> String {
    "agora".to_string()
}

fn default_announcement_forum() -> String {
    "Announcements".to_string()
}

const fn default_search_min_query_len() -> usize {
    3
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_cache_ttl() -> u64 {
    300
}

const fn default_page_size() -> u64 {
    20
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `AGORA_ENV`)
    /// 4. Environment variables with `AGORA_` prefix, `__` between sections
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("AGORA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forum_defaults() {
        let forum = ForumConfig::default();
        assert_eq!(forum.default_permission, PermissionDefault::Allow);
        assert_eq!(forum.forum_fanout, ForumFanout::NewTopics);
        assert_eq!(forum.announcement_forum_name, "Announcements");
        assert_eq!(forum.search_min_query_len, 3);
        assert_eq!(forum.cache_ttl_secs, 300);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://localhost/agora" },
            "forum": { "default_permission": "deny", "forum_fanout": "all_activity" }
        }))
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.redis.is_none());
        assert_eq!(config.database.max_connections, 20);
        assert!(!config.forum.default_permission.allows());
        assert_eq!(config.forum.forum_fanout, ForumFanout::AllActivity);
        assert_eq!(config.forum.retry_attempts, 3);
    }
}
