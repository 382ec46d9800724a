// Configuration loaded from the environment (and `.env` when present):
// - database connection string
// - HTTP listening address/port
// - feed provider selection and its endpoint/credentials
// - address cache settings (size, TTL)

use dotenv::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Raw `FEED_PROVIDER` value, parsed when the feed client is built.
    pub feed_provider: String,
    pub bloxroute_ws_url: Option<String>,
    pub bloxroute_api_key: Option<String>,
    pub alchemy_ws_url: Option<String>,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub monitor_autostart: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:db.sqlite3".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let feed_provider = non_empty_var("FEED_PROVIDER").unwrap_or_else(|| "bloxroute".to_string());
        let bloxroute_ws_url = non_empty_var("BLOXROUTE_WS_URL");
        let bloxroute_api_key = non_empty_var("BLOXROUTE_API_KEY");
        let alchemy_ws_url = non_empty_var("ALCHEMY_WS_URL");
        let cache_ttl = env::var("CACHE_TTL")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let cache_max_capacity = env::var("CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .unwrap_or(10_000);
        let monitor_autostart = env::var("MONITOR_AUTOSTART")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            database_url,
            server_host,
            server_port,
            feed_provider,
            bloxroute_ws_url,
            bloxroute_api_key,
            alchemy_ws_url,
            cache_ttl,
            cache_max_capacity,
            monitor_autostart,
        }
    }

    /// Socket address string for the HTTP server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// Configuration for tests: in-memory database, no feed endpoints.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            feed_provider: "bloxroute".to_string(),
            bloxroute_ws_url: None,
            bloxroute_api_key: None,
            alchemy_ws_url: None,
            cache_ttl: Duration::from_secs(30),
            cache_max_capacity: 1_000,
            monitor_autostart: false,
        }
    }
}
