use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    /// Overrides the database named in `url` when set.
    pub name: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub run_migrations: bool,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub window_seconds: u64,
    pub stale_after_seconds: u64,
    pub exclude_paths: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/hydration_tracker".to_string(),
            name: None,
            max_connections: 50,
            min_connections: 1,
            acquire_timeout: 5,
            run_migrations: true,
            retry_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "0.0.0.0".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 60,
            window_seconds: 60,
            stale_after_seconds: 120,
            exclude_paths: vec!["/docs".to_string(), "/openapi.json".to_string(), "/redoc".to_string(), "/app".to_string()],
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost".to_string(),
                "http://localhost:8000".to_string(),
                "http://localhost:443".to_string(),
                "https://localhost".to_string(),
                "https://localhost:8000".to_string(),
                "https://localhost:443".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

impl LoggingConfig {
    /// Lower-cased level, falling back to `info` for anything `tracing` would not accept.
    pub fn effective_level(&self) -> String {
        let level = self.level.trim().to_lowercase();
        // Long-form aliases are accepted as well.
        let level = match level.as_str() {
            "warning" => "warn".to_string(),
            "critical" => "error".to_string(),
            _ => level,
        };

        if VALID_LOG_LEVELS.contains(&level.as_str()) {
            level
        } else {
            tracing::warn!(configured = %self.level, "invalid log level, using info");
            "info".to_string()
        }
    }
}

impl TlsConfig {
    pub fn paths(&self) -> Option<(&str, &str)> {
        match (self.cert_path.as_deref(), self.key_path.as_deref()) {
            (Some(cert), Some(key)) if !cert.is_empty() && !key.is_empty() => Some((cert, key)),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Hydration.toml (if present)
    /// 3. Environment variables prefixed with HYDRATION_, nested keys split on `__`
    ///    (e.g. HYDRATION_DATABASE__URL)
    /// 4. Plain variables kept for compatibility with older deployments
    pub fn load() -> Result<Self, figment::Error> {
        let defaults = toml::to_string(&Config::default()).map_err(|e| figment::Error::from(e.to_string()))?;

        Self::figment(Figment::new().merge(Toml::string(&defaults)).merge(Toml::file("Hydration.toml"))).extract()
    }

    fn figment(base: Figment) -> Figment {
        base.merge(Env::prefixed("HYDRATION_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["DB_NAME"]).map(|_| "database.name".into()))
            .merge(Env::raw().only(&["LOG_LEVEL"]).map(|_| "logging.level".into()))
            .merge(Env::raw().only(&["RATE_LIMIT_ENABLED"]).map(|_| "rate_limit.enabled".into()))
            .merge(Env::raw().only(&["RATE_LIMIT_PER_MINUTE"]).map(|_| "rate_limit.requests_per_minute".into()))
            .merge(Env::raw().only(&["SSL_CERT_PATH"]).map(|_| "tls.cert_path".into()))
            .merge(Env::raw().only(&["SSL_KEY_PATH"]).map(|_| "tls.key_path".into()))
            .merge(Env::raw().only(&["API_HOST"]).map(|_| "server.address".into()))
            .merge(Env::raw().only(&["API_PORT"]).map(|_| "server.port".into()))
    }
}
