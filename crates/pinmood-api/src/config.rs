//! API configuration.

use std::path::PathBuf;

/// Where analysis results are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Firestore,
    /// Process-local map, lost on restart
    Memory,
}

impl CacheBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "memory" => Self::Memory,
            _ => Self::Firestore,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Frontend origin that sign-in redirects back to
    pub frontend_url: String,
    /// Built frontend served for unmatched paths
    pub static_dir: Option<PathBuf>,
    pub cache_backend: CacheBackend,
    /// Firestore collection for cached analyses
    pub cache_collection: String,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            cors_origins: vec!["http://localhost:3000".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            static_dir: None,
            cache_backend: CacheBackend::Firestore,
            cache_collection: pinmood_firestore::DEFAULT_CACHE_COLLECTION.to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_burst),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            frontend_url: std::env::var("FRONTEND_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.frontend_url),
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            cache_backend: std::env::var("CACHE_BACKEND")
                .map(|s| CacheBackend::parse(&s))
                .unwrap_or(defaults.cache_backend),
            cache_collection: std::env::var("FIRESTORE_CACHE_COLLECTION")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.cache_collection),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "API_HOST",
        "API_PORT",
        "CORS_ORIGINS",
        "FRONTEND_URL",
        "STATIC_DIR",
        "CACHE_BACKEND",
        "FIRESTORE_CACHE_COLLECTION",
        "METRICS_ENABLED",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear();
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 5001);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.cache_backend, CacheBackend::Firestore);
        assert_eq!(config.cache_collection, "cache");
        assert!(config.static_dir.is_none());
        assert!(config.metrics_enabled);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear();
        std::env::set_var("API_PORT", "8080");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        std::env::set_var("FRONTEND_URL", "https://app.example/");
        std::env::set_var("CACHE_BACKEND", "Memory");
        std::env::set_var("STATIC_DIR", "public");
        std::env::set_var("METRICS_ENABLED", "false");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.frontend_url, "https://app.example");
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
        assert!(!config.metrics_enabled);

        clear();
    }
}
