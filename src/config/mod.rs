// Configuration module entry point
// Loads layered configuration and exposes the per-process application state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::StartupError;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, TlsConfig,
    UpstreamConfig, Variant,
};

/// Environment variable overriding `upstream.storage_url`
pub const STORAGE_URL_ENV: &str = "STORAGE_SERVICE_URL";
/// Environment variable overriding `upstream.scraper_url`
pub const SCRAPER_URL_ENV: &str = "SCRAPER_SERVICE_URL";

const DEFAULT_SCRAPER_URL: &str = "http://scraper-service:8082";
const ENV_PREFIX: &str = "WEBUI";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let variant = Self::detect_variant(config_path)?;

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.index_files"),
            )
            .set_override_option("upstream.storage_url", std::env::var(STORAGE_URL_ENV).ok())?
            .set_override_option("upstream.scraper_url", std::env::var(SCRAPER_URL_ENV).ok())?;

        Self::with_defaults(settings, variant)?.build()?.try_deserialize()
    }

    /// Build a configuration from defaults only, ignoring files and environment
    pub fn defaults(variant: Variant) -> Result<Self, config::ConfigError> {
        Self::with_defaults(config::Config::builder(), variant)?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        variant: Variant,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        builder
            .set_default("server.variant", variant.to_string())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(variant.default_port()))?
            .set_default("server.static_dir", "web-ui")?
            .set_default("server.index_files", vec!["index.html", "index.htm"])?
            .set_default("upstream.storage_url", variant.default_storage_url())?
            .set_default("upstream.scraper_url", DEFAULT_SCRAPER_URL)?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("tls.cert_path", "certs/server.crt")?
            .set_default("tls.key_path", "certs/server.key")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 75)
    }

    /// Variant defaults depend on the variant itself, so it is resolved
    /// from the file and environment before the full configuration is built.
    fn detect_variant(config_path: &str) -> Result<Variant, config::ConfigError> {
        let sources = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        match sources.get::<Variant>("server.variant") {
            Ok(variant) => Ok(variant),
            Err(config::ConfigError::NotFound(_)) => Ok(Variant::default()),
            Err(e) => Err(e),
        }
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| StartupError::Address(format!("{addr}: {e}")))
    }

    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.performance.connection_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that load from the process environment must not interleave
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_plain_defaults() {
        let cfg = Config::defaults(Variant::Plain).unwrap();
        assert_eq!(cfg.server.variant, Variant::Plain);
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.upstream.storage_url, "http://storage-service:8082");
        assert_eq!(cfg.upstream.scraper_url, "http://scraper-service:8082");
        assert_eq!(cfg.upstream_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.server.index_files, vec!["index.html", "index.htm"]);
    }

    #[test]
    fn test_tls_defaults_keep_their_own_storage_port() {
        let cfg = Config::defaults(Variant::Tls).unwrap();
        assert_eq!(cfg.server.variant, Variant::Tls);
        assert_eq!(cfg.server.port, 8443);
        assert_eq!(cfg.upstream.storage_url, "http://storage-service:8081");
        assert_eq!(cfg.tls.cert_path, "certs/server.crt");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            "[server]\nvariant = \"tls\"\nport = 9443\n\n[upstream]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let stem = dir.path().join("gateway");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.variant, Variant::Tls);
        assert_eq!(cfg.server.port, 9443);
        assert_eq!(cfg.upstream.timeout_secs, 5);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::defaults(Variant::Plain).unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8000);

        cfg.server.host = "not an address".to_string();
        assert!(matches!(cfg.get_socket_addr(), Err(StartupError::Address(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        std::env::set_var("WEBUI_SERVER__VARIANT", "tls");
        std::env::set_var("WEBUI_SERVER__PORT", "9123");
        std::env::set_var("WEBUI_LOGGING__ACCESS_LOG", "false");
        std::env::set_var(STORAGE_URL_ENV, "http://jobs-db:9000");
        std::env::set_var(SCRAPER_URL_ENV, "http://scraper:9100");
        let loaded = Config::load_from(missing.to_str().unwrap());
        for key in [
            "WEBUI_SERVER__VARIANT",
            "WEBUI_SERVER__PORT",
            "WEBUI_LOGGING__ACCESS_LOG",
            STORAGE_URL_ENV,
            SCRAPER_URL_ENV,
        ] {
            std::env::remove_var(key);
        }

        let cfg = loaded.unwrap();
        assert_eq!(cfg.server.variant, Variant::Tls);
        assert_eq!(cfg.server.port, 9123);
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.upstream.storage_url, "http://jobs-db:9000");
        assert_eq!(cfg.upstream.scraper_url, "http://scraper:9100");
    }

    #[test]
    fn test_variant_from_environment_picks_its_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        std::env::set_var("WEBUI_SERVER__VARIANT", "tls");
        let loaded = Config::load_from(missing.to_str().unwrap());
        std::env::remove_var("WEBUI_SERVER__VARIANT");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.server.port, 8443);
        assert_eq!(cfg.upstream.storage_url, "http://storage-service:8081");
    }
}
