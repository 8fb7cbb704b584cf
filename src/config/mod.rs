// Configuration module entry point
// Loads layered configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, RoutesConfig};

use crate::archive::DEFAULT_IDENTIFIER_PATTERN;
use crate::http::encoding::DEFAULT_COMPRESSION_LEVEL;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `RELAY__SERVER__PORT=9000`
const ENV_PREFIX: &str = "RELAY";

impl Config {
    /// Load configuration from the path given as first CLI argument,
    /// falling back to "config.toml" in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (extension optional)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let default_work_dir = std::env::temp_dir().join("archive-relay");

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("storage.root", "D")?
            .set_default("storage.work_dir", default_work_dir.to_string_lossy().into_owned())?
            .set_default("storage.extension", "zip")?
            .set_default("storage.query_param", "md5")?
            .set_default("storage.identifier_pattern", DEFAULT_IDENTIFIER_PATTERN)?
            .set_default("storage.max_entry_size", 536_870_912)? // 512MB
            .set_default("storage.compression_level", i64::from(DEFAULT_COMPRESSION_LEVEL))?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "archive-relay")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("http.legacy_error_status", true)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that deserialize fine but cannot work
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage.query_param.is_empty() {
            return Err(config::ConfigError::Message(
                "storage.query_param must not be empty".to_string(),
            ));
        }
        if self.storage.extension.trim_start_matches('.').is_empty() {
            return Err(config::ConfigError::Message(
                "storage.extension must not be empty".to_string(),
            ));
        }
        if self.storage.compression_level > 9 {
            return Err(config::ConfigError::Message(format!(
                "storage.compression_level must be 0-9, got {}",
                self.storage.compression_level
            )));
        }
        if !self.routes.download_path.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "routes.download_path must start with '/', got '{}'",
                self.routes.download_path
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
