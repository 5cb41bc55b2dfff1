//! Configuration management.
//!
//! All settings come from the environment: `MINIFLUX_URL` (mandatory),
//! `HOST` (default `127.0.0.1`) and `PORT` (default `8080`).

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Miniflux instance (e.g. `https://reader.example.com`)
    pub miniflux_url: String,

    /// Host to bind the HTTP listener to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Config {
    /// Listener address in `host:port` form.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Load configuration from the environment.
///
/// Fails when `MINIFLUX_URL` is not set; the process must not start without
/// a backend to talk to.
pub fn load_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    settings.try_deserialize()
}
