use super::types::*;
use crate::error_handling::types::ConfigError;
use crate::storage::file_storage::DEFAULT_HISTORY_FILE;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line arguments.
///
/// Every flag is optional and overrides the matching key of the TOML file given
/// as `config_file`. Without a file the built-in defaults are used.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use reframe_compare::configuration::config::{Args, Config};
///
/// let args = Args::parse();
/// let config = Config::load(&args).expect("invalid configuration");
/// println!("Listening on {}:{}", config.bind_address, config.port);
/// ```
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "reframe-compare")]
#[command(version)]
#[command(about = "Compare two image reframing providers side by side")]
pub struct Args {
    /// Path to a TOML configuration file
    pub config_file: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Port the HTTP server listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding the history document
    #[arg(long, env = "REFRAME_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// History backend
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackend>,

    /// Provider API key
    #[arg(long, env = "FAL_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upper bound for a single provider call, in seconds
    #[arg(long)]
    pub provider_timeout_secs: Option<u64>,
}

/// Application configuration structure that defines all runtime parameters.
///
/// It is read from a TOML file with `serde` (every key optional) and then
/// patched with the command-line [`Args`].
///
/// # Fields Overview
///
/// - `bind_address` / `port`: where the HTTP transport listens
/// - `storage_backend`: `file` (durable JSON document) or `memory`
/// - `storage_path` / `history_file`: location of the history document
/// - `api_key`: credential sent to the provider API
/// - `storage_base_url` / `run_base_url`: provider API roots for upload and model calls
/// - `request_timeout_secs`: HTTP client timeout, also bounds the upload
/// - `provider_timeout_secs`: per-provider bound inside a comparison
/// - `max_upload_bytes`: largest accepted compare payload
/// - `provider_a` / `provider_b`: the two model endpoints being compared
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network address to bind the server to.
    pub bind_address: String,

    /// TCP port of the HTTP transport.
    pub port: u16,

    /// Which history backend to use.
    pub storage_backend: StorageBackend,

    /// Directory where the history document is written.
    ///
    /// Created on the first save if it does not exist.
    pub storage_path: PathBuf,

    /// File name of the history document inside `storage_path`.
    ///
    /// Must be a bare file name, no directory components.
    pub history_file: String,

    /// Provider API key. Required to run comparisons.
    pub api_key: Option<String>,

    /// Root of the provider storage API.
    pub storage_base_url: String,

    /// Root of the provider model API.
    pub run_base_url: String,

    /// Timeout applied by the HTTP client to every request.
    pub request_timeout_secs: u64,

    /// Time after which a pending provider call settles as `timeout`.
    pub provider_timeout_secs: u64,

    /// Maximum size of a compare request body.
    pub max_upload_bytes: u64,

    /// First provider, resolved with the nearest aspect ratio.
    pub provider_a: ProviderConfig,

    /// Second provider, resolved with the bucketed size presets.
    pub provider_b: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3001,
            storage_backend: StorageBackend::File,
            storage_path: PathBuf::from("public"),
            history_file: DEFAULT_HISTORY_FILE.to_string(),
            api_key: None,
            storage_base_url: "https://rest.alpha.fal.ai".to_string(),
            run_base_url: "https://fal.run".to_string(),
            request_timeout_secs: 300,
            provider_timeout_secs: 180,
            max_upload_bytes: 20 * 1024 * 1024,
            provider_a: ProviderConfig::image_editing(),
            provider_b: ProviderConfig::ideogram(),
        }
    }
}

impl Config {
    /// Reads and parses a TOML configuration file. Does not validate.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        debug!("Read configuration file {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    /// Builds the effective configuration: file (or defaults), then CLI
    /// overrides, then validation.
    pub fn load(args: &Args) -> Result<Config, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                info!("No configuration file given, using defaults");
                Config::default()
            }
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(bind_address) = &args.bind_address {
            self.bind_address = bind_address.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(storage_path) = &args.storage_path {
            self.storage_path = storage_path.clone();
        }
        if let Some(backend) = args.storage_backend {
            self.storage_backend = backend;
        }
        if let Some(api_key) = &args.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(secs) = args.provider_timeout_secs {
            self.provider_timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingApiKey);
        }
        if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "bind_address '{}' is not an IP address",
                self.bind_address
            )));
        }
        if self.history_file.is_empty()
            || Path::new(&self.history_file).file_name().and_then(|n| n.to_str())
                != Some(self.history_file.as_str())
        {
            return Err(ConfigError::InvalidValue(format!(
                "history_file '{}' must be a plain file name",
                self.history_file
            )));
        }
        if !(1..=3600).contains(&self.provider_timeout_secs) {
            return Err(ConfigError::NotInRange(format!(
                "provider_timeout_secs must be within 1..=3600, got {}",
                self.provider_timeout_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::NotInRange(
                "max_upload_bytes must be at least 1".to_string(),
            ));
        }
        for provider in [&self.provider_a, &self.provider_b] {
            if provider.endpoint.trim().is_empty() || provider.descriptor_field.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "provider '{}' needs an endpoint and a descriptor_field",
                    provider.name
                )));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let ip: std::net::IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("bind_address '{}'", self.bind_address))
        })?;
        Ok((ip, self.port).into())
    }
}
