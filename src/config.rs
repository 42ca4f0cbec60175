//! Configuration for exposer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DecodeMode, Method, MethodSet};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "exposer.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or IP address to bind
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// TCP port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// URL path of the endpoint
    #[serde(default = "default_route")]
    pub route: String,

    /// HTTP methods the endpoint answers
    #[serde(default = "default_methods")]
    pub methods: Vec<Method>,

    /// Request body decoding convention
    #[serde(default)]
    pub decode: DecodeMode,

    /// Stop the listener when the process receives ctrl-c
    #[serde(default)]
    pub shutdown_on_ctrl_c: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            route: default_route(),
            methods: default_methods(),
            decode: DecodeMode::default(),
            shutdown_on_ctrl_c: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load config from `path`, or from `exposer.toml` if present, then apply
    /// `EXPOSER_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `EXPOSER_HOSTNAME`, `EXPOSER_PORT`, `EXPOSER_ROUTE` and
    /// `EXPOSER_METHODS` (comma separated) from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hostname) = lookup("EXPOSER_HOSTNAME") {
            self.server.hostname = hostname;
        }
        if let Some(port) = lookup("EXPOSER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid EXPOSER_PORT: {}", port)))?;
        }
        if let Some(route) = lookup("EXPOSER_ROUTE") {
            self.server.route = route;
        }
        if let Some(methods) = lookup("EXPOSER_METHODS") {
            self.server.methods = methods
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Method>>>()?;
        }
        Ok(())
    }

    /// Method set from the server section
    pub fn methods(&self) -> MethodSet {
        self.server.methods.iter().copied().collect()
    }

    /// Options for `expose` derived from the server section
    pub fn expose_options(&self) -> ExposeOptions {
        ExposeOptions {
            port: self.server.port,
            hostname: self.server.hostname.clone(),
            route: self.server.route.clone(),
            decode: self.server.decode,
            shutdown_on_ctrl_c: self.server.shutdown_on_ctrl_c,
        }
    }
}

/// Binding parameters accepted by `expose` and its variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeOptions {
    pub port: u16,
    pub hostname: String,
    pub route: String,
    pub decode: DecodeMode,
    pub shutdown_on_ctrl_c: bool,
}

impl Default for ExposeOptions {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            route: default_route(),
            decode: DecodeMode::default(),
            shutdown_on_ctrl_c: false,
        }
    }
}

impl ExposeOptions {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn decode(mut self, decode: DecodeMode) -> Self {
        self.decode = decode;
        self
    }

    pub fn shutdown_on_ctrl_c(mut self, enabled: bool) -> Self {
        self.shutdown_on_ctrl_c = enabled;
        self
    }
}

/// Immutable binding configuration of one listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    methods: MethodSet,
    options: ExposeOptions,
}

impl Binding {
    /// Validate the route and freeze the binding
    pub fn new(methods: MethodSet, options: ExposeOptions) -> Result<Self> {
        validate_route(&options.route)?;
        Ok(Self { methods, options })
    }

    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    pub fn port(&self) -> u16 {
        self.options.port
    }

    pub fn hostname(&self) -> &str {
        &self.options.hostname
    }

    pub fn route(&self) -> &str {
        &self.options.route
    }

    pub fn decode(&self) -> DecodeMode {
        self.options.decode
    }

    pub fn shutdown_on_ctrl_c(&self) -> bool {
        self.options.shutdown_on_ctrl_c
    }

    /// `host:port` string handed to the socket resolver
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.options.hostname, self.options.port)
    }
}

/// Routes are literal paths: they must start with `/` and carry no capture
/// syntax the router would interpret.
fn validate_route(route: &str) -> Result<()> {
    if !route.starts_with('/') {
        return Err(Error::InvalidRoute(format!(
            "route must start with '/': {:?}",
            route
        )));
    }

    if route.contains(['{', '}', '*']) {
        return Err(Error::InvalidRoute(format!(
            "route must be a literal path: {:?}",
            route
        )));
    }

    if route.split('/').any(|segment| segment.starts_with(':')) {
        return Err(Error::InvalidRoute(format!(
            "route segments must not start with ':': {:?}",
            route
        )));
    }

    Ok(())
}

// Default value functions

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_route() -> String {
    "/".to_string()
}

fn default_methods() -> Vec<Method> {
    Method::ALL.to_vec()
}

fn default_log_level() -> String {
    "exposer=info,tower_http=debug".to_string()
}
