// Start of file: /src/config/environment.rs

// * Environment configuration with a singleton pattern.
// * Grid settings name the remote nodes and the cache to use.

use std::{borrow::Cow, collections::HashMap, fmt, str::FromStr};
// * anyhow for convenient error handling
use anyhow::{anyhow, bail, Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 3; // 3 seconds
const DEFAULT_GRID_NODE_NAME: &str = "social-grid-client";
const DEFAULT_GRID_REMOTE_NODES: &str = "127.0.0.1:6379";
const DEFAULT_GRID_CACHE_NAME: &str = "persons";
const DEFAULT_GRID_SEQUENCE_NAME: &str = "persons_sequence";

/// Which grid implementation backs the `persons` cache
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridBackend {
    /// In-process cache, lost on restart
    Memory,
    /// Remote Redis nodes
    Redis,
}

impl GridBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridBackend::Memory => "memory",
            GridBackend::Redis => "redis",
        }
    }
}

impl FromStr for GridBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(GridBackend::Memory),
            "redis" => Ok(GridBackend::Redis),
            other => Err(anyhow!("Unknown grid backend '{other}', expected 'memory' or 'redis'")),
        }
    }
}

/// Address of one remote grid node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridNode {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for GridNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for GridNode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (host, port) = value
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("Grid node '{value}' must look like host:port"))?;

        if host.is_empty() {
            bail!("Grid node '{value}' has an empty host");
        }

        let port: u16 = port
            .parse()
            .with_context(|| format!("Invalid port in grid node '{value}'"))?;

        Ok(Self { host: host.to_string(), port })
    }
}

/// Parses a comma-separated `host:port` list, skipping blank entries
pub fn parse_grid_nodes(value: &str) -> Result<Vec<GridNode>> {
    let nodes: Vec<GridNode> = value
        .split(',')
        .filter(|entry: &&str| !entry.trim().is_empty())
        .map(GridNode::from_str)
        .collect::<Result<_>>()?;

    if nodes.is_empty() {
        bail!("GRID_REMOTE_NODES must name at least one node");
    }

    Ok(nodes)
}

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub grid_backend: GridBackend,
    pub grid_node_name: Cow<'static, str>,
    pub grid_remote_nodes: Vec<GridNode>,
    pub grid_cache_name: Cow<'static, str>,
    pub grid_sequence_name: Cow<'static, str>,
}

impl EnvironmentVariables {
    // * Reads the process environment.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    // * Builds the configuration from an explicit variable map, providing defaults if missing
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get_var = |key: &str| vars.get(key).map(String::as_str);

        Ok(Self {
            environment: get_var("ENVIRONMENT")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                    Cow::Borrowed(DEFAULT_ENVIRONMENT)
                }),

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            protocol: get_var("PROTOCOL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_PROTOCOL)),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            grid_backend: get_var("GRID_BACKEND")
                .map(|s| s.parse().context("Invalid GRID_BACKEND"))
                .transpose()?
                .unwrap_or(GridBackend::Memory),

            grid_node_name: get_var("GRID_NODE_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_GRID_NODE_NAME)),

            grid_remote_nodes: parse_grid_nodes(
                get_var("GRID_REMOTE_NODES").unwrap_or(DEFAULT_GRID_REMOTE_NODES),
            )
            .context("Invalid GRID_REMOTE_NODES")?,

            grid_cache_name: get_var("GRID_CACHE_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_GRID_CACHE_NAME)),

            grid_sequence_name: get_var("GRID_SEQUENCE_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_GRID_SEQUENCE_NAME)),
        })
    }

    // * Returns a reference to the lazily-initialized environment configuration
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> = Lazy::new(|| {
            let config: EnvironmentVariables = EnvironmentVariables::load()?;

            if cfg!(debug_assertions) {
                tracing::debug!("Loaded environment configuration: {:#?}", config);
            }

            Ok(config)
        });

        INSTANCE
            .as_ref()
            .map_err(|e: &anyhow::Error| anyhow!("Failed to load environment configuration: {e:#}"))
    }
}


// End of file: /src/config/environment.rs
