//! Server configuration module.
//!
//! Configuration is loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BOOKSHELF_LISTEN_PORT`: Port to listen on (default: `25600`)
//! - `BOOKSHELF_JWT_SECRET`: HS256 secret for bearer tokens
//! - `BOOKSHELF_JWT_PUBLIC_KEY`: PEM-encoded RS256 public key for bearer tokens
//! - `BOOKSHELF_MAX_FILTER_DEPTH`: Maximum filter nesting (default: `32`)
//! - `BOOKSHELF_MAX_FILTER_NODES`: Maximum filter size (default: `512`)
//!
//! # Invariants
//!
//! - Exactly one of `BOOKSHELF_JWT_SECRET` and `BOOKSHELF_JWT_PUBLIC_KEY` is set.
//! - Filter limits are at least 1.

use crate::auth::JwtConfig;
use crate::search::FilterLimits;

const LISTEN_PORT: &str = "BOOKSHELF_LISTEN_PORT";
const JWT_SECRET: &str = "BOOKSHELF_JWT_SECRET";
const JWT_PUBLIC_KEY: &str = "BOOKSHELF_JWT_PUBLIC_KEY";
const MAX_FILTER_DEPTH: &str = "BOOKSHELF_MAX_FILTER_DEPTH";
const MAX_FILTER_NODES: &str = "BOOKSHELF_MAX_FILTER_NODES";

const DEFAULT_MAX_DEPTH: usize = FilterLimits::DEFAULT_MAX_DEPTH;
const DEFAULT_MAX_NODES: usize = FilterLimits::DEFAULT_MAX_NODES;

/// Server configuration.
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
/// - `jwt` holds validated key material
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to.
    pub listen_port: u16,
    /// Bearer token verification.
    pub jwt: JwtConfig,
    /// Bounds applied to client filters before compilation.
    pub filter_limits: FilterLimits,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 25600;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - neither or both of the JWT variables are set, or the key is invalid
    /// - a numeric variable is set but does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_port = Self::load_listen_port(&lookup)?;
        let jwt = Self::load_jwt(&lookup)?;
        let filter_limits = FilterLimits {
            max_depth: Self::load_limit(&lookup, MAX_FILTER_DEPTH, DEFAULT_MAX_DEPTH)?,
            max_nodes: Self::load_limit(&lookup, MAX_FILTER_NODES, DEFAULT_MAX_NODES)?,
        };

        Ok(Self {
            listen_port,
            jwt,
            filter_limits,
        })
    }

    /// Load the listen port. Returns the default if not set.
    fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(value) = lookup(LISTEN_PORT) else {
            return Ok(Self::DEFAULT_PORT);
        };
        match value.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(ConfigError::InvalidValue {
                name: LISTEN_PORT.to_string(),
                message: format!("'{value}' is not a valid port number (must be 1-65535)"),
            }),
        }
    }

    fn load_jwt<F>(lookup: &F) -> Result<JwtConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |name: &str, message: String| ConfigError::InvalidValue {
            name: name.to_string(),
            message,
        };
        match (lookup(JWT_SECRET), lookup(JWT_PUBLIC_KEY)) {
            (Some(_), Some(_)) => Err(invalid(
                JWT_SECRET,
                format!("cannot be combined with {JWT_PUBLIC_KEY}"),
            )),
            (Some(secret), None) => JwtConfig::new_hs256(secret.into_bytes())
                .map_err(|e| invalid(JWT_SECRET, e.to_string())),
            (None, Some(public_key)) => JwtConfig::new_rs256(public_key)
                .map_err(|e| invalid(JWT_PUBLIC_KEY, e.to_string())),
            (None, None) => Err(ConfigError::MissingEnvVar(JWT_SECRET.to_string())),
        }
    }

    fn load_limit<F>(lookup: &F, name: &str, default: usize) -> Result<usize, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(name).map_or(Ok(default), |value| {
            value
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("'{value}' is not a positive integer"),
                })
        })
    }
}
