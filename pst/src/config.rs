//! Reader configuration.
//!
//! Configuration is passed explicitly to [`PstFile::open`](crate::messaging::PstFile::open);
//! nothing in the library reads global state. The binary builds it from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `PST_VERIFY_CRC`: verify header, page and block CRCs (default: `true`)
//! - `PST_LAZY_BTREES`: search the NDB B-trees page by page instead of loading
//!   them up front (default: `false`)
//! - `PST_COLLECTION_POLICY`: `strict` or `lenient` (default: `strict`)
//! - `PST_FILE`: input file, used by the binary when no argument is given

use std::path::PathBuf;
use std::str::FromStr;

/// How collections (sub-folders, contents, attachments, recipients) treat
/// elements that fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPolicy {
    /// The first failure aborts the whole collection.
    #[default]
    Strict,
    /// Failed elements are skipped and reported alongside the decoded ones.
    Lenient,
}

impl FromStr for CollectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(format!("'{s}' is not a collection policy (expected strict or lenient)")),
        }
    }
}

/// Options controlling how a file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Reject header, page and block CRC mismatches. When off, mismatches are
    /// logged and the data is used as is.
    pub verify_crc: bool,
    /// Use on-demand B-tree lookups rather than loading both trees at open.
    pub lazy_btrees: bool,
    pub collection_policy: CollectionPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_crc: Self::DEFAULT_VERIFY_CRC,
            lazy_btrees: Self::DEFAULT_LAZY_BTREES,
            collection_policy: CollectionPolicy::default(),
        }
    }
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

impl ReaderConfig {
    pub const DEFAULT_VERIFY_CRC: bool = true;
    pub const DEFAULT_LAZY_BTREES: bool = false;

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            verify_crc: load_bool("PST_VERIFY_CRC", Self::DEFAULT_VERIFY_CRC)?,
            lazy_btrees: load_bool("PST_LAZY_BTREES", Self::DEFAULT_LAZY_BTREES)?,
            collection_policy: load_collection_policy()?,
        })
    }

    #[must_use]
    pub const fn with_verify_crc(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }

    #[must_use]
    pub const fn with_lazy_btrees(mut self, lazy_btrees: bool) -> Self {
        self.lazy_btrees = lazy_btrees;
        self
    }

    #[must_use]
    pub const fn with_collection_policy(mut self, collection_policy: CollectionPolicy) -> Self {
        self.collection_policy = collection_policy;
        self
    }
}

/// Resolve the input file: the command-line argument if given, else `PST_FILE`.
///
/// # Errors
///
/// Returns an error if neither is present.
pub fn input_path(argument: Option<String>) -> Result<PathBuf, ConfigError> {
    argument
        .or_else(|| std::env::var("PST_FILE").ok())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ConfigError::MissingEnvVar("PST_FILE".to_string()))
}

fn load_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |value| parse_bool(name, &value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean"),
        }),
    }
}

fn load_collection_policy() -> Result<CollectionPolicy, ConfigError> {
    match std::env::var("PST_COLLECTION_POLICY") {
        Ok(value) => value.parse().map_err(|message| ConfigError::InvalidValue {
            name: "PST_COLLECTION_POLICY".to_string(),
            message,
        }),
        Err(_) => Ok(CollectionPolicy::default()),
    }
}
