//! Lot configuration: capacities, pricing and where the data files live.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LOT_SPOTS must be a positive integer, got '{0}'")]
    InvalidSpots(String),

    #[error("LOT_RATE must be a non-negative number, got '{0}'")]
    InvalidRate(String),

    #[error("LOT_OWNER_IDS must be 'sequential' or 'token', got '{0}'")]
    InvalidOwnerIds(String),
}

/// How owner identifiers are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerIdScheme {
    /// `OWN0001`, `OWN0002`, ... continuing from the highest id on disk
    Sequential,
    /// Random UUID per owner
    Token,
}

impl OwnerIdScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Some(OwnerIdScheme::Sequential),
            "token" | "uuid" => Some(OwnerIdScheme::Token),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotConfig {
    /// Root directory holding admin/, vehicles/, owners/, parking/, reports/
    pub data_dir: PathBuf,
    /// Number of physical spots (numbered 1..=spot_count)
    pub spot_count: usize,
    /// Price per billed hour
    pub rate_per_hour: f64,
    /// Currency label used in rendered output
    pub currency: String,
    pub max_admins: usize,
    pub max_vehicles: usize,
    pub owner_ids: OwnerIdScheme,
}

pub const DEFAULT_SPOT_COUNT: usize = 50;
pub const DEFAULT_RATE_PER_HOUR: f64 = 100.0;
pub const DEFAULT_MAX_ADMINS: usize = 10;
pub const DEFAULT_MAX_VEHICLES: usize = 200;

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            spot_count: DEFAULT_SPOT_COUNT,
            rate_per_hour: DEFAULT_RATE_PER_HOUR,
            currency: "TK".to_string(),
            max_admins: DEFAULT_MAX_ADMINS,
            max_vehicles: DEFAULT_MAX_VEHICLES,
            owner_ids: OwnerIdScheme::Sequential,
        }
    }
}

impl LotConfig {
    /// Config rooted at `data_dir` with every other value at its default.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// Environment variables:
    /// - LOT_DATA_DIR: data directory (default: current directory)
    /// - LOT_SPOTS: number of spots (default: 50)
    /// - LOT_RATE: price per hour (default: 100.0)
    /// - LOT_CURRENCY: currency label (default: TK)
    /// - LOT_OWNER_IDS: `sequential` or `token` (default: sequential)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LOT_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = std::env::var("LOT_SPOTS") {
            config.spot_count = parse_spots(&raw)?;
        }

        if let Ok(raw) = std::env::var("LOT_RATE") {
            config.rate_per_hour = parse_rate(&raw)?;
        }

        if let Ok(currency) = std::env::var("LOT_CURRENCY") {
            if !currency.is_empty() {
                config.currency = currency;
            }
        }

        if let Ok(raw) = std::env::var("LOT_OWNER_IDS") {
            config.owner_ids =
                OwnerIdScheme::parse(&raw).ok_or(ConfigError::InvalidOwnerIds(raw))?;
        }

        Ok(config)
    }

    pub fn with_spots(mut self, spot_count: usize) -> Self {
        self.spot_count = spot_count;
        self
    }

    /// Rates that `parse_rate` would reject are billed at the default rate.
    pub fn with_rate(mut self, rate_per_hour: f64) -> Self {
        self.rate_per_hour = rate_per_hour;
        self
    }

    pub fn with_owner_ids(mut self, scheme: OwnerIdScheme) -> Self {
        self.owner_ids = scheme;
        self
    }

    pub fn admin_file(&self) -> PathBuf {
        self.data_dir.join("admin").join("data.txt")
    }

    pub fn owner_file(&self) -> PathBuf {
        self.data_dir.join("owners").join("data.txt")
    }

    pub fn vehicle_file(&self) -> PathBuf {
        self.data_dir.join("vehicles").join("data.txt")
    }

    pub fn spot_file(&self) -> PathBuf {
        self.data_dir.join("parking").join("data.txt")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

pub fn parse_spots(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidSpots(raw.to_string())),
    }
}

pub fn parse_rate(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate >= 0.0 => Ok(rate),
        _ => Err(ConfigError::InvalidRate(raw.to_string())),
    }
}
