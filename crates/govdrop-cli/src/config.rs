//! govdrop configuration file

use anyhow::Context;
use govdrop_core::Dec;
use govdrop_distribution::{DistributionParameters, DustPolicy, DEFAULT_ADDRESS_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "govdrop.toml";

/// Complete configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GovdropConfig {
    /// Distribution parameters
    #[serde(default)]
    pub distribution: DistributionConfig,

    /// Dust exclusion
    #[serde(default)]
    pub dust: DustConfig,

    /// Snapshot reading
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GovdropConfig {
    /// Read `path`; a missing default file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Validated distribution parameters
    pub fn to_parameters(&self) -> govdrop_core::Result<DistributionParameters> {
        let d = &self.distribution;
        let params = DistributionParameters {
            yes_votes_multiplier: d.yes_votes_multiplier.clone(),
            no_votes_multiplier: d.no_votes_multiplier.clone(),
            bonus: d.bonus.clone(),
            malus: d.malus.clone(),
            conversion_factor: d.conversion_factor.clone(),
            address_prefix: d.address_prefix.clone(),
            dust: DustPolicy::new(self.dust.min_allocation.clone()),
        };
        params.validate()?;
        Ok(params)
    }
}

/// `[distribution]` section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default = "default_yes_votes_multiplier")]
    pub yes_votes_multiplier: Dec,

    #[serde(default = "default_no_votes_multiplier")]
    pub no_votes_multiplier: Dec,

    /// Extra factor on NoWithVeto
    #[serde(default = "default_bonus")]
    pub bonus: Dec,

    /// Factor on the non-voter pool
    #[serde(default = "default_malus")]
    pub malus: Dec,

    #[serde(default = "default_conversion_factor")]
    pub conversion_factor: Dec,

    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
}

fn default_yes_votes_multiplier() -> Dec {
    DistributionParameters::default().yes_votes_multiplier
}

fn default_no_votes_multiplier() -> Dec {
    DistributionParameters::default().no_votes_multiplier
}

fn default_bonus() -> Dec {
    DistributionParameters::default().bonus
}

fn default_malus() -> Dec {
    DistributionParameters::default().malus
}

fn default_conversion_factor() -> Dec {
    DistributionParameters::default().conversion_factor
}

fn default_address_prefix() -> String {
    DEFAULT_ADDRESS_PREFIX.to_string()
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            yes_votes_multiplier: default_yes_votes_multiplier(),
            no_votes_multiplier: default_no_votes_multiplier(),
            bonus: default_bonus(),
            malus: default_malus(),
            conversion_factor: default_conversion_factor(),
            address_prefix: default_address_prefix(),
        }
    }
}

/// `[dust]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DustConfig {
    /// Allocations below this amount are excluded
    #[serde(default)]
    pub min_allocation: Dec,
}

/// `[snapshot]` section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Denom of liquid balances
    #[serde(default = "default_denom")]
    pub denom: String,
}

fn default_denom() -> String {
    "uatom".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            denom: default_denom(),
        }
    }
}

/// `[logging]` section
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_parameters() {
        let params = GovdropConfig::default().to_parameters().unwrap();
        assert_eq!(params, DistributionParameters::default());
    }

    #[test]
    fn test_partial_file() {
        let config: GovdropConfig = toml::from_str(
            r#"
            [distribution]
            no_votes_multiplier = "4"
            malus = 0.5

            [dust]
            min_allocation = "0.001"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let params = config.to_parameters().unwrap();
        assert_eq!(params.no_votes_multiplier, Dec::from_int(4));
        assert_eq!(params.malus, Dec::new_with_prec(5, 1));
        assert_eq!(params.bonus, Dec::new_with_prec(103, 2));
        assert_eq!(params.dust.min_allocation, Dec::new_with_prec(1, 3));
        assert_eq!(config.snapshot.denom, "uatom");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_values_rejected_on_conversion() {
        let config: GovdropConfig = toml::from_str("[distribution]\nconversion_factor = \"0\"\n").unwrap();
        assert!(config.to_parameters().is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[snapshot]\ndenom = \"uosmo\"").unwrap();

        let config = GovdropConfig::load(file.path()).unwrap();
        assert_eq!(config.snapshot.denom, "uosmo");
        assert!(GovdropConfig::load(Path::new("/nonexistent/govdrop.toml")).is_err());
    }
}
