//! Application configuration.
//!
//! Values come from `<config dir>/gasolinera/config.toml`, overlaid by
//! `GASOLINERA__*` environment variables (for example
//! `GASOLINERA__DATA_ROOT=/tmp/datos`). Everything has a default, so a missing
//! file is not an error.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{models::FuelType, save::StateStore, selector::AttendantSelector, station::Station};

/// Directory under the user's config directory holding `config.toml`.
pub const CONFIG_DIR: &str = "gasolinera";

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "GASOLINERA";

const DEFAULT_CONFIG: &str = r#"# Gasolinera configuration.

# Directory holding saved stations (*.gas). Defaults to the platform data dir.
# data_root = "/home/me/.local/share/gasolinera/datos"

# Where gasolinera.log is written.
log_dir = "logs"

# tracing filter used when RUST_LOG is not set.
log_filter = "info"

# Starting point for the "New station" form.
[template]
pumps = 4
attendants = ["Alice", "Bob", "Charly"]

[[template.fuel_types]]
name = "corriente"
unit_price = 14500
available = 100.0

[[template.fuel_types]]
name = "plus"
unit_price = 16251
available = 80.0

[[template.fuel_types]]
name = "extra"
unit_price = 21090
available = 50.0
"#;

/// Runtime configuration for the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding saved stations.
    pub data_root: PathBuf,
    /// Directory for the log file.
    pub log_dir: PathBuf,
    /// Fallback tracing filter.
    pub log_filter: String,
    /// Defaults for newly created stations.
    pub template: StationTemplate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: StateStore::default_root(),
            log_dir: PathBuf::from("logs"),
            log_filter: "info".to_string(),
            template: StationTemplate::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = settings
            .try_deserialize::<AppConfig>()
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Store for the configured data directory.
    pub fn state_store(&self) -> StateStore {
        StateStore::new(&self.data_root)
    }
}

/// Pump count, fuel types and staff used to seed a new station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationTemplate {
    /// Number of pumps.
    pub pumps: usize,
    /// Fuel types with their initial stock.
    pub fuel_types: Vec<FuelType>,
    /// Attendant names.
    pub attendants: Vec<String>,
}

impl Default for StationTemplate {
    fn default() -> Self {
        Self {
            pumps: 1,
            fuel_types: Vec::new(),
            attendants: Vec::new(),
        }
    }
}

impl StationTemplate {
    /// Build a station from the template.
    pub fn build<S>(&self, selector: &mut S) -> crate::Result<Station>
    where
        S: AttendantSelector + ?Sized,
    {
        Station::new(
            self.pumps,
            self.fuel_types.iter().cloned(),
            &self.attendants,
            selector,
        )
    }
}

/// Location of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the commented default config if the user has none yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

fn ensure_default_config_at(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::RoundRobinSelector;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("config.toml"))?;
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.template.pumps, 1);
        assert!(config.template.fuel_types.is_empty());
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gasolinera").join("config.toml");
        ensure_default_config_at(path.clone())?;
        assert!(path.exists());

        fs::write(&path, format!("data_root = \"/tmp/datos\"\n{DEFAULT_CONFIG}"))?;
        ensure_default_config_at(path.clone())?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_root, PathBuf::from("/tmp/datos"));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.template.pumps, 4);
        assert_eq!(config.template.attendants, ["Alice", "Bob", "Charly"]);
        let names: Vec<_> = config.template.fuel_types.iter().map(FuelType::name).collect();
        assert_eq!(names, ["corriente", "plus", "extra"]);
        Ok(())
    }

    #[test]
    fn template_builds_station() -> Result<()> {
        let template = StationTemplate {
            pumps: 2,
            fuel_types: vec![FuelType::new("corriente", 14500, 100.0)],
            attendants: vec!["Alice".to_string()],
        };
        let station = template.build(&mut RoundRobinSelector::default())?;
        assert_eq!(station.pump_count(), 2);
        assert_eq!(station.fuel_type("corriente").map(FuelType::unit_price), Some(14500));

        let empty = StationTemplate::default().build(&mut RoundRobinSelector::default());
        assert!(empty.is_err());
        Ok(())
    }
}
