//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/warfarin/config.toml`.

use crate::catalog::{get_default_inventory, TabletInventory};
use crate::{Error, Result, SpecialDayPattern, DAYS_PER_WEEK};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub search: SearchLimits,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Stocked tablet strengths and the default selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_strengths")]
    pub strengths: Vec<u32>,

    #[serde(default = "default_selected")]
    pub selected: Vec<u32>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            strengths: default_strengths(),
            selected: default_selected(),
        }
    }
}

impl InventoryConfig {
    pub fn to_inventory(&self) -> TabletInventory {
        TabletInventory::new(&self.strengths, &self.selected)
    }
}

/// Bounds applied by the regimen search
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchLimits {
    /// Tablet pieces (whole or half) allowed on a single day
    #[serde(default = "default_max_tablets_per_day")]
    pub max_tablets_per_day: u32,

    /// Absolute ceiling for any single day's dose
    #[serde(default = "default_max_daily_dose_mg")]
    pub max_daily_dose_mg: f64,

    /// A raised special-day dose may be at most this multiple of the base dose
    #[serde(default = "default_special_dose_multiplier_limit")]
    pub special_dose_multiplier_limit: f64,

    /// Largest accepted gap between realized and prescribed weekly dose
    #[serde(default = "default_weekly_tolerance_mg")]
    pub weekly_tolerance_mg: f64,

    /// Number of regimens returned
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_tablets_per_day: default_max_tablets_per_day(),
            max_daily_dose_mg: default_max_daily_dose_mg(),
            special_dose_multiplier_limit: default_special_dose_multiplier_limit(),
            weekly_tolerance_mg: default_weekly_tolerance_mg(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

/// Defaults for inputs the host does not ask for explicitly
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_allow_half")]
    pub allow_half: bool,

    #[serde(default = "default_special_day_pattern")]
    pub special_day_pattern: SpecialDayPattern,

    #[serde(default = "default_days_until_appointment")]
    pub days_until_appointment: u32,

    #[serde(default)]
    pub start_day_of_week: u8,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            allow_half: default_allow_half(),
            special_day_pattern: default_special_day_pattern(),
            days_until_appointment: default_days_until_appointment(),
            start_day_of_week: 0,
        }
    }
}

// Default value functions
fn default_strengths() -> Vec<u32> {
    get_default_inventory()
        .tablets
        .iter()
        .map(|t| t.strength_mg)
        .collect()
}

fn default_selected() -> Vec<u32> {
    get_default_inventory().selected_strengths()
}

fn default_max_tablets_per_day() -> u32 {
    4
}

fn default_max_daily_dose_mg() -> f64 {
    15.0
}

fn default_special_dose_multiplier_limit() -> f64 {
    2.5
}

fn default_weekly_tolerance_mg() -> f64 {
    0.5
}

fn default_max_suggestions() -> usize {
    5
}

fn default_allow_half() -> bool {
    true
}

fn default_special_day_pattern() -> SpecialDayPattern {
    SpecialDayPattern::FriSun
}

fn default_days_until_appointment() -> u32 {
    7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("warfarin").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check that the configuration describes a usable setup
    pub fn validate(&self) -> Result<()> {
        let inventory = self.inventory.to_inventory();
        let mut errors = inventory.validate();

        for mg in &self.inventory.selected {
            if !inventory.contains(*mg) {
                errors.push(format!("Selected strength {} mg is not stocked", mg));
            }
        }

        let search = &self.search;
        if search.max_tablets_per_day == 0 {
            errors.push("search.max_tablets_per_day must be at least 1".into());
        }
        if !(search.max_daily_dose_mg > 0.0) {
            errors.push("search.max_daily_dose_mg must be positive".into());
        }
        if !(search.special_dose_multiplier_limit >= 1.0) {
            errors.push("search.special_dose_multiplier_limit must be at least 1".into());
        }
        if !(search.weekly_tolerance_mg >= 0.0) {
            errors.push("search.weekly_tolerance_mg must not be negative".into());
        }
        if search.max_suggestions == 0 {
            errors.push("search.max_suggestions must be at least 1".into());
        }

        if self.defaults.start_day_of_week as usize >= DAYS_PER_WEEK {
            errors.push("defaults.start_day_of_week must be 0-6".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }
}
