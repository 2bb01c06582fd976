use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::costsim::{PriceSheet, PriceSheetEntry, Workload};
use crate::scoring::{DEFAULT_MAX_SELECTION, MIN_SELECTION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub workload: Workload,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub models: Vec<PriceSheetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub bundle_dirs: Vec<String>,
    #[serde(default = "default_true")]
    pub include_builtin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_max_selected")]
    pub max_selected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_sweep_step_pct")]
    pub sweep_step_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bundle_dirs: Option<Vec<String>>,
    pub max_selected: Option<usize>,
    pub default_model: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/genai-advisor/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed
            .validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.comparison.max_selected < MIN_SELECTION {
            bail!(
                "comparison.max_selected must be at least {MIN_SELECTION}, got {}",
                self.comparison.max_selected
            );
        }
        for entry in &self.models {
            let prices = [
                entry.input_price_per_k_tokens,
                entry.output_price_per_k_tokens,
                entry.cache_read_price_per_k_tokens,
                entry.cache_write_price_per_k_tokens,
            ];
            if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
                bail!("model {} has a negative or non-finite price", entry.model_id);
            }
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dirs) = overrides.bundle_dirs {
            self.content.bundle_dirs.extend(dirs);
        }
        if let Some(max_selected) = overrides.max_selected {
            self.comparison.max_selected = max_selected.max(MIN_SELECTION);
        }
        if let Some(model) = overrides.default_model {
            self.simulator.default_model = model;
        }
    }

    /// Configured models, or the built-in sheet when none are listed.
    pub fn price_sheet(&self) -> PriceSheet {
        if self.models.is_empty() {
            PriceSheet::builtin()
        } else {
            PriceSheet {
                entries: self.models.clone(),
            }
        }
    }

    pub fn resolved_bundle_dirs(&self) -> Vec<PathBuf> {
        self.content
            .bundle_dirs
            .iter()
            .map(|dir| expand_tilde(dir))
            .collect()
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> String {
        let template = r#"[content]
bundle_dirs = ["~/.config/genai-advisor/topics"]
include_builtin = true

[comparison]
max_selected = 4

[workload]
requests_per_day = 1000
input_tokens_per_request = 2000
output_tokens_per_request = 500
cacheable_fraction_pct = 60.0
cache_hit_rate_pct = 70.0

[simulator]
default_model = "claude-3-5-sonnet"
sweep_step_pct = 10.0

# Leave [[models]] out to use the built-in price sheet.
# [[models]]
# model_id = "claude-3-5-sonnet"
# display_name = "Claude 3.5 Sonnet"
# input_price_per_k_tokens = 0.003
# output_price_per_k_tokens = 0.015
# cache_read_price_per_k_tokens = 0.0003
# cache_write_price_per_k_tokens = 0.00375
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content: ContentConfig::default(),
            comparison: ComparisonConfig::default(),
            workload: Workload::default(),
            simulator: SimulatorConfig::default(),
            models: Vec::new(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            bundle_dirs: Vec::new(),
            include_builtin: true,
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            max_selected: default_max_selected(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            sweep_step_pct: default_sweep_step_pct(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_selected() -> usize {
    DEFAULT_MAX_SELECTION
}

fn default_model() -> String {
    "claude-3-5-sonnet".to_string()
}

fn default_sweep_step_pct() -> f64 {
    10.0
}
