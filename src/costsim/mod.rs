pub mod analysis;
pub mod model;

use serde::{Deserialize, Serialize};

pub use analysis::{
    break_even_hit_rate, simulate_models, sweep_hit_rate, ModelSimulation, SweepPoint,
};
pub use model::{round_half_up, simulate};

/// Billing is modelled on a flat 30-day month.
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const TOKENS_PER_PRICE_UNIT: f64 = 1000.0;

/// Per-model token prices, all per 1K tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSheetEntry {
    pub model_id: String,
    #[serde(default)]
    pub display_name: String,
    pub input_price_per_k_tokens: f64,
    pub output_price_per_k_tokens: f64,
    pub cache_read_price_per_k_tokens: f64,
    pub cache_write_price_per_k_tokens: f64,
}

impl PriceSheetEntry {
    pub fn new(
        model_id: impl Into<String>,
        display_name: impl Into<String>,
        input: f64,
        output: f64,
        cache_read: f64,
        cache_write: f64,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            display_name: display_name.into(),
            input_price_per_k_tokens: input,
            output_price_per_k_tokens: output,
            cache_read_price_per_k_tokens: cache_read,
            cache_write_price_per_k_tokens: cache_write,
        }
    }

    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.model_id
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSheet {
    pub entries: Vec<PriceSheetEntry>,
}

impl PriceSheet {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                PriceSheetEntry::new(
                    "claude-3-5-sonnet",
                    "Claude 3.5 Sonnet",
                    0.003,
                    0.015,
                    0.0003,
                    0.00375,
                ),
                PriceSheetEntry::new(
                    "claude-3-5-haiku",
                    "Claude 3.5 Haiku",
                    0.0008,
                    0.004,
                    0.00008,
                    0.001,
                ),
                PriceSheetEntry::new(
                    "claude-3-opus",
                    "Claude 3 Opus",
                    0.015,
                    0.075,
                    0.0015,
                    0.01875,
                ),
                PriceSheetEntry::new(
                    "claude-3-haiku",
                    "Claude 3 Haiku",
                    0.00025,
                    0.00125,
                    0.00003,
                    0.0003,
                ),
            ],
        }
    }

    pub fn entries(&self) -> &[PriceSheetEntry] {
        &self.entries
    }

    /// Looks up by model id or display name, ignoring case.
    pub fn find(&self, model: &str) -> Option<&PriceSheetEntry> {
        let wanted = model.trim();
        self.entries.iter().find(|e| {
            e.model_id.eq_ignore_ascii_case(wanted) || e.display_name.eq_ignore_ascii_case(wanted)
        })
    }

    pub fn default_entry(&self) -> Option<&PriceSheetEntry> {
        self.entries.first()
    }
}

impl Default for PriceSheet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Traffic shape of one simulated workload. Percentages are expected in
/// 0..=100 but are not clamped here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Workload {
    pub requests_per_day: u64,
    pub input_tokens_per_request: u64,
    pub output_tokens_per_request: u64,
    pub cacheable_fraction_pct: f64,
    pub cache_hit_rate_pct: f64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            requests_per_day: 1000,
            input_tokens_per_request: 2000,
            output_tokens_per_request: 500,
            cacheable_fraction_pct: 60.0,
            cache_hit_rate_pct: 70.0,
        }
    }
}

impl Workload {
    pub fn with_hit_rate(&self, cache_hit_rate_pct: f64) -> Self {
        Self {
            cache_hit_rate_pct,
            ..self.clone()
        }
    }
}

/// Daily and monthly cost with and without prompt caching. Values are
/// unrounded; round only when displaying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSimulation {
    pub model_id: String,
    pub cached_tokens: f64,
    pub uncached_tokens: f64,
    pub hits_per_day: f64,
    pub misses_per_day: f64,
    pub hit_cost_per_day: f64,
    pub miss_cost_per_day: f64,
    pub no_cache_per_day: f64,
    pub no_cache_per_month: f64,
    pub with_cache_per_day: f64,
    pub with_cache_per_month: f64,
    pub savings_per_day: f64,
    pub savings_per_month: f64,
    pub savings_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::PriceSheet;

    #[test]
    fn finds_models_by_id_or_display_name() {
        let sheet = PriceSheet::builtin();
        assert_eq!(
            sheet.find("Claude 3.5 Sonnet").map(|e| e.model_id.as_str()),
            Some("claude-3-5-sonnet")
        );
        assert_eq!(
            sheet.find(" CLAUDE-3-HAIKU ").map(|e| e.label()),
            Some("Claude 3 Haiku")
        );
        assert!(sheet.find("gpt-4").is_none());
        assert_eq!(
            sheet.default_entry().map(|e| e.model_id.as_str()),
            Some("claude-3-5-sonnet")
        );
    }

    #[test]
    fn builtin_write_price_is_a_premium_and_read_a_discount() {
        for entry in PriceSheet::builtin().entries() {
            assert!(entry.cache_write_price_per_k_tokens > entry.input_price_per_k_tokens);
            assert!(entry.cache_read_price_per_k_tokens < entry.input_price_per_k_tokens);
        }
    }
}
