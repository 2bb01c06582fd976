use serde::{Deserialize, Serialize};

use crate::costsim::model::{round_half_up, simulate};
use crate::costsim::{CostSimulation, PriceSheet, PriceSheetEntry, Workload};

/// Finest hit-rate step a sweep will take.
pub const MIN_SWEEP_STEP_PCT: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSimulation {
    pub model_id: String,
    pub display_name: String,
    pub simulation: CostSimulation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepPoint {
    pub cache_hit_rate_pct: f64,
    pub no_cache_per_day: f64,
    pub with_cache_per_day: f64,
    pub savings_per_day: f64,
    pub savings_pct: f64,
}

pub fn simulate_models(workload: &Workload, sheet: &PriceSheet) -> Vec<ModelSimulation> {
    sheet
        .entries()
        .iter()
        .map(|entry| ModelSimulation {
            model_id: entry.model_id.clone(),
            display_name: entry.label().to_string(),
            simulation: simulate(workload, entry),
        })
        .collect()
}

/// Simulates hit rates 0, step, 2*step, ... and finally 100.
pub fn sweep_hit_rate(
    workload: &Workload,
    price: &PriceSheetEntry,
    step_pct: f64,
) -> Vec<SweepPoint> {
    if !step_pct.is_finite() || step_pct <= 0.0 {
        return vec![sweep_point(workload, price, workload.cache_hit_rate_pct)];
    }
    let step = step_pct.max(MIN_SWEEP_STEP_PCT);

    let mut points = Vec::new();
    let mut i = 0u32;
    loop {
        let rate = f64::from(i) * step;
        if rate >= 100.0 - 1e-9 {
            break;
        }
        points.push(sweep_point(workload, price, rate));
        i += 1;
    }
    points.push(sweep_point(workload, price, 100.0));
    points
}

fn sweep_point(workload: &Workload, price: &PriceSheetEntry, rate: f64) -> SweepPoint {
    let result = simulate(&workload.with_hit_rate(rate), price);
    SweepPoint {
        cache_hit_rate_pct: rate,
        no_cache_per_day: result.no_cache_per_day,
        with_cache_per_day: result.with_cache_per_day,
        savings_per_day: result.savings_per_day,
        savings_pct: result.savings_pct,
    }
}

/// Smallest hit rate, in percent, at which caching costs no more than not
/// caching. Treats the hit rate as continuous. `None` when nothing is cacheable
/// or cache reads are not cheaper than plain input.
pub fn break_even_hit_rate(workload: &Workload, price: &PriceSheetEntry) -> Option<f64> {
    let cached_tokens = round_half_up(
        workload.input_tokens_per_request as f64 * workload.cacheable_fraction_pct / 100.0,
    );
    if cached_tokens <= 0.0 {
        return None;
    }

    let input = price.input_price_per_k_tokens;
    let read = price.cache_read_price_per_k_tokens;
    let write = price.cache_write_price_per_k_tokens;
    if write <= input {
        return Some(0.0);
    }
    if read >= write {
        return None;
    }
    let fraction = (write - input) / (write - read);
    if fraction > 1.0 {
        return None;
    }
    Some(fraction * 100.0)
}
