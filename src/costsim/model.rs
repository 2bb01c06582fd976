use crate::costsim::{
    CostSimulation, PriceSheetEntry, Workload, DAYS_PER_MONTH, TOKENS_PER_PRICE_UNIT,
};

/// Rounds halves toward positive infinity (`floor(x + 0.5)`).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Prompt-cache economics for one workload on one model.
///
/// No clamping and no errors: out-of-range percentages give out-of-range but
/// finite results. Only token and request counts are rounded.
pub fn simulate(workload: &Workload, price: &PriceSheetEntry) -> CostSimulation {
    let requests = workload.requests_per_day as f64;
    let input_tokens = workload.input_tokens_per_request as f64;
    let output_tokens = workload.output_tokens_per_request as f64;

    let cached_tokens = round_half_up(input_tokens * workload.cacheable_fraction_pct / 100.0);
    let uncached_tokens = input_tokens - cached_tokens;
    let hits_per_day = round_half_up(requests * workload.cache_hit_rate_pct / 100.0);
    let misses_per_day = requests - hits_per_day;

    let output_cost = per_k(output_tokens) * price.output_price_per_k_tokens;
    let uncached_input_cost = per_k(uncached_tokens) * price.input_price_per_k_tokens;

    let no_cache_per_day =
        requests * (per_k(input_tokens) * price.input_price_per_k_tokens + output_cost);
    let hit_cost_per_day = hits_per_day
        * (per_k(cached_tokens) * price.cache_read_price_per_k_tokens
            + uncached_input_cost
            + output_cost);
    let miss_cost_per_day = misses_per_day
        * (per_k(cached_tokens) * price.cache_write_price_per_k_tokens
            + uncached_input_cost
            + output_cost);
    let with_cache_per_day = hit_cost_per_day + miss_cost_per_day;

    let savings_per_day = no_cache_per_day - with_cache_per_day;
    let savings_pct = if no_cache_per_day > 0.0 {
        savings_per_day / no_cache_per_day * 100.0
    } else {
        0.0
    };

    CostSimulation {
        model_id: price.model_id.clone(),
        cached_tokens,
        uncached_tokens,
        hits_per_day,
        misses_per_day,
        hit_cost_per_day,
        miss_cost_per_day,
        no_cache_per_day,
        no_cache_per_month: no_cache_per_day * DAYS_PER_MONTH,
        with_cache_per_day,
        with_cache_per_month: with_cache_per_day * DAYS_PER_MONTH,
        savings_per_day,
        savings_per_month: savings_per_day * DAYS_PER_MONTH,
        savings_pct,
    }
}

fn per_k(tokens: f64) -> f64 {
    tokens / TOKENS_PER_PRICE_UNIT
}
