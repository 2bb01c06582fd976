use anyhow::Result;

use crate::costsim::{ModelSimulation, SweepPoint};
use crate::scoring::CandidateProfile;

/// Long format: one record per candidate and dimension.
pub fn comparison_to_csv(profiles: &[CandidateProfile]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["candidate", "label", "dimension", "dimension_label", "score"])?;
    for profile in profiles {
        for value in &profile.values {
            writer.write_record([
                profile.id.as_str(),
                profile.label.as_str(),
                value.key.as_str(),
                value.label.as_str(),
                value.value.to_string().as_str(),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn models_to_csv(results: &[ModelSimulation]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "model_id",
        "no_cache_per_day",
        "with_cache_per_day",
        "savings_per_day",
        "no_cache_per_month",
        "with_cache_per_month",
        "savings_per_month",
        "savings_pct",
    ])?;
    for result in results {
        let sim = &result.simulation;
        writer.write_record([
            result.model_id.clone(),
            format!("{:.4}", sim.no_cache_per_day),
            format!("{:.4}", sim.with_cache_per_day),
            format!("{:.4}", sim.savings_per_day),
            format!("{:.2}", sim.no_cache_per_month),
            format!("{:.2}", sim.with_cache_per_month),
            format!("{:.2}", sim.savings_per_month),
            format!("{:.2}", sim.savings_pct),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn sweep_to_csv(points: &[SweepPoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "cache_hit_rate_pct",
        "no_cache_per_day",
        "with_cache_per_day",
        "savings_per_day",
        "savings_pct",
    ])?;
    for point in points {
        writer.write_record([
            format!("{:.1}", point.cache_hit_rate_pct),
            format!("{:.4}", point.no_cache_per_day),
            format!("{:.4}", point.with_cache_per_day),
            format!("{:.4}", point.savings_per_day),
            format!("{:.2}", point.savings_pct),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::{comparison_to_csv, models_to_csv, sweep_to_csv};
    use crate::costsim::{simulate_models, sweep_hit_rate, PriceSheet, Workload};
    use crate::scoring::compare;
    use crate::scoring::fixtures::vector_store_catalog;

    #[test]
    fn comparison_csv_has_a_row_per_score() {
        let catalog = vector_store_catalog();
        let profiles = compare(&["opensearch", "kendra"], &catalog, 4).expect("comparable");
        let csv = comparison_to_csv(&profiles).expect("csv renders");
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 3);
        assert_eq!(lines[1], "opensearch,OpenSearch Serverless,scale,Scale,5");
    }

    #[test]
    fn model_csv_keeps_unrounded_daily_precision() {
        let results = simulate_models(&Workload::default(), &PriceSheet::builtin());
        let csv = models_to_csv(&results).expect("csv renders");
        let sonnet = csv
            .lines()
            .find(|l| l.starts_with("claude-3-5-sonnet,"))
            .expect("sonnet row");
        assert_eq!(
            sonnet,
            "claude-3-5-sonnet,13.5000,11.5020,1.9980,405.00,345.06,59.94,14.80"
        );
    }

    #[test]
    fn sweep_csv_has_a_row_per_point() {
        let sheet = PriceSheet::builtin();
        let price = sheet.default_entry().expect("entries");
        let points = sweep_hit_rate(&Workload::default(), price, 25.0);
        let csv = sweep_to_csv(&points).expect("csv renders");
        assert_eq!(csv.lines().count(), 1 + 5);
        assert!(csv.lines().nth(5).is_some_and(|l| l.starts_with("100.0,")));
    }
}
