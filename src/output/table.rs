use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::content::{BundleReport, ContentBundle, Recommendation};
use crate::costsim::{CostSimulation, ModelSimulation, SweepPoint, Workload};
use crate::decision::{DecisionTrace, QuestionNode};
use crate::output::{format_pct, format_usd, score_bar};
use crate::scoring::{CandidateProfile, DimensionLeader};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn money_cell(value: f64) -> Cell {
    let cell = Cell::new(format_usd(value));
    if value < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

pub fn render_topics_table(bundles: &[ContentBundle]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Topic",
        "Title",
        "Questions",
        "Recommendations",
        "Candidates",
        "Fingerprint",
    ]);
    for bundle in bundles {
        table.add_row(vec![
            bundle.topic.clone(),
            bundle.title.clone(),
            bundle
                .tree
                .as_ref()
                .map(|t| t.questions().len().to_string())
                .unwrap_or_else(|| "-".to_string()),
            bundle.recommendations.len().to_string(),
            bundle
                .scoring
                .as_ref()
                .map(|s| s.candidates().len().to_string())
                .unwrap_or_else(|| "-".to_string()),
            bundle.short_fingerprint().to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_trace_table(trace: &DecisionTrace) -> String {
    let mut table = new_table();
    table.set_header(vec!["Step", "Question", "Answer"]);
    for (idx, step) in trace.steps.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            step.prompt.clone(),
            format!("[{}] {}", step.answer_index, step.answer_label),
        ]);
    }
    table.to_string()
}

pub fn render_question_table(question: &QuestionNode) -> String {
    let mut table = new_table();
    table.set_header(vec!["#".to_string(), question.prompt.clone()]);
    for (idx, option) in question.options.iter().enumerate() {
        table.add_row(vec![idx.to_string(), option.label.clone()]);
    }
    table.to_string()
}

pub fn render_recommendation_table(recommendation: &Recommendation) -> String {
    let mut table = new_table();
    table.set_header(vec![Cell::new(&recommendation.title).fg(Color::Green)]);
    table.add_row(vec![recommendation.summary.clone()]);
    for detail in &recommendation.details {
        table.add_row(vec![format!("- {detail}")]);
    }
    table.to_string()
}

/// One row per dimension, one column per candidate, plus the leaders.
pub fn render_comparison_table(
    profiles: &[CandidateProfile],
    leaders: &[DimensionLeader],
) -> String {
    let mut table = new_table();
    let mut header = vec!["Dimension".to_string()];
    header.extend(profiles.iter().map(|p| p.label.clone()));
    header.push("Leader".to_string());
    table.set_header(header);

    for leader in leaders {
        let mut cells = vec![Cell::new(&leader.label)];
        for profile in profiles {
            let value = profile
                .values
                .iter()
                .find(|v| v.key == leader.key)
                .map(|v| v.value)
                .unwrap_or(0);
            let cell = Cell::new(format!("{} {value}", score_bar(value)));
            cells.push(if value == leader.best {
                cell.fg(Color::Green)
            } else {
                cell
            });
        }
        let names = profiles
            .iter()
            .filter(|p| leader.candidates.contains(&p.id))
            .map(|p| p.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        cells.push(Cell::new(names));
        table.add_row(Row::from(cells));
    }
    table.to_string()
}

pub fn render_simulation_table(label: &str, workload: &Workload, sim: &CostSimulation) -> String {
    let mut table = new_table();
    table.set_header(vec![label, "Per Day", "Per Month"]);
    table.add_row(Row::from(vec![
        Cell::new("Without caching"),
        money_cell(sim.no_cache_per_day),
        money_cell(sim.no_cache_per_month),
    ]));
    table.add_row(Row::from(vec![
        Cell::new("With caching"),
        money_cell(sim.with_cache_per_day),
        money_cell(sim.with_cache_per_month),
    ]));
    table.add_row(Row::from(vec![
        Cell::new(format!("Savings ({})", format_pct(sim.savings_pct))),
        money_cell(sim.savings_per_day),
        money_cell(sim.savings_per_month),
    ]));
    table.add_row(vec![
        "Cache hits / misses".to_string(),
        format!("{:.0} / {:.0}", sim.hits_per_day, sim.misses_per_day),
        format!(
            "{} requests at {} hit rate",
            workload.requests_per_day,
            format_pct(workload.cache_hit_rate_pct)
        ),
    ]);
    table.add_row(vec![
        "Cached / uncached tokens".to_string(),
        format!("{:.0} / {:.0}", sim.cached_tokens, sim.uncached_tokens),
        format!(
            "{} input tokens per request",
            workload.input_tokens_per_request
        ),
    ]);
    table.to_string()
}

pub fn render_models_table(results: &[ModelSimulation]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Model",
        "No Cache / Month",
        "With Cache / Month",
        "Savings / Month",
        "Savings",
    ]);
    for result in results {
        let sim = &result.simulation;
        table.add_row(Row::from(vec![
            Cell::new(&result.display_name),
            money_cell(sim.no_cache_per_month),
            money_cell(sim.with_cache_per_month),
            money_cell(sim.savings_per_month),
            Cell::new(format_pct(sim.savings_pct)),
        ]));
    }
    table.to_string()
}

pub fn render_sweep_table(points: &[SweepPoint], break_even_pct: Option<f64>) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Hit Rate",
        "No Cache / Day",
        "With Cache / Day",
        "Savings / Day",
        "Savings",
    ]);
    for point in points {
        table.add_row(Row::from(vec![
            Cell::new(format_pct(point.cache_hit_rate_pct)),
            money_cell(point.no_cache_per_day),
            money_cell(point.with_cache_per_day),
            money_cell(point.savings_per_day),
            Cell::new(format_pct(point.savings_pct)),
        ]));
    }
    let footer = match break_even_pct {
        Some(rate) => format!("Break-even hit rate: {}", format_pct(rate)),
        None => "Caching never breaks even for this workload".to_string(),
    };
    format!("{table}\n{footer}")
}

pub fn render_validation_table(reports: &[BundleReport]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Source", "Topic", "Status", "Problems"]);
    for report in reports {
        let status = if report.ok {
            Cell::new("OK").fg(Color::Green)
        } else {
            Cell::new("INVALID").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&report.source),
            Cell::new(report.topic.as_deref().unwrap_or("-")),
            status,
            Cell::new(report.problems.join("\n")),
        ]));
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::{render_comparison_table, render_sweep_table, render_trace_table};
    use crate::costsim::{sweep_hit_rate, PriceSheet, Workload};
    use crate::decision::fixtures::two_question_tree;
    use crate::decision::trace;
    use crate::scoring::fixtures::vector_store_catalog;
    use crate::scoring::{compare, dimension_leaders};

    #[test]
    fn comparison_table_lists_every_dimension_and_candidate() {
        let catalog = vector_store_catalog();
        let profiles = compare(&["aurora", "memorydb"], &catalog, 4).expect("comparable");
        let leaders = dimension_leaders(&profiles);
        let rendered = render_comparison_table(&profiles, &leaders);
        assert!(rendered.contains("Aurora pgvector"));
        assert!(rendered.contains("MemoryDB"));
        assert!(rendered.contains("Query latency"));
        assert!(rendered.contains("●●●●● 5"));
    }

    #[test]
    fn trace_table_shows_each_answer() {
        let tree = two_question_tree();
        let walked = trace(&tree, &[1, 0]).expect("valid path");
        let rendered = render_trace_table(&walked);
        assert!(rendered.contains("[1] No"));
        assert!(rendered.contains("[0] Yes"));
    }

    #[test]
    fn sweep_table_reports_break_even() {
        let sheet = PriceSheet::builtin();
        let price = sheet.default_entry().expect("builtin sheet has entries");
        let points = sweep_hit_rate(&Workload::default(), price, 50.0);
        let rendered = render_sweep_table(&points, Some(21.74));
        assert!(rendered.contains("Break-even hit rate: 21.7%"));
        assert!(rendered.contains("100.0%"));
        assert!(render_sweep_table(&points, None).contains("never breaks even"));
    }
}
