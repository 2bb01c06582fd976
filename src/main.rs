use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use genai_advisor::config::{Config, ConfigOverrides};
use genai_advisor::content::{
    bundle_files, check_file, BundleReport, Recommendation, TopicRegistry,
};
use genai_advisor::costsim::{
    break_even_hit_rate, simulate, simulate_models, sweep_hit_rate, ModelSimulation,
    PriceSheet, PriceSheetEntry, SweepPoint, Workload,
};
use genai_advisor::decision::{trace, DecisionSession, DecisionTrace, Evaluation, QuestionNode};
use genai_advisor::output::csv::{comparison_to_csv, models_to_csv, sweep_to_csv};
use genai_advisor::output::json::{render_json, render_topic_json};
use genai_advisor::output::table::{
    render_comparison_table, render_models_table, render_question_table,
    render_recommendation_table, render_simulation_table, render_sweep_table,
    render_topics_table, render_trace_table, render_validation_table,
};
use genai_advisor::scoring::{
    dimension_leaders, CandidateProfile, ComparisonSelection, DimensionLeader, ScoringError,
    SelectionChange,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "genai-advisor",
    about = "Decision trees, side-by-side comparisons and prompt-cache cost estimates for GenAI architecture choices"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long = "content-dir")]
    content_dirs: Vec<String>,
    #[arg(long = "max-selected")]
    max_selected: Option<usize>,
    #[command(flatten)]
    workload: WorkloadArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct WorkloadArgs {
    #[arg(long = "requests-per-day", global = true)]
    requests_per_day: Option<u64>,
    #[arg(long = "input-tokens", global = true)]
    input_tokens: Option<u64>,
    #[arg(long = "output-tokens", global = true)]
    output_tokens: Option<u64>,
    #[arg(long = "cacheable-pct", global = true)]
    cacheable_pct: Option<f64>,
    #[arg(long = "hit-rate-pct", global = true)]
    hit_rate_pct: Option<f64>,
}

impl WorkloadArgs {
    fn apply(&self, workload: &mut Workload) {
        if let Some(v) = self.requests_per_day {
            workload.requests_per_day = v;
        }
        if let Some(v) = self.input_tokens {
            workload.input_tokens_per_request = v;
        }
        if let Some(v) = self.output_tokens {
            workload.output_tokens_per_request = v;
        }
        if let Some(v) = self.cacheable_pct {
            workload.cacheable_fraction_pct = v;
        }
        if let Some(v) = self.hit_rate_pct {
            workload.cache_hit_rate_pct = v;
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Topics,
    Validate {
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    Ask {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        answers: String,
    },
    Compare {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        ids: Option<String>,
    },
    Simulate {
        #[arg(long)]
        model: Option<String>,
    },
    Models,
    Sweep {
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        step: Option<f64>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Serialize)]
struct TopicSummary<'a> {
    topic: &'a str,
    title: &'a str,
    description: &'a str,
    fingerprint: &'a str,
    questions: usize,
    recommendations: usize,
    candidates: usize,
}

#[derive(Debug, Serialize)]
struct AskReport<'a> {
    answers: &'a [usize],
    trace: &'a DecisionTrace,
    next_question: Option<&'a QuestionNode>,
    recommendation: Option<&'a Recommendation>,
}

#[derive(Debug, Serialize)]
struct ComparisonReport<'a> {
    profiles: &'a [CandidateProfile],
    leaders: &'a [DimensionLeader],
}

#[derive(Debug, Serialize)]
struct SweepReport<'a> {
    model_id: &'a str,
    workload: &'a Workload,
    break_even_hit_rate_pct: Option<f64>,
    points: &'a [SweepPoint],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        bundle_dirs: (!cli.content_dirs.is_empty()).then(|| cli.content_dirs.clone()),
        max_selected: cli.max_selected,
        default_model: None,
    });
    cli.workload.apply(&mut config.workload);
    warn_on_out_of_range(&config.workload);

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)?;
        }
        Commands::Validate { files } => {
            let reports = validate_content(&config, files)?;
            print_validation(&reports, cli.output)?;
            let failed = reports.iter().filter(|r| !r.ok).count();
            if failed > 0 {
                bail!("{failed} content bundle(s) failed validation");
            }
        }
        Commands::Topics => {
            let registry = build_registry(&config)?;
            print_topics(&registry, cli.output)?;
        }
        Commands::Ask { topic, answers } => {
            let registry = build_registry(&config)?;
            run_ask(&registry, topic, answers, cli.output)?;
        }
        Commands::Compare { topic, ids } => {
            let registry = build_registry(&config)?;
            run_compare(
                &registry,
                topic,
                ids.as_deref(),
                config.comparison.max_selected,
                cli.output,
            )?;
        }
        Commands::Simulate { model } => {
            let sheet = config.price_sheet();
            let entry = resolve_model(&sheet, model.as_deref(), &config)?;
            let result = ModelSimulation {
                model_id: entry.model_id.clone(),
                display_name: entry.label().to_string(),
                simulation: simulate(&config.workload, entry),
            };
            match cli.output {
                OutputFormat::Table => println!(
                    "{}",
                    render_simulation_table(entry.label(), &config.workload, &result.simulation)
                ),
                OutputFormat::Json => println!("{}", render_json(&result)?),
                OutputFormat::Csv => print!("{}", models_to_csv(std::slice::from_ref(&result))?),
            }
        }
        Commands::Models => {
            let results = simulate_models(&config.workload, &config.price_sheet());
            match cli.output {
                OutputFormat::Table => println!("{}", render_models_table(&results)),
                OutputFormat::Json => println!("{}", render_json(&results)?),
                OutputFormat::Csv => print!("{}", models_to_csv(&results)?),
            }
        }
        Commands::Sweep { model, step } => {
            let sheet = config.price_sheet();
            let entry = resolve_model(&sheet, model.as_deref(), &config)?;
            let step = step.unwrap_or(config.simulator.sweep_step_pct);
            let points = sweep_hit_rate(&config.workload, entry, step);
            let break_even = break_even_hit_rate(&config.workload, entry);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", entry.label());
                    println!("{}", render_sweep_table(&points, break_even));
                }
                OutputFormat::Json => println!(
                    "{}",
                    render_json(&SweepReport {
                        model_id: &entry.model_id,
                        workload: &config.workload,
                        break_even_hit_rate_pct: break_even,
                        points: &points,
                    })?
                ),
                OutputFormat::Csv => print!("{}", sweep_to_csv(&points)?),
            }
        }
    }

    Ok(())
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &Path,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn warn_on_out_of_range(workload: &Workload) {
    for (name, value) in [
        ("cacheable fraction", workload.cacheable_fraction_pct),
        ("cache hit rate", workload.cache_hit_rate_pct),
    ] {
        if !(0.0..=100.0).contains(&value) {
            warn!("{name} {value}% is outside 0-100; results will not be meaningful");
        }
    }
}

fn build_registry(config: &Config) -> Result<TopicRegistry> {
    let mut registry = if config.content.include_builtin {
        TopicRegistry::with_builtins()?
    } else {
        TopicRegistry::new()
    };
    for dir in config.resolved_bundle_dirs() {
        let loaded = registry.load_dir(&dir)?;
        info!("loaded {loaded} content bundle(s) from {}", dir.display());
    }
    if registry.bundles().is_empty() {
        warn!("no topics loaded; check [content] in the config");
    }
    Ok(registry)
}

fn validate_content(config: &Config, files: &[PathBuf]) -> Result<Vec<BundleReport>> {
    let mut reports = Vec::new();
    if files.is_empty() {
        if config.content.include_builtin {
            for bundle in TopicRegistry::with_builtins()?.bundles() {
                reports.push(BundleReport {
                    source: format!("builtin:{}", bundle.topic),
                    topic: Some(bundle.topic.clone()),
                    ok: true,
                    fingerprint: Some(bundle.fingerprint.clone()),
                    problems: Vec::new(),
                });
            }
        }
        for dir in config.resolved_bundle_dirs() {
            if !dir.exists() {
                warn!("content directory does not exist: {}", dir.display());
                continue;
            }
            for path in bundle_files(&dir)? {
                reports.push(check_file(&path));
            }
        }
    } else {
        for path in files {
            reports.push(check_file(path));
        }
    }
    Ok(reports)
}

fn print_validation(reports: &[BundleReport], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => println!("{}", render_validation_table(reports)),
        OutputFormat::Json => println!("{}", render_json(reports)?),
        OutputFormat::Csv => {
            warn!("CSV output for validate not implemented, using JSON");
            println!("{}", render_json(reports)?);
        }
    }
    Ok(())
}

fn print_topics(registry: &TopicRegistry, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => println!("{}", render_topics_table(registry.bundles())),
        OutputFormat::Json | OutputFormat::Csv => {
            if matches!(output, OutputFormat::Csv) {
                warn!("CSV output for topics not implemented, using JSON");
            }
            let summaries: Vec<_> = registry
                .bundles()
                .iter()
                .map(|b| TopicSummary {
                    topic: &b.topic,
                    title: &b.title,
                    description: &b.description,
                    fingerprint: &b.fingerprint,
                    questions: b.tree.as_ref().map(|t| t.questions().len()).unwrap_or(0),
                    recommendations: b.recommendations.len(),
                    candidates: b.scoring.as_ref().map(|s| s.candidates().len()).unwrap_or(0),
                })
                .collect();
            println!("{}", render_json(&summaries)?);
        }
    }
    Ok(())
}

fn run_ask(
    registry: &TopicRegistry,
    topic: &str,
    raw_answers: &str,
    output: OutputFormat,
) -> Result<()> {
    let bundle = registry.require(topic)?;
    let tree = bundle
        .tree
        .as_ref()
        .ok_or_else(|| anyhow!("topic {} has no decision tree", bundle.topic))?;

    let mut session = DecisionSession::new();
    for (step, index) in parse_answers(raw_answers)?.into_iter().enumerate() {
        session
            .answer(tree, index)
            .with_context(|| format!("answer #{} rejected", step + 1))?;
    }
    let walked = trace(tree, session.answers())?;
    debug!(
        "{} answers walked on topic {}",
        session.answers().len(),
        bundle.topic
    );

    let (next_question, recommendation) = match &walked.outcome {
        Evaluation::InProgress { node } => (tree.question(node), None),
        Evaluation::Done { terminal } => (None, bundle.recommendations.resolve(terminal)),
    };

    match output {
        OutputFormat::Table => {
            if !walked.steps.is_empty() {
                println!("{}", render_trace_table(&walked));
            }
            if let Some(question) = next_question {
                println!("{}", render_question_table(question));
                let prefix = if raw_answers.trim().is_empty() {
                    String::new()
                } else {
                    format!("{},", raw_answers.trim())
                };
                println!("Answer with --answers {prefix}<#>");
            }
            if let Some(recommendation) = recommendation {
                println!("{}", render_recommendation_table(recommendation));
            }
        }
        OutputFormat::Json | OutputFormat::Csv => {
            if matches!(output, OutputFormat::Csv) {
                warn!("CSV output for ask not implemented, using JSON");
            }
            let report = AskReport {
                answers: session.answers(),
                trace: &walked,
                next_question,
                recommendation,
            };
            println!(
                "{}",
                render_topic_json(&bundle.topic, &bundle.fingerprint, &report)?
            );
        }
    }
    Ok(())
}

fn run_compare(
    registry: &TopicRegistry,
    topic: &str,
    raw_ids: Option<&str>,
    max_selected: usize,
    output: OutputFormat,
) -> Result<()> {
    let bundle = registry.require(topic)?;
    let catalog = bundle
        .scoring
        .as_ref()
        .ok_or_else(|| anyhow!("topic {} has no scoring catalog", bundle.topic))?;

    let ids = match raw_ids {
        Some(raw) => parse_id_list(raw),
        None => catalog.candidates().iter().map(|c| c.id.clone()).collect(),
    };
    let mut selection = ComparisonSelection::new(max_selected);
    for id in ids {
        if catalog.candidate(&id).is_none() {
            return Err(ScoringError::UnknownCandidate(id).into());
        }
        if let SelectionChange::Selected { evicted: Some(old) } = selection.select(id) {
            warn!(
                "comparison holds at most {} candidates; dropped {old}",
                selection.capacity()
            );
        }
    }
    let profiles = selection.compare(catalog)?;
    let leaders = dimension_leaders(&profiles);

    match output {
        OutputFormat::Table => println!("{}", render_comparison_table(&profiles, &leaders)),
        OutputFormat::Json => println!(
            "{}",
            render_topic_json(
                &bundle.topic,
                &bundle.fingerprint,
                &ComparisonReport {
                    profiles: &profiles,
                    leaders: &leaders,
                },
            )?
        ),
        OutputFormat::Csv => print!("{}", comparison_to_csv(&profiles)?),
    }
    Ok(())
}

fn resolve_model<'a>(
    sheet: &'a PriceSheet,
    requested: Option<&str>,
    config: &Config,
) -> Result<&'a PriceSheetEntry> {
    let wanted = requested.unwrap_or(config.simulator.default_model.as_str());
    if let Some(entry) = sheet.find(wanted) {
        return Ok(entry);
    }
    if requested.is_none() {
        if let Some(entry) = sheet.default_entry() {
            warn!("default model {wanted} not in price sheet, using {}", entry.model_id);
            return Ok(entry);
        }
    }
    let known = sheet
        .entries()
        .iter()
        .map(|e| e.model_id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(anyhow!("unknown model {wanted}; known models: {known}"))
}

fn parse_answers(raw: &str) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for piece in raw.split(',') {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        let index = trimmed
            .parse::<usize>()
            .with_context(|| format!("answer {trimmed:?} is not a non-negative option index"))?;
        out.push(index);
    }
    Ok(out)
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
