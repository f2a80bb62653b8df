use anyhow::{bail, Context};
use clap::Parser;
use pickwise_core::{parse_records, ProductRecord, Source};
use pickwise_scoring::{
    BuyabilityScorer, PriceRange, RecommendRequest, RecommendResponse, RefinementMode,
    ScoringConfig, ScoringInputs,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Rank candidate designs by buyability
#[derive(Parser, Debug)]
#[command(name = "pickwise")]
#[command(about = "Buyability scoring for candidate product designs", long_about = None)]
struct Args {
    /// JSON array of candidate records
    #[arg(long, required_unless_present = "records")]
    candidates: Option<PathBuf>,

    /// JSON array of the brand's past products
    #[arg(long)]
    brand_history: Option<PathBuf>,

    /// JSON array of competitor products
    #[arg(long)]
    competitors: Option<PathBuf>,

    /// JSON array of records of every source, split by their `source` field
    #[arg(long, conflicts_with_all = ["candidates", "brand_history", "competitors"])]
    records: Option<PathBuf>,

    /// Scoring configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Weight override, e.g. `--weight variety=0.3` (repeatable)
    #[arg(short, long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f32)>,

    /// Number of recommendations
    #[arg(short = 'n', long, default_value_t = pickwise_scoring::DEFAULT_TOP_N)]
    top_n: usize,

    /// Refinement prompt, e.g. "more florals, fewer browns"
    #[arg(short, long)]
    prompt: Option<String>,

    /// Lowest price to recommend
    #[arg(long)]
    min_price: Option<f64>,

    /// Highest price to recommend
    #[arg(long)]
    max_price: Option<f64>,

    /// Filter to prompt matches instead of nudging scores
    #[arg(long)]
    filter: bool,

    /// Include each record's payload in the output
    #[arg(long)]
    include_payload: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_weight(s: &str) -> Result<(String, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid weight '{}': {}", value, e))?;
    Ok((key.trim().to_string(), value))
}

fn read_records(path: &Path, source: Option<Source>) -> anyhow::Result<Vec<ProductRecord>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse records in {}", path.display()))?;
    let (mut records, rejected) = parse_records(value)
        .with_context(|| format!("failed to parse records in {}", path.display()))?;
    for rejection in &rejected {
        warn!("{:?}: {}", path, rejection);
    }
    if let Some(source) = source {
        for record in &mut records {
            record.source = source;
        }
    }
    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

fn read_set(path: Option<&PathBuf>, source: Source) -> anyhow::Result<Vec<ProductRecord>> {
    match path {
        Some(path) => read_records(path, Some(source)),
        None => Ok(Vec::new()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON response
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            ScoringConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ScoringConfig::default(),
    };

    let (weights, issues) = config
        .weights
        .with_pairs(args.weights.iter().map(|(key, value)| (key.as_str(), *value)));
    for issue in &issues {
        warn!("Ignoring weight override: {}", issue);
    }
    config.weights = weights;
    if args.filter {
        config.options.refinement.mode = RefinementMode::Filter;
    }
    if let (Some(min), Some(max)) = (args.min_price, args.max_price) {
        if min > max {
            bail!("--min-price {} is above --max-price {}", min, max);
        }
    }

    let inputs = match &args.records {
        Some(path) => ScoringInputs::from_records(read_records(path, None)?),
        None => ScoringInputs::new(
            read_set(args.candidates.as_ref(), Source::Candidate)?,
            read_set(args.brand_history.as_ref(), Source::BrandHistory)?,
            read_set(args.competitors.as_ref(), Source::Competitor)?,
        ),
    };

    info!(
        "Scoring {} candidates against {} brand and {} competitor records",
        inputs.candidates.len(),
        inputs.brand_history.len(),
        inputs.competitors.len()
    );

    let scorer = BuyabilityScorer::from_config(&config);
    let scored = scorer.score(&inputs, &config.weights);

    let mut request = RecommendRequest::new(args.top_n)
        .with_price(PriceRange::new(args.min_price, args.max_price));
    request.prompt = args.prompt.clone();
    let list = scorer.recommender().recommend_with(scored.records(), &request);

    let response = RecommendResponse::new(
        &list,
        scored.weights(),
        scored.len(),
        scored.issues(),
        args.include_payload,
    );
    println!("{}", serde_json::to_string_pretty(&response)?);

    info!("Recommended {} of {} candidates", list.len(), scored.len());
    Ok(())
}
