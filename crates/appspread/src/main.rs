use appspread_core::{from_file, resources::pod_name, to_json_pretty};
use appspread_scheduler::normalize::normalize_scores;
use appspread_scheduler::score::{LeastAllocated, RandomScore, ScoreFunction};
use appspread_scheduler::{
    AppSpread, AppSpreadConfig, FilterResult, NodeAccounting, ScheduleResult, Scheduler,
    SchedulerConfig, SchedulingContext, ScoreResult,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "appspread", about = "Appspread node placement policy engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scheduling attempt for the pod in a cluster snapshot
    Evaluate {
        /// YAML or JSON file with `pod` and `nodes` (each `{node, pods}`)
        #[arg(long)]
        context: PathBuf,
        /// How requests of pods already bound to a node are summed
        #[arg(long, value_enum, default_value_t = Accounting::FirstContainer)]
        accounting: Accounting,
        /// Scoring function for feasible nodes
        #[arg(long, value_enum, default_value_t = Scoring::Random)]
        scorer: Scoring,
        /// Seed for reproducible random scores
        #[arg(long, env = "APPSPREAD_SEED")]
        seed: Option<u64>,
        /// Label naming a pod's logical application
        #[arg(long, default_value = appspread_core::APPLICATION_NAME_LABEL)]
        application_label: String,
        /// Maximum number of per-node calls in flight
        #[arg(long, default_value_t = 16)]
        parallelism: usize,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Min-max normalize NODE=SCORE pairs into 0-100
    Normalize {
        /// Raw scores, e.g. `node-a=10 node-b=90`
        #[arg(required = true)]
        scores: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Accounting {
    /// Count only the first container of each bound pod
    FirstContainer,
    /// Count every container of each bound pod
    AllContainers,
}

impl From<Accounting> for NodeAccounting {
    fn from(value: Accounting) -> Self {
        match value {
            Accounting::FirstContainer => NodeAccounting::FirstContainer,
            Accounting::AllContainers => NodeAccounting::AllContainers,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scoring {
    /// Uniform random score per node
    Random,
    /// Prefer nodes with more CPU headroom
    LeastAllocated,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Printed result of an `evaluate` run
#[derive(Serialize)]
struct Report<'a> {
    pod: &'a str,
    filter_results: &'a [FilterResult],
    scores: &'a [ScoreResult],
    best_node: Option<&'a str>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            context,
            accounting,
            scorer,
            seed,
            application_label,
            parallelism,
            output,
        } => {
            let config = AppSpreadConfig {
                application_label,
                node_accounting: accounting.into(),
            };
            let score_function: Box<dyn ScoreFunction> = match (scorer, seed) {
                (Scoring::Random, Some(seed)) => Box::new(RandomScore::seeded(seed)),
                (Scoring::Random, None) => Box::new(RandomScore::new()),
                (Scoring::LeastAllocated, _) => Box::new(LeastAllocated {
                    accounting: config.node_accounting,
                }),
            };
            let plugin = AppSpread::with_score_function(config, score_function);

            run_evaluate(&context, plugin, SchedulerConfig { parallelism }, output).await
        }
        Commands::Normalize { scores } => run_normalize(&scores),
    }
}

/// Load a snapshot and run one scheduling attempt over it
async fn run_evaluate(
    path: &std::path::Path,
    plugin: AppSpread,
    config: SchedulerConfig,
    output: OutputFormat,
) -> miette::Result<()> {
    let context: SchedulingContext = from_file(path)?;
    info!(
        "Loaded pod {} and {} nodes from {}",
        pod_name(&context.pod),
        context.nodes.len(),
        path.display()
    );

    let plugin = Arc::new(plugin);
    let scheduler = Scheduler::new(plugin.clone(), plugin, config);
    let (pod, nodes) = context.into_shared();

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning scheduling attempt");
            ctrl_c_token.cancel();
        }
    });

    let result = scheduler.schedule(pod.clone(), &nodes, &token).await?;
    print_report(pod_name(&pod), &result, output)
}

fn print_report(pod: &str, result: &ScheduleResult, output: OutputFormat) -> miette::Result<()> {
    let report = Report {
        pod,
        filter_results: &result.filter_results,
        scores: &result.scores,
        best_node: result.best_node().map(|s| s.node_name.as_str()),
    };

    match output {
        OutputFormat::Json => println!("{}", to_json_pretty(&report)?),
        OutputFormat::Text => {
            println!("pod: {}", report.pod);
            for filter in report.filter_results {
                match &filter.reason {
                    None => println!("  {:<24} feasible", filter.node_name),
                    Some(reason) => println!("  {:<24} rejected: {}", filter.node_name, reason),
                }
            }
            for score in report.scores {
                println!("  {:<24} score {}", score.node_name, score.score);
            }
            if let Some(best) = report.best_node {
                println!("best node: {}", best);
            }
        }
    }

    Ok(())
}

/// Normalize scores given on the command line
fn run_normalize(raw: &[String]) -> miette::Result<()> {
    let mut scores = raw
        .iter()
        .map(|pair| -> miette::Result<ScoreResult> {
            let (node, score) = pair
                .split_once('=')
                .ok_or_else(|| miette::miette!("Expected NODE=SCORE, got '{}'", pair))?;
            let score = score
                .trim()
                .parse::<i64>()
                .map_err(|e| miette::miette!("Invalid score in '{}': {}", pair, e))?;
            Ok(ScoreResult::new(node.trim(), score))
        })
        .collect::<miette::Result<Vec<_>>>()?;

    normalize_scores(&mut scores)?;

    for score in &scores {
        println!("{}={}", score.node_name, score.score);
    }

    Ok(())
}
