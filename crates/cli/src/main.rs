//! Cache replacement simulator CLI.
//!
//! This binary provides the entry points for benchmarking eviction policies. It performs:
//! 1. **Run:** Load one or more traces, evaluate the selected policies, print per-episode and
//!    summary lines, and write the result summary as JSON.
//! 2. **Stats:** Load traces and print their access counts without simulating.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cachesim_core::config::{Config, EpisodePlan, PolicyKind, TraceConfig};
use cachesim_core::policy::{LearnedPolicy, LinearScorer, PolicyParams};
use cachesim_core::sim::controller::{Evaluation, TraceEvaluation, TraceJob};
use cachesim_core::sim::loader::TraceLoader;
use cachesim_core::sim::report::{self, ResultRecord};
use cachesim_core::{CacheEnv, Result, SimError};

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Trace-driven cache replacement simulator",
    long_about = "Replay block-level access traces against a fixed-size cache and compare eviction policies by miss rate.\n\nExamples:\n  cachesim run -t traces/boot.csv --cache-size 50\n  cachesim run -t a.csv -t b.csv --policy lru --policy mru --workers 2\n  cachesim run -t a.csv --policy learned --weights model.json --params best_params.json\n  cachesim stats -t traces/boot.csv"
)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `cachesim_core=debug`).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate eviction policies over one or more traces.
    Run(RunArgs),

    /// Print access counts for one or more traces.
    Stats {
        /// Trace CSV files.
        #[arg(short, long = "trace", required = true)]
        traces: Vec<PathBuf>,

        /// JSON configuration file; only its `trace` section is used.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep boot-phase rows.
        #[arg(long)]
        include_boot: bool,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Trace CSV files; each is evaluated separately unless `--concat` is given.
    #[arg(short, long = "trace", required = true)]
    traces: Vec<PathBuf>,

    /// Concatenate all traces, in order, into a single workload.
    #[arg(long)]
    concat: bool,

    /// JSON configuration file; command-line flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cache slots.
    #[arg(long)]
    cache_size: Option<usize>,

    /// Policies to evaluate (random, lru, lfu, mru, learned); repeatable.
    #[arg(short, long = "policy")]
    policies: Vec<PolicyKind>,

    /// Run this many episodes for every policy instead of the per-class plan.
    #[arg(long)]
    episodes: Option<usize>,

    /// Enable the skip action.
    #[arg(long)]
    allow_skip: bool,

    /// Keep boot-phase rows.
    #[arg(long)]
    include_boot: bool,

    /// Learned policy parameter file.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Linear scorer weights for the learned policy.
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Maximum number of traces evaluated concurrently.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Result summary output path.
    #[arg(short, long, default_value = "results.json")]
    output: PathBuf,

    /// Print cache statistics for each policy's final episode; optionally
    /// restrict to sections (summary, misses, operations).
    #[arg(long = "stats", value_name = "SECTION", num_args = 0..)]
    stats: Option<Vec<String>>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let outcome = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Stats {
            traces,
            config,
            include_boot,
        } => stats_trace_config(config.as_deref(), include_boot)
            .and_then(|trace_config| cmd_stats(&traces, trace_config)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the global subscriber; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    path.map_or_else(|| Ok(Config::default()), Config::from_json_file)
}

/// Trace settings for `stats`, read the same way `run` reads them.
fn stats_trace_config(path: Option<&Path>, include_boot: bool) -> Result<TraceConfig> {
    let mut trace = load_config(path)?.trace;
    if include_boot {
        trace.include_boot = true;
    }
    Ok(trace)
}

/// Builds the effective configuration from an optional file plus flag overrides.
fn build_config(args: &RunArgs) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(size) = args.cache_size {
        config.cache.cache_size = size;
    }
    if args.allow_skip {
        config.cache.allow_skip = true;
    }
    if args.include_boot {
        config.trace.include_boot = true;
    }
    if !args.policies.is_empty() {
        config.evaluation.policies.clone_from(&args.policies);
    }
    if let Some(n) = args.episodes {
        config.evaluation.episodes = EpisodePlan::uniform(n);
    }
    if let Some(n) = args.workers {
        config.evaluation.workers = n;
    }

    config.validate()?;
    Ok(config)
}

/// Loads the requested traces as evaluation jobs.
fn load_jobs(args: &RunArgs, config: &Config) -> Result<Vec<TraceJob>> {
    let loader = TraceLoader::new(config.trace.clone());
    if args.concat {
        let loaded = loader.load_paths(&args.traces)?;
        return Ok(vec![TraceJob {
            name: "concat".to_string(),
            trace: loaded.trace,
        }]);
    }
    args.traces
        .iter()
        .map(|path| {
            let loaded = loader.load_path(path)?;
            Ok(TraceJob {
                name: display_name(path),
                trace: loaded.trace,
            })
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Attaches the learned-policy factory when a learned policy is requested.
fn attach_learned(evaluation: Evaluation, args: &RunArgs) -> Result<Evaluation> {
    if !evaluation.config().evaluation.policies.contains(&PolicyKind::Learned) {
        return Ok(evaluation);
    }
    let weights = args.weights.as_ref().ok_or_else(|| {
        SimError::Config("the learned policy needs --weights <file>".into())
    })?;
    let scorer = LinearScorer::from_json_file(weights)?;
    let params = match &args.params {
        Some(path) => PolicyParams::from_json_file(path)?,
        None => PolicyParams::default(),
    };
    info!(
        weights = %weights.display(),
        epsilon = params.exploration_rate(),
        mentor = ?params.explore_mentor,
        "learned policy configured"
    );

    Ok(evaluation.with_learned(move |env: &CacheEnv, seed| {
        if scorer.n_features != env.n_features() {
            return Err(SimError::Config(format!(
                "scorer expects {} features but the environment produces {}",
                scorer.n_features,
                env.n_features()
            )));
        }
        LearnedPolicy::with_params(Box::new(scorer.clone()), &params, env.n_actions(), seed)
    }))
}

/// Prints per-episode and summary lines for one trace.
fn print_evaluation(eval: &TraceEvaluation, sections: Option<&[String]>) {
    println!("==================== Testcase {} ====================", eval.trace);
    for summary in &eval.summaries {
        println!("-------------------- {} --------------------", summary.policy);
        for ep in &summary.episodes {
            println!(
                "Agent={}, Case={}, Episode={}: Accesses={}, Misses={}, MissRate={:.6}",
                summary.policy, eval.trace, ep.episode, ep.accesses, ep.misses, ep.miss_rate
            );
        }
        println!(
            "Agent={}, Case={}: Mean={:.6}, Median={:.6}, Max={:.6}, Min={:.6}",
            summary.policy, eval.trace, summary.mean, summary.median, summary.max, summary.min
        );
        if let (Some(sections), Some(last)) = (sections, summary.episodes.last()) {
            last.stats.print_sections(sections);
        }
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        cache_size = config.cache.cache_size,
        allow_skip = config.cache.allow_skip,
        policies = ?config.evaluation.policies,
        workers = config.evaluation.workers,
        "starting evaluation"
    );

    let jobs = load_jobs(&args, &config)?;
    let evaluation = attach_learned(Evaluation::new(config), &args)?;
    let results = evaluation.run(&jobs)?;

    for eval in &results {
        print_evaluation(eval, args.stats.as_deref());
    }

    let records: Vec<ResultRecord> = report::collect_records(&results);
    report::write_results(&args.output, &records)?;

    println!();
    println!("{}", "=".repeat(80));
    println!("RESULTS SAVED TO: {}", args.output.display());
    println!("{}", "=".repeat(80));
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn cmd_stats(traces: &[PathBuf], trace_config: TraceConfig) -> Result<()> {
    let loader = TraceLoader::new(trace_config);

    println!(
        "{:<32} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "trace", "rows", "kept", "unique", "reads", "writes"
    );
    println!("{}", "-".repeat(87));
    for path in traces {
        let loaded = loader.load_path(path)?;
        let summary = loaded.trace.summary();
        let rows: usize = loaded.sources.iter().map(|s| s.rows).sum();
        println!(
            "{:<32} {:>10} {:>10} {:>10} {:>10} {:>10}",
            display_name(path),
            rows,
            summary.accesses,
            summary.unique_blocks,
            summary.reads,
            summary.writes
        );
    }
    Ok(())
}
