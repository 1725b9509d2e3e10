//! foamcut command-line runner

mod job;

use anyhow::Context;
use clap::{Parser, Subcommand};
use foamcut::{
    Mode, OptimizationResult, Optimizer, OptimizerConfig, ProgressCallback, ResultSummary,
    StrategyKind, Warning,
};
use job::Job;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "foamcut")]
#[command(about = "3D foam cutting-stock optimizer")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Overrides {
    /// Optimization mode (basic, genetic, annealing, guillotine, multi, hybrid, adaptive)
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Strategies of a multi run, comma separated
    #[arg(short, long, value_delimiter = ',')]
    algorithms: Option<Vec<StrategyKind>>,

    /// Base random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Run strategies of a multi/hybrid run on worker threads
    #[arg(long)]
    parallel: bool,

    /// Wall-clock budget in milliseconds
    #[arg(short, long = "time-limit", value_name = "MS")]
    time_limit_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, mut config: OptimizerConfig) -> OptimizerConfig {
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(algorithms) = &self.algorithms {
            config = config.with_algorithms(algorithms.clone());
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.parallel {
            config = config.with_parallel(true);
        }
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit_ms(ms);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a JSON job file
    Run {
        /// Path to the job file
        file: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Write the JSON result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Print a sample job file
    Example,

    /// List available modes
    Modes,
}

fn progress_logger() -> ProgressCallback {
    Arc::new(|info| {
        tracing::info!(
            algorithm = %info.algorithm,
            progress = info.progress_percent,
            "{}",
            info.stage
        );
    })
}

fn run(job: Job, overrides: &Overrides) -> anyhow::Result<OptimizationResult> {
    let config = overrides.apply(job.effective_config());
    tracing::info!(
        mode = %config.mode,
        pieces = job.pieces.len(),
        stock = job.stock.len(),
        "Starting optimization"
    );

    let optimizer = Optimizer::new(config).with_progress(progress_logger());
    let result = optimizer.optimize(job.pieces, job.stock)?;
    print_result(&result);
    Ok(result)
}

/// Human-readable report on stderr.
fn print_result(result: &OptimizationResult) {
    let summary = ResultSummary::from(result);
    eprintln!("\nResult ({})", summary.strategy);
    eprintln!("{:-<60}", "");
    eprintln!("  placed:      {}", summary.placed);
    eprintln!("  unplaced:    {}", summary.unplaced);
    eprintln!("  blocks used: {}", summary.blocks_used);
    eprintln!("  efficiency:  {:.2}%", summary.efficiency);
    if let Some(cost) = result.total_cost {
        eprintln!("  total cost:  {:.2}", cost);
    }
    eprintln!("  time:        {}ms", summary.time_ms);

    for layout in &result.layouts {
        eprintln!(
            "  {} #{}: {} pieces, {:.1}% used",
            layout.stock_label,
            layout.stock_ordinal,
            layout.placements.len(),
            layout.utilization
        );
    }

    if let Some(comparison) = &result.algorithm_comparison {
        eprintln!("\nStrategy Comparison:");
        eprintln!("{:-<60}", "");
        for r in &comparison.ranking {
            eprintln!(
                "  #{} {:<12} eff={:.2}% time={}ms score={:.3}",
                r.rank, r.algorithm, r.efficiency, r.execution_time_ms, r.score
            );
        }
        for f in &comparison.failures {
            eprintln!("  failed {:<10} {}", f.strategy, f.detail);
        }
    }
    if let Some(hybrid) = &result.hybrid_analysis {
        eprintln!("\nHybrid stages (improvement {:+.2}%):", hybrid.improvement);
        for s in &hybrid.stages {
            match s.efficiency {
                Some(e) => eprintln!("  {}. {:<12} {:.2}%", s.stage, s.algorithm, e),
                None => eprintln!("  {}. {:<12} failed", s.stage, s.algorithm),
            }
        }
    }
    if let Some(adaptive) = &result.adaptive_analysis {
        eprintln!(
            "\nAdaptive: complexity={} ({:?}), candidates={:?}, selected={}",
            adaptive.complexity, adaptive.tier, adaptive.candidates, adaptive.selected
        );
    }
    if let Some(instructions) = &result.cutting_instructions {
        eprintln!(
            "\nCutting plan: {} cuts over {} blocks, ~{:.0}s",
            instructions.summary.total_cuts,
            instructions.summary.total_blocks,
            instructions.summary.estimated_total_time_s
        );
        for block in &instructions.blocks {
            eprintln!("  Block {} ({}):", block.block_number, block.stock_label);
            for phase in &block.phases {
                for cut in &phase.cuts {
                    eprintln!("    {}", cut.description);
                }
            }
        }
    }

    for w in &result.warnings {
        match w {
            Warning::Unplaced {
                piece_id,
                count,
                reason,
            } => eprintln!("  warning: {} x '{}' unplaced ({:?})", count, piece_id, reason),
            other => eprintln!("  warning: {:?}", other),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            file,
            overrides,
            output,
            pretty,
        } => {
            let job = Job::load(&file)?;
            let result = run(job, &overrides)?;

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("\nResult saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Example => {
            println!("{}", serde_json::to_string_pretty(&Job::example())?);
        }

        Commands::Modes => {
            println!("Available modes:");
            println!("================");
            for mode in Mode::ALL {
                println!("  {:<12} {}", mode.name(), mode.description());
            }
            println!("\nUse 'foamcut run <JOB> --mode <MODE>' to select one");
        }
    }

    Ok(())
}
