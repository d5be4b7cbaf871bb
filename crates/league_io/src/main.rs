//! fantasy-sim CLI
//!
//! Loads a league directory, runs the season engine and writes flat
//! reports to stdout (or `--out`). Progress goes to stderr.

#[cfg(feature = "cli")]
use anyhow::{bail, Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use fantasy_core::{OptimizerConfig, RosterMutation, RosterOptimizer, SimulationConfig, SimulationControl, Simulator};
#[cfg(feature = "cli")]
use league_io::{load_league, write_rows, write_rows_to_path, LeagueFiles, OutputFormat, RunMetadata};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "fantasy-sim")]
#[command(about = "Monte Carlo season projections for fantasy leagues", long_about = None)]
struct Cli {
    /// Directory with league.json, units.csv, matchups.csv and optional history.csv
    #[arg(long, default_value = ".")]
    league: PathBuf,

    /// Engine preset
    #[arg(long, global = true, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    /// Season trials (overrides the preset)
    #[arg(long, global = true)]
    trials: Option<usize>,

    /// Master seed; random when omitted
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Stop starting new batches after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Output file; stdout when omitted
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Quick,
    Default,
    Thorough,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Per-entry playoff, placement and earnings probabilities
    Simulate,

    /// Week-by-week projected matchups
    Matchups,

    /// Replacement value of one unit, or of every unit
    War {
        #[arg(long)]
        unit: Option<String>,
    },

    /// Value one roster move for an entry
    Evaluate {
        #[arg(long)]
        entry: String,

        /// Free agent to add
        #[arg(long)]
        add: Option<String>,

        /// Rostered unit to drop
        #[arg(long)]
        drop: Option<String>,
    },

    /// Hill-climb an entry's roster over the free-agent pool
    Optimize {
        #[arg(long)]
        entry: String,

        /// Units never dropped (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Free agents never added (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        #[arg(long, default_value_t = 10)]
        max_iterations: usize,

        #[arg(long, default_value_t = 0.0)]
        min_improvement: f64,
    },
}

#[cfg(feature = "cli")]
impl Cli {
    fn simulator(&self) -> Simulator {
        let mut config = match self.preset {
            Preset::Quick => SimulationConfig::quick(),
            Preset::Default => SimulationConfig::default(),
            Preset::Thorough => SimulationConfig::thorough(),
        };
        if let Some(trials) = self.trials {
            config = config.with_trials(trials);
        }
        config.seed = self.seed;

        let mut control = SimulationControl::unbounded();
        if let Some(secs) = self.timeout_secs {
            control = control.with_timeout(Duration::from_secs(secs));
        }
        // pin the seed so it can be reported
        Simulator::new(config).with_control(control).pinned()
    }

    fn emit<T: serde::Serialize>(&self, rows: &[T], metadata: &RunMetadata) -> Result<()> {
        match &self.out {
            Some(path) => {
                write_rows_to_path(path, rows, self.format, metadata)
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                eprintln!("📄 Report written to: {}", path.display());
            }
            None => write_rows(std::io::stdout().lock(), rows, self.format, metadata)
                .context("Failed to write report to stdout")?,
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let files = LeagueFiles::in_dir(&cli.league);
    let (league, load) = load_league(&files)
        .with_context(|| format!("Failed to load league from {}", cli.league.display()))?;
    eprintln!(
        "📥 Loaded {} entries, {} rostered units, {} free agents ({} warnings)",
        load.entries,
        load.rostered,
        load.free_agents,
        load.warnings.len()
    );

    let simulator = cli.simulator();
    let seed = simulator.config().seed;
    let metadata = RunMetadata::new(&league.settings.season).with_seed(seed);

    match &cli.command {
        Commands::Simulate => {
            let report = simulator.evaluate(&league)?;
            if report.cancelled {
                eprintln!("⏱️  Stopped early after {} trials", report.trials);
            }
            cli.emit(&report.entries, &metadata.with_trials(report.trials, report.cancelled))?;
        }

        Commands::Matchups => {
            let rows = simulator.project_matchups(&league)?;
            cli.emit(&rows, &metadata)?;
        }

        Commands::War { unit } => {
            let values = match unit {
                Some(name) => vec![simulator.war(&league, name)?],
                None => simulator.unit_values(&league)?,
            };
            cli.emit(&values, &metadata.with_trials(simulator.config().war_trials, false))?;
        }

        Commands::Evaluate { entry, add, drop } => {
            let mutation = match (add, drop) {
                (Some(add), Some(drop)) => RosterMutation::swap(entry, drop, add),
                (Some(add), None) => RosterMutation::add(entry, add),
                (None, Some(drop)) => RosterMutation::drop(entry, drop),
                (None, None) => bail!("evaluate needs --add, --drop or both"),
            };
            let valuation = simulator.value_change(&league, &mutation)?;
            if let Some(delta) = valuation.deltas.iter().find(|d| &d.name == entry) {
                eprintln!(
                    "🔁 {}: expected earnings {:+.2}, P(playoffs) {:+.3}",
                    mutation, delta.expected_earnings, delta.p_playoffs
                );
            }
            let trials = valuation.after.trials;
            let cancelled = valuation.before.cancelled || valuation.after.cancelled;
            cli.emit(&valuation.deltas, &metadata.with_trials(trials, cancelled))?;
        }

        Commands::Optimize {
            entry,
            include,
            exclude,
            max_iterations,
            min_improvement,
        } => {
            let config = OptimizerConfig {
                max_iterations: *max_iterations,
                min_improvement: *min_improvement,
                include: include.clone(),
                exclude: exclude.clone(),
            };
            let result = RosterOptimizer::new(&simulator, config).optimize(&league, entry)?;
            eprintln!(
                "✅ {}: expected earnings {:.2} -> {:.2} in {} moves",
                result.entry,
                result.initial_earnings,
                result.final_earnings,
                result.steps.len()
            );
            cli.emit(&result.steps, &metadata.with_trials(simulator.config().num_trials, false))?;
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("fantasy-sim CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
