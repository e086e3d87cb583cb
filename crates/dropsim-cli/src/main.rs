//! dropsim CLI: run drop tests, benchmarks and input checks from the
//! command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dropsim_compute::Backend;
use dropsim_scheduler::PlanTier;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dropsim")]
#[command(version, about = "Explicit-dynamics drop-test simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a drop test from a request file and a mesh
    Simulate {
        /// Simulation request (.toml or .json)
        #[arg(short, long, default_value = "drop.toml")]
        request: PathBuf,

        /// Tetrahedral mesh (.json or binary)
        #[arg(short, long)]
        mesh: PathBuf,

        /// Subscription plan used for scheduling
        #[arg(short, long, default_value = "free", value_parser = parse_plan)]
        plan: PlanTier,

        /// Results artifact output path
        #[arg(short, long, default_value = "results.json")]
        output: PathBuf,

        /// Also write telemetry events as JSON lines
        #[arg(long)]
        events: Option<PathBuf>,

        /// Scheduler config (.toml)
        #[arg(long)]
        scheduler: Option<PathBuf>,
    },

    /// Run the benchmark scenarios
    Benchmark {
        /// Scenario name or "all"
        #[arg(short, long, default_value = "all")]
        scenario: String,

        #[arg(short, long, value_enum, default_value_t = BackendArg::Parallel)]
        backend: BackendArg,

        /// Write CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a request, optionally against its mesh
    Validate {
        request: PathBuf,

        #[arg(short, long)]
        mesh: Option<PathBuf>,
    },

    /// Show where a job of the given size would run
    Schedule {
        elements: usize,

        #[arg(short, long, default_value = "free", value_parser = parse_plan)]
        plan: PlanTier,
    },

    /// Print a summary of a mesh or a results artifact
    Inspect { path: PathBuf },

    /// List the built-in material presets
    Materials,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Scalar,
    Parallel,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Scalar => Backend::Scalar,
            BackendArg::Parallel => Backend::Parallel,
        }
    }
}

fn parse_plan(s: &str) -> Result<PlanTier, String> {
    s.parse()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            request,
            mesh,
            plan,
            output,
            events,
            scheduler,
        } => commands::simulate(&commands::SimulateArgs {
            request,
            mesh,
            plan,
            output,
            events,
            scheduler,
        }),
        Commands::Benchmark {
            scenario,
            backend,
            output,
        } => commands::benchmark(&scenario, backend.into(), output.as_deref()),
        Commands::Validate { request, mesh } => commands::validate(&request, mesh.as_deref()),
        Commands::Schedule { elements, plan } => commands::schedule(elements, plan),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Materials => commands::materials(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
