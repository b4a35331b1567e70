//! islet - CLI entry point
//!
//! Concurrent island ecosystem simulator.

use clap::{Parser, Subcommand};
use islet::{benchmark, Config, ShutdownOutcome, World};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "islet")]
#[command(version)]
#[command(about = "Concurrent island ecosystem simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation until extinction
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Safety cap on ticks (0 = run until extinction)
        #[arg(short, long, default_value = "10000")]
        max_ticks: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Write census history JSON here when the run ends
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Grid rows
        #[arg(long, default_value = "16")]
        rows: usize,

        /// Grid columns
        #[arg(long, default_value = "16")]
        cols: usize,

        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        ticks: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            max_ticks,
            seed,
            output,
            quiet,
        } => run_simulation(config, max_ticks, seed, output, quiet),

        Commands::Init { output } => generate_config(output),

        Commands::Benchmark { rows, cols, ticks } => run_benchmark(rows, cols, ticks),
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_simulation(
    config_path: PathBuf,
    max_ticks: u64,
    seed: Option<u64>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create config
    let config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };
    init_logging(&config.logging.log_level);

    // Create world
    let mut world = if let Some(s) = seed {
        println!("Using seed: {}", s);
        World::new_with_seed(config.clone(), s)?
    } else {
        World::new(config.clone())?
    };

    println!("Starting simulation");
    println!("  Grid: {}x{}", config.world.rows, config.world.cols);
    println!("  Initial population: {}", world.population());
    println!("  Max ticks: {}", max_ticks);
    println!();

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;
    let mut ticks_run = 0u64;

    while world.population() > 0 {
        if max_ticks > 0 && ticks_run >= max_ticks {
            println!("\nReached tick cap at {}", ticks_run);
            break;
        }
        let summary = world.step();
        ticks_run += 1;

        if !quiet && summary.tick % stats_interval == 0 {
            println!("{}", world.census.summary());
        }
    }

    match world.shutdown() {
        ShutdownOutcome::Clean => {}
        outcome => log::warn!("worker pool shutdown escalated: {outcome:?}"),
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", ticks_run);
    println!(
        "Speed: {:.1} ticks/s",
        ticks_run as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("Final population: {}", world.population());
    if world.is_extinct() {
        println!("All organisms are gone.");
    }

    if let Some(path) = output {
        world.history.save(&path)?;
        println!("Census history: {:?}", path);
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn run_benchmark(rows: usize, cols: usize, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");
    println!("=== islet Benchmark ===");
    println!("Grid: {}x{}", rows, cols);
    println!("Ticks: {}", ticks);
    println!();

    let result = benchmark(ticks, rows, cols)?;
    println!("{}", result);

    Ok(())
}
