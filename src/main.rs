#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use fhe_bench::{bench, notebook_cmd};

#[derive(Parser, Debug)]
#[command(name = "fhe-bench")]
#[command(about = "Benchmark suite for encrypted-computation engines", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set FHE_BENCH_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Benchmark a target function from the config
    Bench {
        /// Target function name (from bench-config.toml)
        function: String,
        /// Engine name (e.g., clear, mock)
        #[arg(long)]
        engine: Option<String>,
        /// Path to bench config (defaults to bench-config.toml)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
        /// Number of measured compile iterations to run
        #[arg(long, default_value_t = 1)]
        iterations: usize,
        /// Number of warmup compile iterations to run before measuring
        #[arg(long, default_value_t = 0)]
        warmup: usize,
        /// Override the number of evaluation samples
        #[arg(long)]
        samples: Option<u32>,
        /// RNG seed for input sampling
        #[arg(long)]
        seed: Option<u64>,
        /// Write machine-readable JSON report to this file
        #[arg(long)]
        json: Option<std::path::PathBuf>,
        /// Append the record to this JSONL file (defaults to out/bench.jsonl)
        #[arg(long)]
        jsonl: Option<std::path::PathBuf>,
        /// Export the record to this CSV file
        #[arg(long)]
        csv: Option<std::path::PathBuf>,
    },

    /// Benchmark every target in the config
    BenchAll {
        /// Engine name (e.g., clear, mock)
        #[arg(long)]
        engine: Option<String>,
        /// Path to bench config (defaults to bench-config.toml)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
        /// Number of measured compile iterations to run
        #[arg(long, default_value_t = 1)]
        iterations: usize,
        /// Number of warmup compile iterations to run before measuring
        #[arg(long, default_value_t = 0)]
        warmup: usize,
        /// RNG seed for input sampling
        #[arg(long)]
        seed: Option<u64>,
        /// Append records to this JSONL file (defaults to out/bench.jsonl)
        #[arg(long)]
        jsonl: Option<std::path::PathBuf>,
        /// Export all records to this CSV file
        #[arg(long)]
        csv: Option<std::path::PathBuf>,
    },

    /// List target functions in the config
    List {
        /// Path to bench config (defaults to bench-config.toml)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },

    /// Print the compiled operation graph of a target
    Describe {
        /// Target function name
        function: String,
        /// Engine name (e.g., clear, mock)
        #[arg(long)]
        engine: Option<String>,
        /// Path to bench config (defaults to bench-config.toml)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },

    /// Write a Graphviz DOT rendering of a target's compiled graph
    Draw {
        /// Target function name
        function: String,
        /// Output DOT file path
        #[arg(long)]
        output: std::path::PathBuf,
        /// Lay the graph out left-to-right instead of top-to-bottom
        #[arg(long)]
        horizontal: bool,
        /// Engine name (e.g., clear, mock)
        #[arg(long)]
        engine: Option<String>,
        /// Path to bench config (defaults to bench-config.toml)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },

    /// Force metadata.execution.timeout in notebooks under a directory
    NotebookTimeout {
        /// Directory containing *.ipynb files (non-recursive)
        dir: std::path::PathBuf,
        /// Timeout value to write, in seconds
        #[arg(long, default_value_t = notebook_cmd::DEFAULT_TIMEOUT)]
        timeout: u64,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("FHE_BENCH_LOG").unwrap_or_else(|_| {
        if verbose {
            "fhe_bench=debug".to_string()
        } else {
            "fhe_bench=info".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Bench {
            function,
            engine,
            config,
            iterations,
            warmup,
            samples,
            seed,
            json,
            jsonl,
            csv,
        } => bench::bench_cmd::run(
            function,
            engine,
            config,
            Some(iterations),
            Some(warmup),
            samples,
            seed,
            json,
            jsonl,
            csv,
        ),
        Commands::BenchAll {
            engine,
            config,
            iterations,
            warmup,
            seed,
            jsonl,
            csv,
        } => bench::bench_cmd::run_all(
            engine,
            config,
            Some(iterations),
            Some(warmup),
            seed,
            jsonl,
            csv,
        ),
        Commands::List { config } => bench::bench_cmd::list(config),
        Commands::Describe {
            function,
            engine,
            config,
        } => bench::bench_cmd::describe(function, engine, config),
        Commands::Draw {
            function,
            output,
            horizontal,
            engine,
            config,
        } => bench::bench_cmd::draw(function, output, horizontal, engine, config),
        Commands::NotebookTimeout { dir, timeout } => notebook_cmd::run(dir, timeout),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
