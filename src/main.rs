use clap::{Parser, Subcommand};
use log::LevelFilter;
use race_executor::pow::{self, hash_attempt, leading_zero_bits, PowConfig, Target};
use std::time::Duration;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "racex")]
#[command(about = "racex - first valid answer wins parallel search")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a proof-of-work nonce
    Pow {
        /// Data to hash in front of the nonce
        #[arg(long)]
        data: String,
        /// Required leading zero bits
        #[arg(long, default_value = "20")]
        bits: u32,
        /// Number of worker threads (defaults to the number of CPUs)
        #[arg(long, short = 'j')]
        workers: Option<usize>,
        /// Nonces to scan across all workers before giving up
        #[arg(long, default_value = "1000000000000")]
        limit: u64,
        /// Seed for the starting nonce
        #[arg(long)]
        seed: Option<u64>,
        /// Timeout in seconds for the search
        #[arg(long)]
        timeout: Option<u64>,
        /// Print race statistics
        #[arg(long)]
        stats: bool,
    },
    /// Check a nonce and timestamp against data and difficulty
    Verify {
        #[arg(long)]
        data: String,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        timestamp: u64,
        #[arg(long, default_value = "20")]
        bits: u32,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the -v level.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

fn run_pow(
    data: &str,
    config: &PowConfig,
    show_stats: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Searching for {} leading zero bits with {} workers",
        config.bits, config.race.workers
    );

    let report = pow::solve(data.as_bytes(), config)?;

    println!("Nonce: {}", report.solution.nonce);
    println!("Timestamp: {}", report.solution.timestamp);
    println!("Hash: {}", report.solution.hash_hex());
    if show_stats {
        print!("{}", report.stats.format_summary());
    }
    Ok(())
}

fn run_verify(
    data: &str,
    nonce: u64,
    timestamp: u64,
    bits: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = Target::from_bits(bits)?;
    let hash = hash_attempt(data.as_bytes(), nonce, timestamp);

    println!("Hash: {}", hex::encode(hash));
    println!("Leading zero bits: {}", leading_zero_bits(&hash));
    if target.is_met_by(&hash) {
        println!("Valid: meets {} bits", bits);
        Ok(())
    } else {
        Err(format!("does not meet {} bits", bits).into())
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Pow {
            data,
            bits,
            workers,
            limit,
            seed,
            timeout,
            stats,
        } => {
            let mut config = PowConfig::default()
                .with_bits(bits)
                .with_nonce_limit(limit)
                .with_seed_option(seed)
                .with_timeout_option(timeout.map(Duration::from_secs));
            config.race = config.race.with_workers_option(workers);

            if let Err(e) = run_pow(&data, &config, stats) {
                eprintln!("Error during search: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Verify {
            data,
            nonce,
            timestamp,
            bits,
        } => {
            if let Err(e) = run_verify(&data, nonce, timestamp, bits) {
                eprintln!("Error verifying nonce: {}", e);
                std::process::exit(1);
            }
        }
    }
}
