//! Hook Address Miner CLI
//!
//! Usage:
//!   hook_miner mine --init-code-hash 0x... --flags before-swap,after-swap
//!   hook_miner mine --init-code 0x6080... --constructor-args 0x... --flags 0x00c0 -w 8
//!   hook_miner verify --init-code-hash 0x... --salt 1234 --flags before-swap
//!   hook_miner flags 0x...

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hook_miner::config::{Command, FlagsArgs, MineArgs, VerifyArgs};
use hook_miner::{
    create2_address, Address, Config, ConfigError, Flag, FlagMask, InitCodeHash, MinedSalt, Miner,
    MiningError, MiningRequest, MiningResult, PoolStatus, Salt, Verifier, WorkerPool,
};

const EXIT_CONFIG: i32 = 1;
const EXIT_FAILED: i32 = 2;

/// Sequential progress cadence, in candidates.
const SEQUENTIAL_REPORT_EVERY: u64 = 100_000;

fn main() {
    init_tracing();
    let config = Config::parse();

    let code = match config.command {
        Command::Mine(ref args) => run_mine(args),
        Command::Verify(ref args) => run_verify(args),
        Command::Flags(ref args) => run_flags(args),
    };
    process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_mine(args: &MineArgs) -> i32 {
    let request = match args.request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return EXIT_CONFIG;
        }
    };
    let workers = args.worker_count();
    let verifier = Verifier::new(request.target);

    println!("Hook Address Miner");
    println!("==================");
    println!("Deployer:   {}", request.deployer);
    println!("Init hash:  0x{}", hex::encode(request.init_code_hash));
    println!("Flags:      {} ({:#06x})", request.target, request.target);
    println!("Bound:      {} salts", format_number(request.max_iterations));
    println!("Odds:       {}", verifier.difficulty_description(request.max_iterations));
    println!("Workers:    {}", workers);
    println!();

    let stop_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = stop_flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let started = Instant::now();
    let result = if workers == 1 {
        mine_sequential(&request, stop_flag)
    } else {
        mine_with_pool(&request, workers, stop_flag, args.report_interval)
    };

    match result {
        Ok(found) => {
            print_result(&found, started.elapsed());
            0
        }
        Err(e @ MiningError::InvalidMask { .. }) => {
            eprintln!("Configuration error: {}", e);
            EXIT_CONFIG
        }
        Err(e) => {
            eprintln!("Search failed: {}", e);
            if let MiningError::NotFound { .. } = e {
                eprintln!("Re-run with a larger --max-iterations.");
            }
            EXIT_FAILED
        }
    }
}

fn mine_sequential(request: &MiningRequest, stop_flag: Arc<AtomicBool>) -> MiningResult {
    let started = Instant::now();
    Miner::new()
        .stop_flag(stop_flag)
        .report_every(SEQUENTIAL_REPORT_EVERY)
        .observer(move |tried: u64| {
            let rate = tried as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
            info!(
                "[{:>4}s] Tried {} salts ({}/s)",
                started.elapsed().as_secs(),
                format_number(tried),
                format_number(rate as u64)
            );
        })
        .mine(request)
}

fn mine_with_pool(
    request: &MiningRequest,
    workers: usize,
    stop_flag: Arc<AtomicBool>,
    report_interval: u64,
) -> MiningResult {
    let mut pool = WorkerPool::with_stop_flag(workers, *request, stop_flag)?;
    let report_interval = Duration::from_secs(report_interval.max(1));
    let mut last_report = Instant::now();

    while pool.poll(report_interval) == PoolStatus::Running {
        if last_report.elapsed() >= report_interval {
            print_progress(&pool);
            last_report = Instant::now();
        }
    }

    info!(
        "Searched {} salts in {:.2}s ({}/s)",
        format_number(pool.total_salts()),
        pool.elapsed().as_secs_f64(),
        format_number(pool.salts_per_second() as u64)
    );
    pool.wait()
}

fn run_verify(args: &VerifyArgs) -> i32 {
    let (deployer, init_code_hash, salt, target, expected) = match parse_verify(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return EXIT_CONFIG;
        }
    };

    let address = create2_address(&deployer, &salt, &init_code_hash);
    let check = Verifier::new(target).check(&address);

    println!("Address:    {}", address);
    println!("Exposes:    {}", FlagMask::extract(&address));
    println!("Expected:   {}", target);
    println!("Flags:      {}", if check.is_match() { "match" } else { "MISMATCH" });

    let mut ok = check.is_match();
    if let Some(expected) = expected {
        let same = expected == address;
        println!("Deployed:   {} ({})", expected, if same { "same" } else { "DIFFERENT" });
        ok &= same;
    }
    if ok {
        0
    } else {
        EXIT_FAILED
    }
}

fn parse_verify(
    args: &VerifyArgs,
) -> Result<(Address, InitCodeHash, Salt, FlagMask, Option<Address>), ConfigError> {
    Ok((
        args.deployer()?,
        args.init_code.resolve()?,
        args.salt()?,
        args.target()?,
        args.expected()?,
    ))
}

fn run_flags(args: &FlagsArgs) -> i32 {
    let address = match args.address() {
        Ok(address) => address,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return EXIT_CONFIG;
        }
    };
    let mask = FlagMask::extract(&address);

    println!("Address: {}", address);
    println!("Mask:    {:#06x}", mask);
    for flag in Flag::ALL {
        let mark = if mask.contains(flag) { "x" } else { " " };
        println!("  [{}] {:>2} {}", mark, flag.bit(), flag);
    }
    0
}

fn print_result(found: &MinedSalt, elapsed: Duration) {
    println!("=== Match ===");
    println!("Address:      {}", found.address);
    println!("Salt (hex):   {}", found.salt);
    println!("Salt (dec):   {}", found.salt.to_decimal());
    println!("Flags:        {}", FlagMask::extract(&found.address));
    println!("Iterations:   {}", found.iterations);
    println!("Time elapsed: {:.2}s", elapsed.as_secs_f64());
}

fn print_progress(pool: &WorkerPool) {
    let best = match pool.best() {
        Some(salt) => salt.to_string(),
        None => "none".to_string(),
    };
    info!(
        "[{:>4}s] Tried {} salts ({}/s), best salt so far: {}",
        pool.elapsed().as_secs(),
        format_number(pool.total_salts()),
        format_number(pool.salts_per_second() as u64),
        best
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}
