// ABOUTME: CLI entry point for the hashcat-runner binary
// ABOUTME: Parses subcommands, builds the client from env and flags, and renders results
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

mod format;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use hashcat_runner::{
    CrackOptions, CrackSession, CrackedHash, HashcatClient, HashcatConfig, HashcatError,
    HashcatSession,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use format::status_line;

/// hashcat-runner: supervise hashcat from the command line
#[derive(Parser)]
#[command(name = "hashcat-runner", version, about)]
struct Cli {
    /// Path to the hashcat binary (overrides `HASHCAT_BINARY`)
    #[arg(long, global = true)]
    binary: Option<PathBuf>,

    /// Directory for session working files (overrides `HASHCAT_WORK_DIR`)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List backend platforms and devices
    Devices,
    /// List supported hash types
    Hashes {
        /// Only show hash types in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Benchmark one or every hash type
    Benchmark {
        /// Hash type to benchmark
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        hash_type: Option<u32>,
        /// Benchmark every supported hash type
        #[arg(long)]
        all: bool,
    },
    /// Crack a hash or a file of hashes
    Crack(CrackArgs),
    /// Print the installed hashcat version and capabilities
    Version,
}

#[derive(Args)]
struct CrackArgs {
    /// Single hash to crack
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    hash: Option<String>,
    /// File with one hash per line
    #[arg(long)]
    file: Option<PathBuf>,
    /// Hash mode, e.g. 0 for MD5 (configured default when omitted)
    #[arg(long)]
    hash_type: Option<u32>,
    /// Attack mode, e.g. 0 for dictionary or 3 for mask (configured default when omitted)
    #[arg(long)]
    attack: Option<u8>,
    /// Mask or wordlist
    #[arg(long)]
    mask: String,
    /// Rule file (repeatable)
    #[arg(long = "rule")]
    rules: Vec<String>,
    /// Device type id (repeatable)
    #[arg(long = "device")]
    devices: Vec<u32>,
    /// Workload profile 1-4
    #[arg(long)]
    workload: Option<u8>,
    /// Disable optimized kernels
    #[arg(long)]
    no_optimized: bool,
    /// Print every progress snapshot instead of a status line
    #[arg(long)]
    verbose: bool,
}

impl CrackArgs {
    fn options(&self, client: &HashcatClient) -> CrackOptions {
        let mut options = client
            .default_options(self.mask.clone())
            .with_optimized_kernel(!self.no_optimized)
            .with_devices(self.devices.clone());
        for rule in &self.rules {
            options = options.with_rule(rule.clone());
        }
        if let Some(w) = self.workload {
            options = options.with_workload(w);
        }
        if let Some(hash_type) = self.hash_type {
            options.hash_type = hash_type;
        }
        if let Some(attack) = self.attack {
            options.attack_mode = attack;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays clean for --json output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = HashcatConfig::from_env()?;
    if let Some(binary) = cli.binary.clone() {
        config.binary_path = binary;
    }
    if let Some(dir) = cli.work_dir.clone() {
        config = config.with_work_dir(dir);
    }
    let client = HashcatClient::new(config)?;

    match cli.command {
        Command::Devices => devices(&client, cli.json).await?,
        Command::Hashes { ref category } => hashes(&client, category.as_deref(), cli.json).await?,
        Command::Benchmark { hash_type, all } => benchmark(&client, hash_type, all, cli.json).await?,
        Command::Crack(ref args) => crack(&client, args, cli.json).await?,
        Command::Version => version(&client, cli.json).await?,
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), HashcatError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| HashcatError::internal(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

async fn devices(client: &HashcatClient, json: bool) -> Result<(), HashcatError> {
    let list = client.devices().await?;
    if json {
        return print_json(&list);
    }
    for platform in &list.platforms {
        println!("Platform #{}: {} ({})", platform.id, platform.name, platform.vendor);
        for device in &platform.devices {
            println!(
                "  Device #{:<3} {:<4} {} [{} MB, {} MHz, {} CUs]",
                device.id,
                device.device_type,
                device.name,
                device.memory_total_mb,
                device.clock_mhz,
                device.processors
            );
        }
    }
    Ok(())
}

async fn hashes(
    client: &HashcatClient,
    category: Option<&str>,
    json: bool,
) -> Result<(), HashcatError> {
    let supported = client.supported_hashes().await?;
    let selected: Vec<_> = match category {
        Some(c) => supported.by_category(c),
        None => supported.hash_types.iter().collect(),
    };
    if json {
        return print_json(&selected);
    }
    for hash_type in selected {
        println!("{:>6}  {:<40} {}", hash_type.id, hash_type.name, hash_type.category);
    }
    Ok(())
}

async fn benchmark(
    client: &HashcatClient,
    hash_type: Option<u32>,
    all: bool,
    json: bool,
) -> Result<(), HashcatError> {
    let response = match (hash_type, all) {
        (_, true) => client.benchmark_all().await?,
        (Some(id), false) => client.benchmark(id).await?,
        (None, false) => return Err(HashcatError::config("pass --hash-type or --all")),
    };
    if json {
        return print_json(&response);
    }
    for bench in &response.benchmarks {
        println!("Hash-Mode {} ({})", bench.hash_mode, bench.hash_name);
        for result in &bench.device_results {
            println!(
                "  Device #{}: {} {} ({:.2} ms)",
                result.device_id, result.speed, result.speed_unit, result.time_per_hash_ms
            );
        }
    }
    println!(
        "Total: {:.2} {} | avg {:.2} ms",
        response.summary.total_speed, response.summary.speed_unit, response.summary.avg_time_per_hash_ms
    );
    if !response.failed_hash_types.is_empty() {
        println!("Failed hash types: {:?}", response.failed_hash_types);
    }
    Ok(())
}

async fn version(client: &HashcatClient, json: bool) -> Result<(), HashcatError> {
    let caps = client.version().await?;
    if json {
        return print_json(&caps);
    }
    println!("hashcat {} at {}", caps.display_version(), client.binary().display());
    Ok(())
}

fn create_session(
    client: &HashcatClient,
    args: &CrackArgs,
    cancel: &CancellationToken,
) -> Result<HashcatSession, HashcatError> {
    let options = args.options(client);
    match (&args.hash, &args.file) {
        (Some(hash), _) => client.new_session(cancel, hash, &options),
        (None, Some(path)) => client.new_file_session(cancel, path, &options),
        (None, None) => Err(HashcatError::config("pass --hash or --file")),
    }
}

async fn crack(client: &HashcatClient, args: &CrackArgs, json: bool) -> Result<(), HashcatError> {
    let cancel = CancellationToken::new();
    let session = create_session(client, args, &cancel)?;

    let mut progress = session
        .progress()
        .await
        .ok_or_else(|| HashcatError::internal("progress stream unavailable"))?;
    let mut cracked = session
        .cracked()
        .ok_or_else(|| HashcatError::internal("results stream unavailable"))?;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping session");
            interrupt.cancel();
        }
    });

    session.start().await?;
    info!(session = session.name(), "Cracking started");

    let mut found: Vec<CrackedHash> = Vec::new();
    let (mut progress_open, mut cracked_open) = (true, true);
    while progress_open || cracked_open {
        tokio::select! {
            update = progress.next(), if progress_open => match update {
                Some(update) if args.verbose => {
                    eprintln!("{}", serde_json::to_string(&update).unwrap_or_default());
                }
                Some(update) => {
                    let stats = update.calculate_stats();
                    eprintln!("[{}] {}", update.status, status_line(&stats));
                }
                None => progress_open = false,
            },
            hit = cracked.next(), if cracked_open => match hit {
                Some(hit) => {
                    if !json {
                        println!("{}:{}", hit.hash, hit.plaintext);
                    }
                    found.push(hit);
                }
                None => cracked_open = false,
            },
        }
    }

    let outcome = session.wait().await;
    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        eprintln!("No hashes recovered");
    }
    if cancel.is_cancelled() && outcome.is_ok() {
        eprintln!("Stopped before completion");
    }
    outcome
}

