use std::path::PathBuf;

use anyhow::Result;
use asteroids_core::constants::{DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};
use clap::{Parser, Subcommand};
use host::autopilot::describe_pilots;
use host::{
    load_config, load_manifest, record_session, replay_file, run_batch, verify_file, write_json,
    write_log, RecordOptions,
};

#[derive(Parser, Debug)]
#[command(name = "host")]
#[command(about = "Record, replay and verify deterministic Asteroids input logs")]
struct Cli {
    /// Session rules as JSON; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available autopilots
    ListPilots,
    /// Play a scripted session and write its input log
    Record {
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 3_600)]
        frames: u32,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_WORLD_WIDTH as u16)]
        width: u16,
        #[arg(long, default_value_t = DEFAULT_WORLD_HEIGHT as u16)]
        height: u16,
        #[arg(long, default_value = "aim")]
        pilot: String,
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
    /// Replay an input log headlessly and report the final state
    Replay {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
    /// Check a claimed score against a replay of the log
    Verify {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        score: u32,
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
    /// Replay every log listed in a JSON manifest in parallel
    Batch {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let Cli { config, command } = Cli::parse();
    let config = load_config(config.as_deref())?;

    match command {
        Commands::ListPilots => {
            for (id, description) in describe_pilots() {
                println!("{id:<8} {description}");
            }
        }
        Commands::Record {
            seed,
            frames,
            out,
            width,
            height,
            pilot,
            json_out,
        } => {
            let artifact = record_session(
                &RecordOptions {
                    seed,
                    frames,
                    width,
                    height,
                    pilot,
                },
                &config,
            )?;
            write_log(&out, &artifact.log)?;
            let metrics = &artifact.metrics;
            println!("Input log recorded and verified.");
            println!("  Pilot:         {}", metrics.pilot);
            println!("  Seed:          {} (0x{:08x})", metrics.seed, metrics.seed_hash);
            println!("  Frames:        {}", metrics.frame_count);
            println!("  Final score:   {}", metrics.final_score);
            println!("  Level:         {}", metrics.final_level);
            println!("  Lives:         {}", metrics.final_lives);
            println!("  Fingerprint:   0x{:016x}", metrics.fingerprint);
            println!("  Log:           {} ({} bytes)", out.display(), artifact.log.len());
            if let Some(path) = json_out {
                write_json(&path, metrics)?;
                println!("  Metrics JSON:  {}", path.display());
            }
        }
        Commands::Replay {
            seed,
            log,
            json_out,
        } => {
            let report = replay_file(&seed, &log, &config)?;
            if report.completed {
                println!("Replay completed.");
            } else {
                println!(
                    "Replay stopped: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
            println!("  Frames:        {}", report.frames_replayed);
            println!("  Status:        {:?}", report.state.status);
            println!("  Final score:   {}", report.state.score);
            println!("  Level:         {}", report.state.level);
            println!("  Lives:         {}", report.state.lives);
            println!("  Fingerprint:   0x{:016x}", report.state.fingerprint);
            if let Some(checksum) = report.log_checksum {
                println!("  Log checksum:  0x{checksum:08x}");
            }
            if let Some(path) = json_out {
                write_json(&path, &report)?;
                println!("  Report JSON:   {}", path.display());
            }
        }
        Commands::Verify {
            seed,
            log,
            score,
            json_out,
        } => {
            let verdict = verify_file(&seed, &log, score, &config)?;
            println!("Claim verified.");
            println!("  Seed:          {} (0x{:08x})", verdict.seed, verdict.seed_hash);
            println!("  Frames:        {}", verdict.frame_count);
            println!("  Final score:   {}", verdict.final_score);
            println!("  Level:         {}", verdict.level);
            println!("  Lives:         {}", verdict.lives);
            println!("  Log checksum:  0x{:08x}", verdict.log_checksum);
            if let Some(path) = json_out {
                write_json(&path, &verdict)?;
                println!("  Verdict JSON:  {}", path.display());
            }
        }
        Commands::Batch {
            manifest,
            jobs,
            json_out,
        } => {
            let manifest = load_manifest(&manifest)?;
            let outcomes = run_batch(&manifest, &config, jobs)?;
            for outcome in &outcomes {
                let claim = match outcome.claim_accepted {
                    Some(true) => "accepted",
                    Some(false) => "rejected",
                    None => "-",
                };
                println!(
                    "{:<16} frames={:<7} score={:<7} claim={:<8} {}",
                    outcome.seed,
                    outcome.frames_replayed,
                    outcome.final_score,
                    claim,
                    outcome.error.as_deref().unwrap_or("ok")
                );
            }
            if let Some(path) = json_out {
                write_json(&path, &outcomes)?;
                println!("Batch JSON: {}", path.display());
            }
        }
    }

    Ok(())
}
