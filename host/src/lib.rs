pub mod autopilot;

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use asteroids_core::{
    rng::seed_hash, verify_claim, Control, GameStateSnapshot, GameStatus, HeadlessGame,
    InputLogWriter, Session, SessionConfig, Verdict, WorldSize,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autopilot::create_pilot;

pub const MAX_FRAMES_ENV: &str = "ASTEROIDS_MAX_FRAMES";
pub const STARTING_LIVES_ENV: &str = "ASTEROIDS_STARTING_LIVES";

/// Frame duration used by the recorder, roughly 60fps.
pub const FRAME_MS: u32 = 16;

pub fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

/// Session rules from an optional JSON file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_str::<SessionConfig>(&raw)
                .with_context(|| format!("invalid config json in {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    config.max_frames = read_env_u32(MAX_FRAMES_ENV, config.max_frames);
    config.starting_lives = read_env_u32(STARTING_LIVES_ENV, config.starting_lives);
    Ok(config)
}

#[derive(Clone, Debug)]
pub struct RecordOptions {
    pub seed: String,
    pub frames: u32,
    pub width: u16,
    pub height: u16,
    pub pilot: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecordMetrics {
    pub pilot: String,
    pub seed: String,
    pub seed_hash: u32,
    pub frame_count: u32,
    pub final_score: u32,
    pub final_level: u32,
    pub final_lives: u32,
    pub finished: bool,
    pub fingerprint: u64,
    pub action_frames: u32,
    pub turn_frames: u32,
    pub thrust_frames: u32,
    pub fire_frames: u32,
}

#[derive(Clone, Debug)]
pub struct RecordArtifact {
    pub metrics: RecordMetrics,
    pub log: Vec<u8>,
}

/// Plays a scripted session live, recording every frame, then replays the
/// result to make sure the log reproduces it.
pub fn record_session(options: &RecordOptions, config: &SessionConfig) -> Result<RecordArtifact> {
    if options.frames == 0 {
        bail!("frames must be > 0");
    }
    if options.frames > config.max_frames {
        bail!(
            "frames {} exceeds the replay limit {}",
            options.frames,
            config.max_frames
        );
    }

    let mut pilot =
        create_pilot(&options.pilot).ok_or_else(|| anyhow!("unknown pilot '{}'", options.pilot))?;
    let mut writer = InputLogWriter::new(options.width, options.height)
        .context("failed to start input log")?;
    let world = WorldSize::new(f64::from(options.width), f64::from(options.height));
    let mut session = Session::seeded(&options.seed, world, config.clone());
    session.start();

    let mut action_frames = 0u32;
    let mut turn_frames = 0u32;
    let mut thrust_frames = 0u32;
    let mut fire_frames = 0u32;
    for _ in 0..options.frames {
        if session.status() == GameStatus::Finished {
            break;
        }
        let input = pilot.next_input(&session);
        let frame = writer
            .record(FRAME_MS, options.width, options.height, &input)
            .context("failed to record frame")?;

        if !frame.input.is_idle() {
            action_frames += 1;
        }
        if frame.input.turn() != 0.0 {
            turn_frames += 1;
        }
        if frame.input.thrust() > 0.0 {
            thrust_frames += 1;
        }
        if frame.input.pressed(Control::Fire) {
            fire_frames += 1;
        }

        session.tick_frame(&frame);
    }

    let live = session.snapshot();
    let frame_count = writer.frame_count();
    let log = writer.finish();
    let verdict = verify_claim(&options.seed, &log, live.score, config)
        .map_err(|err| anyhow!("recorded log failed verification: {err}"))?;
    if verdict.fingerprint != live.fingerprint {
        bail!(
            "replay diverged from live session: live={:#018x} replay={:#018x}",
            live.fingerprint,
            verdict.fingerprint
        );
    }
    info!(
        seed = %options.seed,
        frames = frame_count,
        score = live.score,
        "session recorded"
    );

    Ok(RecordArtifact {
        metrics: RecordMetrics {
            pilot: pilot.id().to_string(),
            seed: options.seed.clone(),
            seed_hash: seed_hash(&options.seed),
            frame_count,
            final_score: live.score,
            final_level: live.level,
            final_lives: live.lives,
            finished: live.status == GameStatus::Finished,
            fingerprint: live.fingerprint,
            action_frames,
            turn_frames,
            thrust_frames,
            fire_frames,
        },
        log,
    })
}

pub fn write_log(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

pub fn read_log_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read input log: {}", path.display()))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).context("failed to serialize json output")?;
    write_log(path, &json)
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub seed: String,
    pub completed: bool,
    pub error: Option<String>,
    pub frames_replayed: u32,
    pub log_checksum: Option<u32>,
    pub state: GameStateSnapshot,
}

pub fn replay_bytes(seed: &str, bytes: &[u8], config: &SessionConfig) -> ReplayReport {
    let game = HeadlessGame::run(seed, bytes, config);
    ReplayReport {
        seed: seed.to_string(),
        completed: game.completed(),
        error: game.error().map(ToString::to_string),
        frames_replayed: game.frames_replayed(),
        log_checksum: game.header().map(|header| header.checksum),
        state: game.state(),
    }
}

pub fn replay_file(seed: &str, path: &Path, config: &SessionConfig) -> Result<ReplayReport> {
    let bytes = read_log_file(path)?;
    Ok(replay_bytes(seed, &bytes, config))
}

pub fn verify_file(
    seed: &str,
    path: &Path,
    claimed_score: u32,
    config: &SessionConfig,
) -> Result<Verdict> {
    let bytes = read_log_file(path)?;
    verify_claim(seed, &bytes, claimed_score, config)
        .with_context(|| format!("claim rejected for {}", path.display()))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchEntry {
    pub seed: String,
    /// Relative paths are resolved against the manifest's directory.
    pub log: PathBuf,
    #[serde(default)]
    pub claimed_score: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchManifest {
    pub runs: Vec<BatchEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchOutcome {
    pub seed: String,
    pub log: PathBuf,
    pub completed: bool,
    pub error: Option<String>,
    pub frames_replayed: u32,
    pub final_score: u32,
    /// `None` when the entry made no claim.
    pub claim_accepted: Option<bool>,
}

pub fn load_manifest(path: &Path) -> Result<BatchManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading manifest {}", path.display()))?;
    let mut manifest: BatchManifest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid manifest json in {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for entry in &mut manifest.runs {
        if entry.log.is_relative() {
            entry.log = base.join(&entry.log);
        }
    }
    Ok(manifest)
}

/// Replays every manifest entry independently, in parallel.
pub fn run_batch(
    manifest: &BatchManifest,
    config: &SessionConfig,
    jobs: Option<usize>,
) -> Result<Vec<BatchOutcome>> {
    if manifest.runs.is_empty() {
        bail!("batch manifest has no runs");
    }
    if jobs == Some(0) {
        bail!("batch --jobs must be >= 1 when provided");
    }

    let run_one = |entry: &BatchEntry| -> Result<BatchOutcome> {
        let report = replay_file(&entry.seed, &entry.log, config).with_context(|| {
            format!(
                "batch run failed for seed={} log={}",
                entry.seed,
                entry.log.display()
            )
        })?;
        let claim_accepted = entry
            .claimed_score
            .map(|claimed| report.completed && report.state.score == claimed);
        debug!(seed = %entry.seed, score = report.state.score, "batch entry replayed");
        Ok(BatchOutcome {
            seed: entry.seed.clone(),
            log: entry.log.clone(),
            completed: report.completed,
            error: report.error,
            frames_replayed: report.frames_replayed,
            final_score: report.state.score,
            claim_accepted,
        })
    };

    let results: Vec<Result<BatchOutcome>> = if let Some(jobs) = jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| manifest.runs.par_iter().map(run_one).collect())
    } else {
        manifest.runs.par_iter().map(run_one).collect()
    };

    results.into_iter().collect()
}
