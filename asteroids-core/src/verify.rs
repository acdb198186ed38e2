use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{config::SessionConfig, error::VerifyError, headless::HeadlessGame, rng::seed_hash};

/// Outcome of a successfully verified claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub seed: String,
    pub seed_hash: u32,
    pub frame_count: u32,
    pub final_score: u32,
    pub level: u32,
    pub lives: u32,
    pub log_checksum: u32,
    pub fingerprint: u64,
}

/// Replays `bytes` under `seed` and checks the result against
/// `claimed_score`.
pub fn verify_claim(
    seed: &str,
    bytes: &[u8],
    claimed_score: u32,
    config: &SessionConfig,
) -> Result<Verdict, VerifyError> {
    let game = HeadlessGame::run(seed, bytes, config);
    if let Some(err) = game.error() {
        return Err(VerifyError::Replay(err.clone()));
    }

    let state = game.state();
    if state.score != claimed_score {
        warn!(
            claimed = claimed_score,
            computed = state.score,
            "claimed score does not match replay"
        );
        return Err(VerifyError::ScoreMismatch {
            claimed: claimed_score,
            computed: state.score,
        });
    }

    Ok(Verdict {
        seed: seed.to_owned(),
        seed_hash: seed_hash(seed),
        frame_count: game.frames_replayed(),
        final_score: state.score,
        level: state.level,
        lives: state.lives,
        log_checksum: game.header().map_or(0, |header| header.checksum),
        fingerprint: state.fingerprint,
    })
}
