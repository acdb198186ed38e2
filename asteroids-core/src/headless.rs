use tracing::{debug, warn};

use crate::{
    config::SessionConfig,
    constants::{DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH},
    error::LogError,
    geometry::WorldSize,
    input_log::{LogHeader, LogReader},
    session::{GameStateSnapshot, Session},
};

/// A session driven entirely by a recorded input log.
///
/// Every frame goes through the same [`Session::tick`] the live game uses.
/// Decoding problems never escape: replay stops at the first bad frame and
/// the error is kept for inspection.
pub struct HeadlessGame {
    session: Session,
    header: Option<LogHeader>,
    error: Option<LogError>,
    frames_replayed: u32,
    checkpoints: Vec<GameStateSnapshot>,
}

impl HeadlessGame {
    pub fn run(seed: &str, bytes: &[u8], config: &SessionConfig) -> Self {
        Self::replay(seed, bytes, config, None)
    }

    /// Like [`HeadlessGame::run`], also sampling a snapshot before the first
    /// frame, every `sample_every` frames, and after the last one.
    pub fn run_with_checkpoints(
        seed: &str,
        bytes: &[u8],
        config: &SessionConfig,
        sample_every: u32,
    ) -> Self {
        Self::replay(seed, bytes, config, Some(sample_every.max(1)))
    }

    fn replay(seed: &str, bytes: &[u8], config: &SessionConfig, stride: Option<u32>) -> Self {
        let reader = match LogReader::new(bytes, config.max_frames) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(%err, "input log rejected");
                let world = WorldSize::new(DEFAULT_WORLD_WIDTH, DEFAULT_WORLD_HEIGHT);
                return Self {
                    session: Session::seeded(seed, world, config.clone()),
                    header: None,
                    error: Some(err),
                    frames_replayed: 0,
                    checkpoints: Vec::new(),
                };
            }
        };

        let header = reader.header();
        let mut session = Session::seeded(seed, reader.initial_world(), config.clone());
        session.start();

        let mut checkpoints = Vec::new();
        if stride.is_some() {
            checkpoints.push(session.snapshot());
        }

        let mut error = None;
        let mut frames_replayed = 0;
        for frame in reader {
            match frame {
                Ok(frame) => {
                    session.tick_frame(&frame);
                    frames_replayed = frame.index;
                    if let Some(stride) = stride {
                        if frame.index % stride == 0 || frame.index == header.frame_count {
                            checkpoints.push(session.snapshot());
                        }
                    }
                }
                Err(err) => {
                    warn!(frame = frames_replayed + 1, %err, "replay stopped");
                    error = Some(err);
                    break;
                }
            }
        }

        debug!(
            frames = frames_replayed,
            score = session.state().score,
            completed = error.is_none(),
            "replay finished"
        );

        Self {
            session,
            header: Some(header),
            error,
            frames_replayed,
            checkpoints,
        }
    }

    /// Every frame in the log was decoded and applied.
    pub fn completed(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&LogError> {
        self.error.as_ref()
    }

    pub fn frames_replayed(&self) -> u32 {
        self.frames_replayed
    }

    pub fn state(&self) -> GameStateSnapshot {
        self.session.snapshot()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Envelope of the log, if it got past header validation.
    pub fn header(&self) -> Option<LogHeader> {
        self.header
    }

    pub fn checkpoints(&self) -> &[GameStateSnapshot] {
        &self.checkpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        input::{Control, InputState},
        input_log::InputLogWriter,
        session::GameStatus,
    };

    fn log(frames: u32) -> Vec<u8> {
        let mut writer = InputLogWriter::new(800, 600).unwrap();
        for frame in 0..frames {
            let input = InputState::new().with(Control::Fire, if frame == 0 { 1.0 } else { 0.0 });
            writer.record(16, 800, 600, &input).unwrap();
        }
        writer.finish()
    }

    #[test]
    fn replays_every_frame() {
        let game = HeadlessGame::run("test-1", &log(10), &SessionConfig::default());
        assert!(game.completed());
        assert_eq!(game.frames_replayed(), 10);
        let state = game.state();
        assert_eq!(state.frames, 10);
        assert_eq!(state.score, 0);
        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(game.session().world(), WorldSize::new(800.0, 600.0));
    }

    #[test]
    fn bad_envelope_leaves_an_unstarted_session() {
        let game = HeadlessGame::run("test-1", &[], &SessionConfig::default());
        assert!(!game.completed());
        assert_eq!(game.error(), Some(&LogError::Empty));
        assert_eq!(game.frames_replayed(), 0);
        assert_eq!(game.state().status, GameStatus::Init);
        assert!(game.header().is_none());
    }

    #[test]
    fn frame_limit_is_enforced() {
        let config = SessionConfig {
            max_frames: 5,
            ..SessionConfig::default()
        };
        let game = HeadlessGame::run("test-1", &log(6), &config);
        assert_eq!(
            game.error(),
            Some(&LogError::TooManyFrames {
                frame_count: 6,
                max_frames: 5
            })
        );
    }

    #[test]
    fn checkpoints_sample_start_stride_and_end() {
        let game =
            HeadlessGame::run_with_checkpoints("test-1", &log(25), &SessionConfig::default(), 10);
        let frames: Vec<u64> = game.checkpoints().iter().map(|c| c.frames).collect();
        assert_eq!(frames, vec![0, 10, 20, 25]);
    }
}
