use asteroids_core::{
    read_log, verify_claim, Control, GameStateSnapshot, GameStatus, HeadlessGame, InputLogWriter,
    InputState, LogError, Session, SessionConfig, VerifyError, WorldSize,
};

/// Deterministic pilot: sweeps left and right, thrusts in bursts, fires
/// whenever it can, and occasionally jumps.
fn pilot(frame: u32) -> InputState {
    let phase = frame % 240;
    InputState::new()
        .with(Control::Left, if phase < 60 { 0.6 } else { 0.0 })
        .with(Control::Right, if (120..170).contains(&phase) { 0.9 } else { 0.0 })
        .with(Control::Thrust, if frame % 90 < 20 { 0.75 } else { 0.0 })
        .with(Control::Fire, if frame % 11 == 0 { 1.0 } else { 0.0 })
        .with(Control::Hyperspace, if frame % 1_500 == 777 { 1.0 } else { 0.0 })
}

/// Plays live, feeding the session exactly what the recorder normalised.
fn record(
    seed: &str,
    frames: u32,
    size_at: impl Fn(u32) -> (u16, u16),
) -> (Vec<u8>, GameStateSnapshot) {
    let (width, height) = size_at(0);
    let mut writer = InputLogWriter::new(width, height).expect("writer");
    let world = WorldSize::new(f64::from(width), f64::from(height));
    let mut session = Session::seeded(seed, world, SessionConfig::default());
    session.start();
    for frame in 0..frames {
        let (width, height) = size_at(frame + 1);
        let normalised = writer
            .record(16, width, height, &pilot(frame))
            .expect("record frame");
        session.tick_frame(&normalised);
    }
    (writer.finish(), session.snapshot())
}

fn fixed_size(_: u32) -> (u16, u16) {
    (800, 600)
}

#[test]
fn replay_matches_the_live_session() {
    let (log, live) = record("replay-live", 2_400, fixed_size);
    let game = HeadlessGame::run("replay-live", &log, &SessionConfig::default());
    assert!(game.completed(), "replay failed: {:?}", game.error());
    assert_eq!(game.frames_replayed(), 2_400);
    assert_eq!(game.state(), live);
}

#[test]
fn replay_is_deterministic() {
    let (log, _) = record("repeat", 1_200, fixed_size);
    let first = HeadlessGame::run("repeat", &log, &SessionConfig::default()).state();
    let second = HeadlessGame::run("repeat", &log, &SessionConfig::default()).state();
    assert_eq!(first, second);
}

#[test]
fn seeds_produce_different_games() {
    let (log, _) = record("seed-a", 600, fixed_size);
    let a = HeadlessGame::run("seed-a", &log, &SessionConfig::default()).state();
    let b = HeadlessGame::run("seed-b", &log, &SessionConfig::default()).state();
    assert_ne!(a.fingerprint, b.fingerprint);
}

#[test]
fn mid_game_resizes_replay_identically() {
    let size_at = |frame: u32| {
        if frame < 300 {
            (800, 600)
        } else if frame < 700 {
            (1280, 720)
        } else {
            (640, 480)
        }
    };
    let (log, live) = record("resize", 1_000, size_at);
    let (header, frames) = read_log(&log, 10_000).expect("log decodes");
    assert_eq!((header.width, header.height), (800, 600));
    assert_eq!((frames[299].width, frames[299].height), (1280, 720));
    assert_eq!((frames[999].width, frames[999].height), (640, 480));

    let game = HeadlessGame::run("resize", &log, &SessionConfig::default());
    assert_eq!(game.state(), live);
    assert_eq!(game.session().world(), WorldSize::new(640.0, 480.0));
}

#[test]
fn test_1_scenario_from_a_log() {
    let mut writer = InputLogWriter::new(800, 600).expect("writer");
    writer
        .record(16, 800, 600, &InputState::new().with(Control::Fire, 1.0))
        .expect("fire frame");
    for _ in 0..9 {
        writer.record(16, 800, 600, &InputState::new()).expect("idle frame");
    }
    let log = writer.finish();

    let game = HeadlessGame::run("test-1", &log, &SessionConfig::default());
    assert!(game.completed());
    let state = game.state();
    assert_eq!(state.frames, 10);
    assert_eq!(state.score, 0);
    assert_eq!(state.status, GameStatus::Running);
    assert!(state.ship_alive);
}

#[test]
fn checkpoints_are_reproducible() {
    let (log, _) = record("checkpoints", 1_000, fixed_size);
    let config = SessionConfig::default();
    let a = HeadlessGame::run_with_checkpoints("checkpoints", &log, &config, 100);
    let b = HeadlessGame::run_with_checkpoints("checkpoints", &log, &config, 100);
    assert_eq!(a.checkpoints().len(), 11);
    assert_eq!(a.checkpoints(), b.checkpoints());
    assert!(a
        .checkpoints()
        .windows(2)
        .all(|pair| pair[0].score <= pair[1].score));
}

#[test]
fn verification_round_trip() {
    let (log, live) = record("claim", 1_800, fixed_size);
    let config = SessionConfig::default();

    let verdict = verify_claim("claim", &log, live.score, &config).expect("honest claim");
    assert_eq!(verdict.final_score, live.score);
    assert_eq!(verdict.frame_count, 1_800);
    assert_eq!(verdict.fingerprint, live.fingerprint);

    assert!(matches!(
        verify_claim("claim", &log, live.score + 1, &config),
        Err(VerifyError::ScoreMismatch { .. })
    ));

    let truncated = &log[..log.len() - 1];
    assert!(matches!(
        verify_claim("claim", truncated, live.score, &config),
        Err(VerifyError::Replay(LogError::CrcMismatch { .. }))
    ));
}
