pub mod body;
pub mod config;
pub mod constants;
pub mod entities;
pub mod error;
pub mod events;
pub mod geometry;
pub mod headless;
pub mod hit_area;
pub mod input;
pub mod input_log;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod tick_queue;
pub mod verify;

pub use config::SessionConfig;
pub use error::{LogError, VerifyError};
pub use events::{GameEvent, Subscription, Topic, TopicSet};
pub use geometry::{Vec2, WorldSize};
pub use headless::HeadlessGame;
pub use input::{Control, InputState};
pub use input_log::{read_log, InputLogWriter, LogFrame, LogHeader, LogReader};
pub use rng::{CosmeticRng, RandomSource, SeededRng};
pub use scoring::ExtraLifePolicy;
pub use session::{GameState, GameStateSnapshot, GameStatus, Session};
pub use verify::{verify_claim, Verdict};
