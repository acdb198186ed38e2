use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_INPUT_DEADZONE, DEFAULT_MAX_FRAMES, STARTING_LIVES},
    scoring::ExtraLifePolicy,
};

/// Per-session rules. Missing fields in a config file take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub starting_lives: u32,
    pub extra_life: ExtraLifePolicy,
    /// Analog inputs below this are treated as released.
    pub input_deadzone: f64,
    pub ufos_enabled: bool,
    /// Upper bound on frames a replayed log may contain.
    pub max_frames: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            extra_life: ExtraLifePolicy::Disabled,
            input_deadzone: DEFAULT_INPUT_DEADZONE,
            ufos_enabled: true,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"starting_lives": 5}"#).unwrap();
        assert_eq!(config.starting_lives, 5);
        assert_eq!(config.max_frames, DEFAULT_MAX_FRAMES);
        assert_eq!(config.extra_life, ExtraLifePolicy::Disabled);
        assert!(config.ufos_enabled);
    }
}
