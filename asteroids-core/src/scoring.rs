use serde::{Deserialize, Serialize};

/// How score converts into extra lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtraLifePolicy {
    #[default]
    Disabled,
    /// One life every time the score crosses a multiple of `step`.
    EveryPoints { step: u32 },
}

impl ExtraLifePolicy {
    /// Lives earned by moving the score from `before` to `after`.
    pub fn lives_awarded(self, before: u32, after: u32) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::EveryPoints { step: 0 } => 0,
            Self::EveryPoints { step } => (after / step).saturating_sub(before / step),
        }
    }
}
