use crate::common::Float;
use crate::roll::Number;
use serde::{Deserialize, Serialize};

/// How a final value is rounded for display. Stored values keep full precision.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Round {
    /// Truncate to two decimal places.
    None,
    /// Half rounds up.
    #[default]
    Normal,
    Up,
    Down,
}

impl Round {
    pub fn apply(self, value: Number) -> Number {
        let Number::Float(x) = value else {
            return value;
        };
        let rounded: Float = match self {
            Self::None => (x * 100.0).trunc() / 100.0,
            Self::Normal => (x + 0.5).floor(),
            Self::Up => x.ceil(),
            Self::Down => x.floor(),
        };
        Number::Float(rounded)
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    #[default]
    Roll,
    /// Substitute each die's expected value for its rolls.
    Average,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub round: Round,
    pub mode: EvalMode,
    pub max_rolls: Option<usize>,
    pub max_depth: usize,
    pub seed: Option<u64>,
}

impl Settings {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.round = round;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            round: Round::default(),
            mode: EvalMode::default(),
            max_rolls: Some(1000),
            max_depth: 20,
            seed: None,
        }
    }
}
