//! Training/evaluation mode switch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EmbedError;

/// Execution mode passed explicitly to every forward call.
///
/// There is no stored mode on any layer; callers thread the value through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Regularization is active.
    Training,
    /// Regularization is the identity.
    #[default]
    Evaluation,
}

impl Mode {
    #[must_use]
    pub fn is_training(self) -> bool {
        matches!(self, Self::Training)
    }

    /// Map a `train` flag onto a mode.
    #[must_use]
    pub fn from_train_flag(train: bool) -> Self {
        if train { Self::Training } else { Self::Evaluation }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Evaluation => write!(f, "evaluation"),
        }
    }
}

impl FromStr for Mode {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "training" | "train" => Ok(Self::Training),
            "evaluation" | "eval" => Ok(Self::Evaluation),
            other => Err(EmbedError::input(format!("unknown mode: {other}"))),
        }
    }
}
