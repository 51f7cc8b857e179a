use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Game-mode bucket inside a platform's stats object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Solo,
    Duo,
    Trio,
    Squad,
    Ltm,
    Overall,
}

impl GameMode {
    pub const ALL: [Self; 6] = [
        Self::Solo,
        Self::Duo,
        Self::Trio,
        Self::Squad,
        Self::Ltm,
        Self::Overall,
    ];

    /// Modes polled when the configuration does not name any.
    pub const DEFAULTS: [Self; 3] = [Self::Solo, Self::Duo, Self::Squad];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Duo => "duo",
            Self::Trio => "trio",
            Self::Squad => "squad",
            Self::Ltm => "ltm",
            Self::Overall => "overall",
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "duo" => Ok(Self::Duo),
            "trio" => Ok(Self::Trio),
            "squad" => Ok(Self::Squad),
            "ltm" => Ok(Self::Ltm),
            "overall" => Ok(Self::Overall),
            other => Err(ValidationError::InvalidGameMode {
                value: other.to_owned(),
            }),
        }
    }
}
