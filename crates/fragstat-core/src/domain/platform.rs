use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream input-method bucket (the `image` query parameter).
///
/// Consoles share the `gamepad` bucket and PC shares `keyboardMouse`, so user-facing
/// aliases collapse onto three upstream keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    Gamepad,
    KeyboardMouse,
    Touch,
}

impl Platform {
    pub const ALL: [Self; 3] = [Self::Gamepad, Self::KeyboardMouse, Self::Touch];

    /// Key used in the request `image` parameter and the `data.stats` payload object.
    pub const fn image_key(self) -> &'static str {
        match self {
            Self::Gamepad => "gamepad",
            Self::KeyboardMouse => "keyboardMouse",
            Self::Touch => "touch",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Gamepad => "Console",
            Self::KeyboardMouse => "PC",
            Self::Touch => "Mobile",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.image_key())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gamepad" | "xbox" | "psn" | "ps" | "switch" | "console" => Ok(Self::Gamepad),
            "keyboardmouse" | "kbm" | "pc" => Ok(Self::KeyboardMouse),
            "touch" | "mobile" => Ok(Self::Touch),
            _ => Err(ValidationError::InvalidPlatform {
                value: value.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.image_key().to_owned()
    }
}
