use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MIN_PLAYER_ID_LEN: usize = 3;
const MAX_PLAYER_ID_LEN: usize = 16;

/// Validated account display name used as the upstream `name` parameter.
///
/// Case is preserved: the upstream lookup is case-insensitive but the value also seeds
/// record identifiers, which should read the way the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPlayerId);
        }

        let len = trimmed.chars().count();
        if !(MIN_PLAYER_ID_LEN..=MAX_PLAYER_ID_LEN).contains(&len) {
            return Err(ValidationError::PlayerIdLength {
                len,
                min: MIN_PLAYER_ID_LEN,
                max: MAX_PLAYER_ID_LEN,
            });
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                return Err(ValidationError::PlayerIdInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for PlayerId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}
