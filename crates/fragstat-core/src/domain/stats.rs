use serde::{Deserialize, Serialize};

use crate::{GameMode, Platform, PlayerId, UtcDateTime, ValidationError};

/// Lifetime (or windowed) metrics for one platform/mode cell.
///
/// Counts are unsigned so they cannot go negative; ratio fields are checked by
/// [`StatsRecord::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub id: String,
    pub kills: u64,
    pub matches: u64,
    /// Fraction of matches won, `0.0..=1.0`.
    pub win_ratio: f64,
    pub kd: f64,
    pub kills_per_match: f64,
    /// Victory royales. The upstream calls this field `wins`.
    pub top1: u64,
    pub top3: u64,
    pub top5: u64,
    pub top6: u64,
    pub top10: u64,
    pub top12: u64,
    pub top25: u64,
    pub score: u64,
    pub score_per_match: f64,
    pub minutes_played: u64,
    pub last_modified: Option<UtcDateTime>,
}

impl StatsRecord {
    /// Zeroed record carrying only its identifier.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kills: 0,
            matches: 0,
            win_ratio: 0.0,
            kd: 0.0,
            kills_per_match: 0.0,
            top1: 0,
            top3: 0,
            top5: 0,
            top6: 0,
            top10: 0,
            top12: 0,
            top25: 0,
            score: 0,
            score_per_match: 0.0,
            minutes_played: 0,
            last_modified: None,
        }
    }

    /// `{player}_{platform}_{mode}`, the identifier every record carries.
    pub fn record_id(player: &PlayerId, platform: Platform, mode: GameMode) -> String {
        format!("{}_{}_{}", player, platform.image_key(), mode.as_str())
    }

    pub fn wins(&self) -> u64 {
        self.top1
    }

    /// Deaths estimated as `matches - wins`; every non-winning match ends in exactly one death.
    pub fn estimated_deaths(&self) -> u64 {
        self.matches.saturating_sub(self.top1)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_ratio("kd", self.kd)?;
        validate_ratio("kills_per_match", self.kills_per_match)?;
        validate_ratio("score_per_match", self.score_per_match)?;
        validate_ratio("win_ratio", self.win_ratio)?;
        if self.win_ratio > 1.0 {
            return Err(ValidationError::WinRatioOutOfRange {
                value: self.win_ratio,
            });
        }
        Ok(())
    }
}

fn validate_ratio(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
