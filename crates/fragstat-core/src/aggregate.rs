//! Cross-platform and cross-mode roll-ups over a finished [`Snapshot`].
//!
//! Counts are summed. Rate-like metrics are recomputed from summed numerators and
//! denominators rather than averaged per cell, so cells with more matches weigh more.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;
use crate::{GameMode, Platform, StatsRecord, ValidationError};

/// Named roll-up metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Eliminations,
    Wins,
    Matches,
    WinRate,
    Kd,
    Top3,
    Top5,
    Top6,
    Top10,
    Top12,
    Top25,
    Score,
    MinutesPlayed,
}

impl Metric {
    pub const ALL: [Self; 13] = [
        Self::Eliminations,
        Self::Wins,
        Self::Matches,
        Self::WinRate,
        Self::Kd,
        Self::Top3,
        Self::Top5,
        Self::Top6,
        Self::Top10,
        Self::Top12,
        Self::Top25,
        Self::Score,
        Self::MinutesPlayed,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Eliminations => "eliminations",
            Self::Wins => "wins",
            Self::Matches => "matches",
            Self::WinRate => "win_rate",
            Self::Kd => "kd",
            Self::Top3 => "top3",
            Self::Top5 => "top5",
            Self::Top6 => "top6",
            Self::Top10 => "top10",
            Self::Top12 => "top12",
            Self::Top25 => "top25",
            Self::Score => "score",
            Self::MinutesPlayed => "minutes_played",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Eliminations => "Eliminations",
            Self::Wins => "Wins",
            Self::Matches => "Matches",
            Self::WinRate => "Win Rate",
            Self::Kd => "K/D Ratio",
            Self::Top3 => "Top 3",
            Self::Top5 => "Top 5",
            Self::Top6 => "Top 6",
            Self::Top10 => "Top 10",
            Self::Top12 => "Top 12",
            Self::Top25 => "Top 25",
            Self::Score => "Score",
            Self::MinutesPlayed => "Minutes Played",
        }
    }

    /// Ratio metrics are weighted; everything else is a plain sum.
    pub const fn is_ratio(self) -> bool {
        matches!(self, Self::WinRate | Self::Kd)
    }

    fn count(self, record: &StatsRecord) -> u64 {
        match self {
            Self::Eliminations => record.kills,
            Self::Wins => record.top1,
            Self::Matches => record.matches,
            Self::Top3 => record.top3,
            Self::Top5 => record.top5,
            Self::Top6 => record.top6,
            Self::Top10 => record.top10,
            Self::Top12 => record.top12,
            Self::Top25 => record.top25,
            Self::Score => record.score,
            Self::MinutesPlayed => record.minutes_played,
            Self::WinRate | Self::Kd => 0,
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "kills" => return Ok(Self::Eliminations),
            "top1" => return Ok(Self::Wins),
            "win_ratio" | "winrate" => return Ok(Self::WinRate),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|metric| metric.key() == normalized)
            .ok_or_else(|| ValidationError::InvalidMetric {
                value: value.to_owned(),
            })
    }
}

/// Platform × mode subset of a snapshot. `None` selects everything the snapshot holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    platforms: Option<Vec<Platform>>,
    modes: Option<Vec<GameMode>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(
        platforms: impl IntoIterator<Item = Platform>,
        modes: impl IntoIterator<Item = GameMode>,
    ) -> Self {
        Self {
            platforms: Some(platforms.into_iter().collect()),
            modes: Some(modes.into_iter().collect()),
        }
    }

    pub fn platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = Some(platforms.into_iter().collect());
        self
    }

    pub fn modes(mut self, modes: impl IntoIterator<Item = GameMode>) -> Self {
        self.modes = Some(modes.into_iter().collect());
        self
    }

    pub fn includes(&self, platform: Platform, mode: GameMode) -> bool {
        self.platforms
            .as_ref()
            .map_or(true, |platforms| platforms.contains(&platform))
            && self.modes.as_ref().map_or(true, |modes| modes.contains(&mode))
    }

    /// Platforms of `snapshot` this selection covers, in snapshot order.
    pub fn platforms_in(&self, snapshot: &Snapshot) -> Vec<Platform> {
        snapshot
            .platforms()
            .iter()
            .copied()
            .filter(|platform| {
                self.platforms
                    .as_ref()
                    .map_or(true, |wanted| wanted.contains(platform))
            })
            .collect()
    }

    pub fn modes_in(&self, snapshot: &Snapshot) -> Vec<GameMode> {
        snapshot
            .modes()
            .iter()
            .copied()
            .filter(|mode| self.modes.as_ref().map_or(true, |wanted| wanted.contains(mode)))
            .collect()
    }
}

/// Named selections exposed as ready-made roll-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatePreset {
    AllPlatformsAllModes,
    ConsoleAllModes,
    PcAllModes,
    AllPlatformsSolo,
    AllPlatformsDuo,
    AllPlatformsSquad,
}

impl AggregatePreset {
    pub const ALL: [Self; 6] = [
        Self::AllPlatformsAllModes,
        Self::ConsoleAllModes,
        Self::PcAllModes,
        Self::AllPlatformsSolo,
        Self::AllPlatformsDuo,
        Self::AllPlatformsSquad,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::AllPlatformsAllModes => "all_platforms_all_modes",
            Self::ConsoleAllModes => "console_all_modes",
            Self::PcAllModes => "pc_all_modes",
            Self::AllPlatformsSolo => "all_platforms_solo",
            Self::AllPlatformsDuo => "all_platforms_duo",
            Self::AllPlatformsSquad => "all_platforms_squad",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::AllPlatformsAllModes => "All Platforms All Modes",
            Self::ConsoleAllModes => "Console All Modes",
            Self::PcAllModes => "PC All Modes",
            Self::AllPlatformsSolo => "All Platforms Solo",
            Self::AllPlatformsDuo => "All Platforms Duo",
            Self::AllPlatformsSquad => "All Platforms Squad",
        }
    }

    pub fn selection(self) -> Selection {
        match self {
            Self::AllPlatformsAllModes => Selection::all(),
            Self::ConsoleAllModes => Selection::all().platforms([Platform::Gamepad]),
            Self::PcAllModes => Selection::all().platforms([Platform::KeyboardMouse]),
            Self::AllPlatformsSolo => Selection::all().modes([GameMode::Solo]),
            Self::AllPlatformsDuo => Selection::all().modes([GameMode::Duo]),
            Self::AllPlatformsSquad => Selection::all().modes([GameMode::Squad]),
        }
    }
}

impl Display for AggregatePreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AggregatePreset {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.key() == normalized)
            .ok_or_else(|| ValidationError::InvalidPreset {
                value: value.to_owned(),
            })
    }
}

/// Computes one roll-up value over the selected cells of `snapshot`.
///
/// * additive metrics: sum over every selected cell, saturating at `u64::MAX`
/// * [`Metric::WinRate`]: `round(100 * Σwins / Σmatches, 1)`, `0.0` without matches
/// * [`Metric::Kd`]: `round(Σkills / Σ(matches - wins), 3)`, `0.0` without deaths
///
/// Cells with zero matches do not contribute to the ratio metrics.
pub fn aggregate(snapshot: &Snapshot, selection: &Selection, metric: Metric) -> f64 {
    let cells = snapshot
        .cells()
        .filter(|(platform, mode, _)| selection.includes(*platform, *mode))
        .map(|(_, _, record)| record);

    match metric {
        Metric::WinRate => {
            let (wins, matches) = cells
                .filter(|record| record.matches > 0)
                .fold((0_u64, 0_u64), |(wins, matches), record| {
                    (
                        wins.saturating_add(record.top1),
                        matches.saturating_add(record.matches),
                    )
                });
            if matches == 0 {
                return 0.0;
            }
            round_to(100.0 * wins as f64 / matches as f64, 1)
        }
        Metric::Kd => {
            let (kills, deaths) = cells
                .filter(|record| record.matches > 0)
                .fold((0_u64, 0_u64), |(kills, deaths), record| {
                    (
                        kills.saturating_add(record.kills),
                        deaths.saturating_add(record.estimated_deaths()),
                    )
                });
            if deaths == 0 {
                return 0.0;
            }
            round_to(kills as f64 / deaths as f64, 3)
        }
        additive => cells
            .map(|record| additive.count(record))
            .fold(0_u64, u64::saturating_add) as f64,
    }
}

/// Every metric for one preset, keyed by metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub preset: AggregatePreset,
    pub display_name: &'static str,
    pub platforms: Vec<Platform>,
    pub modes: Vec<GameMode>,
    pub values: BTreeMap<Metric, f64>,
}

impl Rollup {
    pub fn value(&self, metric: Metric) -> f64 {
        self.values.get(&metric).copied().unwrap_or(0.0)
    }
}

pub fn rollup(snapshot: &Snapshot, preset: AggregatePreset) -> Rollup {
    let selection = preset.selection();
    Rollup {
        preset,
        display_name: preset.display_name(),
        platforms: selection.platforms_in(snapshot),
        modes: selection.modes_in(snapshot),
        values: Metric::ALL
            .into_iter()
            .map(|metric| (metric, aggregate(snapshot, &selection, metric)))
            .collect(),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::PlayerId;

    fn cell(kills: u64, matches: u64, wins: u64) -> StatsRecord {
        let mut record = StatsRecord::empty("cell");
        record.kills = kills;
        record.matches = matches;
        record.top1 = wins;
        record
    }

    fn gamepad_snapshot() -> Snapshot {
        SnapshotBuilder::new(
            PlayerId::parse("test_player").expect("valid player id"),
            &[Platform::Gamepad],
            &GameMode::DEFAULTS,
            true,
        )
        .with_record(Platform::Gamepad, GameMode::Solo, cell(100, 50, 10))
        .with_record(Platform::Gamepad, GameMode::Duo, cell(50, 25, 5))
        .with_record(Platform::Gamepad, GameMode::Squad, cell(200, 100, 25))
        .build()
    }

    #[test]
    fn weighted_rollup_matches_reference_values() {
        let snapshot = gamepad_snapshot();
        let all = Selection::all();

        assert_eq!(aggregate(&snapshot, &all, Metric::Eliminations), 350.0);
        assert_eq!(aggregate(&snapshot, &all, Metric::Matches), 175.0);
        assert_eq!(aggregate(&snapshot, &all, Metric::Wins), 40.0);
        assert_eq!(aggregate(&snapshot, &all, Metric::WinRate), 22.9);
        assert_eq!(aggregate(&snapshot, &all, Metric::Kd), 2.593);
    }

    #[test]
    fn ratios_are_zero_without_matches_or_deaths() {
        let empty = SnapshotBuilder::new(
            PlayerId::parse("test_player").expect("valid player id"),
            &[Platform::Touch],
            &[GameMode::Solo],
            true,
        )
        .with_record(Platform::Touch, GameMode::Solo, cell(0, 0, 0))
        .build();
        assert_eq!(aggregate(&empty, &Selection::all(), Metric::WinRate), 0.0);
        assert_eq!(aggregate(&empty, &Selection::all(), Metric::Kd), 0.0);

        let flawless = SnapshotBuilder::new(
            PlayerId::parse("test_player").expect("valid player id"),
            &[Platform::Touch],
            &[GameMode::Solo],
            true,
        )
        .with_record(Platform::Touch, GameMode::Solo, cell(12, 3, 3))
        .build();
        assert_eq!(aggregate(&flawless, &Selection::all(), Metric::Kd), 0.0);
        assert_eq!(aggregate(&flawless, &Selection::all(), Metric::WinRate), 100.0);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let half = u64::MAX / 2 + 1;
        let snapshot = SnapshotBuilder::new(
            PlayerId::parse("test_player").expect("valid player id"),
            &[Platform::Gamepad],
            &[GameMode::Solo, GameMode::Duo],
            true,
        )
        .with_record(Platform::Gamepad, GameMode::Solo, cell(half, half, 0))
        .with_record(Platform::Gamepad, GameMode::Duo, cell(half, half, 0))
        .build();
        let all = Selection::all();

        assert_eq!(aggregate(&snapshot, &all, Metric::Eliminations), u64::MAX as f64);
        assert_eq!(aggregate(&snapshot, &all, Metric::Matches), u64::MAX as f64);
        assert_eq!(aggregate(&snapshot, &all, Metric::Kd), 1.0);
        assert_eq!(aggregate(&snapshot, &all, Metric::WinRate), 0.0);
    }

    #[test]
    fn selection_narrows_cells() {
        let snapshot = gamepad_snapshot();

        let solo = Selection::all().modes([GameMode::Solo]);
        assert_eq!(aggregate(&snapshot, &solo, Metric::Eliminations), 100.0);
        assert_eq!(aggregate(&snapshot, &solo, Metric::WinRate), 20.0);

        let pc = AggregatePreset::PcAllModes.selection();
        assert_eq!(aggregate(&snapshot, &pc, Metric::Eliminations), 0.0);
    }

    #[test]
    fn rollup_computes_every_metric_for_a_preset() {
        let snapshot = gamepad_snapshot();
        let rollup = rollup(&snapshot, AggregatePreset::ConsoleAllModes);

        assert_eq!(rollup.display_name, "Console All Modes");
        assert_eq!(rollup.platforms, vec![Platform::Gamepad]);
        assert_eq!(rollup.modes, GameMode::DEFAULTS.to_vec());
        assert_eq!(rollup.values.len(), Metric::ALL.len());
        assert_eq!(rollup.value(Metric::Kd), 2.593);
    }

    #[test]
    fn metric_and_preset_keys_parse() {
        assert_eq!("eliminations".parse::<Metric>(), Ok(Metric::Eliminations));
        assert_eq!("kills".parse::<Metric>(), Ok(Metric::Eliminations));
        assert_eq!("WIN_RATE".parse::<Metric>(), Ok(Metric::WinRate));
        assert!("headshots".parse::<Metric>().is_err());

        for preset in AggregatePreset::ALL {
            assert_eq!(preset.key().parse::<AggregatePreset>(), Ok(preset));
        }
        assert!(matches!(
            "mobile_all_modes".parse::<AggregatePreset>(),
            Err(ValidationError::InvalidPreset { .. })
        ));
    }
}
