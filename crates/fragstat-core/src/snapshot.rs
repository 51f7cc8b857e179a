use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::PlatformStats;
use crate::{GameMode, Platform, PlayerId, StatsRecord, UtcDateTime};

/// Immutable result of one complete refresh cycle.
///
/// Every requested platform is present; a cycle that cannot fill all of them produces
/// no snapshot at all. Replace, never patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    player: PlayerId,
    platforms: Vec<Platform>,
    modes: Vec<GameMode>,
    stats: BTreeMap<Platform, PlatformStats>,
    live: bool,
    fetched_at: UtcDateTime,
}

impl Snapshot {
    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    /// Platforms requested for this cycle, in request order.
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Modes requested for this cycle, in request order.
    pub fn modes(&self) -> &[GameMode] {
        &self.modes
    }

    pub fn stats(&self) -> &BTreeMap<Platform, PlatformStats> {
        &self.stats
    }

    pub fn platform(&self, platform: Platform) -> Option<&PlatformStats> {
        self.stats.get(&platform)
    }

    pub fn record(&self, platform: Platform, mode: GameMode) -> Option<&StatsRecord> {
        self.stats.get(&platform)?.get(&mode)
    }

    /// True iff every constituent fetch used live upstream data.
    pub const fn is_live(&self) -> bool {
        self.live
    }

    pub const fn fetched_at(&self) -> UtcDateTime {
        self.fetched_at
    }

    /// Every (platform, mode, record) cell.
    pub fn cells(&self) -> impl Iterator<Item = (Platform, GameMode, &StatsRecord)> + '_ {
        self.stats.iter().flat_map(|(&platform, modes)| {
            modes.iter().map(move |(&mode, record)| (platform, mode, record))
        })
    }
}

/// Accumulates per-platform results during a cycle.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    player: PlayerId,
    platforms: Vec<Platform>,
    modes: Vec<GameMode>,
    stats: BTreeMap<Platform, PlatformStats>,
    live: bool,
}

impl SnapshotBuilder {
    pub fn new(player: PlayerId, platforms: &[Platform], modes: &[GameMode], live: bool) -> Self {
        Self {
            player,
            platforms: platforms.to_vec(),
            modes: modes.to_vec(),
            stats: BTreeMap::new(),
            live,
        }
    }

    pub fn insert(&mut self, platform: Platform, stats: PlatformStats) -> &mut Self {
        self.stats.insert(platform, stats);
        self
    }

    /// Builder used in tests and fixtures: one record per call.
    pub fn with_record(mut self, platform: Platform, mode: GameMode, record: StatsRecord) -> Self {
        self.stats.entry(platform).or_default().insert(mode, record);
        self
    }

    pub fn build(self) -> Snapshot {
        self.build_at(UtcDateTime::now())
    }

    pub fn build_at(self, fetched_at: UtcDateTime) -> Snapshot {
        Snapshot {
            player: self.player,
            platforms: self.platforms,
            modes: self.modes,
            stats: self.stats,
            live: self.live,
            fetched_at,
        }
    }
}
