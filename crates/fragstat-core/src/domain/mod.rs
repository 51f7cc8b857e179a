//! # Domain Models
//!
//! Canonical domain types for fragstat.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PlayerId`] | Validated account name |
//! | [`Platform`] | Upstream input-method bucket (gamepad, keyboardMouse, touch) |
//! | [`GameMode`] | Mode bucket within a platform |
//! | [`StatsRecord`] | Metrics for one platform/mode cell |
//! | [`UtcDateTime`] | UTC timestamp |

mod mode;
mod platform;
mod player;
mod stats;
mod timestamp;

pub use mode::GameMode;
pub use platform::Platform;
pub use player::PlayerId;
pub use stats::StatsRecord;
pub use timestamp::UtcDateTime;
