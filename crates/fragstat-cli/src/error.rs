use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] fragstat_core::ValidationError),

    #[error(transparent)]
    Config(#[from] fragstat_core::ConfigError),

    #[error("refresh failed [{}]: {}", .0.code(), .0)]
    Refresh(#[from] fragstat_core::RefreshError),

    #[error("no snapshot available after {cycles} cycle(s)")]
    NoSnapshot { cycles: u32 },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Refresh(_) => 3,
            Self::NoSnapshot { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
