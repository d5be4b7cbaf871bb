use thiserror::Error;

/// Errors raised by the simulation engine.
///
/// Degraded statistics never land here: they fall back to role baselines
/// and are reported through `tracing`. These variants are configuration or
/// caller mistakes that leave nothing sensible to simulate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Role {role} has no historical observations to build a baseline from")]
    MissingRoleBaseline { role: String },

    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    #[error("Unit {unit} is not on the roster of {entry}")]
    UnknownUnit { entry: String, unit: String },

    #[error("Unsupported playoff size: {teams} (expected 0, 2, 4, 6 or 8)")]
    UnsupportedPlayoffSize { teams: u32 },

    #[error("Not enough entries: need {needed}, found {found}")]
    NotEnoughEntries { needed: usize, found: usize },

    #[error("Baseline lineup has no slot for role {role}")]
    NoSlotForRole { role: String },

    #[error("Simulation stopped before any trial completed")]
    NoTrialsCompleted,
}

impl SimError {
    /// True when retrying with a different [`crate::engine::SimulationControl`]
    /// could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimError::NoTrialsCompleted)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
