//! Error taxonomy for the assignment engine and its collaborators.

use thiserror::Error;

/// All failure modes the engine and its surrounding tasking driver can
/// surface. Within the engine, `SolverInfeasible` and `SolverTimeout` are
/// recovered by the fallback tiers in [`crate::engine::Engine::calculate`];
/// only the final tier's failure escapes as an `AssignError`.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("invalid day name: {0}")]
    InvalidDay(String),

    #[error("overlap/window operation requires both bounds")]
    MissingInterval,

    #[error("solver returned a non-optimal status: {0}")]
    SolverInfeasible(String),

    #[error("happiness-scoring solve exceeded its time limit without reaching an optimum")]
    SolverTimeout,

    #[error("external collaborator failed: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AssignError {
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AssignError::Upstream(Box::new(err))
    }
}
