//! Service-level error type shared by the planning services.

use crate::planning::{
    domain::{PlanningDomainError, Sprint, SprintId, Task, TaskId},
    ports::{PlanningRepository, PlanningRepositoryError},
};
use thiserror::Error;

/// Service-level errors for planning operations.
#[derive(Debug, Error)]
pub enum PlanningServiceError {
    /// The proposed change was rejected by a planning rule.
    #[error(transparent)]
    Domain(#[from] PlanningDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PlanningRepositoryError),
}

impl PlanningServiceError {
    /// Returns the validation rejection, if this is one.
    #[must_use]
    pub const fn as_rejection(&self) -> Option<&PlanningDomainError> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Repository(_) => None,
        }
    }
}

/// Result type for planning service operations.
pub type PlanningServiceResult<T> = Result<T, PlanningServiceError>;

pub(super) async fn load_sprint<R: PlanningRepository>(
    repository: &R,
    id: SprintId,
) -> PlanningServiceResult<Sprint> {
    repository
        .find_sprint(id)
        .await?
        .ok_or(PlanningServiceError::Repository(
            PlanningRepositoryError::SprintNotFound(id),
        ))
}

pub(super) async fn load_task<R: PlanningRepository>(
    repository: &R,
    id: TaskId,
) -> PlanningServiceResult<Task> {
    repository
        .find_task(id)
        .await?
        .ok_or(PlanningServiceError::Repository(
            PlanningRepositoryError::TaskNotFound(id),
        ))
}
