//! Repository port for sprint and task persistence.

use crate::planning::domain::{ProjectId, Sprint, SprintId, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for planning repository operations.
pub type PlanningRepositoryResult<T> = Result<T, PlanningRepositoryError>;

/// Records written together as one unit of work.
///
/// A change set is applied entirely or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanningChangeSet {
    inserted_sprints: Vec<Sprint>,
    updated_sprints: Vec<Sprint>,
    removed_sprints: Vec<SprintId>,
    inserted_tasks: Vec<Task>,
    updated_tasks: Vec<Task>,
}

impl PlanningChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new sprint.
    pub fn insert_sprint(&mut self, sprint: Sprint) {
        self.inserted_sprints.push(sprint);
    }

    /// Queues a modified sprint, replacing an earlier queued version.
    pub fn update_sprint(&mut self, sprint: Sprint) {
        replace_or_push(&mut self.updated_sprints, sprint, Sprint::id);
    }

    /// Queues a sprint removal.
    pub fn remove_sprint(&mut self, id: SprintId) {
        self.removed_sprints.push(id);
    }

    /// Queues a new task.
    pub fn insert_task(&mut self, task: Task) {
        self.inserted_tasks.push(task);
    }

    /// Queues a modified task, replacing an earlier queued version.
    pub fn update_task(&mut self, task: Task) {
        replace_or_push(&mut self.updated_tasks, task, Task::id);
    }

    /// Sprints to insert.
    #[must_use]
    pub fn inserted_sprints(&self) -> &[Sprint] {
        &self.inserted_sprints
    }

    /// Sprints to overwrite.
    #[must_use]
    pub fn updated_sprints(&self) -> &[Sprint] {
        &self.updated_sprints
    }

    /// Sprints to delete.
    #[must_use]
    pub fn removed_sprints(&self) -> &[SprintId] {
        &self.removed_sprints
    }

    /// Tasks to insert.
    #[must_use]
    pub fn inserted_tasks(&self) -> &[Task] {
        &self.inserted_tasks
    }

    /// Tasks to overwrite.
    #[must_use]
    pub fn updated_tasks(&self) -> &[Task] {
        &self.updated_tasks
    }

    /// Returns whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted_sprints.is_empty()
            && self.updated_sprints.is_empty()
            && self.removed_sprints.is_empty()
            && self.inserted_tasks.is_empty()
            && self.updated_tasks.is_empty()
    }
}

fn replace_or_push<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let wanted = key(&item);
    match items.iter_mut().find(|existing| key(existing) == wanted) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

/// Sprint and task persistence contract.
#[async_trait]
pub trait PlanningRepository: Send + Sync {
    /// Finds a sprint by identifier.
    ///
    /// Returns `None` when the sprint does not exist.
    async fn find_sprint(&self, id: SprintId) -> PlanningRepositoryResult<Option<Sprint>>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> PlanningRepositoryResult<Option<Task>>;

    /// Returns all sprints of a project ordered by end date descending, then
    /// identifier descending.
    async fn sprints_for_project(&self, project_id: ProjectId)
    -> PlanningRepositoryResult<Vec<Sprint>>;

    /// Returns the tasks currently assigned to a sprint.
    async fn tasks_in_sprint(&self, sprint_id: SprintId) -> PlanningRepositoryResult<Vec<Task>>;

    /// Returns auto-mode sprints whose stored state is not yet done.
    async fn sprints_pending_refresh(&self) -> PlanningRepositoryResult<Vec<Sprint>>;

    /// Applies a change set atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningRepositoryError::DuplicateSprint`] or
    /// [`PlanningRepositoryError::DuplicateTask`] for inserts of existing
    /// identifiers, [`PlanningRepositoryError::SprintNotFound`] or
    /// [`PlanningRepositoryError::TaskNotFound`] for updates of missing
    /// records. Nothing is written when an error is returned.
    async fn commit(&self, changes: PlanningChangeSet) -> PlanningRepositoryResult<()>;
}

/// Errors returned by planning repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PlanningRepositoryError {
    /// A sprint with the same identifier already exists.
    #[error("duplicate sprint identifier: {0}")]
    DuplicateSprint(SprintId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The sprint was not found.
    #[error("sprint not found: {0}")]
    SprintNotFound(SprintId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PlanningRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
