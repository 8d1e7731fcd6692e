//! Task entity extended with sprint membership and deadline coupling.

use super::{PlanningDomainError, ProjectId, Sprint, SprintId, TaskId, TaskName};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Who is writing a task.
///
/// User writes re-derive `deadline_manual`; system-sync writes propagate
/// derived values verbatim and never mark a deadline manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskWriteMode {
    /// An edit coming from a person.
    User,
    /// A propagation issued by the sprint rules.
    SystemSync,
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task title.
    pub name: TaskName,
    /// Owning project, if any.
    pub project_id: Option<ProjectId>,
    /// Sprint membership, if any.
    pub sprint_id: Option<SprintId>,
    /// Explicit deadline, if any.
    pub deadline: Option<NaiveDate>,
    /// Explicit manual flag; only honoured for tasks without a sprint.
    pub deadline_manual: Option<bool>,
}

/// Field changes requested for an existing task.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    name: Option<TaskName>,
    project_id: Option<Option<ProjectId>>,
    sprint_id: Option<Option<SprintId>>,
    deadline: Option<Option<NaiveDate>>,
    deadline_manual: Option<bool>,
}

impl TaskUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the task.
    #[must_use]
    pub fn with_name(mut self, name: TaskName) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets or clears the project.
    #[must_use]
    pub const fn with_project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Assigns the task to a sprint.
    #[must_use]
    pub const fn assign_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(Some(sprint_id));
        self
    }

    /// Removes the task from its sprint.
    #[must_use]
    pub const fn clear_sprint(mut self) -> Self {
        self.sprint_id = Some(None);
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(Some(deadline));
        self
    }

    /// Clears the deadline.
    #[must_use]
    pub const fn clear_deadline(mut self) -> Self {
        self.deadline = Some(None);
        self
    }

    /// Sets the manual deadline flag explicitly.
    ///
    /// User writes on a task inside a sprint re-derive the flag from the
    /// deadline instead.
    #[must_use]
    pub const fn with_deadline_manual(mut self, manual: bool) -> Self {
        self.deadline_manual = Some(manual);
        self
    }

    /// Returns the requested sprint change.
    #[must_use]
    pub const fn sprint_change(&self) -> Option<Option<SprintId>> {
        self.sprint_id
    }

    /// Returns whether the update touches a field checked against the
    /// sprint.
    #[must_use]
    pub const fn touches_sprint_constraints(&self) -> bool {
        self.sprint_id.is_some() || self.deadline.is_some() || self.project_id.is_some()
    }

    /// Returns whether the update can change the duplicate-name outcome.
    #[must_use]
    pub const fn touches_identity(&self) -> bool {
        self.name.is_some() || self.sprint_id.is_some() || self.project_id.is_some()
    }
}

/// Task record as seen by the planning rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    project_id: Option<ProjectId>,
    sprint_id: Option<SprintId>,
    deadline: Option<NaiveDate>,
    deadline_manual: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub name: TaskName,
    /// Persisted project.
    pub project_id: Option<ProjectId>,
    /// Persisted sprint membership.
    pub sprint_id: Option<SprintId>,
    /// Persisted deadline.
    pub deadline: Option<NaiveDate>,
    /// Persisted manual deadline flag.
    pub deadline_manual: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task, inheriting its deadline from `sprint` when none is
    /// given.
    ///
    /// `sprint` must be the record referenced by `params.sprint_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanningDomainError`] when the task violates the sprint
    /// constraints.
    pub fn create(
        params: NewTask,
        sprint: Option<&Sprint>,
        clock: &impl Clock,
    ) -> Result<Self, PlanningDomainError> {
        let now = clock.utc();
        let (deadline, deadline_manual) = match sprint {
            Some(owner) => match params.deadline {
                None => (Some(owner.end_date()), false),
                Some(date) => (Some(date), date != owner.end_date()),
            },
            None => (params.deadline, params.deadline_manual.unwrap_or(false)),
        };

        let task = Self {
            id: TaskId::new(),
            name: params.name,
            project_id: params.project_id,
            sprint_id: sprint.map(Sprint::id),
            deadline,
            deadline_manual,
            created_at: now,
            updated_at: now,
        };
        task.check_sprint_constraints(sprint)?;
        Ok(task)
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            project_id: data.project_id,
            sprint_id: data.sprint_id,
            deadline: data.deadline,
            deadline_manual: data.deadline_manual,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the sprint membership.
    #[must_use]
    pub const fn sprint_id(&self) -> Option<SprintId> {
        self.sprint_id
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    /// Returns whether the deadline was pinned away from the sprint end.
    #[must_use]
    pub const fn deadline_manual(&self) -> bool {
        self.deadline_manual
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies an update.
    ///
    /// `sprint` is the sprint the task belongs to once the update lands:
    /// the newly assigned one, the current one, or `None` when cleared.
    ///
    /// User writes follow the deadline rules: assigning a sprint resets the
    /// deadline to the sprint end, and a deadline or manual-flag change on a
    /// task inside a sprint re-derives `deadline_manual`. System-sync writes
    /// apply fields as given.
    pub fn apply_update(
        &mut self,
        update: &TaskUpdate,
        mode: TaskWriteMode,
        sprint: Option<&Sprint>,
        clock: &impl Clock,
    ) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(project_id) = update.project_id {
            self.project_id = project_id;
        }
        if let Some(sprint_id) = update.sprint_id {
            self.sprint_id = sprint_id;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        if let Some(manual) = update.deadline_manual {
            self.deadline_manual = manual;
        }

        if mode == TaskWriteMode::User {
            self.derive_deadline(update, sprint);
        }
        self.touch(clock);
    }

    /// Snaps the deadline to the sprint end through the system-sync path.
    ///
    /// Returns whether anything changed.
    pub fn sync_deadline(&mut self, end_date: NaiveDate, clock: &impl Clock) -> bool {
        if self.deadline == Some(end_date) && !self.deadline_manual {
            return false;
        }
        let sync = TaskUpdate::new()
            .with_deadline(end_date)
            .with_deadline_manual(false);
        self.apply_update(&sync, TaskWriteMode::SystemSync, None, clock);
        true
    }

    /// Checks project membership and deadline bounds against `sprint`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::TaskProjectMismatch`],
    /// [`PlanningDomainError::DeadlineBeforeSprintStart`] or
    /// [`PlanningDomainError::DeadlineAfterSprintEnd`].
    pub fn check_sprint_constraints(
        &self,
        sprint: Option<&Sprint>,
    ) -> Result<(), PlanningDomainError> {
        let Some(owner) = sprint else {
            return Ok(());
        };

        if self
            .project_id
            .is_some_and(|project| project != owner.project_id())
        {
            return Err(PlanningDomainError::TaskProjectMismatch {
                task_name: self.name.clone(),
                sprint_id: owner.id(),
                sprint_project: owner.project_id(),
            });
        }

        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        if deadline < owner.start_date() {
            return Err(PlanningDomainError::DeadlineBeforeSprintStart {
                task_name: self.name.clone(),
                deadline,
                start: owner.start_date(),
            });
        }
        if deadline > owner.end_date() {
            return Err(PlanningDomainError::DeadlineAfterSprintEnd {
                task_name: self.name.clone(),
                deadline,
                end: owner.end_date(),
            });
        }
        Ok(())
    }

    fn derive_deadline(&mut self, update: &TaskUpdate, sprint: Option<&Sprint>) {
        match (update.sprint_id, sprint) {
            (Some(Some(_)), Some(owner)) => {
                self.deadline = Some(owner.end_date());
                self.deadline_manual = false;
            }
            (Some(None), _) | (_, None) => {}
            (None, Some(owner)) => {
                if update.deadline.is_some() || update.deadline_manual.is_some() {
                    self.deadline_manual = self.deadline != Some(owner.end_date());
                }
            }
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
