//! Service layer for task sprint membership and deadlines.

use super::error::{PlanningServiceResult, load_sprint, load_task};
use crate::planning::{
    domain::{
        DuplicateTaskName, NewTask, ProjectId, Sprint, SprintId, Task, TaskDraft,
        TaskDraftChange, TaskId, TaskName, TaskPreview, TaskUpdate, TaskWriteMode,
    },
    ports::{PlanningChangeSet, PlanningRepository},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    project_id: Option<ProjectId>,
    sprint_id: Option<SprintId>,
    deadline: Option<NaiveDate>,
    deadline_manual: Option<bool>,
}

impl CreateTaskRequest {
    /// Creates a request with the task title.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: None,
            sprint_id: None,
            deadline: None,
            deadline_manual: None,
        }
    }

    /// Sets the owning project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Places the task in a sprint.
    #[must_use]
    pub const fn with_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    /// Sets an explicit deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the manual deadline flag for tasks created outside a sprint.
    #[must_use]
    pub const fn with_deadline_manual(mut self, manual: bool) -> Self {
        self.deadline_manual = Some(manual);
        self
    }
}

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<R, C>
where
    R: PlanningRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskService<R, C>
where
    R: PlanningRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task, inheriting the sprint end date as deadline when none
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Domain`] when the task breaks a
    /// sprint constraint or [`super::PlanningServiceError::Repository`] when
    /// the sprint is missing or persistence fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> PlanningServiceResult<Task> {
        let sprint = match request.sprint_id {
            Some(sprint_id) => Some(load_sprint(&*self.repository, sprint_id).await?),
            None => None,
        };
        let task = Task::create(
            NewTask {
                name: TaskName::new(request.name)?,
                project_id: request.project_id,
                sprint_id: request.sprint_id,
                deadline: request.deadline,
                deadline_manual: request.deadline_manual,
            },
            sprint.as_ref(),
            &*self.clock,
        )?;

        let mut changes = PlanningChangeSet::new();
        changes.insert_task(task.clone());
        self.repository.commit(changes).await?;
        tracing::info!(task_id = %task.id(), sprint_id = ?task.sprint_id(), "task created");
        Ok(task)
    }

    /// Applies a user edit to one task.
    ///
    /// Assigning a sprint resets the deadline to the sprint end; deadline or
    /// manual-flag edits inside a sprint re-derive the manual flag. A task touched on
    /// its sprint, deadline or project is re-validated against its sprint.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Domain`] when the task breaks a
    /// sprint constraint or [`super::PlanningServiceError::Repository`] when
    /// a record is missing or persistence fails.
    pub async fn update_task(&self, id: TaskId, update: TaskUpdate) -> PlanningServiceResult<Task> {
        let mut sprints = HashMap::new();
        let task = self.stage_update(id, &update, &mut sprints).await?;

        let mut changes = PlanningChangeSet::new();
        changes.update_task(task.clone());
        self.repository.commit(changes).await?;
        tracing::info!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Applies the same user edit to several tasks as one unit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_task`]; when any task is rejected none is
    /// stored.
    pub async fn update_tasks(
        &self,
        ids: &[TaskId],
        update: TaskUpdate,
    ) -> PlanningServiceResult<Vec<Task>> {
        let mut sprints = HashMap::new();
        let mut changes = PlanningChangeSet::new();
        let mut updated = Vec::with_capacity(ids.len());

        for id in ids {
            let task = self.stage_update(*id, &update, &mut sprints).await?;
            changes.update_task(task.clone());
            updated.push(task);
        }

        self.repository.commit(changes).await?;
        tracing::info!(count = updated.len(), "tasks updated");
        Ok(updated)
    }

    async fn stage_update(
        &self,
        id: TaskId,
        update: &TaskUpdate,
        sprints: &mut HashMap<SprintId, Sprint>,
    ) -> PlanningServiceResult<Task> {
        let mut task = load_task(&*self.repository, id).await?;
        let owner_id = update.sprint_change().unwrap_or(task.sprint_id());
        if let Some(sprint_id) = owner_id {
            if !sprints.contains_key(&sprint_id) {
                let sprint = load_sprint(&*self.repository, sprint_id).await?;
                sprints.insert(sprint_id, sprint);
            }
        }
        let owner = owner_id.and_then(|sprint_id| sprints.get(&sprint_id));

        task.apply_update(update, TaskWriteMode::User, owner, &*self.clock);
        if update.touches_sprint_constraints() {
            task.check_sprint_constraints(owner).inspect_err(|err| {
                tracing::warn!(task_id = %id, error = %err, "task update rejected");
            })?;
        }
        tracing::debug!(
            task_id = %id,
            deadline = ?task.deadline(),
            deadline_manual = task.deadline_manual(),
            "task deadline derived"
        );
        Ok(task)
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup fails.
    pub async fn find_task(&self, id: TaskId) -> PlanningServiceResult<Option<Task>> {
        Ok(self.repository.find_task(id).await?)
    }

    /// Proposes form values after a task field was edited.
    ///
    /// Selecting a sprint proposes its end date as the deadline; editing the
    /// deadline re-derives the manual flag. Name, sprint and project edits
    /// also look for another task of the same sprint with the same trimmed
    /// name and report it as a non-blocking warning.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when the selected
    /// sprint is missing or lookup fails.
    pub async fn preview_task_change(
        &self,
        draft: TaskDraft,
        change: TaskDraftChange,
    ) -> PlanningServiceResult<TaskPreview> {
        let sprint = match draft.sprint_id {
            Some(sprint_id) => Some(load_sprint(&*self.repository, sprint_id).await?),
            None => None,
        };
        let mut proposed = draft;
        proposed.apply_change(change, sprint.as_ref());

        let checks_name = matches!(
            change,
            TaskDraftChange::Name | TaskDraftChange::Sprint | TaskDraftChange::Project
        );
        let warning = match (&sprint, checks_name) {
            (Some(owner), true) => {
                let siblings = self.repository.tasks_in_sprint(owner.id()).await?;
                DuplicateTaskName::detect(&proposed, &siblings)
            }
            _ => None,
        };
        if let Some(duplicate) = &warning {
            tracing::warn!(
                sprint_id = %duplicate.sprint_id,
                existing_task_id = %duplicate.existing_task_id,
                "{duplicate}"
            );
        }

        Ok(TaskPreview {
            draft: proposed,
            warning,
        })
    }
}
