//! Service layer for sprint creation, updates, task selection and state
//! maintenance.

use super::error::{PlanningServiceResult, load_sprint, load_task};
use crate::planning::{
    domain::{
        NewSprint, PlanningDomainError, ProjectId, Sprint, SprintDraft, SprintId, SprintName,
        SprintPolicy, SprintState, SprintUpdate, StateMode, Task, TaskId, TaskUpdate,
        TaskWriteMode,
    },
    ports::{PlanningChangeSet, PlanningRepository},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Request payload for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSprintRequest {
    name: String,
    project_id: ProjectId,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    end_date_manual: Option<bool>,
    state_mode: StateMode,
    state_manual: SprintState,
}

impl CreateSprintRequest {
    /// Creates a request with required sprint fields.
    #[must_use]
    pub fn new(name: impl Into<String>, project_id: ProjectId, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            project_id,
            start_date,
            end_date: None,
            end_date_manual: None,
            state_mode: StateMode::Auto,
            state_manual: SprintState::Planned,
        }
    }

    /// Sets an explicit end date.
    #[must_use]
    pub const fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Sets the manual end flag explicitly.
    #[must_use]
    pub const fn with_end_date_manual(mut self, manual: bool) -> Self {
        self.end_date_manual = Some(manual);
        self
    }

    /// Pins the sprint state manually from creation.
    #[must_use]
    pub const fn with_manual_state(mut self, state: SprintState) -> Self {
        self.state_mode = StateMode::Manual;
        self.state_manual = state;
        self
    }
}

/// Sprint orchestration service.
#[derive(Clone)]
pub struct SprintService<R, C>
where
    R: PlanningRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    policy: SprintPolicy,
}

impl<R, C> SprintService<R, C>
where
    R: PlanningRepository,
    C: Clock + Send + Sync,
{
    /// Creates a sprint service with the default policy.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            policy: SprintPolicy::default(),
        }
    }

    /// Replaces the sprint policy.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::InvalidPolicy`] when the policy is
    /// inconsistent.
    pub fn with_policy(mut self, policy: SprintPolicy) -> Result<Self, PlanningDomainError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &SprintPolicy {
        &self.policy
    }

    /// Creates one sprint.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Domain`] when the sprint breaks
    /// a rule or [`super::PlanningServiceError::Repository`] when persistence
    /// fails.
    pub async fn create_sprint(&self, request: CreateSprintRequest) -> PlanningServiceResult<Sprint> {
        let siblings = self
            .repository
            .sprints_for_project(request.project_id)
            .await?;
        let sprint = self.build_sprint(request, &siblings)?;

        let mut changes = PlanningChangeSet::new();
        changes.insert_sprint(sprint.clone());
        self.repository.commit(changes).await?;
        tracing::info!(sprint_id = %sprint.id(), window = %sprint.window(), "sprint created");
        Ok(sprint)
    }

    /// Creates a batch of sprints as one unit.
    ///
    /// Sprints of the same batch are overlap-checked against each other as
    /// well as against stored sprints.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Domain`] when any sprint breaks
    /// a rule, in which case none is stored, or
    /// [`super::PlanningServiceError::Repository`] when persistence fails.
    pub async fn create_sprints(
        &self,
        requests: Vec<CreateSprintRequest>,
    ) -> PlanningServiceResult<Vec<Sprint>> {
        let mut stored: HashMap<ProjectId, Vec<Sprint>> = HashMap::new();
        let mut created: Vec<Sprint> = Vec::with_capacity(requests.len());

        for request in requests {
            if !stored.contains_key(&request.project_id) {
                let siblings = self
                    .repository
                    .sprints_for_project(request.project_id)
                    .await?;
                stored.insert(request.project_id, siblings);
            }
            let siblings = stored.get(&request.project_id).into_iter().flatten();
            let sprint = self.build_sprint(request, siblings.chain(created.iter()))?;
            created.push(sprint);
        }

        let mut changes = PlanningChangeSet::new();
        for sprint in &created {
            changes.insert_sprint(sprint.clone());
        }
        self.repository.commit(changes).await?;
        tracing::info!(count = created.len(), "sprints created");
        Ok(created)
    }

    fn build_sprint<'a>(
        &self,
        request: CreateSprintRequest,
        siblings: impl IntoIterator<Item = &'a Sprint>,
    ) -> Result<Sprint, PlanningDomainError> {
        let sprint = Sprint::create(
            NewSprint {
                name: SprintName::new(request.name)?,
                project_id: request.project_id,
                start_date: request.start_date,
                end_date: request.end_date,
                end_date_manual: request.end_date_manual,
                state_mode: request.state_mode,
                state_manual: request.state_manual,
            },
            &self.policy,
            &*self.clock,
        )?;
        sprint.check_no_overlap(siblings)?;
        Ok(sprint)
    }

    /// Updates a sprint and cascades date changes to its tasks.
    ///
    /// Non-manual task deadlines follow a moved end date. Nothing is stored
    /// when a manually pinned task deadline would fall outside the new
    /// window.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Domain`] when the update is
    /// rejected or [`super::PlanningServiceError::Repository`] when the
    /// sprint is missing or persistence fails.
    pub async fn update_sprint(
        &self,
        id: SprintId,
        update: SprintUpdate,
    ) -> PlanningServiceResult<Sprint> {
        let mut sprint = load_sprint(&*self.repository, id).await?;
        let tasks = self.repository.tasks_in_sprint(id).await?;

        let outcome = sprint
            .apply_update(&update, !tasks.is_empty(), &self.policy, &*self.clock)
            .inspect_err(|err| tracing::warn!(sprint_id = %id, error = %err, "sprint update rejected"))?;

        if update.touches_placement() {
            let siblings = self
                .repository
                .sprints_for_project(sprint.project_id())
                .await?;
            sprint.check_no_overlap(&siblings)?;
        }

        let mut changes = PlanningChangeSet::new();
        if outcome.dates_touched() {
            sprint
                .check_manual_deadlines(&tasks, self.policy.offender_sample_size)
                .inspect_err(|err| {
                    tracing::warn!(sprint_id = %id, error = %err, "sprint dates rejected");
                })?;
            for mut task in tasks {
                if !task.deadline_manual() && task.sync_deadline(sprint.end_date(), &*self.clock) {
                    tracing::debug!(task_id = %task.id(), deadline = %sprint.end_date(), "task deadline synced");
                    changes.update_task(task);
                }
            }
        }

        changes.update_sprint(sprint.clone());
        self.repository.commit(changes).await?;
        tracing::info!(
            sprint_id = %id,
            window = %sprint.window(),
            state = %sprint.state(),
            "sprint updated"
        );
        Ok(sprint)
    }

    /// Finds a sprint by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup fails.
    pub async fn find_sprint(&self, id: SprintId) -> PlanningServiceResult<Option<Sprint>> {
        Ok(self.repository.find_sprint(id).await?)
    }

    /// Lists a project's sprints, latest end date first.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup fails.
    pub async fn list_project_sprints(
        &self,
        project_id: ProjectId,
    ) -> PlanningServiceResult<Vec<Sprint>> {
        Ok(self.repository.sprints_for_project(project_id).await?)
    }

    /// Returns whether any task belongs to the sprint.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup fails.
    pub async fn has_tasks(&self, id: SprintId) -> PlanningServiceResult<bool> {
        Ok(!self.repository.tasks_in_sprint(id).await?.is_empty())
    }

    /// Returns the tasks currently selected for the sprint.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when the sprint is
    /// missing or lookup fails.
    pub async fn selected_tasks(&self, id: SprintId) -> PlanningServiceResult<Vec<Task>> {
        load_sprint(&*self.repository, id).await?;
        Ok(self.repository.tasks_in_sprint(id).await?)
    }

    /// Replaces the sprint's task selection.
    ///
    /// Added tasks join the sprint and, unless their deadline is pinned to
    /// another date, take the sprint end date and follow it from then on.
    /// Removed tasks leave the sprint and keep their deadline.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::TaskProjectMismatch`] when an added task
    /// belongs to another project, a deadline bound error when a pinned
    /// deadline lies outside the window, or a repository error when a task is
    /// missing. Nothing is stored on error.
    pub async fn set_selected_tasks(
        &self,
        id: SprintId,
        task_ids: impl IntoIterator<Item = TaskId>,
    ) -> PlanningServiceResult<Vec<Task>> {
        let sprint = load_sprint(&*self.repository, id).await?;
        let current = self.repository.tasks_in_sprint(id).await?;
        let current_ids: HashSet<TaskId> = current.iter().map(Task::id).collect();

        let mut wanted = HashSet::new();
        let mut added = Vec::new();
        for task_id in task_ids {
            if wanted.insert(task_id) && !current_ids.contains(&task_id) {
                added.push(task_id);
            }
        }

        let mut changes = PlanningChangeSet::new();
        let attach = TaskUpdate::new().assign_sprint(id);
        for task_id in added {
            let mut task = load_task(&*self.repository, task_id).await?;
            if task.project_id() != Some(sprint.project_id()) {
                return Err(PlanningDomainError::TaskProjectMismatch {
                    task_name: task.name().clone(),
                    sprint_id: id,
                    sprint_project: sprint.project_id(),
                }
                .into());
            }
            task.apply_update(&attach, TaskWriteMode::SystemSync, Some(&sprint), &*self.clock);
            if !task.deadline_manual() || task.deadline() == Some(sprint.end_date()) {
                task.sync_deadline(sprint.end_date(), &*self.clock);
            }
            task.check_sprint_constraints(Some(&sprint))?;
            changes.update_task(task);
        }

        let detach = TaskUpdate::new().clear_sprint();
        for mut task in current {
            if !wanted.contains(&task.id()) {
                task.apply_update(&detach, TaskWriteMode::SystemSync, None, &*self.clock);
                changes.update_task(task);
            }
        }

        self.repository.commit(changes).await?;
        tracing::info!(sprint_id = %id, selected = wanted.len(), "sprint task selection updated");
        Ok(self.repository.tasks_in_sprint(id).await?)
    }

    /// Returns the sprint to automatic state tracking.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when the sprint is
    /// missing or persistence fails.
    pub async fn set_auto(&self, id: SprintId) -> PlanningServiceResult<Sprint> {
        let mut sprint = load_sprint(&*self.repository, id).await?;
        sprint.switch_to_auto(&*self.clock);
        self.store_state_override(sprint).await
    }

    /// Pins the sprint as planned.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::PastSprintState`] when the sprint has
    /// already ended, or a repository error.
    pub async fn set_planned(&self, id: SprintId) -> PlanningServiceResult<Sprint> {
        self.pin_state(id, SprintState::Planned).await
    }

    /// Pins the sprint as active.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::PastSprintState`] when the sprint has
    /// already ended, or a repository error.
    pub async fn set_active(&self, id: SprintId) -> PlanningServiceResult<Sprint> {
        self.pin_state(id, SprintState::Active).await
    }

    /// Pins the sprint as done.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the sprint is missing or persistence
    /// fails.
    pub async fn set_done(&self, id: SprintId) -> PlanningServiceResult<Sprint> {
        self.pin_state(id, SprintState::Done).await
    }

    async fn pin_state(&self, id: SprintId, state: SprintState) -> PlanningServiceResult<Sprint> {
        let mut sprint = load_sprint(&*self.repository, id).await?;
        sprint.pin_state(state, &*self.clock)?;
        self.store_state_override(sprint).await
    }

    async fn store_state_override(&self, sprint: Sprint) -> PlanningServiceResult<Sprint> {
        let mut changes = PlanningChangeSet::new();
        changes.update_sprint(sprint.clone());
        self.repository.commit(changes).await?;
        tracing::info!(
            sprint_id = %sprint.id(),
            mode = sprint.state_mode().as_str(),
            state = %sprint.state(),
            "sprint state overridden"
        );
        Ok(sprint)
    }

    /// Recomputes the state of every auto-mode sprint that is not done yet.
    ///
    /// Intended to be run by an external scheduler. Returns the sprints whose
    /// state changed; they are stored as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup or
    /// persistence fails.
    pub async fn refresh_states(&self) -> PlanningServiceResult<Vec<Sprint>> {
        let pending = self.repository.sprints_pending_refresh().await?;
        let examined = pending.len();

        let mut changes = PlanningChangeSet::new();
        let mut refreshed = Vec::new();
        for mut sprint in pending {
            if sprint.refresh_state(&*self.clock) {
                changes.update_sprint(sprint.clone());
                refreshed.push(sprint);
            }
        }

        if !changes.is_empty() {
            self.repository.commit(changes).await?;
        }
        tracing::info!(examined, refreshed = refreshed.len(), "sprint states refreshed");
        Ok(refreshed)
    }

    /// Proposes form values after the start date was edited.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::DateOutOfRange`] when the default end
    /// overflows the calendar.
    pub fn preview_start_date_change(
        &self,
        draft: SprintDraft,
    ) -> Result<SprintDraft, PlanningDomainError> {
        let mut proposed = draft;
        proposed.on_start_date_changed(&self.policy, self.today())?;
        Ok(proposed)
    }

    /// Proposes form values after the end date was edited.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::DateOutOfRange`] when the default end
    /// overflows the calendar.
    pub fn preview_end_date_change(
        &self,
        draft: SprintDraft,
    ) -> Result<SprintDraft, PlanningDomainError> {
        let mut proposed = draft;
        proposed.on_end_date_changed(&self.policy, self.today())?;
        Ok(proposed)
    }

    /// Deletes every sprint of a project, detaching their tasks.
    ///
    /// Hosts call this when the project itself is deleted. Detached tasks
    /// keep their deadline. Returns the number of sprints removed.
    ///
    /// # Errors
    ///
    /// Returns [`super::PlanningServiceError::Repository`] when lookup or
    /// persistence fails.
    pub async fn delete_project_sprints(
        &self,
        project_id: ProjectId,
    ) -> PlanningServiceResult<usize> {
        let sprints = self.repository.sprints_for_project(project_id).await?;
        let detach = TaskUpdate::new().clear_sprint();

        let mut changes = PlanningChangeSet::new();
        for sprint in &sprints {
            for mut task in self.repository.tasks_in_sprint(sprint.id()).await? {
                task.apply_update(&detach, TaskWriteMode::SystemSync, None, &*self.clock);
                changes.update_task(task);
            }
            changes.remove_sprint(sprint.id());
        }

        self.repository.commit(changes).await?;
        tracing::info!(project_id = %project_id, removed = sprints.len(), "project sprints deleted");
        Ok(sprints.len())
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}
