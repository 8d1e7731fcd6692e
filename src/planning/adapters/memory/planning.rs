//! In-memory repository for sprint planning.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::planning::{
    domain::{ProjectId, SprintId, SprintState, StateMode, Sprint, Task, TaskId},
    ports::{
        PlanningChangeSet, PlanningRepository, PlanningRepositoryError, PlanningRepositoryResult,
    },
};

/// Thread-safe in-memory sprint and task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanningRepository {
    state: Arc<RwLock<InMemoryPlanningState>>,
}

#[derive(Debug, Default)]
struct InMemoryPlanningState {
    sprints: HashMap<SprintId, Sprint>,
    tasks: HashMap<TaskId, Task>,
    sprint_index: HashMap<SprintId, Vec<TaskId>>,
}

impl InMemoryPlanningRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> PlanningRepositoryError {
    PlanningRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Removes a task ID from the sprint index, cleaning up the entry if empty.
fn unindex_task(state: &mut InMemoryPlanningState, sprint_id: SprintId, task_id: TaskId) {
    if let Some(ids) = state.sprint_index.get_mut(&sprint_id) {
        ids.retain(|id| *id != task_id);
        if ids.is_empty() {
            state.sprint_index.remove(&sprint_id);
        }
    }
}

fn index_task(state: &mut InMemoryPlanningState, task: &Task) {
    if let Some(sprint_id) = task.sprint_id() {
        state
            .sprint_index
            .entry(sprint_id)
            .or_default()
            .push(task.id());
    }
}

/// Stores a task and keeps the sprint → task index in step with it.
fn put_task(state: &mut InMemoryPlanningState, task: &Task) {
    let previous_sprint = state.tasks.get(&task.id()).and_then(Task::sprint_id);
    if let Some(sprint_id) = previous_sprint {
        unindex_task(state, sprint_id, task.id());
    }
    index_task(state, task);
    state.tasks.insert(task.id(), task.clone());
}

fn check_preconditions(
    state: &InMemoryPlanningState,
    changes: &PlanningChangeSet,
) -> PlanningRepositoryResult<()> {
    let mut new_sprints = HashSet::new();
    for sprint in changes.inserted_sprints() {
        if state.sprints.contains_key(&sprint.id()) || !new_sprints.insert(sprint.id()) {
            return Err(PlanningRepositoryError::DuplicateSprint(sprint.id()));
        }
    }
    let known_sprint = |id: &SprintId| state.sprints.contains_key(id) || new_sprints.contains(id);
    for sprint in changes.updated_sprints() {
        if !known_sprint(&sprint.id()) {
            return Err(PlanningRepositoryError::SprintNotFound(sprint.id()));
        }
    }
    for id in changes.removed_sprints() {
        if !known_sprint(id) {
            return Err(PlanningRepositoryError::SprintNotFound(*id));
        }
    }

    let mut new_tasks = HashSet::new();
    for task in changes.inserted_tasks() {
        if state.tasks.contains_key(&task.id()) || !new_tasks.insert(task.id()) {
            return Err(PlanningRepositoryError::DuplicateTask(task.id()));
        }
    }
    for task in changes.updated_tasks() {
        if !state.tasks.contains_key(&task.id()) && !new_tasks.contains(&task.id()) {
            return Err(PlanningRepositoryError::TaskNotFound(task.id()));
        }
    }
    Ok(())
}

#[async_trait]
impl PlanningRepository for InMemoryPlanningRepository {
    async fn find_sprint(&self, id: SprintId) -> PlanningRepositoryResult<Option<Sprint>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.sprints.get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> PlanningRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn sprints_for_project(
        &self,
        project_id: ProjectId,
    ) -> PlanningRepositoryResult<Vec<Sprint>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut sprints: Vec<Sprint> = state
            .sprints
            .values()
            .filter(|sprint| sprint.project_id() == project_id)
            .cloned()
            .collect();
        sprints.sort_by_key(|sprint| Reverse((sprint.end_date(), sprint.id())));
        Ok(sprints)
    }

    async fn tasks_in_sprint(&self, sprint_id: SprintId) -> PlanningRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let tasks = state
            .sprint_index
            .get(&sprint_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(tasks)
    }

    async fn sprints_pending_refresh(&self) -> PlanningRepositoryResult<Vec<Sprint>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .sprints
            .values()
            .filter(|sprint| sprint.state_mode() == StateMode::Auto)
            .filter(|sprint| sprint.state() != SprintState::Done)
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: PlanningChangeSet) -> PlanningRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        check_preconditions(&state, &changes)?;

        for sprint in changes
            .inserted_sprints()
            .iter()
            .chain(changes.updated_sprints())
        {
            state.sprints.insert(sprint.id(), sprint.clone());
        }
        for task in changes
            .inserted_tasks()
            .iter()
            .chain(changes.updated_tasks())
        {
            put_task(&mut state, task);
        }
        for id in changes.removed_sprints() {
            state.sprints.remove(id);
            state.sprint_index.remove(id);
        }
        Ok(())
    }
}
