//! Unsaved edit-form state and the derived values proposed while editing.
//!
//! Previews never persist anything; they return the values a form should
//! display before the user commits.

use super::{
    PlanningDomainError, ProjectId, Sprint, SprintId, SprintPolicy, SprintState, StateMode, Task,
    TaskId, derive_state,
};
use chrono::NaiveDate;
use std::fmt;

/// Sprint edit form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintDraft {
    /// Start date as currently entered.
    pub start_date: Option<NaiveDate>,
    /// End date as currently entered.
    pub end_date: Option<NaiveDate>,
    /// Manual end flag as currently held by the form.
    pub end_date_manual: bool,
    /// State mode as currently selected.
    pub state_mode: StateMode,
    /// Manual state override as currently selected.
    pub state_manual: SprintState,
    /// State shown by the form.
    pub state: SprintState,
}

impl SprintDraft {
    /// Creates an empty draft in auto mode.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
            end_date_manual: false,
            state_mode: StateMode::Auto,
            state_manual: SprintState::Planned,
            state: SprintState::Planned,
        }
    }

    /// Loads a draft from a stored sprint.
    #[must_use]
    pub const fn from_sprint(sprint: &Sprint) -> Self {
        Self {
            start_date: Some(sprint.start_date()),
            end_date: Some(sprint.end_date()),
            end_date_manual: sprint.end_date_manual(),
            state_mode: sprint.state_mode(),
            state_manual: sprint.state_manual(),
            state: sprint.state(),
        }
    }

    /// Reacts to a start-date edit.
    ///
    /// An empty or auto-managed end date follows the new default; a pinned
    /// end date stays.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::DateOutOfRange`] when the default end
    /// overflows the calendar.
    pub fn on_start_date_changed(
        &mut self,
        policy: &SprintPolicy,
        today: NaiveDate,
    ) -> Result<(), PlanningDomainError> {
        if let Some(start) = self.start_date {
            if self.end_date.is_none() || !self.end_date_manual {
                self.end_date = Some(policy.default_end_date(start)?);
                self.end_date_manual = false;
            }
        }
        self.recompute_state(today);
        Ok(())
    }

    /// Reacts to an end-date edit by re-deriving the manual flag.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::DateOutOfRange`] when the default end
    /// overflows the calendar.
    pub fn on_end_date_changed(
        &mut self,
        policy: &SprintPolicy,
        today: NaiveDate,
    ) -> Result<(), PlanningDomainError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            self.end_date_manual = end != policy.default_end_date(start)?;
        }
        self.recompute_state(today);
        Ok(())
    }

    /// Re-derives the displayed state.
    pub fn recompute_state(&mut self, today: NaiveDate) {
        self.state = derive_state(
            self.state_mode,
            self.state_manual,
            self.start_date,
            self.end_date,
            today,
        );
    }
}

impl Default for SprintDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Which task form field the user just edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskDraftChange {
    /// The title changed.
    Name,
    /// The project changed.
    Project,
    /// The sprint changed.
    Sprint,
    /// The deadline changed.
    Deadline,
}

/// Task edit form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Identifier when editing an existing task.
    pub task_id: Option<TaskId>,
    /// Title as currently entered, untrimmed.
    pub name: String,
    /// Project as currently selected.
    pub project_id: Option<ProjectId>,
    /// Sprint as currently selected.
    pub sprint_id: Option<SprintId>,
    /// Deadline as currently entered.
    pub deadline: Option<NaiveDate>,
    /// Manual deadline flag as currently held by the form.
    pub deadline_manual: bool,
}

impl TaskDraft {
    /// Loads a draft from a stored task.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: Some(task.id()),
            name: task.name().as_str().to_owned(),
            project_id: task.project_id(),
            sprint_id: task.sprint_id(),
            deadline: task.deadline(),
            deadline_manual: task.deadline_manual(),
        }
    }

    /// Applies the deadline rules for an edit of `change`.
    ///
    /// `sprint` is the record referenced by `sprint_id`. Selecting a sprint
    /// proposes its end date as the deadline; editing the deadline re-derives
    /// the manual flag. Clearing the deadline counts as a manual override.
    pub fn apply_change(&mut self, change: TaskDraftChange, sprint: Option<&Sprint>) {
        let Some(owner) = sprint else {
            return;
        };
        match change {
            TaskDraftChange::Sprint => {
                self.deadline = Some(owner.end_date());
                self.deadline_manual = false;
            }
            TaskDraftChange::Deadline => {
                self.deadline_manual = self.deadline != Some(owner.end_date());
            }
            TaskDraftChange::Name | TaskDraftChange::Project => {}
        }
    }
}

/// Non-blocking warning: another task of the sprint already uses the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTaskName {
    /// The shared trimmed name.
    pub name: String,
    /// Sprint holding both tasks.
    pub sprint_id: SprintId,
    /// The task that already carries the name.
    pub existing_task_id: TaskId,
}

impl DuplicateTaskName {
    /// Looks for another task of `siblings` with the draft's trimmed name.
    #[must_use]
    pub fn detect<'a>(
        draft: &TaskDraft,
        siblings: impl IntoIterator<Item = &'a Task>,
    ) -> Option<Self> {
        let sprint_id = draft.sprint_id?;
        let name = draft.name.trim();
        if name.is_empty() {
            return None;
        }
        siblings
            .into_iter()
            .filter(|task| task.sprint_id() == Some(sprint_id))
            .filter(|task| Some(task.id()) != draft.task_id)
            .find(|task| task.name().as_str() == name)
            .map(|task| Self {
                name: name.to_owned(),
                sprint_id,
                existing_task_id: task.id(),
            })
    }
}

impl fmt::Display for DuplicateTaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a task named '{}' already exists in this sprint",
            self.name
        )
    }
}

/// Values proposed for a task form after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPreview {
    /// The draft with derived fields filled in.
    pub draft: TaskDraft,
    /// Advisory warning, if any. Never blocks saving.
    pub warning: Option<DuplicateTaskName>,
}
