//! Validation rejections raised by the planning rules.

use super::{ProjectId, SprintId, SprintName, SprintState, TaskName};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Every way a proposed sprint or task change can be rejected.
///
/// All variants are deterministic functions of the proposed data: the caller
/// must fix the input before resubmitting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanningDomainError {
    /// The sprint name is empty after trimming.
    #[error("sprint name must not be empty")]
    EmptySprintName,

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The sprint ends before it starts.
    #[error("sprint end date ({end}) cannot be before the start date ({start})")]
    EndBeforeStart {
        /// Proposed start date.
        start: NaiveDate,
        /// Proposed end date.
        end: NaiveDate,
    },

    /// The sprint window is longer than the policy allows.
    #[error(
        "sprint duration of {days} days cannot exceed {max_weeks} weeks ({max_days} days)"
    )]
    DurationExceeded {
        /// Inclusive length of the proposed window.
        days: i64,
        /// Maximum inclusive length in days.
        max_days: u32,
        /// Maximum length in whole weeks.
        max_weeks: u32,
    },

    /// Adding the default sprint length to a date left the calendar range.
    #[error("adding {days} days to {date} leaves the supported calendar range")]
    DateOutOfRange {
        /// Base date.
        date: NaiveDate,
        /// Offset that overflowed.
        days: u32,
    },

    /// A manual state of planned or active was requested for a sprint that
    /// already ended.
    #[error(
        "sprint {sprint_id} ended on {end_date}; a sprint whose end date is in the past cannot be set to {state}"
    )]
    PastSprintState {
        /// Offending sprint.
        sprint_id: SprintId,
        /// Sprint end date.
        end_date: NaiveDate,
        /// Requested manual state.
        state: SprintState,
    },

    /// The window collides with another sprint of the same project.
    #[error(
        "this sprint ({start} → {end}) overlaps with '{other_name}' ({other_start} → {other_end}); sprints in the same project cannot overlap"
    )]
    OverlappingSprint {
        /// Proposed start date.
        start: NaiveDate,
        /// Proposed end date.
        end: NaiveDate,
        /// Conflicting sprint.
        other_id: SprintId,
        /// Conflicting sprint name.
        other_name: SprintName,
        /// Conflicting sprint start date.
        other_start: NaiveDate,
        /// Conflicting sprint end date.
        other_end: NaiveDate,
    },

    /// The project of a sprint that already has tasks cannot change.
    #[error("cannot change the project of sprint {0} once it has tasks")]
    ProjectLockedByTasks(SprintId),

    /// The project of an active or finished sprint cannot change.
    #[error("cannot change the project of sprint {sprint_id} once it is {state}")]
    ProjectLockedByState {
        /// Offending sprint.
        sprint_id: SprintId,
        /// Current sprint state.
        state: SprintState,
    },

    /// Moving the sprint dates would strand manually pinned task deadlines
    /// outside the new window.
    #[error(
        "cannot change the sprint dates: tasks with manually set deadlines fall outside the sprint period {start} → {end}; tasks: {offenders}"
    )]
    ManualDeadlinesOutsideSprint {
        /// Proposed start date.
        start: NaiveDate,
        /// Proposed end date.
        end: NaiveDate,
        /// Names of the stranded tasks.
        offenders: OffendingTasks,
    },

    /// A task and its sprint belong to different projects.
    #[error(
        "task '{task_name}' can only be assigned to a sprint of its own project; sprint {sprint_id} belongs to project {sprint_project}"
    )]
    TaskProjectMismatch {
        /// Offending task.
        task_name: TaskName,
        /// Target sprint.
        sprint_id: SprintId,
        /// Project owning the sprint.
        sprint_project: ProjectId,
    },

    /// The task deadline precedes the sprint start.
    #[error(
        "the task '{task_name}' deadline ({deadline}) is before the sprint start date ({start})"
    )]
    DeadlineBeforeSprintStart {
        /// Offending task.
        task_name: TaskName,
        /// Task deadline.
        deadline: NaiveDate,
        /// Sprint start date.
        start: NaiveDate,
    },

    /// The task deadline falls after the sprint end.
    #[error(
        "the task '{task_name}' deadline ({deadline}) falls after the sprint end date ({end})"
    )]
    DeadlineAfterSprintEnd {
        /// Offending task.
        task_name: TaskName,
        /// Task deadline.
        deadline: NaiveDate,
        /// Sprint end date.
        end: NaiveDate,
    },

    /// The sprint policy is internally inconsistent.
    #[error("invalid sprint policy: {0}")]
    InvalidPolicy(String),
}

/// Capped list of task names reported by
/// [`PlanningDomainError::ManualDeadlinesOutsideSprint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffendingTasks {
    sample: Vec<TaskName>,
    remaining: usize,
}

impl OffendingTasks {
    /// Keeps the first `sample_size` names and counts the rest.
    #[must_use]
    pub fn new(names: Vec<TaskName>, sample_size: usize) -> Self {
        let mut sample = names;
        let remaining = sample.len().saturating_sub(sample_size);
        sample.truncate(sample_size);
        Self { sample, remaining }
    }

    /// Returns the reported task names.
    #[must_use]
    pub fn sample(&self) -> &[TaskName] {
        &self.sample
    }

    /// Returns how many offenders were left out of the sample.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }
}

impl fmt::Display for OffendingTasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sample.iter().map(TaskName::as_str).collect();
        f.write_str(&names.join(", "))?;
        if self.remaining > 0 {
            write!(f, " (+{} more)", self.remaining)?;
        }
        Ok(())
    }
}

/// Error returned while parsing sprint states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sprint state: {0}")]
pub struct ParseSprintStateError(pub String);

/// Error returned while parsing sprint state modes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sprint state mode: {0}")]
pub struct ParseStateModeError(pub String);
