//! Domain model for sprint planning.
//!
//! Sprints own a date window and a lifecycle state; tasks optionally belong
//! to a sprint and inherit their deadline from it. Everything here is pure:
//! records are loaded and stored by the services through the repository
//! port.

mod error;
mod ids;
mod policy;
mod preview;
mod sprint;
mod task;
mod window;

pub use error::{OffendingTasks, ParseSprintStateError, ParseStateModeError, PlanningDomainError};
pub use ids::{ProjectId, SprintId, SprintName, TaskId, TaskName};
pub use policy::SprintPolicy;
pub use preview::{DuplicateTaskName, SprintDraft, TaskDraft, TaskDraftChange, TaskPreview};
pub use sprint::{
    NewSprint, PersistedSprintData, Sprint, SprintState, SprintUpdate, SprintUpdateOutcome,
    StateMode, derive_state,
};
pub use task::{NewTask, PersistedTaskData, Task, TaskUpdate, TaskWriteMode};
pub use window::SprintWindow;
