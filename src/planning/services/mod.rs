//! Application services for sprint planning orchestration.

mod error;
mod sprint;
mod task;

pub use error::{PlanningServiceError, PlanningServiceResult};
pub use sprint::{CreateSprintRequest, SprintService};
pub use task::{CreateTaskRequest, TaskService};
