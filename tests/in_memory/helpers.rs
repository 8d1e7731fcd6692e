//! Shared fixtures for in-memory planning integration tests.

use std::sync::Arc;

use crate::test_helpers::{CalendarClock, parse_date};
use chrono::NaiveDate;
use rstest::fixture;
use sprintwise::planning::{
    adapters::memory::InMemoryPlanningRepository,
    domain::{ProjectId, Sprint, Task},
    services::{CreateSprintRequest, CreateTaskRequest, SprintService, TaskService},
};

/// Sprint service type used by the in-memory tests.
pub type TestSprintService = SprintService<InMemoryPlanningRepository, CalendarClock>;

/// Task service type used by the in-memory tests.
pub type TestTaskService = TaskService<InMemoryPlanningRepository, CalendarClock>;

/// Both planning services over one repository, plus the clock driving them.
pub struct Planning {
    pub clock: Arc<CalendarClock>,
    pub sprints: TestSprintService,
    pub tasks: TestTaskService,
    pub project: ProjectId,
}

impl Planning {
    /// Builds services whose calendar reads `today`.
    pub fn on(today: NaiveDate) -> Self {
        let repository = Arc::new(InMemoryPlanningRepository::new());
        let clock = Arc::new(CalendarClock::on(today));
        Self {
            sprints: SprintService::new(Arc::clone(&repository), Arc::clone(&clock)),
            tasks: TaskService::new(repository, Arc::clone(&clock)),
            clock,
            project: ProjectId::new(),
        }
    }

    /// Creates a sprint in the default project.
    ///
    /// # Errors
    ///
    /// Returns an error when a date is malformed or the sprint is rejected.
    pub async fn sprint(
        &self,
        name: &str,
        start: &str,
        end: Option<&str>,
    ) -> Result<Sprint, eyre::Report> {
        let mut request = CreateSprintRequest::new(name, self.project, parse_date(start)?);
        if let Some(end_date) = end {
            request = request.with_end_date(parse_date(end_date)?);
        }
        Ok(self.sprints.create_sprint(request).await?)
    }

    /// Creates a task in `sprint`, optionally with an explicit deadline.
    ///
    /// # Errors
    ///
    /// Returns an error when the deadline is malformed or the task is
    /// rejected.
    pub async fn task(
        &self,
        name: &str,
        sprint: &Sprint,
        deadline: Option<&str>,
    ) -> Result<Task, eyre::Report> {
        let mut request = CreateTaskRequest::new(name)
            .with_project(sprint.project_id())
            .with_sprint(sprint.id());
        if let Some(date) = deadline {
            request = request.with_deadline(parse_date(date)?);
        }
        Ok(self.tasks.create_task(request).await?)
    }

    /// Reloads a task from storage.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing or lookup fails.
    pub async fn reload(&self, task: &Task) -> Result<Task, eyre::Report> {
        self.tasks
            .find_task(task.id())
            .await?
            .ok_or_else(|| eyre::eyre!("task {} disappeared", task.id()))
    }
}

/// Planning services on 2023-12-20, before any sprint in the tests starts.
#[fixture]
pub fn planning() -> Planning {
    Planning::on(parse_date("2023-12-20").expect("valid fixture date"))
}
