//! Unit tests for the planning module.
//!
//! Tests are organised by component: shared date helpers, the sprint and
//! task domain rules, and the services running over the in-memory adapter.


use crate::planning::{
    adapters::memory::InMemoryPlanningRepository,
    domain::{ProjectId, Sprint, Task},
    services::{CreateSprintRequest, CreateTaskRequest, SprintService, TaskService},
};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, RwLock};

/// Builds a calendar date, panicking on invalid input.
pub(super) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Clock pinned to noon UTC of a chosen day; tests move it explicitly.
#[derive(Debug)]
pub(super) struct TestClock {
    now: RwLock<DateTime<Utc>>,
}

impl TestClock {
    pub(super) fn on(date: NaiveDate) -> Self {
        Self {
            now: RwLock::new(noon(date)),
        }
    }

    pub(super) fn set_today(&self, date: NaiveDate) {
        *self.now.write().expect("clock lock") = noon(date);
    }
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    let midday = NaiveTime::from_hms_opt(12, 0, 0).expect("valid time");
    date.and_time(midday).and_utc()
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock")
    }
}

pub(super) type TestSprintService = SprintService<InMemoryPlanningRepository, TestClock>;
pub(super) type TestTaskService = TaskService<InMemoryPlanningRepository, TestClock>;

/// Sprint and task services sharing one repository and one clock.
pub(super) struct Planner {
    pub(super) clock: Arc<TestClock>,
    pub(super) sprints: TestSprintService,
    pub(super) tasks: TestTaskService,
}

impl Planner {
    pub(super) fn on(today: NaiveDate) -> Self {
        let repository = Arc::new(InMemoryPlanningRepository::new());
        let clock = Arc::new(TestClock::on(today));
        Self {
            sprints: SprintService::new(Arc::clone(&repository), Arc::clone(&clock)),
            tasks: TaskService::new(repository, Arc::clone(&clock)),
            clock,
        }
    }

    pub(super) async fn sprint(
        &self,
        project_id: ProjectId,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Sprint {
        let mut request = CreateSprintRequest::new("Sprint", project_id, start);
        if let Some(end_date) = end {
            request = request.with_end_date(end_date);
        }
        self.sprints
            .create_sprint(request)
            .await
            .expect("sprint creation should succeed")
    }

    pub(super) async fn task_in(&self, name: &str, sprint: &Sprint) -> Task {
        self.tasks
            .create_task(
                CreateTaskRequest::new(name)
                    .with_project(sprint.project_id())
                    .with_sprint(sprint.id()),
            )
            .await
            .expect("task creation should succeed")
    }

    pub(super) async fn reload_task(&self, task: &Task) -> Task {
        self.tasks
            .find_task(task.id())
            .await
            .expect("lookup should succeed")
            .expect("task should exist")
    }

    pub(super) async fn reload_sprint(&self, sprint: &Sprint) -> Sprint {
        self.sprints
            .find_sprint(sprint.id())
            .await
            .expect("lookup should succeed")
            .expect("sprint should exist")
    }
}

#[fixture]
pub(super) fn planner() -> Planner {
    Planner::on(ymd(2023, 12, 20))
}
