//! Given steps for sprint planning BDD scenarios.

use super::world::{SprintWorld, run_async};
use crate::test_helpers::parse_date;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use sprintwise::planning::services::{CreateSprintRequest, CreateTaskRequest};

#[given(r#"today is "{date}""#)]
fn today_is(world: &mut SprintWorld, date: String) -> Result<(), eyre::Report> {
    world.clock.set_today(parse_date(&date)?);
    Ok(())
}

#[given(r#"sprint "{name}" runs from "{start}" to "{end}""#)]
fn sprint_runs(
    world: &mut SprintWorld,
    name: String,
    start: String,
    end: String,
) -> Result<(), eyre::Report> {
    let request = CreateSprintRequest::new(name.as_str(), world.project, parse_date(&start)?)
        .with_end_date(parse_date(&end)?);
    let sprint = run_async(world.sprint_service.create_sprint(request))
        .wrap_err("create sprint for scenario setup")?;
    world.sprints.insert(name, sprint);
    Ok(())
}

#[given(r#"a task "{task}" is added to sprint "{sprint}""#)]
fn task_added(world: &mut SprintWorld, task: String, sprint: String) -> Result<(), eyre::Report> {
    let owner = world.sprint(&sprint)?;
    let request = CreateTaskRequest::new(task.as_str())
        .with_project(owner.project_id())
        .with_sprint(owner.id());
    let created = run_async(world.task_service.create_task(request))
        .wrap_err("create task for scenario setup")?;
    world.tasks.insert(task, created);
    Ok(())
}

#[given(r#"a pinned task "{task}" due "{date}" is added to sprint "{sprint}""#)]
fn pinned_task_added(
    world: &mut SprintWorld,
    task: String,
    date: String,
    sprint: String,
) -> Result<(), eyre::Report> {
    let owner = world.sprint(&sprint)?;
    let request = CreateTaskRequest::new(task.as_str())
        .with_project(owner.project_id())
        .with_sprint(owner.id())
        .with_deadline(parse_date(&date)?);
    let created = run_async(world.task_service.create_task(request))
        .wrap_err("create pinned task for scenario setup")?;
    world.tasks.insert(task, created);
    Ok(())
}
