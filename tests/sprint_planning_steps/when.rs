//! When steps for sprint planning BDD scenarios.

use super::world::{SprintWorld, run_async};
use crate::test_helpers::parse_date;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use sprintwise::planning::{
    domain::{SprintState, SprintUpdate, TaskDraft, TaskDraftChange},
    services::CreateSprintRequest,
};

#[when(r#"sprint "{name}" is created starting "{start}""#)]
fn sprint_created(world: &mut SprintWorld, name: String, start: String) -> Result<(), eyre::Report> {
    let request = CreateSprintRequest::new(name.as_str(), world.project, parse_date(&start)?);
    let result = run_async(world.sprint_service.create_sprint(request));
    if let Some(sprint) = world.record(result) {
        world.sprints.insert(name, sprint);
    }
    Ok(())
}

#[when(r#"a finished sprint "{name}" from "{start}" to "{end}" is created pinned as "{state}""#)]
fn pinned_sprint_created(
    world: &mut SprintWorld,
    name: String,
    start: String,
    end: String,
    state: String,
) -> Result<(), eyre::Report> {
    let pinned = SprintState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid state in scenario: {err}"))?;
    let request = CreateSprintRequest::new(name.as_str(), world.project, parse_date(&start)?)
        .with_end_date(parse_date(&end)?)
        .with_manual_state(pinned);
    let result = run_async(world.sprint_service.create_sprint(request));
    if let Some(sprint) = world.record(result) {
        world.sprints.insert(name, sprint);
    }
    Ok(())
}

fn reschedule(world: &mut SprintWorld, name: String, update: SprintUpdate) -> Result<(), eyre::Report> {
    let id = world.sprint(&name)?.id();
    let result = run_async(world.sprint_service.update_sprint(id, update));
    if let Some(sprint) = world.record(result) {
        world.sprints.insert(name, sprint);
    }
    Ok(())
}

#[when(r#"sprint "{name}" is rescheduled to end on "{date}""#)]
fn end_rescheduled(world: &mut SprintWorld, name: String, date: String) -> Result<(), eyre::Report> {
    let update = SprintUpdate::new().with_end_date(parse_date(&date)?);
    reschedule(world, name, update)
}

#[when(r#"sprint "{name}" is rescheduled to start on "{date}""#)]
fn start_rescheduled(
    world: &mut SprintWorld,
    name: String,
    date: String,
) -> Result<(), eyre::Report> {
    let update = SprintUpdate::new().with_start_date(parse_date(&date)?);
    reschedule(world, name, update)
}

#[when(r#"the calendar advances to "{date}""#)]
fn calendar_advances(world: &mut SprintWorld, date: String) -> Result<(), eyre::Report> {
    world.clock.set_today(parse_date(&date)?);
    Ok(())
}

#[when("sprint states are refreshed")]
fn states_refreshed(world: &mut SprintWorld) -> Result<(), eyre::Report> {
    run_async(world.sprint_service.refresh_states()).wrap_err("refresh sprint states")?;
    Ok(())
}

#[when(r#"a new task named "{name}" is drafted for sprint "{sprint}""#)]
fn task_drafted(world: &mut SprintWorld, name: String, sprint: String) -> Result<(), eyre::Report> {
    let owner = world.sprint(&sprint)?;
    let draft = TaskDraft {
        task_id: None,
        name,
        project_id: Some(owner.project_id()),
        sprint_id: Some(owner.id()),
        deadline: None,
        deadline_manual: false,
    };
    let preview = run_async(
        world
            .task_service
            .preview_task_change(draft, TaskDraftChange::Name),
    )
    .wrap_err("preview task draft")?;
    world.last_preview = Some(preview);
    Ok(())
}
