//! In-memory integration tests for sprint state overrides and refresh.

use super::helpers::{Planning, planning};
use crate::test_helpers::parse_date;
use rstest::rstest;
use sprintwise::planning::domain::{SprintState, StateMode};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn daily_refresh_walks_through_the_lifecycle(
    planning: Planning,
) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let mut observed = vec![sprint.state()];

    for day in ["2024-01-01", "2024-01-15", "2024-01-16", "2024-01-17"] {
        planning.clock.set_today(parse_date(day)?);
        for refreshed in planning.sprints.refresh_states().await? {
            observed.push(refreshed.state());
        }
    }

    assert_eq!(
        observed,
        [SprintState::Planned, SprintState::Active, SprintState::Done]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn releasing_override_catches_up_with_calendar(
    planning: Planning,
) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    planning.sprints.set_planned(sprint.id()).await?;
    planning.clock.set_today(parse_date("2024-01-08")?);
    assert!(planning.sprints.refresh_states().await?.is_empty());

    let released = planning.sprints.set_auto(sprint.id()).await?;

    assert_eq!(released.state_mode(), StateMode::Auto);
    assert_eq!(released.state(), SprintState::Active);
    Ok(())
}
