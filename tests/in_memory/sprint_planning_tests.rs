//! In-memory integration tests for sprint windows and placement.

use super::helpers::{Planning, planning};
use crate::test_helpers::parse_date;
use rstest::rstest;
use sprintwise::planning::{
    domain::{PlanningDomainError, ProjectId, SprintUpdate},
    services::{CreateSprintRequest, PlanningServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn consecutive_sprints_share_no_day(planning: Planning) -> Result<(), eyre::Report> {
    let first = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let second = planning.sprint("Sprint 2", "2024-01-16", None).await?;

    assert_eq!(first.end_date(), parse_date("2024-01-15")?);
    assert_eq!(second.end_date(), parse_date("2024-01-30")?);

    let listed = planning.sprints.list_project_sprints(planning.project).await?;
    let ids: Vec<_> = listed.iter().map(|sprint| sprint.id()).collect();
    assert_eq!(ids, [second.id(), first.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sprint_starting_on_previous_end_overlaps(planning: Planning) -> Result<(), eyre::Report> {
    planning.sprint("Sprint 1", "2024-01-01", None).await?;

    let result = planning
        .sprints
        .create_sprint(CreateSprintRequest::new(
            "Sprint 2",
            planning.project,
            parse_date("2024-01-15")?,
        ))
        .await;

    let Err(PlanningServiceError::Domain(err)) = result else {
        return Err(eyre::eyre!("expected overlap rejection"));
    };
    assert!(matches!(err, PlanningDomainError::OverlappingSprint { .. }));
    assert!(err.to_string().contains("'Sprint 1'"), "{err}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn maximum_length_is_four_weeks(planning: Planning) -> Result<(), eyre::Report> {
    let longest = planning
        .sprint("Long", "2024-01-01", Some("2024-01-28"))
        .await?;
    assert_eq!(longest.window().length_days(), 28);
    assert!(longest.end_date_manual());

    let result = planning
        .sprints
        .update_sprint(
            longest.id(),
            SprintUpdate::new().with_end_date(parse_date("2024-01-29")?),
        )
        .await;

    assert!(matches!(
        result,
        Err(PlanningServiceError::Domain(
            PlanningDomainError::DurationExceeded { days: 29, .. }
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn end_before_start_is_rejected(planning: Planning) -> Result<(), eyre::Report> {
    let result = planning
        .sprint("Backwards", "2024-01-10", Some("2024-01-09"))
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("expected rejection"))?;
    assert!(
        err.to_string()
            .contains("cannot be before the start date (2024-01-10)"),
        "{err}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_planned_sprint_moves_between_projects(
    planning: Planning,
) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let target = ProjectId::new();

    let moved = planning
        .sprints
        .update_sprint(sprint.id(), SprintUpdate::new().with_project(target))
        .await?;

    assert_eq!(moved.project_id(), target);
    assert!(
        planning
            .sprints
            .list_project_sprints(planning.project)
            .await?
            .is_empty()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_into_overlapping_project_is_rejected(
    planning: Planning,
) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let target = ProjectId::new();
    planning
        .sprints
        .create_sprint(CreateSprintRequest::new(
            "Other",
            target,
            parse_date("2024-01-10")?,
        ))
        .await?;

    let result = planning
        .sprints
        .update_sprint(sprint.id(), SprintUpdate::new().with_project(target))
        .await;

    assert!(matches!(
        result,
        Err(PlanningServiceError::Domain(
            PlanningDomainError::OverlappingSprint { .. }
        ))
    ));
    Ok(())
}
