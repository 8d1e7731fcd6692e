//! In-memory integration tests for task deadlines following sprint dates.

use super::helpers::{Planning, planning};
use crate::test_helpers::parse_date;
use rstest::rstest;
use sprintwise::planning::{
    domain::{PlanningDomainError, SprintUpdate, TaskUpdate},
    services::PlanningServiceError,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn end_date_cascade_skips_manual_deadlines(planning: Planning) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let follower = planning.task("Follower", &sprint, None).await?;
    let pinned = planning.task("Pinned", &sprint, Some("2024-01-08")).await?;

    planning
        .sprints
        .update_sprint(
            sprint.id(),
            SprintUpdate::new().with_end_date(parse_date("2024-01-26")?),
        )
        .await?;

    assert_eq!(
        planning.reload(&follower).await?.deadline(),
        Some(parse_date("2024-01-26")?)
    );
    assert_eq!(
        planning.reload(&pinned).await?.deadline(),
        Some(parse_date("2024-01-08")?)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shrinking_window_reports_every_stranded_task(
    planning: Planning,
) -> Result<(), eyre::Report> {
    let sprint = planning
        .sprint("Sprint 1", "2024-01-01", Some("2024-01-28"))
        .await?;
    for n in 1..=6 {
        planning
            .task(&format!("Late {n}"), &sprint, Some("2024-01-25"))
            .await?;
    }

    let result = planning
        .sprints
        .update_sprint(
            sprint.id(),
            SprintUpdate::new().with_end_date(parse_date("2024-01-14")?),
        )
        .await;

    let Err(PlanningServiceError::Domain(PlanningDomainError::ManualDeadlinesOutsideSprint {
        offenders,
        ..
    })) = result
    else {
        return Err(eyre::eyre!("expected manual deadline rejection"));
    };
    assert_eq!(offenders.sample().len(), 5);
    assert_eq!(offenders.remaining(), 1);
    assert!(offenders.to_string().ends_with("(+1 more)"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deadline_reset_to_end_rejoins_the_cascade(planning: Planning) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let task = planning.task("Pinned", &sprint, Some("2024-01-05")).await?;
    assert!(task.deadline_manual());

    planning
        .tasks
        .update_task(
            task.id(),
            TaskUpdate::new().with_deadline(parse_date("2024-01-15")?),
        )
        .await?;
    planning
        .sprints
        .update_sprint(
            sprint.id(),
            SprintUpdate::new().with_start_date(parse_date("2024-01-03")?),
        )
        .await?;

    let synced = planning.reload(&task).await?;
    assert_eq!(synced.deadline(), Some(parse_date("2024-01-17")?));
    assert!(!synced.deadline_manual());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleared_sprint_keeps_last_deadline(planning: Planning) -> Result<(), eyre::Report> {
    let sprint = planning.sprint("Sprint 1", "2024-01-01", None).await?;
    let task = planning.task("Drifting", &sprint, None).await?;

    let cleared = planning
        .tasks
        .update_task(task.id(), TaskUpdate::new().clear_sprint())
        .await?;
    planning
        .sprints
        .update_sprint(
            sprint.id(),
            SprintUpdate::new().with_end_date(parse_date("2024-01-20")?),
        )
        .await?;

    assert_eq!(cleared.sprint_id(), None);
    assert_eq!(
        planning.reload(&task).await?.deadline(),
        Some(parse_date("2024-01-15")?)
    );
    Ok(())
}
