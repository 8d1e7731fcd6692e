//! Sprint aggregate root and its lifecycle state.

use super::{
    OffendingTasks, ParseSprintStateError, ParseStateModeError, PlanningDomainError, ProjectId,
    SprintId, SprintName, SprintPolicy, SprintWindow, Task,
};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sprint lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintState {
    /// The sprint has not started yet.
    Planned,
    /// Today falls inside the sprint window.
    Active,
    /// The sprint window has passed.
    Done,
}

impl SprintState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    /// Returns whether the sprint has left the planned state.
    #[must_use]
    pub const fn has_started(self) -> bool {
        matches!(self, Self::Active | Self::Done)
    }
}

impl fmt::Display for SprintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SprintState {
    type Error = ParseSprintStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "active" => Ok(Self::Active),
            "done" => Ok(Self::Done),
            _ => Err(ParseSprintStateError(value.to_owned())),
        }
    }
}

/// How the sprint state is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMode {
    /// State follows the calendar.
    #[default]
    Auto,
    /// State is pinned by an explicit override.
    Manual,
}

impl StateMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for StateMode {
    type Error = ParseStateModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseStateModeError(value.to_owned())),
        }
    }
}

/// Derives the sprint state shown to users.
///
/// In manual mode the override wins. In auto mode the state follows `today`
/// relative to the window, falling back to [`SprintState::Planned`] when a
/// bound is unknown.
#[must_use]
pub fn derive_state(
    mode: StateMode,
    state_manual: SprintState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> SprintState {
    if mode == StateMode::Manual {
        return state_manual;
    }
    match (start, end) {
        (Some(start_date), _) if today < start_date => SprintState::Planned,
        (Some(start_date), Some(end_date)) if start_date <= today && today <= end_date => {
            SprintState::Active
        }
        (_, Some(end_date)) if today > end_date => SprintState::Done,
        _ => SprintState::Planned,
    }
}

/// Parameter object for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSprint {
    /// Display label.
    pub name: SprintName,
    /// Owning project.
    pub project_id: ProjectId,
    /// First day of the sprint.
    pub start_date: NaiveDate,
    /// Last day of the sprint; the policy default when absent.
    pub end_date: Option<NaiveDate>,
    /// Explicit manual end flag; inferred from the end date when absent.
    pub end_date_manual: Option<bool>,
    /// State mode.
    pub state_mode: StateMode,
    /// Manual state override.
    pub state_manual: SprintState,
}

/// Field changes requested for an existing sprint.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintUpdate {
    name: Option<SprintName>,
    project_id: Option<ProjectId>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    end_date_manual: Option<bool>,
    state_mode: Option<StateMode>,
    state_manual: Option<SprintState>,
}

impl SprintUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the sprint.
    #[must_use]
    pub fn with_name(mut self, name: SprintName) -> Self {
        self.name = Some(name);
        self
    }

    /// Moves the sprint to another project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Changes the start date.
    #[must_use]
    pub const fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Changes the end date.
    #[must_use]
    pub const fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Sets the manual end flag explicitly.
    #[must_use]
    pub const fn with_end_date_manual(mut self, manual: bool) -> Self {
        self.end_date_manual = Some(manual);
        self
    }

    /// Changes the state mode.
    #[must_use]
    pub const fn with_state_mode(mut self, mode: StateMode) -> Self {
        self.state_mode = Some(mode);
        self
    }

    /// Changes the manual state override.
    #[must_use]
    pub const fn with_state_manual(mut self, state: SprintState) -> Self {
        self.state_manual = Some(state);
        self
    }

    /// Returns the requested project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns whether the start or end date is part of the update.
    #[must_use]
    pub const fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Returns whether the update can move the sprint relative to its
    /// siblings.
    #[must_use]
    pub const fn touches_placement(&self) -> bool {
        self.project_id.is_some() || self.touches_dates()
    }

    /// Returns whether the update feeds the past-state rule.
    #[must_use]
    pub const fn touches_state_inputs(&self) -> bool {
        self.touches_dates() || self.state_mode.is_some() || self.state_manual.is_some()
    }
}

/// Sprint aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    id: SprintId,
    name: SprintName,
    project_id: ProjectId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    end_date_manual: bool,
    state_mode: StateMode,
    state_manual: SprintState,
    state: SprintState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted sprint aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSprintData {
    /// Persisted sprint identifier.
    pub id: SprintId,
    /// Persisted display label.
    pub name: SprintName,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted start date.
    pub start_date: NaiveDate,
    /// Persisted end date.
    pub end_date: NaiveDate,
    /// Persisted manual end flag.
    pub end_date_manual: bool,
    /// Persisted state mode.
    pub state_mode: StateMode,
    /// Persisted manual state override.
    pub state_manual: SprintState,
    /// Persisted derived state.
    pub state: SprintState,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a sprint, filling in the default end date when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanningDomainError`] when the window is invalid or a
    /// manual planned/active state is requested for a sprint that already
    /// ended.
    pub fn create(
        params: NewSprint,
        policy: &SprintPolicy,
        clock: &impl Clock,
    ) -> Result<Self, PlanningDomainError> {
        let now = clock.utc();
        let default_end = policy.default_end_date(params.start_date)?;
        let (end_date, end_date_manual) = match params.end_date {
            None => (default_end, false),
            Some(end) => (
                end,
                params.end_date_manual.unwrap_or(end != default_end),
            ),
        };

        let mut sprint = Self {
            id: SprintId::new(),
            name: params.name,
            project_id: params.project_id,
            start_date: params.start_date,
            end_date,
            end_date_manual,
            state_mode: params.state_mode,
            state_manual: params.state_manual,
            state: SprintState::Planned,
            created_at: now,
            updated_at: now,
        };
        sprint.state = sprint.compute_state(now.date_naive());
        policy.check_window(sprint.window())?;
        sprint.check_past_state(now.date_naive())?;
        Ok(sprint)
    }

    /// Reconstructs a sprint from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSprintData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            project_id: data.project_id,
            start_date: data.start_date,
            end_date: data.end_date,
            end_date_manual: data.end_date_manual,
            state_mode: data.state_mode,
            state_manual: data.state_manual,
            state: data.state,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> SprintId {
        self.id
    }

    /// Returns the display label.
    #[must_use]
    pub const fn name(&self) -> &SprintName {
        &self.name
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the first day of the sprint.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last day of the sprint.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns whether the end date was pinned away from the default.
    #[must_use]
    pub const fn end_date_manual(&self) -> bool {
        self.end_date_manual
    }

    /// Returns the state mode.
    #[must_use]
    pub const fn state_mode(&self) -> StateMode {
        self.state_mode
    }

    /// Returns the manual state override.
    #[must_use]
    pub const fn state_manual(&self) -> SprintState {
        self.state_manual
    }

    /// Returns the persisted derived state.
    #[must_use]
    pub const fn state(&self) -> SprintState {
        self.state
    }

    /// Returns the sprint window.
    #[must_use]
    pub const fn window(&self) -> SprintWindow {
        SprintWindow::new(self.start_date, self.end_date)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Derives the state this sprint should have on `today`.
    #[must_use]
    pub fn compute_state(&self, today: NaiveDate) -> SprintState {
        derive_state(
            self.state_mode,
            self.state_manual,
            Some(self.start_date),
            Some(self.end_date),
            today,
        )
    }

    /// Recomputes the stored state. Returns whether it changed.
    pub fn refresh_state(&mut self, clock: &impl Clock) -> bool {
        let next = self.compute_state(clock.utc().date_naive());
        if next == self.state {
            return false;
        }
        self.state = next;
        self.touch(clock);
        true
    }

    /// Applies an update following the ordered sprint write rules.
    ///
    /// Project lock, start-date shift, field application and end-flag
    /// re-derivation happen here. Rules that need the sprint's tasks or
    /// siblings are checked by the caller against the returned outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanningDomainError`] when the project is locked, the new
    /// window is invalid, or the past-state rule is violated. The sprint may
    /// be partially modified on error and must be discarded.
    pub fn apply_update(
        &mut self,
        update: &SprintUpdate,
        has_tasks: bool,
        policy: &SprintPolicy,
        clock: &impl Clock,
    ) -> Result<SprintUpdateOutcome, PlanningDomainError> {
        if let Some(project_id) = update.project_id {
            if project_id != self.project_id {
                self.check_project_unlocked(has_tasks)?;
            }
        }

        let previous = self.window();
        match (update.start_date, update.end_date) {
            (Some(start), None) => {
                if !self.end_date_manual {
                    self.end_date = policy.default_end_date(start)?;
                    self.end_date_manual = false;
                }
                self.start_date = start;
            }
            (start, end) => {
                self.start_date = start.unwrap_or(self.start_date);
                self.end_date = end.unwrap_or(self.end_date);
            }
        }

        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(project_id) = update.project_id {
            self.project_id = project_id;
        }
        if let Some(manual) = update.end_date_manual {
            self.end_date_manual = manual;
        }
        if let Some(mode) = update.state_mode {
            self.state_mode = mode;
        }
        if let Some(state) = update.state_manual {
            self.state_manual = state;
        }
        if update.end_date.is_some() && update.end_date_manual.is_none() {
            self.end_date_manual = self.end_date != policy.default_end_date(self.start_date)?;
        }

        let today = clock.utc().date_naive();
        if update.touches_dates() {
            policy.check_window(self.window())?;
        }
        if update.touches_state_inputs() {
            self.check_past_state(today)?;
        }
        self.state = self.compute_state(today);
        self.touch(clock);

        Ok(SprintUpdateOutcome {
            previous,
            dates_touched: update.touches_dates(),
            end_moved: previous.end() != self.end_date,
        })
    }

    /// Switches to auto mode and recomputes the state immediately.
    pub fn switch_to_auto(&mut self, clock: &impl Clock) {
        self.state_mode = StateMode::Auto;
        self.state = self.compute_state(clock.utc().date_naive());
        self.touch(clock);
    }

    /// Pins the state manually.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::PastSprintState`] when pinning planned
    /// or active on a sprint whose end date is in the past.
    pub fn pin_state(
        &mut self,
        state: SprintState,
        clock: &impl Clock,
    ) -> Result<(), PlanningDomainError> {
        self.state_mode = StateMode::Manual;
        self.state_manual = state;
        self.check_past_state(clock.utc().date_naive())?;
        self.state = state;
        self.touch(clock);
        Ok(())
    }

    /// Rejects when any manually pinned task deadline lies outside the
    /// current window.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::ManualDeadlinesOutsideSprint`] naming
    /// at most `sample_size` offending tasks.
    pub fn check_manual_deadlines<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
        sample_size: usize,
    ) -> Result<(), PlanningDomainError> {
        let window = self.window();
        let offenders: Vec<_> = tasks
            .into_iter()
            .filter(|task| task.deadline_manual())
            .filter(|task| task.deadline().is_some_and(|date| !window.contains(date)))
            .map(|task| task.name().clone())
            .collect();
        if offenders.is_empty() {
            return Ok(());
        }
        Err(PlanningDomainError::ManualDeadlinesOutsideSprint {
            start: window.start(),
            end: window.end(),
            offenders: OffendingTasks::new(offenders, sample_size),
        })
    }

    /// Rejects when the window collides with a sibling sprint of the same
    /// project.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::OverlappingSprint`] naming the first
    /// conflicting sprint.
    pub fn check_no_overlap<'a>(
        &self,
        siblings: impl IntoIterator<Item = &'a Self>,
    ) -> Result<(), PlanningDomainError> {
        let window = self.window();
        let conflict = siblings.into_iter().find(|other| {
            other.id != self.id
                && other.project_id == self.project_id
                && other.window().overlaps(window)
        });
        match conflict {
            None => Ok(()),
            Some(other) => Err(PlanningDomainError::OverlappingSprint {
                start: self.start_date,
                end: self.end_date,
                other_id: other.id,
                other_name: other.name.clone(),
                other_start: other.start_date,
                other_end: other.end_date,
            }),
        }
    }

    fn check_project_unlocked(&self, has_tasks: bool) -> Result<(), PlanningDomainError> {
        if has_tasks {
            return Err(PlanningDomainError::ProjectLockedByTasks(self.id));
        }
        if self.state.has_started() {
            return Err(PlanningDomainError::ProjectLockedByState {
                sprint_id: self.id,
                state: self.state,
            });
        }
        Ok(())
    }

    fn check_past_state(&self, today: NaiveDate) -> Result<(), PlanningDomainError> {
        let pinned_open = matches!(self.state_manual, SprintState::Planned | SprintState::Active);
        if self.state_mode == StateMode::Manual && pinned_open && self.end_date < today {
            return Err(PlanningDomainError::PastSprintState {
                sprint_id: self.id,
                end_date: self.end_date,
                state: self.state_manual,
            });
        }
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// What an applied [`SprintUpdate`] changed, for the cascade to tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprintUpdateOutcome {
    previous: SprintWindow,
    dates_touched: bool,
    end_moved: bool,
}

impl SprintUpdateOutcome {
    /// Window before the update.
    #[must_use]
    pub const fn previous_window(&self) -> SprintWindow {
        self.previous
    }

    /// Whether the caller supplied a start or end date.
    #[must_use]
    pub const fn dates_touched(&self) -> bool {
        self.dates_touched
    }

    /// Whether the end date now differs from before.
    #[must_use]
    pub const fn end_moved(&self) -> bool {
        self.end_moved
    }
}
