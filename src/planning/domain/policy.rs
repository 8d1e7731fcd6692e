//! Tunable sprint length and reporting limits.

use super::{PlanningDomainError, SprintWindow};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

const DEFAULT_END_OFFSET_DAYS: u32 = 14;
const MAX_LENGTH_DAYS: u32 = 28;
const OFFENDER_SAMPLE_SIZE: usize = 5;

/// Configuration for sprint date rules.
///
/// Missing fields fall back to their defaults when deserialised, so a host
/// can override a single value.
///
/// # Examples
///
/// ```
/// use sprintwise::planning::domain::SprintPolicy;
///
/// let policy = SprintPolicy::default();
/// assert_eq!(policy.default_end_offset_days, 14);
/// assert_eq!(policy.max_length_days, 28);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintPolicy {
    /// Days added to the start date to derive the default end date.
    pub default_end_offset_days: u32,
    /// Maximum inclusive sprint length in days.
    pub max_length_days: u32,
    /// Number of task names listed when sprint dates strand manual
    /// deadlines.
    pub offender_sample_size: usize,
}

impl Default for SprintPolicy {
    fn default() -> Self {
        Self {
            default_end_offset_days: DEFAULT_END_OFFSET_DAYS,
            max_length_days: MAX_LENGTH_DAYS,
            offender_sample_size: OFFENDER_SAMPLE_SIZE,
        }
    }
}

impl SprintPolicy {
    /// Checks that the default window fits inside the maximum length.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::InvalidPolicy`] when the maximum length
    /// is zero or the default window is longer than the maximum.
    pub fn validate(&self) -> Result<(), PlanningDomainError> {
        if self.max_length_days == 0 {
            return Err(PlanningDomainError::InvalidPolicy(
                "maximum sprint length must be at least one day".to_owned(),
            ));
        }
        if self.default_end_offset_days >= self.max_length_days {
            return Err(PlanningDomainError::InvalidPolicy(format!(
                "default end offset of {} days does not fit in a {}-day sprint",
                self.default_end_offset_days, self.max_length_days
            )));
        }
        Ok(())
    }

    /// Derives the default end date for a sprint starting on `start`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::DateOutOfRange`] when the result falls
    /// outside the supported calendar.
    pub fn default_end_date(&self, start: NaiveDate) -> Result<NaiveDate, PlanningDomainError> {
        start
            .checked_add_days(Days::new(u64::from(self.default_end_offset_days)))
            .ok_or(PlanningDomainError::DateOutOfRange {
                date: start,
                days: self.default_end_offset_days,
            })
    }

    /// Checks window ordering and maximum length.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningDomainError::EndBeforeStart`] or
    /// [`PlanningDomainError::DurationExceeded`].
    pub fn check_window(&self, window: SprintWindow) -> Result<(), PlanningDomainError> {
        if window.end() < window.start() {
            return Err(PlanningDomainError::EndBeforeStart {
                start: window.start(),
                end: window.end(),
            });
        }
        let days = window.length_days();
        if days > i64::from(self.max_length_days) {
            return Err(PlanningDomainError::DurationExceeded {
                days,
                max_days: self.max_length_days,
                max_weeks: self.max_length_days.div_euclid(7),
            });
        }
        Ok(())
    }
}
