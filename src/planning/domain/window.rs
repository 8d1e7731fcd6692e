//! Calendar window arithmetic shared by sprints and task deadlines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive `[start, end]` date range of a sprint.
///
/// The window itself does not enforce ordering or length; see
/// [`SprintPolicy::check_window`](super::SprintPolicy::check_window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SprintWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl SprintWindow {
    /// Creates a window from its bounds.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// First day of the window.
    #[must_use]
    pub const fn start(self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    #[must_use]
    pub const fn end(self) -> NaiveDate {
        self.end
    }

    /// Inclusive length in days. Zero or negative when the bounds are
    /// reversed.
    #[must_use]
    pub fn length_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Returns whether `date` lies inside the window, bounds included.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns whether two windows share at least one day.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        other.start <= self.end && other.end >= self.start
    }
}

impl fmt::Display for SprintWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}
