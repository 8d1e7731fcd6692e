//! Port contracts for sprint planning.
//!
//! Ports define infrastructure-agnostic interfaces used by planning
//! services.

pub mod repository;

pub use repository::{
    PlanningChangeSet, PlanningRepository, PlanningRepositoryError, PlanningRepositoryResult,
};
