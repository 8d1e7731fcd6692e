//! Sprint planning rules for projects and tasks.
//!
//! Sprints own a bounded date window and a lifecycle state. Tasks may join
//! a sprint, in which case their deadline follows the sprint end date until
//! someone pins it. The services keep windows, deadlines and states
//! consistent whatever order edits arrive in, and reject any change that
//! would break them without writing anything. The module follows hexagonal
//! architecture:
//!
//! - Domain types and rules in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
