//! Sprintwise: sprint planning rules for projects and tasks.
//!
//! This crate keeps sprint date windows, task deadlines and sprint lifecycle
//! states consistent with each other, whatever order edits arrive in.
//!
//! # Architecture
//!
//! Sprintwise follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`planning`]: Sprints, sprint-bound tasks and their services

pub mod planning;
