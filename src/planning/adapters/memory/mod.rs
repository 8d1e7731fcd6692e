//! In-memory adapters used by tests and embedded hosts.

mod planning;

pub use planning::InMemoryPlanningRepository;
