//! Step definitions for sprint planning behaviour scenarios.


mod given;
mod when;
