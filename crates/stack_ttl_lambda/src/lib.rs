//! AWS-oriented adapters and handlers for scheduled stack termination.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! provisioning client seam and structured logging) and re-exports the core
//! contract under a single runtime module boundary.

pub mod adapters;
pub mod handlers;

pub mod runtime {
    pub use stack_ttl_core::{contract, plan, schedule};
}
