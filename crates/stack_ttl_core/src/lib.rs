//! Shared stack TTL domain primitives.
//!
//! This crate owns configuration parsing, the termination response contract,
//! and the deterministic termination plan (environment, schedule, policy).
//! It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod plan;
pub mod schedule;
