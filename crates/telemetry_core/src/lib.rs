//! Shared sensor telemetry domain primitives.
//!
//! This crate owns reading/command contracts, time-window arithmetic,
//! statistics aggregation and the actuation decision. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod actuation;
pub mod contract;
pub mod statistics;
pub mod timestamp;
pub mod window;
