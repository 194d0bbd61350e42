//! AWS-oriented adapters and handlers for the sensor telemetry lambdas.
//!
//! This crate owns runtime integration details (Lambda handlers, the DynamoDB
//! reading store, configuration and logging) on top of the domain rules in
//! `telemetry_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod observability;
