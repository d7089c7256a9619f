//! Virtual-user load generator for the PR review service.
//!
//! A fixed number of virtual users replay the create team, create pull
//! request, reassign reviewer and merge workflow against a target service
//! until a deadline passes. Every step yields one labelled pass/fail check.

pub mod check;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod ids;
pub mod scenario;
pub mod scheduler;
pub mod sink;
pub mod telemetry;
