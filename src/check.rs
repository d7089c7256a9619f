//! Outcome classification.
//!
//! Each step declares which statuses count as a pass. Classification is a
//! pure function of the status; emission of the resulting event is the only
//! side effect.

use serde::Serialize;
use std::ops::RangeInclusive;

use crate::executor::{OutcomeStatus, StepOutcome};
use crate::sink::MetricsSink;

/// Statuses a step treats as non-failing. Transport errors never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acceptance {
    AnyOf(&'static [u16]),
    Range(RangeInclusive<u16>),
}

impl Acceptance {
    pub fn accepts(&self, status: OutcomeStatus) -> bool {
        let OutcomeStatus::Http(code) = status else {
            return false;
        };
        match self {
            Acceptance::AnyOf(codes) => codes.contains(&code),
            Acceptance::Range(range) => range.contains(&code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEvent {
    pub label: String,
    pub passed: bool,
}

impl CheckEvent {
    pub fn new(label: impl Into<String>, passed: bool) -> Self {
        Self {
            label: label.into(),
            passed,
        }
    }
}

/// Classify `outcome` and emit exactly one event to `sink`.
pub fn check(
    label: &str,
    outcome: &StepOutcome,
    acceptance: &Acceptance,
    sink: &dyn MetricsSink,
) -> CheckEvent {
    let event = CheckEvent::new(label, acceptance.accepts(outcome.status));
    sink.record_check(&event);
    event
}
