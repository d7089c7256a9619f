//! Identifier generation for per-iteration entities.
//!
//! Every team, user and pull request gets a fresh identifier so that virtual
//! users never touch each other's data. Isolation comes from uniqueness, not
//! from locking.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Produces `prefix + "_" + token` identifiers.
///
/// Implementations must be callable concurrently from every virtual user
/// without producing duplicates.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self, prefix: &str) -> String;
}

/// Random v4 UUID tokens. Stateless, so sharing one instance is safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4())
    }
}

/// Deterministic counter-based tokens, unique for the lifetime of the instance.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_{n:08}")
    }
}
