//! Identifier types for the dependency graph.
//!
//! Nodes and owners are both identified by small copyable IDs backed by
//! atomic counters. IDs are unique for the lifetime of the process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a node in the dependency graph.
///
/// Child sets are keyed by `NodeId`, which is what makes edge insertion
/// idempotent: registering the same child twice produces one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identity for an owning instance.
///
/// Every value and cache entry in the graph is scoped to an owner.
/// The owning system creates one `OwnerId` per instance and keeps it for
/// as long as that instance participates in the graph; distinct owners
/// hold fully independent state in the same node.
///
/// Identity is by ID, not by value: two owners are the same only if they
/// hold the same `OwnerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Generate a new unique owner ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}
