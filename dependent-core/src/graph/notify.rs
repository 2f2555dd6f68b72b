//! Change-notification protocol.
//!
//! Nodes form a directed graph where edges point downstream: a parent
//! holds links to the children that observe it. When a parent's value
//! changes, it notifies every child; computed children evict their cache
//! and forward the notification, so invalidation reaches everything
//! transitively downstream.
//!
//! Children are held as `Weak` references. Observation links are
//! non-owning: a child's lifetime is controlled by whoever created it,
//! and a dropped child is simply skipped during notification.
//!
//! Traversal order among children is unspecified. Notification is a
//! reachability property, not a sequence, and duplicate deliveries (as
//! in diamond-shaped graphs) are harmless because invalidation only
//! evicts.

use std::collections::HashMap;
use std::sync::Weak;

use parking_lot::RwLock;
use tracing::trace;

use super::id::NodeId;

/// Child side of the notification graph: a node that reacts to upstream
/// changes.
pub trait Observer: Send + Sync {
    /// The observing node's ID.
    fn node_id(&self) -> NodeId;

    /// React to an upstream change.
    ///
    /// Computed nodes clear their memoization cache and forward the
    /// notification to their own children. Nothing recomputes here;
    /// invalidation is lazy.
    fn notify_change(&self);
}

/// Parent side of the notification graph: a node other nodes can depend
/// on.
pub trait Dependable: Send + Sync {
    /// This node's ID.
    fn node_id(&self) -> NodeId;

    /// Register `child` as an observer of this node.
    ///
    /// Idempotent: children form a set keyed by node ID, and re-adding
    /// an existing child has no effect. Returns `true` only when a new
    /// edge was created. Edges are never removed.
    fn add_child(&self, child: Weak<dyn Observer>) -> bool;

    /// Propagate a change notification to every registered child.
    fn notify_change(&self);
}

/// The set of children registered on a node.
pub(crate) struct ChildSet {
    entries: RwLock<HashMap<NodeId, Weak<dyn Observer>>>,
}

impl ChildSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register an observer, returning `false` if it was already
    /// present or already dead.
    pub(crate) fn add(&self, child: Weak<dyn Observer>) -> bool {
        let Some(live) = child.upgrade() else {
            return false;
        };
        let id = live.node_id();

        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, child);
        true
    }

    /// Notify every live child. Order is unspecified.
    pub(crate) fn notify_all(&self) {
        // Snapshot first so no lock is held while children run their
        // own invalidation, which may walk further down the graph.
        let children: Vec<Weak<dyn Observer>> =
            self.entries.read().values().cloned().collect();

        trace!(children = children.len(), "propagating change notification");

        for child in children {
            if let Some(child) = child.upgrade() {
                child.notify_change();
            }
        }
    }

    /// Number of registered children, live or not.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
