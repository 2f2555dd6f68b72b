//! Source nodes: externally written value holders that root the graph.
//!
//! A source node stores one value per owner and notifies its children
//! when a write actually changes the stored value. It has no cache of
//! its own, so its role in propagation is purely to detect changes and
//! forward notifications downstream.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use super::id::{NodeId, OwnerId};
use super::notify::{ChildSet, Dependable, Observer};

/// A value holder participating in the notification graph.
///
/// Cloning a `SourceNode` yields another handle to the same underlying
/// node: values and children are shared. A node is typically created
/// once and shared by every instance of the owning type, with each
/// instance's value kept separate under its [`OwnerId`].
///
/// # Example
///
/// ```
/// use dependent_core::{OwnerId, SourceNode};
///
/// let temperature = SourceNode::new();
/// let obj = OwnerId::new();
///
/// assert_eq!(temperature.get(obj), None);
/// temperature.set(obj, 20);
/// assert_eq!(temperature.get(obj), Some(20));
/// ```
pub struct SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Unique identifier for this node.
    id: NodeId,

    /// Per-owner values. Distinct owners are fully independent.
    values: Arc<RwLock<HashMap<OwnerId, T>>>,

    /// Downstream observers to notify on change.
    children: Arc<ChildSet>,
}

impl<T> SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new source node with no values and no children.
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            values: Arc::new(RwLock::new(HashMap::new())),
            children: Arc::new(ChildSet::new()),
        }
    }

    /// Get the node's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the value on record for `owner`, or `None` if nothing has
    /// been stored yet.
    pub fn get(&self, owner: OwnerId) -> Option<T> {
        self.values.read().get(&owner).cloned()
    }

    /// Store a value for `owner`, notifying children if it differs from
    /// the previous one.
    ///
    /// The previous entry is compared with value equality; an absent
    /// entry counts as different from any value. On a change, children
    /// are notified before the new value lands — invalidation is lazy,
    /// so nothing reads the node during the walk. Writing an equal value
    /// fires no notification and mutates nothing observably.
    ///
    /// One effective write fires exactly one notification, regardless
    /// of how many owners hold values in this node: downstream
    /// invalidation is coarse, not scoped to the owner that changed.
    pub fn set(&self, owner: OwnerId, value: T) {
        let unchanged = self.values.read().get(&owner) == Some(&value);
        if unchanged {
            return;
        }

        trace!(node = self.id.raw(), owner = owner.raw(), "source value changed");
        self.children.notify_all();
        self.values.write().insert(owner, value);
    }

    /// Number of owners with a stored value.
    pub fn value_count(&self) -> usize {
        self.values.read().len()
    }

    /// Number of registered children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl<T> Default for SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            values: Arc::clone(&self.values),
            children: Arc::clone(&self.children),
        }
    }
}

impl<T> Dependable for SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn add_child(&self, child: Weak<dyn Observer>) -> bool {
        self.children.add(child)
    }

    fn notify_change(&self) {
        self.children.notify_all()
    }
}

impl<T> Debug for SourceNode<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceNode")
            .field("id", &self.id)
            .field("value_count", &self.value_count())
            .field("child_count", &self.child_count())
            .finish()
    }
}
