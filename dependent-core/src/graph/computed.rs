//! Computed nodes: lazily evaluated, memoized derived values.
//!
//! A computed node wraps a computation over its owner instead of holding
//! externally written state. Results are cached per owner (and per
//! argument value for the method form); any upstream change evicts the
//! whole cache and the next access recomputes.
//!
//! # Wiring
//!
//! Dependencies are declared up front through [`ComputedBuilder`], and
//! the registration step is explicit: `bind` allocates the node and adds
//! it as a child of every declared parent, in one visible place. The
//! edge set is fixed from then on. Because a node cannot exist without a
//! bound computation, there is no "computed node without a function"
//! state to guard against.
//!
//! # Invalidation
//!
//! Invalidation is coarse: one change anywhere in the dependency set
//! clears every owner's entry and every argument's entry, even when only
//! one owner's upstream value moved. It is also lazy: eviction never
//! recomputes, it only clears, and the notification is forwarded so that
//! nodes depending on this one are invalidated too.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::GraphError;

use super::id::{NodeId, OwnerId};
use super::notify::{ChildSet, Dependable, Observer};

/// Parents in declaration order. Most nodes depend on a handful, so the
/// list is stored inline.
type ParentIds = SmallVec<[NodeId; 4]>;

/// Builder that wires a computed node into the graph.
///
/// Parents are declared first, in order; `bind` (or `bind_method`)
/// attaches the computation and performs the registration. Declaring the
/// same parent twice creates a single edge.
///
/// # Example
///
/// ```
/// use dependent_core::{ComputedNode, OwnerId, SourceNode};
///
/// let temperature = SourceNode::new();
/// let t = temperature.clone();
/// let is_hot = ComputedNode::<bool>::builder()
///     .parent(&temperature)
///     .bind(move |owner| t.get(owner).is_some_and(|v| v > 30));
///
/// let obj = OwnerId::new();
/// temperature.set(obj, 20);
/// assert!(!is_hot.get(obj));
/// ```
#[derive(Default)]
pub struct ComputedBuilder {
    parents: Vec<Box<dyn Dependable>>,
}

impl ComputedBuilder {
    /// Create a builder with no parents declared.
    pub fn new() -> Self {
        Self {
            parents: Vec::new(),
        }
    }

    /// Declare a dependency on `parent`. Declaration order is the
    /// node's parent order.
    pub fn parent<P>(mut self, parent: &P) -> Self
    where
        P: Dependable + Clone + 'static,
    {
        self.parents.push(Box::new(parent.clone()));
        self
    }

    /// Attach the computation and wire the node into the graph.
    ///
    /// The returned node is already registered as a child of every
    /// declared parent; wiring is complete when this call returns and
    /// never changes afterwards.
    pub fn bind<T, F>(self, compute: F) -> Arc<ComputedNode<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(OwnerId) -> T + Send + Sync + 'static,
    {
        let node = Arc::new(ComputedNode {
            id: NodeId::new(),
            parents: self.parents.iter().map(|p| p.node_id()).collect(),
            compute: Box::new(compute),
            cache: RwLock::new(HashMap::new()),
            children: ChildSet::new(),
        });

        let child: Weak<dyn Observer> = Arc::downgrade(&(node.clone() as Arc<dyn Observer>));
        wire(&self.parents, child);
        node
    }

    /// Attach a parameterized computation and wire the node into the
    /// graph.
    ///
    /// Distinct argument values for the same owner are cached
    /// independently; invalidation still clears all of them together.
    pub fn bind_method<T, A, F>(self, compute: F) -> Arc<ComputedMethod<T, A>>
    where
        T: Clone + Send + Sync + 'static,
        A: Clone + Eq + Hash + Send + Sync + 'static,
        F: Fn(OwnerId, A) -> T + Send + Sync + 'static,
    {
        let node = Arc::new(ComputedMethod {
            id: NodeId::new(),
            parents: self.parents.iter().map(|p| p.node_id()).collect(),
            compute: Box::new(compute),
            cache: RwLock::new(HashMap::new()),
            children: ChildSet::new(),
        });

        let child: Weak<dyn Observer> = Arc::downgrade(&(node.clone() as Arc<dyn Observer>));
        wire(&self.parents, child);
        node
    }
}

/// Register `child` on every declared parent.
fn wire(parents: &[Box<dyn Dependable>], child: Weak<dyn Observer>) {
    for parent in parents {
        parent.add_child(child.clone());
    }
}

/// A node whose per-owner value is derived from its parents by a
/// memoized computation.
pub struct ComputedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this node.
    id: NodeId,

    /// Parents in declaration order. Fixed at wiring time.
    parents: ParentIds,

    /// The wrapped computation.
    compute: Box<dyn Fn(OwnerId) -> T + Send + Sync>,

    /// Memoized results, one entry per owner.
    cache: RwLock<HashMap<OwnerId, T>>,

    /// Downstream observers to notify after eviction.
    children: ChildSet,
}

impl<T> ComputedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start wiring a computed node.
    pub fn builder() -> ComputedBuilder {
        ComputedBuilder::new()
    }

    /// Get the node's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parents in declaration order.
    pub fn parent_ids(&self) -> &[NodeId] {
        &self.parents
    }

    /// Return the memoized result for `owner`, computing and storing it
    /// on first access after construction or invalidation.
    ///
    /// The computation runs with no lock held. If it panics, no cache
    /// entry is written, the panic propagates to the caller, and the
    /// next access re-invokes the computation.
    pub fn get(&self, owner: OwnerId) -> T {
        if let Some(hit) = self.cache.read().get(&owner) {
            return hit.clone();
        }

        trace!(node = self.id.raw(), owner = owner.raw(), "cache miss, computing");
        let value = (self.compute)(owner);
        self.cache.write().insert(owner, value.clone());
        value
    }

    /// Direct writes are rejected: a computed value only changes
    /// through its parents. Write to an upstream source node instead.
    pub fn set(&self, _owner: OwnerId, _value: T) -> Result<(), GraphError> {
        Err(GraphError::NotWritable(self.id))
    }

    /// Number of memoized entries currently held.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Number of registered children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl<T> Observer for ComputedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn notify_change(&self) {
        let evicted = {
            let mut cache = self.cache.write();
            let n = cache.len();
            cache.clear();
            n
        };

        trace!(node = self.id.raw(), evicted, "cache invalidated");
        self.children.notify_all();
    }
}

impl<T> Dependable for Arc<ComputedNode<T>>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn add_child(&self, child: Weak<dyn Observer>) -> bool {
        self.children.add(child)
    }

    fn notify_change(&self) {
        Observer::notify_change(&**self)
    }
}

impl<T> Debug for ComputedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedNode")
            .field("id", &self.id)
            .field("parents", &self.parents)
            .field("cached_count", &self.cached_count())
            .field("child_count", &self.child_count())
            .finish()
    }
}

/// A parameterized computed node: a memoized method rather than a
/// memoized value.
///
/// Results are cached per `(owner, argument)` pair, so calls with
/// different arguments for the same owner are independent entries.
/// Multiple arguments are passed as a tuple. Invalidation clears every
/// entry at once, exactly as for [`ComputedNode`].
pub struct ComputedMethod<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
{
    id: NodeId,
    parents: ParentIds,
    compute: Box<dyn Fn(OwnerId, A) -> T + Send + Sync>,
    cache: RwLock<HashMap<(OwnerId, A), T>>,
    children: ChildSet,
}

impl<T, A> ComputedMethod<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Start wiring a computed method.
    pub fn builder() -> ComputedBuilder {
        ComputedBuilder::new()
    }

    /// Get the node's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parents in declaration order.
    pub fn parent_ids(&self) -> &[NodeId] {
        &self.parents
    }

    /// Invoke the method for `owner` with `arg`, memoizing per argument
    /// value.
    ///
    /// Same execution contract as [`ComputedNode::get`]: the computation
    /// runs with no lock held, and a panicking computation leaves no
    /// cache entry behind.
    pub fn call(&self, owner: OwnerId, arg: A) -> T {
        let key = (owner, arg);
        if let Some(hit) = self.cache.read().get(&key) {
            return hit.clone();
        }

        trace!(node = self.id.raw(), owner = owner.raw(), "cache miss, computing");
        let value = (self.compute)(key.0, key.1.clone());
        self.cache.write().insert(key, value.clone());
        value
    }

    /// Direct writes are rejected: a computed value only changes
    /// through its parents.
    pub fn set(&self, _owner: OwnerId, _value: T) -> Result<(), GraphError> {
        Err(GraphError::NotWritable(self.id))
    }

    /// Number of memoized entries currently held, across all owners and
    /// arguments.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Number of registered children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl<T, A> Observer for ComputedMethod<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn notify_change(&self) {
        let evicted = {
            let mut cache = self.cache.write();
            let n = cache.len();
            cache.clear();
            n
        };

        trace!(node = self.id.raw(), evicted, "cache invalidated");
        self.children.notify_all();
    }
}

impl<T, A> Dependable for Arc<ComputedMethod<T, A>>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn add_child(&self, child: Weak<dyn Observer>) -> bool {
        self.children.add(child)
    }

    fn notify_change(&self) {
        Observer::notify_change(&**self)
    }
}

impl<T, A> Debug for ComputedMethod<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedMethod")
            .field("id", &self.id)
            .field("parents", &self.parents)
            .field("cached_count", &self.cached_count())
            .field("child_count", &self.child_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SourceNode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn computes_lazily_and_once_per_owner() {
        let calls = Arc::new(AtomicUsize::new(0));

        let source = SourceNode::new();
        let s = source.clone();
        let c = calls.clone();
        let doubled = ComputedNode::<i32>::builder()
            .parent(&source)
            .bind(move |owner| {
                c.fetch_add(1, Ordering::SeqCst);
                s.get(owner).unwrap_or(0) * 2
            });

        let owner = OwnerId::new();
        source.set(owner, 21);

        // Nothing ran yet: invalidation is lazy.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(doubled.get(owner), 42);
        assert_eq!(doubled.get(owner), 42);
        assert_eq!(doubled.get(owner), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn upstream_change_evicts_and_recomputes() {
        let calls = Arc::new(AtomicUsize::new(0));

        let source = SourceNode::new();
        let s = source.clone();
        let c = calls.clone();
        let doubled = ComputedNode::<i32>::builder()
            .parent(&source)
            .bind(move |owner| {
                c.fetch_add(1, Ordering::SeqCst);
                s.get(owner).unwrap_or(0) * 2
            });

        let owner = OwnerId::new();
        source.set(owner, 1);
        assert_eq!(doubled.get(owner), 2);

        source.set(owner, 5);
        assert_eq!(doubled.cached_count(), 0);
        assert_eq!(doubled.get(owner), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn direct_write_is_rejected() {
        let source = SourceNode::new();
        let s = source.clone();
        let node = ComputedNode::<i32>::builder()
            .parent(&source)
            .bind(move |owner| s.get(owner).unwrap_or(0));

        let owner = OwnerId::new();
        let err = node.set(owner, 99).unwrap_err();
        assert_eq!(err, GraphError::NotWritable(node.id()));

        // Rejection holds regardless of prior state.
        source.set(owner, 1);
        node.get(owner);
        assert!(node.set(owner, 99).is_err());
    }

    #[test]
    fn invalidation_is_coarse_across_owners() {
        let calls = Arc::new(AtomicUsize::new(0));

        let source = SourceNode::new();
        let s = source.clone();
        let c = calls.clone();
        let node = ComputedNode::<i32>::builder()
            .parent(&source)
            .bind(move |owner| {
                c.fetch_add(1, Ordering::SeqCst);
                s.get(owner).unwrap_or(0)
            });

        let a = OwnerId::new();
        let b = OwnerId::new();
        source.set(a, 1);
        source.set(b, 2);

        assert_eq!(node.get(a), 1);
        assert_eq!(node.get(b), 2);
        assert_eq!(node.cached_count(), 2);

        // Changing a's value clears b's entry too.
        source.set(a, 10);
        assert_eq!(node.cached_count(), 0);

        // b recomputes to the same value; it is not served stale.
        assert_eq!(node.get(b), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn duplicate_parent_declaration_creates_one_edge() {
        let source = SourceNode::new();
        let s = source.clone();
        let _node = ComputedNode::<i32>::builder()
            .parent(&source)
            .parent(&source)
            .bind(move |owner| s.get(owner).unwrap_or(0));

        assert_eq!(source.child_count(), 1);
    }

    #[test]
    fn builder_wires_declared_parents_in_order() {
        let first = SourceNode::new();
        let second = SourceNode::new();
        let f = first.clone();
        let s = second.clone();
        let node = ComputedNode::<i32>::builder()
            .parent(&first)
            .parent(&second)
            .bind(move |owner| f.get(owner).unwrap_or(0) + s.get(owner).unwrap_or(0));

        assert_eq!(node.parent_ids(), &[first.id(), second.id()]);
        assert_eq!(first.child_count(), 1);
        assert_eq!(second.child_count(), 1);
    }

    #[test]
    fn computed_can_depend_on_computed() {
        let calls_b = Arc::new(AtomicUsize::new(0));
        let calls_c = Arc::new(AtomicUsize::new(0));

        let a = SourceNode::new();

        let a2 = a.clone();
        let cb = calls_b.clone();
        let b = ComputedNode::<i32>::builder().parent(&a).bind(move |owner| {
            cb.fetch_add(1, Ordering::SeqCst);
            a2.get(owner).unwrap_or(0) + 1
        });

        let b2 = b.clone();
        let cc = calls_c.clone();
        let c = ComputedNode::<i32>::builder().parent(&b).bind(move |owner| {
            cc.fetch_add(1, Ordering::SeqCst);
            b2.get(owner) * 10
        });

        let owner = OwnerId::new();
        a.set(owner, 1);
        assert_eq!(c.get(owner), 20);

        // A change at the root invalidates the whole chain.
        a.set(owner, 2);
        assert_eq!(b.cached_count(), 0);
        assert_eq!(c.cached_count(), 0);

        assert_eq!(c.get(owner), 30);
        assert_eq!(calls_b.load(Ordering::SeqCst), 2);
        assert_eq!(calls_c.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn method_caches_per_argument() {
        let calls = Arc::new(AtomicUsize::new(0));

        let source = SourceNode::new();
        let s = source.clone();
        let c = calls.clone();
        let scaled = ComputedMethod::<i32, i32>::builder()
            .parent(&source)
            .bind_method(move |owner, factor: i32| {
                c.fetch_add(1, Ordering::SeqCst);
                s.get(owner).unwrap_or(0) * factor
            });

        let owner = OwnerId::new();
        source.set(owner, 10);

        assert_eq!(scaled.call(owner, 2), 20);
        assert_eq!(scaled.call(owner, 3), 30);
        assert_eq!(scaled.call(owner, 2), 20);
        assert_eq!(scaled.call(owner, 3), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scaled.cached_count(), 2);

        // One upstream change clears every argument's entry.
        source.set(owner, 20);
        assert_eq!(scaled.cached_count(), 0);
        assert_eq!(scaled.call(owner, 2), 40);
        assert_eq!(scaled.call(owner, 3), 60);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn method_rejects_direct_write() {
        let source = SourceNode::new();
        let s = source.clone();
        let scaled = ComputedMethod::<i32, i32>::builder()
            .parent(&source)
            .bind_method(move |owner, factor: i32| s.get(owner).unwrap_or(0) * factor);

        let err = scaled.set(OwnerId::new(), 5).unwrap_err();
        assert_eq!(err, GraphError::NotWritable(scaled.id()));
    }
}
