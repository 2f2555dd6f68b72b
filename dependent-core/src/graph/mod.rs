//! Dependency Graph
//!
//! This module implements the notification graph that ties source
//! values to the computed values derived from them.
//!
//! # Overview
//!
//! The graph is directed: edges run from a parent to the children that
//! observe it. Two node kinds exist:
//!
//! - [`SourceNode`]: an externally written value holder, one value per
//!   owner. Writing a different value notifies children.
//! - [`ComputedNode`] / [`ComputedMethod`]: derived values wrapping a
//!   computation, memoized per owner (and per argument for the method
//!   form). A notification evicts the whole cache and is forwarded
//!   downstream; recomputation happens on next access.
//!
//! # Design Decisions
//!
//! 1. Edges are distributed (each node holds its own child set) rather
//!    than centralized, because propagation here is plain reachability:
//!    there is no batching and no topological scheduling, so nothing
//!    needs a global view of the graph.
//!
//! 2. Children are `Weak` references. Observation must not extend a
//!    node's lifetime, and weak back-references keep diamond-shaped
//!    graphs free of reference cycles.
//!
//! 3. Edges are append-only. Wiring happens once, through
//!    [`ComputedBuilder`], and the edge set is static afterwards.

mod computed;
mod id;
mod notify;
mod source;

pub use computed::{ComputedBuilder, ComputedMethod, ComputedNode};
pub use id::{NodeId, OwnerId};
pub use notify::{Dependable, Observer};
pub use source::SourceNode;
