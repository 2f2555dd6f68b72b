//! Dependent Core
//!
//! This crate implements a small reactive dependency graph: source
//! values declare nothing, computed values declare the nodes they
//! depend on, and when an upstream value changes every downstream
//! computed value is invalidated and recomputed lazily on next access.
//!
//! Values are scoped to owners: one node is shared by every instance of
//! the owning type, and each instance's value or cache entry is keyed
//! by its [`OwnerId`].
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: node types, identity, and the change-notification
//!   protocol
//! - `error`: the error surface of the access boundary
//!
//! # Semantics
//!
//! - Writes to a [`SourceNode`] are change-detected: an equal value is
//!   a no-op, a different value notifies every child exactly once.
//! - Invalidation is coarse and lazy. One upstream change evicts a
//!   computed node's entire cache, for every owner and every argument;
//!   nothing recomputes until the next read.
//! - Wiring is explicit and static. Dependencies are declared through
//!   [`ComputedBuilder`] and fixed once the node is bound; edges are
//!   never removed.
//!
//! # Example
//!
//! ```
//! use dependent_core::{ComputedNode, OwnerId, SourceNode};
//!
//! let temperature = SourceNode::new();
//!
//! let t = temperature.clone();
//! let is_hot = ComputedNode::<bool>::builder()
//!     .parent(&temperature)
//!     .bind(move |owner| t.get(owner).is_some_and(|v| v > 30));
//!
//! let obj = OwnerId::new();
//! temperature.set(obj, 20);
//! assert!(!is_hot.get(obj));
//!
//! temperature.set(obj, 35);
//! assert!(is_hot.get(obj));
//!
//! // A computed value is never written directly.
//! assert!(is_hot.set(obj, false).is_err());
//! ```

pub mod error;
pub mod graph;

pub use error::{GraphError, Result};
pub use graph::{
    ComputedBuilder, ComputedMethod, ComputedNode, Dependable, NodeId, Observer, OwnerId,
    SourceNode,
};
