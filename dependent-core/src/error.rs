//! Error types for graph access.

use thiserror::Error;

use crate::graph::NodeId;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the attribute-access boundary.
///
/// Failures are scoped to the single access attempt: nothing is
/// retried, and no node state is altered by a failed call. User
/// computations signal failure by panicking; such panics propagate
/// unmodified and are never cached, so they do not appear here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A direct write was attempted on a computed node.
    ///
    /// Computed values are derived from their parents; the write
    /// belongs on an upstream source node instead. This signals a
    /// programming error and is not recoverable within the call.
    #[error("node {} is computed and not writable", .0.raw())]
    NotWritable(NodeId),
}
