//! Error taxonomy (§7): construction errors fail fast at build time; dispatch errors carry the
//! partial [`Solution`](crate::dispatch::Solution) they interrupted.

use thiserror::Error;

use crate::dispatch::Solution;
use crate::id::NodeId;
use crate::value::FunctionError;

/// Errors raised while building or reshaping a graph (§7.1, §7.6 invariant violations at construction
/// time).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// An id already denotes a node of a different kind.
    #[error("id `{0}` is already bound to a {1} node")]
    KindMismatch(NodeId, &'static str),

    /// A function node was declared with zero outputs and no `SINK` could be attached.
    #[error("function `{0}` has no outputs")]
    NoOutputs(NodeId),

    /// A sub-dispatcher's input or output map referenced an id that does not exist on the named side.
    #[error("sub-dispatcher `{0}` {1} map references unknown id `{2}`")]
    UnknownMapping(NodeId, &'static str, NodeId),

    /// A sub-dispatcher's input or output map is empty for at least one mapped id.
    #[error("sub-dispatcher `{0}` {1} map for `{2}` has no targets")]
    EmptyMapping(NodeId, &'static str, NodeId),

    /// An edge was given a negative weight while negative weights are disallowed on this dispatcher.
    #[error("edge {0} -> {1} has negative weight {2}; call allow_negative_weights(true) to permit it")]
    NegativeWeight(NodeId, NodeId, f64),

    /// `add_function` was asked to reuse an id that already denotes a node of a different kind, or an
    /// auto-generated id collided unexpectedly.
    #[error("cannot add node `{0}`: {1}")]
    InvalidNode(NodeId, String),
}

/// Errors raised while running [`Dispatcher::dispatch`](crate::graph::Dispatcher::dispatch) (§7.2-§7.5).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// At least one requested output was never seen before the frontier was exhausted.
    #[error("unreachable output(s): {0:?}")]
    UnreachableOutputs(Vec<NodeId>, Box<Solution>),

    /// A user function raised and `raises = true` on the solution.
    #[error("function `{0}` failed: {1}")]
    FunctionFailed(NodeId, FunctionError, Box<Solution>),

    /// The cooperative `stopper` was set before or during the dispatch.
    #[error("dispatch aborted by stopper")]
    Abort(Box<Solution>),
}

impl DispatchError {
    /// Borrows the partial solution carried by any variant.
    pub fn partial_solution(&self) -> &Solution {
        match self {
            DispatchError::UnreachableOutputs(_, s) => s,
            DispatchError::FunctionFailed(_, _, s) => s,
            DispatchError::Abort(s) => s,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
pub type DispatchResult<T> = Result<T, DispatchError>;
