//! Dynamic values and the function-object contracts nodes are built from (§6).
//!
//! Data node values are untyped by spec, so they are represented as [`serde_json::Value`] — the same
//! representation the reference CLI already leans on for all of its data interchange. Functions,
//! domain guards, merges, callbacks and filters are boxed trait objects so a [`Dispatcher`](crate::graph::Dispatcher)
//! can hold a heterogeneous mix of them.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::id::NodeId;

/// The dynamic value carried by a data node.
pub type Value = serde_json::Value;

/// Result of invoking a function node: either a single value (one declared output) or an ordered
/// sequence aligned with declared outputs.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionOutput {
    Single(Value),
    Many(Vec<Value>),
}

impl FunctionOutput {
    /// Normalizes to a vector the length of `n_outputs`.
    pub fn into_values(self, n_outputs: usize) -> Vec<Value> {
        match self {
            FunctionOutput::Single(v) => {
                if n_outputs <= 1 {
                    vec![v]
                } else {
                    vec![v; n_outputs]
                }
            }
            FunctionOutput::Many(vs) => vs,
        }
    }
}

impl From<Value> for FunctionOutput {
    fn from(v: Value) -> Self {
        FunctionOutput::Single(v)
    }
}

impl From<Vec<Value>> for FunctionOutput {
    fn from(vs: Vec<Value>) -> Self {
        FunctionOutput::Many(vs)
    }
}

/// Error raised by a user-supplied function, domain guard, merge or callback.
#[derive(Debug, Clone)]
pub struct FunctionError(pub String);

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FunctionError {}

impl FunctionError {
    pub fn new(msg: impl Into<String>) -> Self {
        FunctionError(msg.into())
    }
}

/// A user-supplied node function: takes the positional values of its declared inputs (in order),
/// returns a single value or an ordered sequence aligned with declared outputs.
pub type NodeFn = Arc<dyn Fn(&[Value]) -> Result<FunctionOutput, FunctionError> + Send + Sync>;

/// A domain guard: same inputs as the node function, returns whether the node may fire.
pub type DomainFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// A merge function for a `wait_inputs` data node: combines every predecessor function's delivered
/// value, keyed by the id of the function that produced it, into the node's committed value.
pub type MergeFn = Arc<dyn Fn(&IndexMap<NodeId, Value>) -> Value + Send + Sync>;

/// Called with the final value of a data node once it is committed.
pub type CallbackFn = Arc<dyn Fn(&Value) + Send + Sync>;

/// A value filter applied, in order, before a data node's value is committed.
pub type FilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
