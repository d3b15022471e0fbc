//! ArciDispatch: a weighted bipartite graph of data and function nodes, dispatched with a
//! best-first expansion that fires only the function nodes needed to produce the requested outputs
//! at minimum total weight.
//!
//! The model is a generalization of shortest-path search: data nodes are ordinary graph nodes,
//! function nodes additionally gate on "have all my declared inputs arrived", and the frontier
//! relaxes through both kinds uniformly. See [`graph`] for construction, [`dispatch`] for the
//! engine, [`shrink`] for graph minimization, and [`wrappers`] for call-site adapters that let a
//! [`Dispatcher`](graph::Dispatcher) act as an ordinary function.

pub mod dispatch;
pub mod error;
pub mod frontier;
pub mod graph;
pub mod id;
pub mod shrink;
pub mod stopper;
pub mod value;
pub mod wrappers;

pub use dispatch::{DispatchOptions, PipeStep, Solution};
pub use error::{DispatchError, DispatchResult, GraphError, GraphResult};
pub use graph::{DataNode, Dispatcher, Edge, FunctionKind, FunctionNode, LinkDirection, NodeRecord, RemoteLink};
pub use id::NodeId;
pub use stopper::Stopper;
pub use value::{CallbackFn, DomainFn, FilterFn, FunctionError, FunctionOutput, MergeFn, NodeFn, Value};
pub use wrappers::{SubDispatch, SubDispatchFunction, SubDispatchOutput, SubDispatchPipe};
