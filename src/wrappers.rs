//! Call-site adapters around a [`Dispatcher`] (§4.W): `SubDispatch` makes one callable like a plain
//! node function, `SubDispatchFunction` freezes it into a fixed positional signature, and
//! `SubDispatchPipe` precomputes its visit order for faster, structure-stable repeats.
//!
//! `schedula`'s `dsp.py` (original_source) layers these as a class hierarchy
//! (`SubDispatch` -> `SubDispatchFunction` -> `SubDispatchPipe`); composition stands in for
//! inheritance here, which is the idiomatic Rust translation and matches how the reference crate
//! prefers owned structs over a trait-object class tower.

use indexmap::IndexMap;
use noisy_float::types::N64;

use crate::dispatch::{self, Counter, DispatchOptions, PipeStep, Solution};
use crate::error::{DispatchError, DispatchResult};
use crate::graph::Dispatcher;
use crate::id::NodeId;
use crate::stopper::Stopper;
use crate::value::{FunctionError, FunctionOutput, Value};

/// The shape of a completed [`SubDispatch::call`], mirroring the four return shapes the spec names.
#[derive(Clone, Debug)]
pub enum SubDispatchOutput {
    Solution(Solution),
    List(Vec<Value>),
    Map(IndexMap<NodeId, Value>),
    Scalar(Value),
}

/// Adapts a [`Dispatcher`] to be called like a plain function node (§4.W `SubDispatch`).
#[derive(Clone)]
pub struct SubDispatch {
    dispatcher: Dispatcher,
    outputs: Vec<NodeId>,
    cutoff: Option<N64>,
    stopper: Option<Stopper>,
}

impl SubDispatch {
    pub fn new(dispatcher: Dispatcher) -> Self {
        SubDispatch { dispatcher, outputs: Vec::new(), cutoff: None, stopper: None }
    }

    pub fn with_outputs(mut self, outputs: Vec<NodeId>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_cutoff(mut self, cutoff: N64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_stopper(mut self, stopper: Stopper) -> Self {
        self.stopper = Some(stopper);
        self
    }

    /// Merges `inputs` in, dispatches, and shapes the result the way the spec describes: the whole
    /// solution when no outputs were named, a scalar for exactly one, otherwise a positional list.
    pub fn call(&self, inputs: IndexMap<NodeId, Value>) -> DispatchResult<SubDispatchOutput> {
        let mut dsp = self.dispatcher.clone();
        let opts = DispatchOptions {
            inputs,
            outputs: self.outputs.clone(),
            cutoff: self.cutoff,
            stopper: self.stopper.clone(),
            raises: true,
            ..Default::default()
        };
        let sol = dsp.dispatch(opts)?;
        Ok(match self.outputs.len() {
            0 => SubDispatchOutput::Solution(sol),
            1 => SubDispatchOutput::Scalar(sol.outputs.get(&self.outputs[0]).cloned().unwrap_or(Value::Null)),
            _ => SubDispatchOutput::List(self.outputs.iter().map(|o| sol.outputs.get(o).cloned().unwrap_or(Value::Null)).collect()),
        })
    }

    /// Same as [`call`](Self::call), but always shaped as a dict filtered to the declared outputs.
    pub fn call_map(&self, inputs: IndexMap<NodeId, Value>) -> DispatchResult<IndexMap<NodeId, Value>> {
        let mut dsp = self.dispatcher.clone();
        let opts = DispatchOptions {
            inputs,
            outputs: self.outputs.clone(),
            cutoff: self.cutoff,
            stopper: self.stopper.clone(),
            raises: true,
            ..Default::default()
        };
        let sol = dsp.dispatch(opts)?;
        Ok(self.outputs.iter().filter_map(|o| sol.outputs.get(o).map(|v| (o.clone(), v.clone()))).collect())
    }
}

/// Freezes a dispatcher into a positional-argument [`NodeFn`](crate::value::NodeFn)-shaped callable
/// over a fixed input/output list (§4.W `SubDispatchFunction`). Pre-shrinks the graph once at
/// construction, so repeated calls dispatch against the minimal equivalent graph.
#[derive(Clone)]
pub struct SubDispatchFunction {
    dispatcher: Dispatcher,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    name: Option<String>,
    stopper: Option<Stopper>,
}

impl SubDispatchFunction {
    pub fn new(dispatcher: Dispatcher, inputs: Vec<NodeId>, outputs: Vec<NodeId>) -> Self {
        let name = dispatcher.name.clone();
        let shrunk = dispatcher.shrink_dsp(inputs.iter().cloned().collect(), &outputs);
        SubDispatchFunction { dispatcher: shrunk, inputs, outputs, name, stopper: None }
    }

    pub fn with_stopper(mut self, stopper: Stopper) -> Self {
        self.stopper = Some(stopper);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Calls with positional arguments aligned to the frozen input list, in order.
    pub fn call(&self, args: &[Value]) -> Result<FunctionOutput, FunctionError> {
        if args.len() != self.inputs.len() {
            return Err(FunctionError::new(format!(
                "expected {} positional argument(s), got {}",
                self.inputs.len(),
                args.len()
            )));
        }
        let inputs: IndexMap<NodeId, Value> = self.inputs.iter().cloned().zip(args.iter().cloned()).collect();
        self.run(inputs)
    }

    /// Calls with keyword arguments; every frozen input must be present and no unknown keyword is
    /// accepted (§4.W "rejecting duplicates and unknown keywords" — `IndexMap` already rules out a
    /// literal duplicate key, so only unknown/missing keys are checked here).
    pub fn call_kwargs(&self, kwargs: IndexMap<NodeId, Value>) -> Result<FunctionOutput, FunctionError> {
        for key in kwargs.keys() {
            if !self.inputs.contains(key) {
                return Err(FunctionError::new(format!("unknown keyword argument `{key}`")));
            }
        }
        for id in &self.inputs {
            if !kwargs.contains_key(id) {
                return Err(FunctionError::new(format!("missing keyword argument `{id}`")));
            }
        }
        self.run(kwargs)
    }

    fn run(&self, inputs: IndexMap<NodeId, Value>) -> Result<FunctionOutput, FunctionError> {
        let mut dsp = self.dispatcher.clone();
        let opts = DispatchOptions {
            inputs,
            outputs: self.outputs.clone(),
            stopper: self.stopper.clone(),
            raises: true,
            ..Default::default()
        };
        let sol = dsp.dispatch(opts).map_err(|e| FunctionError::new(e.to_string()))?;
        let values: Vec<Value> = self.outputs.iter().map(|o| sol.outputs.get(o).cloned().unwrap_or(Value::Null)).collect();
        Ok(if values.len() == 1 { FunctionOutput::Single(values.into_iter().next().unwrap()) } else { FunctionOutput::Many(values) })
    }
}

/// Precomputes the visit order of a [`SubDispatchFunction`]-equivalent call (§4.W
/// `SubDispatchPipe`). Built on the same pre-shrunk graph so repeated calls share a stable
/// structure; at call time it seeds fresh inputs and replays the precomputed `pipe` step by step
/// (mirroring `schedula`'s `SubDispatchPipe.__call__` walking `self.pipe`, original_source
/// `schedula/utils/dsp.py`) instead of searching the frontier again.
#[derive(Clone)]
pub struct SubDispatchPipe {
    inner: SubDispatchFunction,
    pipe: Vec<PipeStep>,
}

impl SubDispatchPipe {
    pub fn new(dispatcher: Dispatcher, inputs: Vec<NodeId>, outputs: Vec<NodeId>) -> Self {
        let inner = SubDispatchFunction::new(dispatcher, inputs.clone(), outputs.clone());
        let mut probe = inner.dispatcher.clone();
        let probe_inputs: IndexMap<NodeId, Value> = inputs.iter().cloned().map(|id| (id, Value::Null)).collect();
        let opts = DispatchOptions { inputs: probe_inputs, outputs, no_call: true, ..Default::default() };
        let pipe = match probe.dispatch(opts) {
            Ok(sol) => sol.pipe,
            Err(e) => e.partial_solution().pipe.clone(),
        };
        SubDispatchPipe { inner, pipe }
    }

    pub fn pipe(&self) -> &[PipeStep] {
        &self.pipe
    }

    pub fn call(&self, args: &[Value], stopper: Option<&Stopper>) -> Result<FunctionOutput, FunctionError> {
        if args.len() != self.inner.inputs.len() {
            return Err(FunctionError::new(format!(
                "expected {} positional argument(s), got {}",
                self.inner.inputs.len(),
                args.len()
            )));
        }
        let inputs: IndexMap<NodeId, Value> = self.inner.inputs.iter().cloned().zip(args.iter().cloned()).collect();
        let opts = DispatchOptions {
            inputs,
            outputs: self.inner.outputs.clone(),
            stopper: stopper.cloned(),
            raises: true,
            ..Default::default()
        };
        let eff_stopper = opts.stopper.clone().unwrap_or_default();
        let mut counter = Counter::new();
        let sol = dispatch::replay(&self.inner.dispatcher, &opts, &eff_stopper, &mut counter, &self.pipe)?;
        let values: Vec<Value> = self.inner.outputs.iter().map(|o| sol.outputs.get(o).cloned().unwrap_or(Value::Null)).collect();
        Ok(if values.len() == 1 { FunctionOutput::Single(values.into_iter().next().unwrap()) } else { FunctionOutput::Many(values) })
    }
}

impl From<DispatchError> for FunctionError {
    fn from(e: DispatchError) -> Self {
        FunctionError::new(e.to_string())
    }
}
