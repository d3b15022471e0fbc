//! The ArciDispatch engine (§4.S): seeds a frontier from inputs and defaults, then expands it
//! best-first until every requested output has a committed value or the frontier runs dry.
//!
//! Structurally this is the reference crate's `pathfind` Dijkstra loop (seed -> pop-min -> relax
//! neighbors -> record) generalized from "shortest path to one target node" to "minimum-weight
//! workflow that produces every requested data node", with an eligibility gate on function nodes
//! (a function only fires once every declared input carries a value) that a plain graph search
//! doesn't need.

use indexmap::{IndexMap, IndexSet};
use noisy_float::types::{n64, N64};

use crate::error::{DispatchError, DispatchResult};
use crate::frontier::Frontier;
use crate::graph::{Dispatcher, FunctionKind, LinkDirection, NodeRecord};
use crate::id::NodeId;
use crate::stopper::Stopper;
use crate::value::Value;

/// One entry of a [`Solution`]'s `pipe`: the order nodes were actually visited in, for later replay
/// by [`SubDispatchPipe`](crate::wrappers::SubDispatchPipe).
#[derive(Clone, Debug, PartialEq)]
pub struct PipeStep {
    pub node: NodeId,
    pub distance: N64,
}

/// The record of a single dispatch call (§4.S "state held per dispatch call"). Returned on success
/// and also carried, partially filled, by every [`DispatchError`] variant.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    /// Exactly what was passed as `inputs`.
    pub inputs: IndexMap<NodeId, Value>,
    /// Exactly what was passed as `inputs_dist`.
    pub inputs_dist: IndexMap<NodeId, N64>,
    /// Best known distance for every node that reached at least `queued`.
    pub dist: IndexMap<NodeId, N64>,
    /// Nodes that reached a terminal state (`seen`, `domain-suppressed` or `errored`).
    pub seen: IndexSet<NodeId>,
    /// Edges actually used to relax a node that was subsequently visited.
    pub workflow: IndexSet<(NodeId, NodeId)>,
    /// Every data node's committed value, not just the requested outputs.
    pub values: IndexMap<NodeId, Value>,
    /// The requested outputs, filtered from `values`.
    pub outputs: IndexMap<NodeId, Value>,
    /// Visit order, for `SubDispatchPipe`.
    pub pipe: Vec<PipeStep>,
    /// Sub-dispatcher node id -> the child's own `Solution`.
    pub sub_solutions: IndexMap<NodeId, Solution>,
    /// Function node id -> the message it raised, when `raises = false`.
    pub errored: IndexMap<NodeId, String>,
    /// Function node ids skipped because their `input_domain` rejected the gathered inputs.
    pub domain_suppressed: IndexSet<NodeId>,
    /// `(target-dispatcher id, data id)` pairs written by a `RemoteLink` during this dispatch,
    /// reported for the parent to apply (see DESIGN.md "Remote link direction semantics").
    pub remote_writes: Vec<(NodeId, Value)>,
}

impl Solution {
    fn commit_value(&mut self, id: NodeId, value: Value, requested: &IndexSet<NodeId>) {
        if requested.contains(&id) {
            self.outputs.insert(id.clone(), value.clone());
        }
        self.values.insert(id, value);
    }
}

/// Inputs to a single [`Dispatcher::dispatch`] call (§6 "Dispatch call").
#[derive(Clone, Default)]
pub struct DispatchOptions {
    pub inputs: IndexMap<NodeId, Value>,
    pub outputs: Vec<NodeId>,
    pub cutoff: Option<N64>,
    pub inputs_dist: IndexMap<NodeId, N64>,
    pub wildcard: Option<bool>,
    /// Skip invoking user functions entirely; used by `shrink_dsp` to discover structure only.
    pub no_call: bool,
    /// Pre-shrink the graph to `inputs`/`outputs` before dispatching.
    pub shrink: bool,
    /// Drop workflow edges that end up unused from the reported solution.
    pub rm_unused_nds: bool,
    pub raises: bool,
    pub stopper: Option<Stopper>,
    /// Structural-discovery mode for `shrink_dsp`: commit every data node on first arrival instead
    /// of waiting for `wait_inputs` to gather all predecessors. Not exposed through the public
    /// `dispatch` surface.
    pub disable_wait_inputs: bool,
}

/// Per-run counters shared across a dispatch and any sub-dispatches it starts, so the insertion
/// counter stays monotonic "across the whole dispatch including sub-dispatches" (§4.S).
pub(crate) struct Counter(u64);

impl Counter {
    pub(crate) fn new() -> Self {
        Counter(0)
    }

    fn next(&mut self) -> u64 {
        let c = self.0;
        self.0 += 1;
        c
    }
}

impl Dispatcher {
    /// Runs ArciDispatch (§4.S) and records the outcome as `last_solution` for later introspection.
    pub fn dispatch(&mut self, opts: DispatchOptions) -> DispatchResult<Solution> {
        let working;
        let dsp: &Dispatcher = if opts.shrink {
            working = self.shrink_dsp(opts.inputs.keys().cloned().collect(), &opts.outputs);
            &working
        } else {
            &*self
        };
        let stopper = opts.stopper.clone().unwrap_or_default();
        let mut counter = Counter::new();
        let result = run(dsp, &opts, &stopper, &mut counter);
        self.last_solution = Some(Box::new(match &result {
            Ok(sol) => sol.clone(),
            Err(e) => e.partial_solution().clone(),
        }));
        result
    }
}

/// Static predecessor function ids of every data node in `dsp`, used to decide when a wait-inputs
/// node's merge has seen everything it is going to see.
fn predecessor_map(dsp: &Dispatcher) -> IndexMap<NodeId, Vec<NodeId>> {
    let mut preds: IndexMap<NodeId, Vec<NodeId>> = IndexMap::new();
    for (src, dst) in dsp.edges.keys() {
        if matches!(dsp.node(src), Some(NodeRecord::Function(_))) {
            preds.entry(dst.clone()).or_default().push(src.clone());
        }
    }
    preds
}

struct Engine<'a> {
    dsp: &'a Dispatcher,
    opts: &'a DispatchOptions,
    stopper: &'a Stopper,
    counter: &'a mut Counter,
    requested: IndexSet<NodeId>,
    predecessors: IndexMap<NodeId, Vec<NodeId>>,
    frontier: Frontier<NodeId>,
    terminal: IndexSet<NodeId>,
    /// wait-inputs data id -> (source function id -> delivered value).
    arrivals: IndexMap<NodeId, IndexMap<NodeId, Value>>,
    /// wait-inputs data id -> the largest edge-adjusted arrival distance seen so far.
    max_arrival_dist: IndexMap<NodeId, N64>,
    sol: Solution,
}

fn new_engine<'a>(dsp: &'a Dispatcher, opts: &'a DispatchOptions, stopper: &'a Stopper, counter: &'a mut Counter) -> Engine<'a> {
    let requested: IndexSet<NodeId> = opts.outputs.iter().cloned().collect();
    Engine {
        dsp,
        opts,
        stopper,
        counter,
        requested,
        predecessors: predecessor_map(dsp),
        frontier: Frontier::new(),
        terminal: IndexSet::new(),
        arrivals: IndexMap::new(),
        max_arrival_dist: IndexMap::new(),
        sol: Solution::default(),
    }
}

/// Runs a single dispatch (top-level or sub-dispatcher recursion) over `dsp`.
pub(crate) fn run(dsp: &Dispatcher, opts: &DispatchOptions, stopper: &Stopper, counter: &mut Counter) -> DispatchResult<Solution> {
    let mut eng = new_engine(dsp, opts, stopper, counter);
    eng.sol.inputs = opts.inputs.clone();
    eng.sol.inputs_dist = opts.inputs_dist.clone();
    eng.seed();
    eng.main_loop()?;
    eng.finish()
}

/// Replays a precomputed visit order (a [`SubDispatchPipe`](crate::wrappers::SubDispatchPipe)'s
/// `pipe`) against fresh `inputs`, checking the stopper before each step, instead of searching the
/// frontier anew. Mirrors `schedula`'s `SubDispatchPipe.__call__` walking `self.pipe` and calling
/// `_set_node_output` per step (original_source `schedula/utils/dsp.py`), rather than re-running the
/// search loop.
pub(crate) fn replay(
    dsp: &Dispatcher,
    opts: &DispatchOptions,
    stopper: &Stopper,
    counter: &mut Counter,
    pipe: &[PipeStep],
) -> DispatchResult<Solution> {
    let mut eng = new_engine(dsp, opts, stopper, counter);
    eng.sol.inputs = opts.inputs.clone();
    eng.sol.inputs_dist = opts.inputs_dist.clone();
    eng.seed();
    for step in pipe {
        if eng.stopper.is_set() {
            return Err(DispatchError::Abort(Box::new(eng.sol.clone())));
        }
        if eng.terminal.contains(&step.node) {
            continue;
        }
        match eng.dsp.node(&step.node) {
            Some(NodeRecord::Data(_)) | None if step.node == NodeId::Start => {
                eng.visit_data_like(step.node.clone(), step.distance)
            }
            Some(NodeRecord::Data(_)) => eng.visit_data(step.node.clone(), step.distance),
            Some(NodeRecord::Function(_)) => eng.visit_function(step.node.clone(), step.distance)?,
            None => {}
        }
    }
    eng.finish()
}

impl<'a> Engine<'a> {
    fn push(&mut self, id: NodeId, dist: N64) {
        if self.terminal.contains(&id) {
            return;
        }
        if let Some(cutoff) = self.opts.cutoff {
            if dist > cutoff {
                return;
            }
        }
        let better = self.sol.dist.get(&id).map_or(true, |&cur| dist < cur);
        let is_function = matches!(self.dsp.node(&id), Some(NodeRecord::Function(_)));
        // Data nodes only re-enter the frontier on a strictly improving distance ("first producer
        // wins"); function nodes must re-enter on *every* relax while unfired, since only the last
        // arriving predecessor can actually make them eligible. dist[f] then tracks the worst (most
        // limiting) arrival, matching a join node's ready time rather than a shortest path.
        if is_function {
            let next = self.sol.dist.get(&id).map_or(dist, |&cur| cur.max(dist));
            self.sol.dist.insert(id.clone(), next);
            let c = self.counter.next();
            self.frontier.push(id, next, c);
        } else if better {
            self.sol.dist.insert(id.clone(), dist);
            let c = self.counter.next();
            self.frontier.push(id, dist, c);
        }
    }

    fn seed(&mut self) {
        self.push(NodeId::Start, n64(0.0));
        let dispatch_wildcard = self.opts.wildcard.unwrap_or(false);
        let inputs: Vec<(NodeId, Value)> = self.opts.inputs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (id, value) in inputs {
            let d = self.opts.inputs_dist.get(&id).copied().unwrap_or_else(|| n64(0.0));
            self.sol.values.insert(id.clone(), value);
            // A node that is both an explicit input and a requested output normally settles on
            // the input's own value (distance 0 always wins). `wildcard` inverts that: the value
            // still feeds this node's successor functions, but the node itself is left unsettled
            // so a later function write (e.g. around a cycle) is what ends up reported as the
            // output, instead of the bare input being echoed back (§9 "wildcard re-entry").
            let node_wildcard = match self.dsp.node(&id).and_then(NodeRecord::as_data) {
                Some(d) => d.wildcard.unwrap_or(dispatch_wildcard),
                None => dispatch_wildcard,
            };
            if node_wildcard && self.requested.contains(&id) {
                self.relax_successors(&id, d);
            } else {
                self.push(id, d);
            }
        }
        if let Some(NodeRecord::Data(_)) = self.dsp.node(&NodeId::SelfRef) {
            if !self.opts.inputs.contains_key(&NodeId::SelfRef) {
                let name = self.dsp.name.clone().unwrap_or_default();
                self.sol.values.insert(NodeId::SelfRef.clone(), Value::String(name));
                self.push(NodeId::SelfRef, n64(0.0));
            }
        }
        for (id, default) in self.dsp.defaults() {
            if self.opts.inputs.contains_key(id) {
                continue;
            }
            let is_wait_inputs = !self.opts.disable_wait_inputs
                && matches!(self.dsp.node(id), Some(NodeRecord::Data(dn)) if dn.wait_inputs);
            if is_wait_inputs {
                // The default is itself one of the values a merge function combines (§9 "average
                // of an initial guess and a function's estimate"), not a value that settles the
                // node on its own — it sits in `arrivals` under the node's own id until every
                // predecessor function has also fired.
                self.arrivals.entry(id.clone()).or_default().insert(id.clone(), default.value.clone());
                let best = self.max_arrival_dist.get(id).map_or(default.initial_dist, |&cur| cur.max(default.initial_dist));
                self.max_arrival_dist.insert(id.clone(), best);
                self.maybe_merge(id);
            } else {
                self.sol.values.insert(id.clone(), default.value.clone());
                self.push(id.clone(), default.initial_dist);
            }
        }
    }

    fn all_outputs_satisfied(&self) -> bool {
        !self.requested.is_empty() && self.requested.iter().all(|o| self.sol.outputs.contains_key(o))
    }

    fn main_loop(&mut self) -> DispatchResult<()> {
        loop {
            if self.stopper.is_set() {
                return Err(DispatchError::Abort(Box::new(self.sol.clone())));
            }
            let Some((v, d)) = self.frontier.pop() else {
                if self.flush_stalled_wait_nodes() {
                    continue;
                }
                break;
            };
            if self.sol.dist.get(&v) != Some(&d) {
                continue; // stale entry
            }
            if self.terminal.contains(&v) {
                continue;
            }
            match self.dsp.node(&v) {
                Some(NodeRecord::Data(_)) | None if v == NodeId::Start => self.visit_data_like(v.clone(), d),
                Some(NodeRecord::Data(_)) => self.visit_data(v.clone(), d),
                Some(NodeRecord::Function(_)) => self.visit_function(v.clone(), d)?,
                None => {}
            }
            if self.all_outputs_satisfied() {
                break;
            }
        }
        Ok(())
    }

    /// `START` is never an explicit `NodeRecord`, but it relaxes successors exactly like a data
    /// node with no value, filters or callback of its own.
    fn visit_data_like(&mut self, v: NodeId, d: N64) {
        self.terminal.insert(v.clone());
        self.sol.seen.insert(v.clone());
        self.sol.pipe.push(PipeStep { node: v.clone(), distance: d });
        self.relax_successors(&v, d);
    }

    fn visit_data(&mut self, v: NodeId, d: N64) {
        let node = self.dsp.node(&v).and_then(NodeRecord::as_data).cloned();
        let Some(node) = node else {
            return self.visit_data_like(v, d);
        };
        let mut value = self.sol.values.get(&v).cloned().unwrap_or(Value::Null);
        for filter in &node.filters {
            value = filter(value);
        }
        if let Some(callback) = &node.callback {
            callback(&value);
        }
        self.sol.commit_value(v.clone(), value.clone(), &self.requested.clone());
        self.propagate_remote_links(&node.remote_links, &value);
        self.terminal.insert(v.clone());
        self.sol.seen.insert(v.clone());
        self.sol.pipe.push(PipeStep { node: v.clone(), distance: d });
        self.relax_successors(&v, d);
    }

    fn relax_successors(&mut self, v: &NodeId, d: N64) {
        let successors: Vec<NodeId> = self.dsp.successors(v).cloned().collect();
        for f in successors {
            if self.terminal.contains(&f) {
                continue;
            }
            let Some(len) = self.dsp.edge_length(v, &f) else { continue };
            self.sol.workflow.insert((v.clone(), f.clone()));
            self.push(f, d + len);
        }
    }

    fn gathered_inputs(&self, inputs: &[NodeId]) -> Option<Vec<Value>> {
        let mut args = Vec::with_capacity(inputs.len());
        for inp in inputs {
            args.push(self.sol.values.get(inp)?.clone());
        }
        Some(args)
    }

    fn visit_function(&mut self, v: NodeId, d: N64) -> DispatchResult<()> {
        let node = self.dsp.node(&v).and_then(NodeRecord::as_function).cloned();
        let Some(node) = node else { return Ok(()) };
        let Some(args) = self.gathered_inputs(&node.inputs) else {
            // Not all inputs have a value yet; this pop is discarded. The node re-enters the
            // frontier when its last missing input relaxes it (see `push`'s function-node branch).
            return Ok(());
        };
        if let Some(domain) = &node.input_domain {
            if !domain(&args) {
                self.terminal.insert(v.clone());
                self.sol.domain_suppressed.insert(v.clone());
                self.sol.seen.insert(v.clone());
                return Ok(());
            }
        }
        if self.opts.no_call {
            self.terminal.insert(v.clone());
            self.sol.seen.insert(v.clone());
            self.sol.pipe.push(PipeStep { node: v.clone(), distance: d });
            self.commit_outputs(&v, &node.outputs, vec![Value::Null; node.outputs.len()], d);
            return Ok(());
        }
        let values = match &node.function {
            FunctionKind::Plain(f) => match f(&args) {
                Ok(out) => out.into_values(node.outputs.len()),
                Err(e) => {
                    if self.opts.raises {
                        return Err(DispatchError::FunctionFailed(v.clone(), e, Box::new(self.sol.clone())));
                    }
                    self.terminal.insert(v.clone());
                    self.sol.errored.insert(v.clone(), e.to_string());
                    self.sol.seen.insert(v.clone());
                    return Ok(());
                }
            },
            FunctionKind::SubDispatcher(spec) => {
                let child_inputs: IndexMap<NodeId, Value> = node
                    .inputs
                    .iter()
                    .zip(args.iter())
                    .flat_map(|(parent_id, value)| {
                        spec.inputs
                            .get(parent_id)
                            .into_iter()
                            .flat_map(move |cids| cids.iter().map(move |cid| (cid.clone(), value.clone())))
                    })
                    .collect();
                if let Some(domain) = &spec.input_domain {
                    if !domain(&args) {
                        self.terminal.insert(v.clone());
                        self.sol.domain_suppressed.insert(v.clone());
                        self.sol.seen.insert(v.clone());
                        return Ok(());
                    }
                }
                let child_outputs: Vec<NodeId> = spec.outputs.keys().cloned().collect();
                let child_opts = DispatchOptions {
                    inputs: child_inputs,
                    outputs: child_outputs,
                    raises: true,
                    stopper: Some(self.stopper.clone()),
                    ..Default::default()
                };
                match run(&spec.child, &child_opts, self.stopper, self.counter) {
                    Ok(child_sol) => {
                        let result: Vec<Value> = node
                            .outputs
                            .iter()
                            .map(|parent_id| {
                                spec.outputs
                                    .iter()
                                    .find(|(_, pids)| pids.contains(parent_id))
                                    .and_then(|(cid, _)| child_sol.values.get(cid))
                                    .cloned()
                                    .unwrap_or(Value::Null)
                            })
                            .collect();
                        for (target, value) in &child_sol.remote_writes {
                            self.apply_remote_write(target.clone(), value.clone(), d);
                        }
                        self.sol.sub_solutions.insert(v.clone(), child_sol);
                        result
                    }
                    Err(DispatchError::Abort(partial)) => {
                        self.sol.sub_solutions.insert(v.clone(), (*partial).clone());
                        return Err(DispatchError::Abort(Box::new(self.sol.clone())));
                    }
                    Err(e) => {
                        let partial = e.partial_solution().clone();
                        self.sol.sub_solutions.insert(v.clone(), partial);
                        if self.opts.raises {
                            return Err(DispatchError::FunctionFailed(
                                v.clone(),
                                crate::value::FunctionError::new(e.to_string()),
                                Box::new(self.sol.clone()),
                            ));
                        }
                        self.terminal.insert(v.clone());
                        self.sol.errored.insert(v.clone(), e.to_string());
                        self.sol.seen.insert(v.clone());
                        return Ok(());
                    }
                }
            }
        };
        self.terminal.insert(v.clone());
        self.sol.seen.insert(v.clone());
        self.sol.pipe.push(PipeStep { node: v.clone(), distance: d });
        self.commit_outputs(&v, &node.outputs, values, d);
        Ok(())
    }

    fn commit_outputs(&mut self, f: &NodeId, outputs: &[NodeId], values: Vec<Value>, d: N64) {
        for (o, value) in outputs.iter().zip(values.into_iter()) {
            let Some(len) = self.dsp.edge_length(f, o) else { continue };
            self.sol.workflow.insert((f.clone(), o.clone()));
            let arrival_dist = d + len;
            let wait_inputs = !self.opts.disable_wait_inputs
                && matches!(self.dsp.node(o), Some(NodeRecord::Data(dn)) if dn.wait_inputs);
            if wait_inputs {
                self.arrivals.entry(o.clone()).or_default().insert(f.clone(), value);
                let best = self
                    .max_arrival_dist
                    .get(o)
                    .map_or(arrival_dist, |&cur| cur.max(arrival_dist));
                self.max_arrival_dist.insert(o.clone(), best);
                self.maybe_merge(o);
            } else {
                self.sol.values.insert(o.clone(), value);
                self.push(o.clone(), arrival_dist);
            }
        }
        // A function's own output-bound relaxation can free up wait-inputs nodes whose only
        // remaining predecessor just became terminal, even with zero arrivals delivered to them.
        self.flush_exhausted(f);
    }

    /// Commits a wait-inputs node's merge once every predecessor that fired has delivered.
    fn maybe_merge(&mut self, o: &NodeId) {
        if self.terminal.contains(o) {
            return;
        }
        let preds = self.predecessors.get(o).cloned().unwrap_or_default();
        let arrived = self.arrivals.get(o).cloned().unwrap_or_default();
        let all_delivered = preds.iter().all(|p| self.terminal.contains(p));
        if !all_delivered || arrived.is_empty() {
            return;
        }
        self.commit_merge(o);
    }

    fn commit_merge(&mut self, o: &NodeId) {
        let Some(arrived) = self.arrivals.shift_remove(o) else { return };
        let merged = match self.dsp.node(o).and_then(NodeRecord::as_data).and_then(|d| d.function.clone()) {
            Some(f) => f(&arrived),
            None => arrived.values().last().cloned().unwrap_or(Value::Null),
        };
        self.sol.values.insert(o.clone(), merged);
        let dist = self.max_arrival_dist.get(o).copied().unwrap_or_else(|| n64(0.0));
        self.push(o.clone(), dist);
    }

    /// After a predecessor function of `o`'s siblings becomes terminal, re-check every wait-inputs
    /// node fed by it: the predecessor might have been the last one any of them were waiting on.
    fn flush_exhausted(&mut self, fired: &NodeId) {
        let successors: Vec<NodeId> = self.predecessors.iter().filter(|(_, ps)| ps.contains(fired)).map(|(o, _)| o.clone()).collect();
        for o in successors {
            self.maybe_merge(&o);
        }
    }

    /// Once the frontier is empty, commits any wait-inputs node that received at least one arrival
    /// even though some of its static predecessors never fired in this dispatch (§4.S point 4 "or
    /// once no more can arrive, determined by the frontier becoming empty of predecessors").
    fn flush_stalled_wait_nodes(&mut self) -> bool {
        let pending: Vec<NodeId> = self
            .arrivals
            .iter()
            .filter(|(o, a)| !a.is_empty() && !self.terminal.contains(*o))
            .map(|(o, _)| o.clone())
            .collect();
        for o in &pending {
            self.commit_merge(o);
        }
        !pending.is_empty()
    }

    fn propagate_remote_links(&mut self, links: &[crate::graph::RemoteLink], value: &Value) {
        for link in links {
            if matches!(link.direction, LinkDirection::Parent | LinkDirection::Child) {
                self.sol.remote_writes.push((link.id.clone(), value.clone()));
            }
        }
    }

    fn apply_remote_write(&mut self, target: NodeId, value: Value, d: N64) {
        if self.terminal.contains(&target) {
            return;
        }
        self.sol.values.insert(target.clone(), value);
        self.push(target, d);
    }

    fn finish(mut self) -> DispatchResult<Solution> {
        if self.opts.rm_unused_nds {
            let used: IndexSet<NodeId> = self.sol.workflow.iter().flat_map(|(a, b)| [a.clone(), b.clone()]).collect();
            self.sol.dist.retain(|id, _| used.contains(id));
        }
        let unreachable: Vec<NodeId> = self.requested.iter().filter(|o| !self.sol.outputs.contains_key(*o)).cloned().collect();
        if !unreachable.is_empty() {
            return Err(DispatchError::UnreachableOutputs(unreachable, Box::new(self.sol)));
        }
        Ok(self.sol)
    }
}
