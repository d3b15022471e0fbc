//! `shrink_dsp` (§4.S "Shrink"): produces a smaller, dispatch-equivalent graph restricted to nodes
//! reachable forward from a set of inputs and backward from a set of outputs.
//!
//! Grounded on the reference crate's `retain_nodes`/`retain_nodes_edges` predicate-based pruning,
//! reused here for the node/edge induced subgraph step (delegated to
//! [`Dispatcher::get_sub_dsp`](crate::graph::Dispatcher::get_sub_dsp)), plus an iterative worklist in
//! the style of its non-recursive strongly-connected-components pass for the forward-discovery loop.

use indexmap::{IndexMap, IndexSet};

use crate::dispatch::{self, Counter, DispatchOptions};
use crate::graph::{Dispatcher, FunctionKind, NodeRecord};
use crate::id::NodeId;
use crate::stopper::Stopper;
use crate::value::Value;

impl Dispatcher {
    /// Computes the minimal dispatcher equivalent to `self` for dispatching `inputs` to `outputs`
    /// (§4.S "Shrink").
    pub fn shrink_dsp(&self, inputs: IndexSet<NodeId>, outputs: &[NodeId]) -> Dispatcher {
        let mut seed_inputs: IndexMap<NodeId, Value> =
            inputs.iter().map(|id| (id.clone(), Value::Null)).collect();
        let mut union_workflow: IndexSet<(NodeId, NodeId)> = IndexSet::new();

        loop {
            let opts = DispatchOptions {
                inputs: seed_inputs.clone(),
                outputs: outputs.to_vec(),
                no_call: true,
                disable_wait_inputs: true,
                ..Default::default()
            };
            let stopper = Stopper::new();
            let mut counter = Counter::new();
            let sol = match dispatch::run(self, &opts, &stopper, &mut counter) {
                Ok(s) => s,
                Err(e) => e.partial_solution().clone(),
            };
            union_workflow.extend(sol.workflow.iter().cloned());

            let stuck: Vec<NodeId> = self
                .nodes()
                .filter_map(|(id, rec)| {
                    if matches!(rec, NodeRecord::Function(_))
                        && sol.dist.contains_key(id)
                        && !sol.seen.contains(id)
                        && !sol.domain_suppressed.contains(id)
                        && !sol.errored.contains_key(id)
                    {
                        Some(id.clone())
                    } else {
                        None
                    }
                })
                .collect();

            let mut newly_required = Vec::new();
            for fid in &stuck {
                if let Some(NodeRecord::Function(f)) = self.node(fid) {
                    for inp in &f.inputs {
                        if !sol.values.contains_key(inp) && !seed_inputs.contains_key(inp) {
                            newly_required.push(inp.clone());
                        }
                    }
                }
            }
            if newly_required.is_empty() {
                break;
            }
            for id in newly_required {
                seed_inputs.insert(id, Value::Null);
            }
        }

        // Backward-reachable set from `outputs` over the discovered union workflow.
        let mut backward: IndexSet<NodeId> = outputs.iter().cloned().collect();
        let mut worklist: Vec<NodeId> = outputs.to_vec();
        while let Some(n) = worklist.pop() {
            for (src, dst) in &union_workflow {
                if *dst == n && backward.insert(src.clone()) {
                    worklist.push(src.clone());
                }
            }
        }

        let mut shrunk = self.get_sub_dsp(&backward, Some(&union_workflow));
        shrink_sub_dispatchers(&mut shrunk);
        shrunk
    }
}

/// Recursively shrinks every sub-dispatcher node's child graph to the I/O it actually uses from the
/// parent's perspective (§4.S point 3 of "Shrink").
fn shrink_sub_dispatchers(dsp: &mut Dispatcher) {
    let ids: Vec<NodeId> = dsp
        .nodes()
        .filter(|(_, rec)| matches!(rec, NodeRecord::Function(f) if matches!(f.function, FunctionKind::SubDispatcher(_))))
        .map(|(id, _)| id.clone())
        .collect();
    for id in ids {
        let (child_inputs, child_outputs) = {
            let f = dsp.node(&id).and_then(NodeRecord::as_function).unwrap();
            let FunctionKind::SubDispatcher(spec) = &f.function else { continue };
            let child_inputs: IndexSet<NodeId> =
                spec.inputs.values().flat_map(|v| v.iter().cloned()).collect();
            let child_outputs: Vec<NodeId> = spec.outputs.keys().cloned().collect();
            (child_inputs, child_outputs)
        };
        if let Some(NodeRecord::Function(f)) = dsp.nodes.get_mut(&id) {
            if let FunctionKind::SubDispatcher(spec) = &mut f.function {
                let shrunk_child = spec.child.shrink_dsp(child_inputs, &child_outputs);
                spec.child = Box::new(shrunk_child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FunctionOutput, NodeFn};
    use noisy_float::types::n64;
    use std::sync::Arc;

    fn add(name: &str, inputs: Vec<NodeId>, output: &str, dsp: &mut Dispatcher, f: NodeFn) {
        dsp.add_function(Some(NodeId::new(name)), f, inputs, vec![NodeId::new(output)], None, None, None, None, vec![], None)
            .unwrap();
    }

    #[test]
    fn drops_functions_not_on_any_path_to_outputs() {
        let mut dsp = Dispatcher::new(None);
        let double: NodeFn = Arc::new(|a: &[Value]| Ok(FunctionOutput::Single((a[0].as_f64().unwrap() * 2.0).into())));
        let noop: NodeFn = Arc::new(|a: &[Value]| Ok(FunctionOutput::Single(a[0].clone())));
        add("used", vec![NodeId::new("a")], "b", &mut dsp, double.clone());
        add("unused", vec![NodeId::new("a")], "z", &mut dsp, noop);

        let inputs: IndexSet<NodeId> = vec![NodeId::new("a")].into_iter().collect();
        let shrunk = dsp.shrink_dsp(inputs, &[NodeId::new("b")]);

        assert!(shrunk.contains(&NodeId::new("used")));
        assert!(!shrunk.contains(&NodeId::new("unused")));
        assert!(!shrunk.contains(&NodeId::new("z")));
    }
}
