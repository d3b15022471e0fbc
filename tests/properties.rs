//! Cross-cutting properties from SPEC_FULL.md §8 not already exercised by a named scenario.

use std::sync::Arc;

use arcidispatch::{DispatchOptions, Dispatcher, FunctionOutput, NodeFn, NodeId, Value};
use indexmap::{IndexMap, IndexSet};
use noisy_float::types::n64;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn diamond() -> Dispatcher {
    let mut dsp = Dispatcher::new(Some("diamond".into()));
    let inc = |k: f64| -> NodeFn { Arc::new(move |a: &[Value]| Ok(FunctionOutput::Single((a[0].as_f64().unwrap() + k).into()))) };
    // a -> left(+1, weight 5) -> c ; a -> right(+2, weight 1) -> c ; the cheaper path wins.
    dsp.add_function(Some(NodeId::new("left")), inc(1.0), vec![NodeId::new("a")], vec![NodeId::new("c")], None, Some(n64(5.0)), None, None, vec![], None).unwrap();
    dsp.add_function(Some(NodeId::new("right")), inc(2.0), vec![NodeId::new("a")], vec![NodeId::new("c")], None, Some(n64(1.0)), None, None, vec![], None).unwrap();
    dsp
}

#[test]
fn dispatch_is_deterministic_across_repeated_runs() {
    init();
    let mut dsp1 = diamond();
    let mut dsp2 = diamond();
    let mut inputs1 = IndexMap::new();
    inputs1.insert(NodeId::new("a"), Value::from(10.0));
    let inputs2 = inputs1.clone();

    let sol1 = dsp1.dispatch(DispatchOptions { inputs: inputs1, outputs: vec![NodeId::new("c")], raises: true, ..Default::default() }).unwrap();
    let sol2 = dsp2.dispatch(DispatchOptions { inputs: inputs2, outputs: vec![NodeId::new("c")], raises: true, ..Default::default() }).unwrap();

    assert_eq!(sol1.outputs, sol2.outputs);
    assert_eq!(sol1.dist, sol2.dist);
    assert_eq!(sol1.workflow, sol2.workflow);
}

#[test]
fn cheapest_workflow_wins_over_a_more_expensive_alternative() {
    init();
    let mut dsp = diamond();
    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(10.0));
    let sol = dsp.dispatch(DispatchOptions { inputs, outputs: vec![NodeId::new("c")], raises: true, ..Default::default() }).unwrap();

    // `right` (weight 1) must win over `left` (weight 5): c = a + 2, not a + 1.
    assert_eq!(sol.outputs.get(&NodeId::new("c")).and_then(Value::as_f64), Some(12.0));
    assert!(sol.seen.contains(&NodeId::new("right")));
    assert!(!sol.seen.contains(&NodeId::new("left")));
    // dist(c) = dist(a) + edge(a,right) + node_weight(right) + edge(right,c) = 0 + 1 + 1 + 1 = 3.
    assert_eq!(sol.dist.get(&NodeId::new("c")).copied(), Some(n64(3.0)));
}

#[test]
fn input_domain_rejection_suppresses_the_function_entirely() {
    init();
    let mut dsp = Dispatcher::new(Some("domain".into()));
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counted = calls.clone();
    let double: NodeFn = Arc::new(move |a: &[Value]| {
        counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(FunctionOutput::Single((a[0].as_f64().unwrap() * 2.0).into()))
    });
    let never: arcidispatch::DomainFn = Arc::new(|_: &[Value]| false);
    dsp.add_function(
        Some(NodeId::new("double")),
        double,
        vec![NodeId::new("a")],
        vec![NodeId::new("b")],
        Some(never),
        None,
        None,
        None,
        vec![],
        None,
    )
    .unwrap();

    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(3.0));
    let err = dsp
        .dispatch(DispatchOptions { inputs, outputs: vec![NodeId::new("b")], raises: true, ..Default::default() })
        .unwrap_err();

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0, "rejected function body must never run");
    let partial = err.partial_solution();
    assert!(!partial.values.contains_key(&NodeId::new("b")));
    assert!(partial.domain_suppressed.contains(&NodeId::new("double")));
}

#[test]
fn get_sub_dsp_from_workflow_contains_exactly_the_traversed_edges() {
    init();
    let mut dsp = diamond();
    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(10.0));
    let sol = dsp.dispatch(DispatchOptions { inputs, outputs: vec![NodeId::new("c")], raises: true, ..Default::default() }).unwrap();

    let nodes: IndexSet<NodeId> = sol
        .workflow
        .iter()
        .flat_map(|(s, d)| [s.clone(), d.clone()])
        .collect();
    let sub = dsp.get_sub_dsp(&nodes, Some(&sol.workflow));

    assert!(sub.contains(&NodeId::new("right")));
    assert!(!sub.contains(&NodeId::new("left")));
    for (src, dst) in &sol.workflow {
        assert!(sub.successors(src).any(|s| s == dst), "missing traversed edge {src}->{dst}");
    }
}
