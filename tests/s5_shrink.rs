//! S5 — shrink: a five-function graph shrunk to the two requested outputs drops every function not
//! on a path from the requested inputs to those outputs, and dispatches identically to the full graph.

use std::sync::Arc;

use arcidispatch::{DispatchOptions, Dispatcher, FunctionOutput, NodeFn, NodeId, Value};
use indexmap::{IndexMap, IndexSet};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scale(k: f64) -> NodeFn {
    Arc::new(move |args: &[Value]| Ok(FunctionOutput::Single((args[0].as_f64().unwrap() * k).into())))
}

fn build() -> Dispatcher {
    let mut dsp = Dispatcher::new(Some("s5".into()));
    // a -> double -> c, b -> triple -> f, requested.
    dsp.add_function(Some(NodeId::new("double")), scale(2.0), vec![NodeId::new("a")], vec![NodeId::new("c")], None, None, None, None, vec![], None).unwrap();
    dsp.add_function(Some(NodeId::new("triple")), scale(3.0), vec![NodeId::new("b")], vec![NodeId::new("f")], None, None, None, None, vec![], None).unwrap();
    // d feeds only a side branch nothing downstream of c/f depends on.
    dsp.add_function(Some(NodeId::new("quadruple")), scale(4.0), vec![NodeId::new("d")], vec![NodeId::new("g")], None, None, None, None, vec![], None).unwrap();
    dsp.add_function(Some(NodeId::new("halve")), scale(0.5), vec![NodeId::new("g")], vec![NodeId::new("h")], None, None, None, None, vec![], None).unwrap();
    // another branch off a that isn't on the path to c or f.
    dsp.add_function(Some(NodeId::new("negate")), scale(-1.0), vec![NodeId::new("a")], vec![NodeId::new("z")], None, None, None, None, vec![], None).unwrap();
    dsp
}

fn inputs() -> IndexMap<NodeId, Value> {
    let mut m = IndexMap::new();
    m.insert(NodeId::new("a"), Value::from(2.0));
    m.insert(NodeId::new("b"), Value::from(3.0));
    m.insert(NodeId::new("d"), Value::from(1.0));
    m
}

#[test]
fn shrink_drops_functions_off_the_path_and_matches_full_dispatch() {
    init();
    let full = build();
    let requested = vec![NodeId::new("c"), NodeId::new("f")];

    let seed_inputs: IndexSet<NodeId> = inputs().keys().cloned().collect();
    let shrunk = full.shrink_dsp(seed_inputs, &requested);

    assert!(shrunk.contains(&NodeId::new("double")));
    assert!(shrunk.contains(&NodeId::new("triple")));
    assert!(!shrunk.contains(&NodeId::new("quadruple")));
    assert!(!shrunk.contains(&NodeId::new("halve")));
    assert!(!shrunk.contains(&NodeId::new("negate")));
    assert!(!shrunk.contains(&NodeId::new("z")));
    assert!(!shrunk.contains(&NodeId::new("g")));
    assert!(!shrunk.contains(&NodeId::new("h")));

    let mut full_dsp = build();
    let mut shrunk_dsp = shrunk;
    let full_sol = full_dsp
        .dispatch(DispatchOptions { inputs: inputs(), outputs: requested.clone(), raises: true, ..Default::default() })
        .unwrap();
    let shrunk_sol = shrunk_dsp
        .dispatch(DispatchOptions { inputs: inputs(), outputs: requested.clone(), raises: true, ..Default::default() })
        .unwrap();

    for id in &requested {
        assert_eq!(full_sol.outputs.get(id), shrunk_sol.outputs.get(id));
    }
}
