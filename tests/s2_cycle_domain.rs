//! S2 — cycle with domain: `a,b -> max -> c -> log(c) -> a`, `log`'s domain requires `c > 0`.
//!
//! `a` is given directly as well as reachable through the cycle; `wildcard` is required so the
//! cyclic recompute (not the bare input) is what ends up reported for `a` (see DESIGN.md "Wildcard
//! re-entry suppresses the output, not the input").

use std::sync::Arc;

use arcidispatch::{DispatchOptions, Dispatcher, FunctionOutput, NodeFn, NodeId, Value};
use indexmap::IndexMap;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build() -> Dispatcher {
    let mut dsp = Dispatcher::new(Some("s2".into()));
    let max_fn: NodeFn = Arc::new(|args: &[Value]| {
        let a = args[0].as_f64().unwrap();
        let b = args[1].as_f64().unwrap();
        Ok(FunctionOutput::Single(a.max(b).into()))
    });
    dsp.add_function(
        Some(NodeId::new("max")),
        max_fn,
        vec![NodeId::new("a"), NodeId::new("b")],
        vec![NodeId::new("c")],
        None,
        None,
        None,
        None,
        vec![],
        None,
    )
    .unwrap();

    let log_fn: NodeFn = Arc::new(|args: &[Value]| Ok(FunctionOutput::Single(args[0].as_f64().unwrap().ln().into())));
    let positive: arcidispatch::DomainFn = Arc::new(|args: &[Value]| args[0].as_f64().unwrap() > 0.0);
    dsp.add_function(
        Some(NodeId::new("log")),
        log_fn,
        vec![NodeId::new("c")],
        vec![NodeId::new("a")],
        Some(positive),
        None,
        None,
        None,
        vec![],
        None,
    )
    .unwrap();
    dsp
}

#[test]
fn cycle_resolves_through_domain_guarded_log() {
    init();
    let mut dsp = build();
    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(0.0));
    inputs.insert(NodeId::new("b"), Value::from(5.0));
    let sol = dsp
        .dispatch(DispatchOptions {
            inputs,
            outputs: vec![NodeId::new("a")],
            wildcard: Some(true),
            raises: true,
            ..Default::default()
        })
        .unwrap();

    let a = sol.outputs.get(&NodeId::new("a")).and_then(Value::as_f64).unwrap();
    assert!((a - 5.0_f64.ln()).abs() < 1e-9);
    assert!(sol.seen.contains(&NodeId::new("log")));
    assert!(sol.domain_suppressed.is_empty());
}

#[test]
fn without_wildcard_the_bare_input_is_echoed() {
    init();
    let mut dsp = build();
    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(0.0));
    inputs.insert(NodeId::new("b"), Value::from(5.0));
    let sol = dsp
        .dispatch(DispatchOptions { inputs, outputs: vec![NodeId::new("a")], raises: true, ..Default::default() })
        .unwrap();

    assert_eq!(sol.outputs.get(&NodeId::new("a")).and_then(Value::as_f64), Some(0.0));
}
