//! S3 — wait-inputs merge: `b - a = c`, `log(c) = d`'s single arrival, merged against `d`'s own
//! `default_value` by averaging (the canonical worked example, original_source `schedula/__init__.py`).
//!
//! `a` is the only explicit input; `b` comes from its own default value (`1`), and `d`'s own default
//! (`4`) is one of the two values `average_fun` averages, not a fallback used only if nothing arrives.

use std::sync::{Arc, Mutex};

use arcidispatch::{DispatchOptions, Dispatcher, FunctionOutput, MergeFn, NodeFn, NodeId, Value};
use indexmap::IndexMap;
use noisy_float::types::n64;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn default_and_delivered_value_are_averaged() {
    init();
    let mut dsp = Dispatcher::new(Some("s3".into()));

    dsp.add_data(Some(NodeId::new("a")), None, n64(0.0), false, None, None, None, vec![], vec![], None).unwrap();
    dsp.add_data(Some(NodeId::new("b")), Some(Value::from(1.0)), n64(0.0), false, None, None, None, vec![], vec![], None).unwrap();
    dsp.add_data(Some(NodeId::new("c")), None, n64(0.0), false, None, None, None, vec![], vec![], None).unwrap();

    let merge_calls = Arc::new(Mutex::new(0usize));
    let seen_keys: Arc<Mutex<Vec<NodeId>>> = Arc::new(Mutex::new(Vec::new()));
    let calls = merge_calls.clone();
    let keys = seen_keys.clone();
    let average_fun: MergeFn = Arc::new(move |kwargs: &IndexMap<NodeId, Value>| {
        *calls.lock().unwrap() += 1;
        *keys.lock().unwrap() = kwargs.keys().cloned().collect();
        let values: Vec<f64> = kwargs.values().map(|v| v.as_f64().unwrap()).collect();
        let sum: f64 = values.iter().sum();
        Value::from(sum / values.len() as f64)
    });
    dsp.add_data(
        Some(NodeId::new("d")),
        Some(Value::from(4.0)),
        n64(0.0),
        true,
        None,
        Some(average_fun),
        None,
        vec![],
        vec![],
        None,
    )
    .unwrap();

    let diff_fn: NodeFn = Arc::new(|args: &[Value]| {
        let a = args[0].as_f64().unwrap();
        let b = args[1].as_f64().unwrap();
        Ok(FunctionOutput::Single((b - a).into()))
    });
    dsp.add_function(
        Some(NodeId::new("diff_function")),
        diff_fn,
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
    let log_domain: arcidispatch::DomainFn = Arc::new(|args: &[Value]| args[0].as_f64().unwrap() > 0.0);
    dsp.add_function(
        Some(NodeId::new("log")),
        log_fn,
        vec![NodeId::new("c")],
        vec![NodeId::new("d")],
        Some(log_domain),
        None,
        None,
        None,
        vec![],
        None,
    )
    .unwrap();

    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(0.0));
    let sol = dsp
        .dispatch(DispatchOptions { inputs, outputs: vec![NodeId::new("d")], raises: true, ..Default::default() })
        .unwrap();

    let d = sol.outputs.get(&NodeId::new("d")).and_then(Value::as_f64).unwrap();
    assert!((d - 2.0).abs() < 1e-9, "expected (log(1) + 4) / 2 = 2.0, got {d}");
    assert_eq!(*merge_calls.lock().unwrap(), 1, "average_fun must be invoked exactly once");

    let keys = seen_keys.lock().unwrap().clone();
    assert!(keys.contains(&NodeId::new("log")), "merge dict must be keyed by the predecessor function that fired");
    assert!(keys.contains(&NodeId::new("d")), "merge dict must also carry d's own default contribution");
    assert_eq!(keys.len(), 2);
}
