//! S6 — cancellation: a stopper set before dispatch starts aborts the run with a partial solution
//! instead of running any function.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arcidispatch::{DispatchError, DispatchOptions, Dispatcher, FunctionOutput, NodeFn, NodeId, Stopper, Value};
use indexmap::IndexMap;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn stopped_dispatch_aborts_before_running_any_function() {
    init();
    let mut dsp = Dispatcher::new(Some("s6".into()));
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let identity: NodeFn = Arc::new(move |args: &[Value]| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(FunctionOutput::Single(args[0].clone()))
    });
    dsp.add_function(
        Some(NodeId::new("identity")),
        identity,
        vec![NodeId::new("a")],
        vec![NodeId::new("b")],
        None,
        None,
        None,
        None,
        vec![],
        None,
    )
    .unwrap();

    let stopper = Stopper::new();
    stopper.set();

    let mut inputs = IndexMap::new();
    inputs.insert(NodeId::new("a"), Value::from(1.0));
    let err = dsp
        .dispatch(DispatchOptions {
            inputs,
            outputs: vec![NodeId::new("b")],
            stopper: Some(stopper),
            raises: true,
            ..Default::default()
        })
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    match err {
        DispatchError::Abort(sol) => {
            assert!(!sol.outputs.contains_key(&NodeId::new("b")));
        }
        other => panic!("expected Abort, got {other:?}"),
    }
}
