//! Thin demo front-end for `arcidispatch` (§10 "CLI / environment variables"): loads a graph
//! definition plus an inputs/outputs request from JSON or YAML, dispatches it, and prints the
//! resulting value map.
//!
//! Mirrors the reference crate's `main.rs`: `clap` v2 builder API, `env_logger::init_from_env`,
//! `serde_json`/`serde_yaml` file loading with `.expect`-on-malformed-input, `log::info!`/`trace!`
//! lifecycle messages.

use std::sync::Arc;

use clap::{crate_version, App, Arg, SubCommand};
use indexmap::IndexMap;

use arcidispatch::{DispatchOptions, Dispatcher, FunctionOutput, NodeFn, NodeId, Value};

/// A graph definition as read from disk. Function nodes name a built-in operator rather than
/// embedding code, since a dispatcher's function slots are `Arc<dyn Fn>` and cannot round-trip
/// through JSON/YAML (§6 "Persisted state layout" — this is config loading, not workflow state).
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
struct GraphDef {
	#[serde(default)]
	data: Vec<DataDef>,
	#[serde(default)]
	functions: Vec<FunctionDef>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
struct DataDef {
	id: String,
	#[serde(default)]
	default: Option<Value>,
	#[serde(default)]
	wait_inputs: bool,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
struct FunctionDef {
	id: String,
	op: String,
	inputs: Vec<String>,
	outputs: Vec<String>,
	#[serde(default)]
	weight: Option<f64>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
struct Request {
	inputs: IndexMap<String, Value>,
	outputs: Vec<String>,
}

/// The built-in operator registry a `FunctionDef.op` name resolves against.
fn builtin(op: &str) -> NodeFn {
	match op {
		"sum" => Arc::new(|args: &[Value]| Ok(FunctionOutput::Single(args.iter().map(|v| v.as_f64().unwrap_or(0.0)).sum::<f64>().into()))),
		"diff" => Arc::new(|args: &[Value]| {
			let a = args[0].as_f64().unwrap_or(0.0);
			let b = args[1].as_f64().unwrap_or(0.0);
			Ok(FunctionOutput::Single((b - a).into()))
		}),
		"mean" => Arc::new(|args: &[Value]| {
			let sum: f64 = args.iter().map(|v| v.as_f64().unwrap_or(0.0)).sum();
			Ok(FunctionOutput::Single((sum / args.len().max(1) as f64).into()))
		}),
		"max" => Arc::new(|args: &[Value]| Ok(FunctionOutput::Single(args.iter().filter_map(|v| v.as_f64()).fold(f64::MIN, f64::max).into()))),
		"min" => Arc::new(|args: &[Value]| Ok(FunctionOutput::Single(args.iter().filter_map(|v| v.as_f64()).fold(f64::MAX, f64::min).into()))),
		"identity" => Arc::new(|args: &[Value]| Ok(FunctionOutput::Single(args.first().cloned().unwrap_or(Value::Null)))),
		other => panic!("unknown operator `{}`; known: sum, diff, mean, max, min, identity", other),
	}
}

fn build_dispatcher(def: &GraphDef) -> Dispatcher {
	let mut dsp = Dispatcher::new(None);
	for d in &def.data {
		dsp.add_data(
			Some(NodeId::new(d.id.clone())),
			d.default.clone(),
			noisy_float::types::n64(0.0),
			d.wait_inputs,
			None,
			None,
			None,
			vec![],
			vec![],
			None,
		)
		.expect("invalid data node in graph definition");
	}
	for f in &def.functions {
		dsp.add_function(
			Some(NodeId::new(f.id.clone())),
			builtin(&f.op),
			f.inputs.iter().cloned().map(NodeId::new).collect(),
			f.outputs.iter().cloned().map(NodeId::new).collect(),
			None,
			f.weight.map(noisy_float::types::n64),
			None,
			None,
			vec![],
			None,
		)
		.expect("invalid function node in graph definition");
	}
	dsp
}

fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));
	let matches = App::new("ArciDispatch")
		.version(crate_version!())
		.about("Dispatch a weighted data/function graph")
		.subcommand(
			SubCommand::with_name("dispatch")
				.about("Build a graph and run one dispatch against it")
				.arg(Arg::with_name("graph").takes_value(true).required(true).index(1).help("Graph definition JSON or YAML"))
				.arg(Arg::with_name("request").takes_value(true).required(true).index(2).help("Inputs/outputs request JSON or YAML"))
				.arg(Arg::with_name("output").takes_value(true).required(true).index(3).help("Output JSON")),
		)
		.get_matches();

	log::info!("Loading...");
	if let Some(matches) = matches.subcommand_matches("dispatch") {
		log::trace!("tracing enabled");
		let graph_path = matches.value_of("graph").unwrap();
		let graph: GraphDef = load(graph_path).expect("graph definition invalid JSON/YAML");
		let request_path = matches.value_of("request").unwrap();
		let request: Request = load(request_path).expect("request invalid JSON/YAML");
		log::info!("Loaded configuration");

		let mut dsp = build_dispatcher(&graph);
		let inputs: IndexMap<NodeId, Value> = request.inputs.into_iter().map(|(k, v)| (NodeId::new(k), v)).collect();
		let outputs: Vec<NodeId> = request.outputs.into_iter().map(NodeId::new).collect();
		let opts = DispatchOptions { inputs, outputs, raises: true, ..Default::default() };
		let solution = dsp.dispatch(opts).unwrap_or_else(|e| panic!("dispatch failed: {}", e));
		log::info!("Dispatched ({} node(s) seen)", solution.seen.len());

		let result: IndexMap<String, Value> = solution.outputs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
		serde_json::to_writer(&std::fs::File::create(matches.value_of("output").unwrap())?, &result).unwrap();
	}
	Ok(())
}

fn load<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
	let file = std::fs::File::open(path)?;
	if path.ends_with(".yaml") || path.ends_with(".yml") {
		Ok(serde_yaml::from_reader(file)?)
	} else {
		Ok(serde_json::from_reader(file)?)
	}
}
