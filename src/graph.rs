//! The graph model (§3, §4.G): data nodes, function nodes, sub-dispatcher nodes, weighted edges,
//! default values and remote links, all owned by a single [`Dispatcher`].
//!
//! Nodes reference each other by [`NodeId`] only — there are no language-level reference cycles, even
//! though the graph itself is naturally cyclic (§9 "Cyclic data/function graph").

use indexmap::{IndexMap, IndexSet};
use noisy_float::types::{n64, N64};

use crate::dispatch::Solution;
use crate::error::{GraphError, GraphResult};
use crate::id::NodeId;
use crate::value::{CallbackFn, DomainFn, FilterFn, MergeFn, NodeFn, Value};

/// Which dispatcher a [`RemoteLink`] writes into relative to the node carrying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkDirection {
    /// Write into the linked id's data node in the parent dispatcher.
    Parent,
    /// Write into the linked id's data node in the child dispatcher.
    Child,
}

/// A binding between a data node and a data node of the same id in a directly related (parent or
/// child) dispatcher, used to propagate values across a sub-dispatcher boundary outside the ordinary
/// input/output maps (§4.S point 3).
#[derive(Clone, Debug)]
pub struct RemoteLink {
    pub id: NodeId,
    pub direction: LinkDirection,
}

/// A default value held on a dispatcher for a data node, consumed at dispatch seed time unless an
/// explicit input overrides it.
#[derive(Clone, Debug)]
pub struct DefaultValue {
    pub value: Value,
    pub initial_dist: N64,
}

/// A directed edge. Edge *length* for distance purposes is `weight + node_weight(dst)` (§4.G).
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub weight: N64,
}

impl Default for Edge {
    fn default() -> Self {
        Edge { weight: n64(1.0) }
    }
}

/// Attributes of a data node (§3).
#[derive(Clone)]
pub struct DataNode {
    pub wait_inputs: bool,
    pub wildcard: Option<bool>,
    pub function: Option<MergeFn>,
    pub callback: Option<CallbackFn>,
    pub filters: Vec<FilterFn>,
    pub default_value: Option<DefaultValue>,
    pub initial_dist: N64,
    pub remote_links: Vec<RemoteLink>,
    pub description: Option<String>,
    pub index: u64,
}

impl DataNode {
    fn new(index: u64) -> Self {
        DataNode {
            wait_inputs: false,
            wildcard: None,
            function: None,
            callback: None,
            filters: Vec::new(),
            default_value: None,
            initial_dist: n64(0.0),
            remote_links: Vec::new(),
            description: None,
            index,
        }
    }
}

/// What a function node invokes: a plain user function, or another dispatcher entered recursively.
#[derive(Clone)]
pub enum FunctionKind {
    Plain(NodeFn),
    SubDispatcher(Box<SubDispatcherSpec>),
}

/// A function node whose callable is itself a dispatcher, plus the I/O remapping between parent and
/// child ids (§3 "Sub-dispatcher node").
#[derive(Clone)]
pub struct SubDispatcherSpec {
    pub child: Box<Dispatcher>,
    /// parent id -> child ids it fans into.
    pub inputs: IndexMap<NodeId, Vec<NodeId>>,
    /// child id -> parent ids it fans out to.
    pub outputs: IndexMap<NodeId, Vec<NodeId>>,
    pub input_domain: Option<DomainFn>,
}

/// Attributes of a function node (§3). `wait_inputs` is always true for function nodes: a function
/// only fires once every declared input has a committed value.
#[derive(Clone)]
pub struct FunctionNode {
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
    pub function: FunctionKind,
    pub input_domain: Option<DomainFn>,
    pub weight: Option<N64>,
    pub filters: Vec<FilterFn>,
    pub description: Option<String>,
    pub index: u64,
}

/// The tagged sum of node kinds (§9 "Polymorphism over node kinds").
#[derive(Clone)]
pub enum NodeRecord {
    Data(DataNode),
    Function(FunctionNode),
}

impl NodeRecord {
    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            NodeRecord::Data(d) => Some(d),
            _ => None,
        }
    }
    pub fn as_data_mut(&mut self) -> Option<&mut DataNode> {
        match self {
            NodeRecord::Data(d) => Some(d),
            _ => None,
        }
    }
    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            NodeRecord::Function(f) => Some(f),
            _ => None,
        }
    }
    pub fn as_function_mut(&mut self) -> Option<&mut FunctionNode> {
        match self {
            NodeRecord::Function(f) => Some(f),
            _ => None,
        }
    }
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeRecord::Data(_) => "data",
            NodeRecord::Function(_) => "function",
        }
    }
    /// The node's own contribution to edge length when it is the destination of an edge (§4.G).
    pub fn node_weight(&self) -> N64 {
        match self {
            NodeRecord::Data(_) => n64(0.0),
            NodeRecord::Function(f) => f.weight.unwrap_or_else(|| n64(0.0)),
        }
    }
}

/// A directed graph of data and function nodes, plus defaults. Construction is fallible (§7.1); a
/// built graph may be dispatched any number of times via [`Dispatcher::dispatch`](crate::dispatch).
#[derive(Clone)]
pub struct Dispatcher {
    pub name: Option<String>,
    pub(crate) nodes: IndexMap<NodeId, NodeRecord>,
    pub(crate) edges: IndexMap<(NodeId, NodeId), Edge>,
    pub(crate) out_adjacency: IndexMap<NodeId, IndexSet<NodeId>>,
    pub(crate) defaults: IndexMap<NodeId, DefaultValue>,
    next_index: u64,
    next_anon_data: u64,
    next_anon_fn: u64,
    allow_negative_weights: bool,
    pub(crate) last_solution: Option<Box<Solution>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            name: None,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            out_adjacency: IndexMap::new(),
            defaults: IndexMap::new(),
            next_index: 0,
            next_anon_data: 0,
            next_anon_fn: 0,
            allow_negative_weights: false,
            last_solution: None,
        }
    }
}

impl Dispatcher {
    pub fn new(name: impl Into<Option<String>>) -> Self {
        Dispatcher {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Allows (or re-disallows) negative edge weights. Off by default (§9 open question): negative
    /// weights break Dijkstra's correctness, so they are rejected unless explicitly permitted.
    pub fn allow_negative_weights(&mut self, allow: bool) -> &mut Self {
        self.allow_negative_weights = allow;
        self
    }

    fn next_index(&mut self) -> u64 {
        let i = self.next_index;
        self.next_index += 1;
        i
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &NodeRecord)> {
        self.nodes.iter()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn edge_weight(&self, src: &NodeId, dst: &NodeId) -> Option<N64> {
        self.edges.get(&(src.clone(), dst.clone())).map(|e| e.weight)
    }

    /// Edge *length*: `edge.weight + node_weight(dst)` (§4.G).
    pub fn edge_length(&self, src: &NodeId, dst: &NodeId) -> Option<N64> {
        let w = self.edge_weight(src, dst)?;
        let dst_node = self.nodes.get(dst)?;
        Some(w + dst_node.node_weight())
    }

    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.out_adjacency
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter())
    }

    fn check_weight(&self, src: &NodeId, dst: &NodeId, w: N64) -> GraphResult<()> {
        if !self.allow_negative_weights && w.raw() < 0.0 {
            return Err(GraphError::NegativeWeight(src.clone(), dst.clone(), w.raw()));
        }
        Ok(())
    }

    fn add_edge(&mut self, src: NodeId, dst: NodeId, weight: N64) -> GraphResult<()> {
        self.check_weight(&src, &dst, weight)?;
        self.out_adjacency
            .entry(src.clone())
            .or_insert_with(IndexSet::new)
            .insert(dst.clone());
        self.edges.insert((src, dst), Edge { weight });
        Ok(())
    }

    fn fresh_data_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::new(format!("data{}", self.next_anon_data));
            self.next_anon_data += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn fresh_fn_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::new(format!("fn{}", self.next_anon_fn));
            self.next_anon_fn += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn ensure_data_slot(&mut self, id: &NodeId) -> GraphResult<()> {
        match self.nodes.get(id) {
            None => {
                let idx = self.next_index();
                let mut node = DataNode::new(idx);
                if matches!(id, NodeId::Sink) {
                    // SINK always waits for every producer that reaches it and has no merge
                    // function of its own; the engine treats a wait-inputs node with no
                    // `function` as a passthrough that just absorbs the last arrival (§3).
                    node.wait_inputs = true;
                }
                self.nodes.insert(id.clone(), NodeRecord::Data(node));
                Ok(())
            }
            Some(NodeRecord::Data(_)) => Ok(()),
            Some(NodeRecord::Function(_)) => Err(GraphError::KindMismatch(id.clone(), "function")),
        }
    }

    /// Adds (or updates) a data node. `id` defaults to a fresh, unused id. `START` has no default
    /// value; `SINK` is forced `wait_inputs` with no function; `SELF` is accepted as an ordinary
    /// sentinel with no extra special-casing beyond its reserved identity; `PLOT` attaches a
    /// plotting callback/merge-function, defaulting to a no-op when the caller doesn't supply one
    /// (§4.G; rendering itself is out of scope, only the attachment is implemented here).
    #[allow(clippy::too_many_arguments)]
    pub fn add_data(
        &mut self,
        id: Option<NodeId>,
        default: Option<Value>,
        initial_dist: N64,
        wait_inputs: bool,
        wildcard: Option<bool>,
        function: Option<MergeFn>,
        callback: Option<CallbackFn>,
        filters: Vec<FilterFn>,
        remote_links: Vec<RemoteLink>,
        description: Option<String>,
    ) -> GraphResult<NodeId> {
        let id = match id {
            Some(id) => id,
            None => self.fresh_data_id(),
        };
        self.ensure_data_slot(&id)?;
        let wait_inputs = wait_inputs || matches!(id, NodeId::Sink);
        let (function, callback) = if matches!(id, NodeId::Plot) {
            (function.or_else(|| Some(default_plot_function())), callback.or_else(|| Some(default_plot_callback())))
        } else {
            (function, callback)
        };
        if let Some(v) = &default {
            if matches!(id, NodeId::Start) {
                return Err(GraphError::InvalidNode(id, "START cannot carry a default value".into()));
            }
            self.defaults.insert(
                id.clone(),
                DefaultValue { value: v.clone(), initial_dist },
            );
        }
        let node = self.nodes.get_mut(&id).unwrap();
        if let NodeRecord::Data(d) = node {
            d.wait_inputs = wait_inputs;
            d.wildcard = wildcard;
            d.function = function;
            d.callback = callback;
            d.filters = filters;
            d.initial_dist = initial_dist;
            d.remote_links = remote_links;
            d.description = description;
        }
        Ok(id)
    }

    /// Appends (or, with `clear=true`, wipes) a remote link on a data node (§4.G
    /// `set_data_remote_link`).
    pub fn set_data_remote_link(
        &mut self,
        id: &NodeId,
        link: Option<RemoteLink>,
        clear: bool,
    ) -> GraphResult<()> {
        self.ensure_data_slot(id)?;
        let node = self.nodes.get_mut(id).unwrap().as_data_mut().unwrap();
        if clear {
            node.remote_links.clear();
        }
        if let Some(link) = link {
            node.remote_links.push(link);
        }
        Ok(())
    }

    /// Sets (or, passing `None`, removes) a default value for a data node.
    pub fn set_default_value(&mut self, id: &NodeId, value: Option<Value>, initial_dist: N64) -> GraphResult<()> {
        self.ensure_data_slot(id)?;
        match value {
            Some(v) => {
                self.defaults.insert(id.clone(), DefaultValue { value: v, initial_dist });
                if let Some(d) = self.nodes.get_mut(id).unwrap().as_data_mut() {
                    d.initial_dist = initial_dist;
                }
            }
            None => {
                self.defaults.shift_remove(id);
            }
        }
        Ok(())
    }

    pub fn default_value(&self, id: &NodeId) -> Option<&DefaultValue> {
        self.defaults.get(id)
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&NodeId, &DefaultValue)> {
        self.defaults.iter()
    }

    /// Adds a function node. `inputs`/`outputs` default to a synthetic edge from `START`/to `SINK` if
    /// empty (invariant 2). `inp_weight`/`out_weight`, if given, must align 1:1 with `inputs`/`outputs`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_function(
        &mut self,
        id: Option<NodeId>,
        function: NodeFn,
        inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
        input_domain: Option<DomainFn>,
        weight: Option<N64>,
        inp_weight: Option<Vec<N64>>,
        out_weight: Option<Vec<N64>>,
        filters: Vec<FilterFn>,
        description: Option<String>,
    ) -> GraphResult<NodeId> {
        self.add_function_kind(
            id,
            FunctionKind::Plain(function),
            inputs,
            outputs,
            input_domain,
            weight,
            inp_weight,
            out_weight,
            filters,
            description,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn add_function_kind(
        &mut self,
        id: Option<NodeId>,
        kind: FunctionKind,
        mut inputs: Vec<NodeId>,
        mut outputs: Vec<NodeId>,
        input_domain: Option<DomainFn>,
        weight: Option<N64>,
        inp_weight: Option<Vec<N64>>,
        out_weight: Option<Vec<N64>>,
        filters: Vec<FilterFn>,
        description: Option<String>,
    ) -> GraphResult<NodeId> {
        let id = match id {
            Some(id) => id,
            None => self.fresh_fn_id(),
        };
        match self.nodes.get(&id) {
            Some(NodeRecord::Data(_)) => return Err(GraphError::KindMismatch(id, "data")),
            Some(NodeRecord::Function(_)) | None => {}
        }
        if inputs.is_empty() {
            inputs.push(NodeId::Start);
        }
        if outputs.is_empty() {
            outputs.push(NodeId::Sink);
        }
        if let Some(w) = &inp_weight {
            if w.len() != inputs.len() {
                return Err(GraphError::InvalidNode(id, "inp_weight length must match inputs".into()));
            }
        }
        if let Some(w) = &out_weight {
            if w.len() != outputs.len() {
                return Err(GraphError::InvalidNode(id, "out_weight length must match outputs".into()));
            }
        }
        for inp in &inputs {
            self.ensure_data_slot(inp)?;
        }
        for out in &outputs {
            self.ensure_data_slot(out)?;
        }
        let idx = self.next_index();
        self.nodes.insert(
            id.clone(),
            NodeRecord::Function(FunctionNode {
                inputs: inputs.clone(),
                outputs: outputs.clone(),
                function: kind,
                input_domain,
                weight,
                filters,
                description,
                index: idx,
            }),
        );
        for (i, inp) in inputs.iter().enumerate() {
            let w = inp_weight.as_ref().map(|v| v[i]).unwrap_or_else(|| n64(1.0));
            self.add_edge(inp.clone(), id.clone(), w)?;
        }
        for (i, out) in outputs.iter().enumerate() {
            let w = out_weight.as_ref().map(|v| v[i]).unwrap_or_else(|| n64(1.0));
            self.add_edge(id.clone(), out.clone(), w)?;
        }
        Ok(id)
    }

    /// Adds a sub-dispatcher node: a function node whose callable is `child`, with explicit I/O
    /// remapping (§4.G `add_dispatcher`). Installs remote links on the child's mapped data nodes so
    /// that further internal recomputation of an already-delivered input value is visible to the
    /// parent (§4.S point 3; see DESIGN.md for the scope of what remote links do here).
    #[allow(clippy::too_many_arguments)]
    pub fn add_dispatcher(
        &mut self,
        id: Option<NodeId>,
        mut child: Dispatcher,
        inputs: IndexMap<NodeId, Vec<NodeId>>,
        outputs: IndexMap<NodeId, Vec<NodeId>>,
        input_domain: Option<DomainFn>,
        weight: Option<N64>,
        inp_weight: Option<Vec<N64>>,
        include_defaults: bool,
    ) -> GraphResult<NodeId> {
        for (parent_id, child_ids) in &inputs {
            if child_ids.is_empty() {
                return Err(GraphError::EmptyMapping(
                    id.clone().unwrap_or_else(|| NodeId::new("<sub-dispatcher>")),
                    "inputs",
                    parent_id.clone(),
                ));
            }
            for cid in child_ids {
                if !child.contains(cid) {
                    return Err(GraphError::UnknownMapping(
                        id.clone().unwrap_or_else(|| NodeId::new("<sub-dispatcher>")),
                        "inputs",
                        cid.clone(),
                    ));
                }
                child.set_data_remote_link(
                    cid,
                    Some(RemoteLink { id: parent_id.clone(), direction: LinkDirection::Parent }),
                    false,
                )?;
            }
        }
        for (child_id, parent_ids) in &outputs {
            if parent_ids.is_empty() {
                return Err(GraphError::EmptyMapping(
                    id.clone().unwrap_or_else(|| NodeId::new("<sub-dispatcher>")),
                    "outputs",
                    child_id.clone(),
                ));
            }
            if !child.contains(child_id) {
                return Err(GraphError::UnknownMapping(
                    id.clone().unwrap_or_else(|| NodeId::new("<sub-dispatcher>")),
                    "outputs",
                    child_id.clone(),
                ));
            }
            for parent_id in parent_ids {
                child.set_data_remote_link(
                    child_id,
                    Some(RemoteLink { id: parent_id.clone(), direction: LinkDirection::Child }),
                    false,
                )?;
            }
        }
        if include_defaults {
            let child_defaults: Vec<(NodeId, DefaultValue)> = child
                .defaults
                .iter()
                .map(|(k, v)| (k.clone(), DefaultValue { value: v.value.clone(), initial_dist: v.initial_dist }))
                .collect();
            for (child_id, dv) in child_defaults {
                if let Some(parent_ids) = outputs.get(&child_id).map(|v| v.as_slice()).or_else(|| {
                    inputs.iter().find(|(_, cids)| cids.contains(&child_id)).map(|(p, _)| {
                        // parent id is the key itself when found via inputs map
                        std::slice::from_ref(p)
                    })
                }) {
                    for pid in parent_ids {
                        self.set_default_value(pid, Some(dv.value.clone()), dv.initial_dist)?;
                    }
                    child.defaults.shift_remove(&child_id);
                }
            }
        }
        let inputs_flat: Vec<NodeId> = inputs.keys().cloned().collect();
        let outputs_flat: Vec<NodeId> = outputs
            .values()
            .flat_map(|v| v.iter().cloned())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let spec = SubDispatcherSpec {
            child: Box::new(child),
            inputs,
            outputs,
            input_domain,
        };
        self.add_function_kind(
            id,
            FunctionKind::SubDispatcher(Box::new(spec)),
            inputs_flat,
            outputs_flat,
            None,
            weight,
            inp_weight,
            None,
            Vec::new(),
            None,
        )
    }

    /// Structure-and-settings clone: same graph and defaults, no retained solution (§3 lifecycle
    /// "may be cloned (`copy_structure`)").
    pub fn copy_structure(&self) -> Dispatcher {
        let mut c = self.clone();
        c.last_solution = None;
        c
    }

    /// The most recently computed solution, if any (§3 lifecycle).
    pub fn last_solution(&self) -> Option<&Solution> {
        self.last_solution.as_deref()
    }

    /// Node/edge induced sub-graph (§4.G `get_sub_dsp`): drops function nodes that lose any input or
    /// all outputs, drops isolated data nodes, and preserves defaults of retained nodes.
    pub fn get_sub_dsp(&self, nodes: &IndexSet<NodeId>, edges: Option<&IndexSet<(NodeId, NodeId)>>) -> Dispatcher {
        let mut out = Dispatcher::new(self.name.clone());
        out.allow_negative_weights = self.allow_negative_weights;

        let edge_allowed = |src: &NodeId, dst: &NodeId| -> bool {
            nodes.contains(src) && nodes.contains(dst) && edges.map_or(true, |e| e.contains(&(src.clone(), dst.clone())))
        };

        // Copy eligible nodes first (without edges).
        for id in nodes {
            if let Some(rec) = self.nodes.get(id) {
                let idx = out.next_index();
                let mut rec = rec.clone();
                match &mut rec {
                    NodeRecord::Data(d) => d.index = idx,
                    NodeRecord::Function(f) => f.index = idx,
                }
                out.nodes.insert(id.clone(), rec);
            }
        }

        // Copy eligible edges, building adjacency.
        for ((src, dst), edge) in &self.edges {
            if edge_allowed(src, dst) {
                out.out_adjacency.entry(src.clone()).or_insert_with(IndexSet::new).insert(dst.clone());
                out.edges.insert((src.clone(), dst.clone()), *edge);
            }
        }

        // Drop function nodes that lost any input or all outputs; iterate to a fixpoint since
        // dropping one function node's output edge can strand another.
        loop {
            let mut to_drop = Vec::new();
            for (id, rec) in &out.nodes {
                if let NodeRecord::Function(f) = rec {
                    let empty = IndexSet::new();
                    let succ = out.out_adjacency.get(id).unwrap_or(&empty);
                    let has_all_inputs = f.inputs.iter().all(|inp| out.edges.contains_key(&(inp.clone(), id.clone())));
                    let has_any_output = f.outputs.iter().any(|o| succ.contains(o));
                    if !has_all_inputs || !has_any_output {
                        to_drop.push(id.clone());
                    }
                }
            }
            if to_drop.is_empty() {
                break;
            }
            for id in to_drop {
                out.remove_node(&id);
            }
        }

        // Drop isolated data nodes (no incoming or outgoing retained edges) unless they carry a
        // default or are reserved sentinels worth keeping for dispatch bookkeeping.
        let isolated: Vec<NodeId> = out
            .nodes
            .iter()
            .filter_map(|(id, rec)| {
                if rec.as_data().is_some() && !matches!(id, NodeId::Start | NodeId::Sink) {
                    let has_out = out.out_adjacency.get(id).map_or(false, |s| !s.is_empty());
                    let has_in = out.edges.keys().any(|(_, dst)| dst == id);
                    if !has_out && !has_in && out.defaults.get(id).is_none() && self.defaults.get(id).is_none() {
                        return Some(id.clone());
                    }
                }
                None
            })
            .collect();
        for id in isolated {
            out.remove_node(&id);
        }

        for id in out.nodes.keys().cloned().collect::<Vec<_>>() {
            if let Some(dv) = self.defaults.get(&id) {
                out.defaults.insert(id, DefaultValue { value: dv.value.clone(), initial_dist: dv.initial_dist });
            }
        }

        out
    }

    fn remove_node(&mut self, id: &NodeId) {
        self.nodes.shift_remove(id);
        self.out_adjacency.shift_remove(id);
        for adj in self.out_adjacency.values_mut() {
            adj.shift_remove(id);
        }
        self.edges.retain(|(s, d), _| s != id && d != id);
        self.defaults.shift_remove(id);
    }

    /// All reserved sentinel ids a fresh dispatcher accepts without explicit declaration.
    pub fn is_reserved(id: &NodeId) -> bool {
        id.is_reserved()
    }
}

/// `PLOT`'s default merge function when the caller doesn't supply one (mirrors `schedula`'s
/// `autoplot_function` fallback, original_source `schedula/__init__.py` `add_data`). Rendering is
/// out of scope, so this just passes the gathered values through unchanged.
fn default_plot_function() -> MergeFn {
    std::sync::Arc::new(|kwargs: &IndexMap<NodeId, Value>| {
        kwargs.values().last().cloned().unwrap_or(Value::Null)
    })
}

/// `PLOT`'s default callback when the caller doesn't supply one (mirrors `schedula`'s
/// `autoplot_callback` fallback). Rendering is out of scope, so this is a no-op.
fn default_plot_callback() -> CallbackFn {
    std::sync::Arc::new(|_: &Value| {})
}
