//! The patch graph: an arena of objects, their wires, and the DSP order.
//!
//! Objects live in an arena with stable integer ids; connections are index
//! tuples, so reordering never chases pointers. The signal execution order is
//! a deterministic topological sort over signal edges (creation order breaks
//! ties), with implicit edges forcing delay-line writers before their readers
//! and throws before their catch. Edge buffers are owned here, not by the
//! objects: each ordered object borrows its producers' outlet buffers and
//! fan-in inlets read a graph-staged accumulator.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;
use tracing::debug;

use crate::buffer_pool::BufferPool;
use crate::object::{
    AttachCtx, ObjectId, PatchObject, PortKind, RoutingRole, SignalCtx, Target,
};
use crate::routing::Routing;
use crate::scheduler::Scheduler;

/// An ordered edge between two object ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub src: ObjectId,
    pub outlet: usize,
    pub dst: ObjectId,
    pub inlet: usize,
    pub kind: PortKind,
}

/// Load-time graph errors. Runtime failures never surface here; they resolve
/// to silence plus a callback notice.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no such object: {0}")]
    NoSuchObject(ObjectId),
    #[error("object {object} has no outlet {outlet}")]
    InvalidOutlet { object: ObjectId, outlet: usize },
    #[error("object {object} has no {kind:?} inlet {inlet}")]
    InvalidInlet {
        object: ObjectId,
        inlet: usize,
        kind: PortKind,
    },
    #[error("no such connection")]
    NoSuchConnection,
    #[error("signal graph contains a cycle not broken by a delay line")]
    SignalCycle,
}

struct Slot {
    object: Option<Box<dyn PatchObject>>,
    alive: bool,
    label: &'static str,
    message_inlets: usize,
    message_outlets: usize,
    signal_inlets: usize,
    signal_outlets: usize,
    role: RoutingRole,
}

impl Slot {
    fn is_dsp(&self) -> bool {
        self.signal_inlets > 0 || self.signal_outlets > 0
    }

    fn outlets(&self) -> usize {
        self.signal_outlets + self.message_outlets
    }
}

/// Where one signal inlet reads from during a block.
enum InletSource {
    Silence,
    Direct(usize),
    /// Fan-in: producer buffers summed into an accumulator before the
    /// consumer runs.
    Sum(Vec<usize>, usize),
}

struct EdgePlan {
    object: ObjectId,
    inputs: Vec<InletSource>,
    outputs: Vec<usize>,
}

/// A collection of objects and the connections between them.
pub struct Graph {
    id: usize,
    sample_rate: f32,
    block_size: usize,
    slots: Vec<Slot>,
    connections: Vec<Connection>,
    plans: Vec<EdgePlan>,
    buffers: Vec<Vec<f32>>,
    silence: Vec<f32>,
    order_valid: bool,
    attached: bool,
}

impl Graph {
    pub(crate) fn new(id: usize, sample_rate: f32, block_size: usize) -> Self {
        Graph {
            id,
            sample_rate,
            block_size,
            slots: Vec::new(),
            connections: Vec::new(),
            plans: Vec::new(),
            buffers: Vec::new(),
            silence: vec![0.0; block_size],
            order_valid: false,
            attached: false,
        }
    }

    /// The `$0` argument of this graph, for graph-scoped routing names.
    pub fn dollar_zero(&self) -> usize {
        self.id
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Expand `$0` in a routing name to this graph's unique id.
    pub fn expand_dollar_zero(&self, text: &str) -> String {
        text.replace("$0", &self.id.to_string())
    }

    // --- objects ----------------------------------------------------------

    /// Add an object; returns its stable id. Invalidates the DSP order when
    /// the object processes signal.
    pub fn add_object(&mut self, object: Box<dyn PatchObject>) -> ObjectId {
        let slot = Slot {
            label: object.label(),
            message_inlets: object.message_inlets(),
            message_outlets: object.message_outlets(),
            signal_inlets: object.signal_inlets(),
            signal_outlets: object.signal_outlets(),
            role: object.routing_role(),
            object: Some(object),
            alive: true,
        };
        if slot.is_dsp() {
            self.order_valid = false;
        }
        self.slots.push(slot);
        self.slots.len() - 1
    }

    /// Remove an object and every wire touching it. The object box is
    /// returned so the caller can run its detach hooks.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Box<dyn PatchObject>> {
        let slot = self.slots.get_mut(id)?;
        if !slot.alive {
            return None;
        }
        slot.alive = false;
        let object = slot.object.take();

        let removed: Vec<Connection> = self
            .connections
            .iter()
            .copied()
            .filter(|c| c.src == id || c.dst == id)
            .collect();
        self.connections.retain(|c| c.src != id && c.dst != id);

        for conn in removed {
            if conn.kind == PortKind::Signal && conn.dst != id {
                self.notify_inlet_update(conn.dst, conn.inlet);
            }
        }
        self.order_valid = false;
        object
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn PatchObject> {
        self.slots
            .get(id)
            .filter(|s| s.alive)
            .and_then(|s| s.object.as_deref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut (dyn PatchObject + 'static)> {
        self.slots
            .get_mut(id)
            .filter(|s| s.alive)
            .and_then(|s| s.object.as_deref_mut())
    }

    /// Live object ids in creation order.
    pub fn objects(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn label_of(&self, id: ObjectId) -> Option<&'static str> {
        self.slots.get(id).filter(|s| s.alive).map(|s| s.label)
    }

    pub(crate) fn take_object(&mut self, id: ObjectId) -> Option<Box<dyn PatchObject>> {
        self.slots
            .get_mut(id)
            .filter(|s| s.alive)
            .and_then(|s| s.object.take())
    }

    pub(crate) fn put_object(&mut self, id: ObjectId, object: Box<dyn PatchObject>) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.object = Some(object);
        }
    }

    // --- connections ------------------------------------------------------

    /// Wire `(src, outlet)` to `(dst, inlet)`. The edge kind is inferred from
    /// the source outlet (signal outlets come first) and validated against
    /// the destination's capability at that inlet.
    pub fn connect(
        &mut self,
        src: ObjectId,
        outlet: usize,
        dst: ObjectId,
        inlet: usize,
    ) -> Result<PortKind, GraphError> {
        let src_slot = self
            .slots
            .get(src)
            .filter(|s| s.alive)
            .ok_or(GraphError::NoSuchObject(src))?;
        if outlet >= src_slot.outlets() {
            return Err(GraphError::InvalidOutlet {
                object: src,
                outlet,
            });
        }
        let kind = if outlet < src_slot.signal_outlets {
            PortKind::Signal
        } else {
            PortKind::Message
        };

        let dst_slot = self
            .slots
            .get(dst)
            .filter(|s| s.alive)
            .ok_or(GraphError::NoSuchObject(dst))?;
        let accepts = match kind {
            PortKind::Signal => inlet < dst_slot.signal_inlets,
            PortKind::Message => inlet < dst_slot.message_inlets,
        };
        if !accepts {
            return Err(GraphError::InvalidInlet {
                object: dst,
                inlet,
                kind,
            });
        }

        self.connections.push(Connection {
            src,
            outlet,
            dst,
            inlet,
            kind,
        });
        if kind == PortKind::Signal {
            self.order_valid = false;
            self.notify_inlet_update(dst, inlet);
        }
        Ok(kind)
    }

    /// Remove the first wire matching all four endpoints.
    pub fn disconnect(
        &mut self,
        src: ObjectId,
        outlet: usize,
        dst: ObjectId,
        inlet: usize,
    ) -> Result<(), GraphError> {
        let position = self
            .connections
            .iter()
            .position(|c| c.src == src && c.outlet == outlet && c.dst == dst && c.inlet == inlet)
            .ok_or(GraphError::NoSuchConnection)?;
        let conn = self.connections.remove(position);
        if conn.kind == PortKind::Signal {
            self.order_valid = false;
            self.notify_inlet_update(dst, inlet);
        }
        Ok(())
    }

    /// Message destinations of `(src, outlet)` in connection registration
    /// order; fanout visits them in exactly this order.
    pub fn message_destinations(&self, src: ObjectId, outlet: usize) -> Vec<(ObjectId, usize)> {
        self.connections
            .iter()
            .filter(|c| c.kind == PortKind::Message && c.src == src && c.outlet == outlet)
            .map(|c| (c.dst, c.inlet))
            .collect()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn signal_fanin_count(&self, dst: ObjectId, inlet: usize) -> usize {
        self.connections
            .iter()
            .filter(|c| c.kind == PortKind::Signal && c.dst == dst && c.inlet == inlet)
            .count()
    }

    fn notify_inlet_update(&mut self, dst: ObjectId, inlet: usize) {
        let connected = self.signal_fanin_count(dst, inlet) > 0;
        if let Some(object) = self.object_mut(dst) {
            object.on_inlet_connection_update(inlet, connected);
        }
    }

    // --- lifecycle --------------------------------------------------------

    /// Run every object's attach hook: routing registrations, loadbang.
    pub(crate) fn attach(&mut self, routing: &mut Routing, scheduler: &mut Scheduler) {
        if self.attached {
            return;
        }
        debug!(graph = self.id, "attaching graph");
        self.for_each_object_ctx(routing, scheduler, |object, ctx| object.on_attach(ctx));
        self.attached = true;
    }

    /// Revoke registrations and leave the graph inert in memory.
    pub(crate) fn detach(&mut self, routing: &mut Routing, scheduler: &mut Scheduler) {
        if !self.attached {
            return;
        }
        debug!(graph = self.id, "detaching graph");
        self.for_each_object_ctx(routing, scheduler, |object, ctx| object.on_detach(ctx));
        self.attached = false;
    }

    fn for_each_object_ctx(
        &mut self,
        routing: &mut Routing,
        scheduler: &mut Scheduler,
        mut hook: impl FnMut(&mut dyn PatchObject, &mut AttachCtx<'_>),
    ) {
        for id in 0..self.slots.len() {
            if !self.slots[id].alive {
                continue;
            }
            let Some(mut object) = self.slots[id].object.take() else {
                continue;
            };
            let mut ctx = AttachCtx {
                routing: &mut *routing,
                scheduler: &mut *scheduler,
                target: Target {
                    graph: self.id,
                    object: id,
                    inlet: 0,
                },
                sample_rate: self.sample_rate,
                block_size: self.block_size,
            };
            hook(object.as_mut(), &mut ctx);
            self.slots[id].object = Some(object);
        }
    }

    /// Run the attach hook for one object added to an already-attached graph.
    pub(crate) fn attach_one(
        &mut self,
        id: ObjectId,
        routing: &mut Routing,
        scheduler: &mut Scheduler,
    ) {
        if !self.attached {
            return;
        }
        let Some(mut object) = self.take_object(id) else {
            return;
        };
        let mut ctx = AttachCtx {
            routing,
            scheduler,
            target: Target {
                graph: self.id,
                object: id,
                inlet: 0,
            },
            sample_rate: self.sample_rate,
            block_size: self.block_size,
        };
        object.on_attach(&mut ctx);
        self.put_object(id, object);
    }

    // --- DSP ordering -----------------------------------------------------

    /// True when a structural change has invalidated the DSP order.
    pub fn order_stale(&self) -> bool {
        !self.order_valid
    }

    /// The current execution order (object ids), for inspection.
    pub fn dsp_order(&self) -> Vec<ObjectId> {
        self.plans.iter().map(|p| p.object).collect()
    }

    /// Recompute the DSP order and re-stage edge buffers if stale.
    ///
    /// Deterministic: ties between independent objects break toward the
    /// lower (earlier-created) id. Delay readers gain an implicit edge from
    /// their writer unless that would close a cycle; throws likewise order
    /// before their catch.
    pub fn ensure_order(&mut self, pool: &BufferPool) -> Result<(), GraphError> {
        if self.order_valid {
            return Ok(());
        }
        for buffer in self.buffers.drain(..) {
            pool.release(buffer);
        }
        self.plans.clear();

        let dsp_ids: Vec<ObjectId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive && s.is_dsp())
            .map(|(id, _)| id)
            .collect();

        let mut dep_graph: DiGraph<ObjectId, ()> = DiGraph::new();
        let mut index_of: HashMap<ObjectId, NodeIndex> = HashMap::new();
        for &id in &dsp_ids {
            index_of.insert(id, dep_graph.add_node(id));
        }
        for conn in &self.connections {
            if conn.kind != PortKind::Signal {
                continue;
            }
            if let (Some(&a), Some(&b)) = (index_of.get(&conn.src), index_of.get(&conn.dst)) {
                dep_graph.add_edge(a, b, ());
            }
        }
        self.add_routing_edges(&mut dep_graph, &index_of);

        // Kahn's algorithm, smallest id first among the ready set.
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for &idx in index_of.values() {
            in_degree.insert(
                idx,
                dep_graph.edges_directed(idx, Direction::Incoming).count(),
            );
        }
        let mut ready: BinaryHeap<Reverse<ObjectId>> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&idx, _)| Reverse(dep_graph[idx]))
            .collect();

        let mut order = Vec::with_capacity(dsp_ids.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            let idx = index_of[&id];
            for edge in dep_graph.edges_directed(idx, Direction::Outgoing) {
                let next = petgraph::visit::EdgeRef::target(&edge);
                let degree = in_degree.get_mut(&next).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(dep_graph[next]));
                }
            }
        }
        if order.len() != dsp_ids.len() {
            return Err(GraphError::SignalCycle);
        }

        // Stage edge buffers along the order.
        let mut outlet_buffer: HashMap<(ObjectId, usize), usize> = HashMap::new();
        for &id in &order {
            let slot = &self.slots[id];
            let outputs: Vec<usize> = (0..slot.signal_outlets)
                .map(|outlet| {
                    let buffer_id = self.buffers.len();
                    self.buffers.push(pool.acquire());
                    outlet_buffer.insert((id, outlet), buffer_id);
                    buffer_id
                })
                .collect();

            let inputs: Vec<InletSource> = (0..slot.signal_inlets)
                .map(|inlet| {
                    let producers: Vec<usize> = self
                        .connections
                        .iter()
                        .filter(|c| {
                            c.kind == PortKind::Signal && c.dst == id && c.inlet == inlet
                        })
                        .filter_map(|c| outlet_buffer.get(&(c.src, c.outlet)).copied())
                        .collect();
                    match producers.len() {
                        0 => InletSource::Silence,
                        1 => InletSource::Direct(producers[0]),
                        _ => {
                            let acc = self.buffers.len();
                            self.buffers.push(pool.acquire());
                            InletSource::Sum(producers, acc)
                        }
                    }
                })
                .collect();

            self.plans.push(EdgePlan {
                object: id,
                inputs,
                outputs,
            });
        }

        self.order_valid = true;
        debug!(graph = self.id, objects = order.len(), "dsp order recomputed");
        Ok(())
    }

    /// Decrementing in-degree relies on edges being duplicated for parallel
    /// wires, so routing edges are added per writer/reader pair.
    fn add_routing_edges(
        &self,
        dep_graph: &mut DiGraph<ObjectId, ()>,
        index_of: &HashMap<ObjectId, NodeIndex>,
    ) {
        let mut writers: HashMap<&crate::message::Symbol, Vec<ObjectId>> = HashMap::new();
        let mut readers: HashMap<&crate::message::Symbol, Vec<ObjectId>> = HashMap::new();
        let mut throws: HashMap<&crate::message::Symbol, Vec<ObjectId>> = HashMap::new();
        let mut catches: HashMap<&crate::message::Symbol, Vec<ObjectId>> = HashMap::new();

        for (id, slot) in self.slots.iter().enumerate() {
            if !slot.alive || !index_of.contains_key(&id) {
                continue;
            }
            match &slot.role {
                RoutingRole::DelayWriter(name) => writers.entry(name).or_default().push(id),
                RoutingRole::DelayReader(name) => readers.entry(name).or_default().push(id),
                RoutingRole::Throw(name) => throws.entry(name).or_default().push(id),
                RoutingRole::Catch(name) => catches.entry(name).or_default().push(id),
                RoutingRole::None => {}
            }
        }

        let mut link = |from: ObjectId, to: ObjectId, dep_graph: &mut DiGraph<ObjectId, ()>| {
            let (a, b) = (index_of[&from], index_of[&to]);
            // A feedback path back to the writer keeps the virtual edge out;
            // the reader then consumes the previous block.
            if has_path_connecting(&*dep_graph, b, a, None) {
                debug!(from, to, "skipping routing edge that would close a cycle");
                return;
            }
            dep_graph.add_edge(a, b, ());
        };

        for (name, ws) in &writers {
            if let Some(rs) = readers.get(name) {
                for &w in ws {
                    for &r in rs {
                        link(w, r, dep_graph);
                    }
                }
            }
        }
        for (name, ts) in &throws {
            if let Some(cs) = catches.get(name) {
                for &t in ts {
                    for &c in cs {
                        link(t, c, dep_graph);
                    }
                }
            }
        }
    }

    // --- signal dispatch --------------------------------------------------

    /// Run every ordered DSP object over `[from, to)`.
    pub(crate) fn process_range(&mut self, from: usize, to: usize, ctx: &mut SignalCtx<'_>) {
        debug_assert!(self.order_valid, "process_range with a stale DSP order");
        debug_assert!(from <= to && to <= self.block_size);

        for p in 0..self.plans.len() {
            // Stage fan-in accumulators over just this sub-range.
            for s in 0..self.plans[p].inputs.len() {
                if let InletSource::Sum(producers, acc) = &self.plans[p].inputs[s] {
                    let producers = producers.clone();
                    let acc = *acc;
                    let mut acc_buffer = std::mem::take(&mut self.buffers[acc]);
                    acc_buffer[from..to].fill(0.0);
                    for &producer in &producers {
                        let source = &self.buffers[producer];
                        for i in from..to {
                            acc_buffer[i] += source[i];
                        }
                    }
                    self.buffers[acc] = acc_buffer;
                }
            }

            let output_ids = self.plans[p].outputs.clone();
            let mut outputs: Vec<Vec<f32>> = output_ids
                .iter()
                .map(|&b| std::mem::take(&mut self.buffers[b]))
                .collect();

            let id = self.plans[p].object;
            let Some(mut object) = self.slots[id].object.take() else {
                for (&b, buffer) in output_ids.iter().zip(outputs) {
                    self.buffers[b] = buffer;
                }
                continue;
            };

            {
                let inputs: Vec<&[f32]> = self.plans[p]
                    .inputs
                    .iter()
                    .map(|source| match source {
                        InletSource::Silence => self.silence.as_slice(),
                        InletSource::Direct(b) => self.buffers[*b].as_slice(),
                        InletSource::Sum(_, acc) => self.buffers[*acc].as_slice(),
                    })
                    .collect();
                object.process_block(&inputs, &mut outputs, from, to, ctx);
            }

            self.slots[id].object = Some(object);
            for (&b, buffer) in output_ids.iter().zip(outputs) {
                self.buffers[b] = buffer;
            }
        }
    }

    /// Release edge buffers back to the pool; called when the graph is
    /// destroyed.
    pub(crate) fn release_buffers(&mut self, pool: &BufferPool) {
        for buffer in self.buffers.drain(..) {
            pool.release(buffer);
        }
        self.plans.clear();
        self.order_valid = false;
    }
}
