//! The top-level owner: one independent instance of the runtime.
//!
//! A context is defined by its sample rate, block size, and channel counts.
//! It owns the root data of the engine: the graphs, the logical clock and
//! message queue, the routing fabric, the buffer pool, and the host callback.
//! Contexts are entirely independent; objects and messages cannot be
//! exchanged between them.
//!
//! `process()` advances exactly one block: it merges host-thread input,
//! drains every pending message whose timestamp falls inside the block
//! (splitting signal computation at the message's sample offset), then
//! finishes the remainder of the block.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::buffer_pool::BufferPool;
use crate::callback::{HostCallback, HostHandle};
use crate::graph::{Graph, GraphError};
use crate::message::{Message, ParseError, Symbol};
use crate::object::{MessageCtx, ObjectId, PatchObject, PortKind, SignalCtx, Target};
use crate::objects::{self, NewObjectCtx};
use crate::routing::Routing;
use crate::scheduler::{ExternalMessage, ExternalSender, Scheduler};

/// Synchronous message cascades deeper than this are cut and reported, so a
/// zero-delay message cycle cannot hang the audio thread.
const MAX_DELIVERY_DEPTH: usize = 128;

const POOL_CAPACITY: usize = 256;
const POOL_PREFILL: usize = 32;

/// Context configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// The sample rate in Hz.
    pub sample_rate: f32,
    /// The computation block size in frames.
    pub block_size: usize,
    /// The number of input channels.
    pub input_channels: usize,
    /// The number of output channels.
    pub output_channels: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sample_rate: 44100.0,
            block_size: 64,
            input_channels: 2,
            output_channels: 2,
        }
    }
}

impl Config {
    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the computation block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the number of input channels.
    pub fn with_input_channels(mut self, channels: usize) -> Self {
        self.input_channels = channels;
        self
    }

    /// Set the number of output channels.
    pub fn with_output_channels(mut self, channels: usize) -> Self {
        self.output_channels = channels;
        self
    }
}

/// [`Context`] errors. These are all load/configuration-time; the audio path
/// reports through the host callback instead.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("no such graph: {0}")]
    NoSuchGraph(usize),
    #[error("unknown object: {0}")]
    UnknownObject(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("input frame length {got}, expected {want}")]
    WrongInputSize { got: usize, want: usize },
    #[error("output frame length {got}, expected {want}")]
    WrongOutputSize { got: usize, want: usize },
}

/// Shared read-only cosine lookup table, built once per context and borrowed
/// by the oscillators.
pub struct CosineTable {
    table: Vec<f32>,
}

const COSINE_TABLE_SIZE: usize = 32768;

impl CosineTable {
    pub fn new() -> Self {
        let n = COSINE_TABLE_SIZE;
        let table = (0..n)
            .map(|i| (std::f32::consts::TAU * i as f32 / (n - 1) as f32).cos())
            .collect();
        CosineTable { table }
    }

    /// The addressable phase range `[0, span)`.
    pub fn span(&self) -> f32 {
        (self.table.len() - 1) as f32
    }

    /// Linear-interpolated lookup at a phase in `[0, span)`. Out-of-range
    /// phases clamp rather than panic.
    pub fn lookup(&self, phase: f32) -> f32 {
        if !(phase >= 0.0) {
            return self.table[0];
        }
        if phase >= self.span() {
            return self.table[self.table.len() - 1];
        }
        let lower = phase as usize;
        let fraction = phase - lower as f32;
        self.table[lower] * (1.0 - fraction) + self.table[lower + 1] * fraction
    }
}

impl Default for CosineTable {
    fn default() -> Self {
        CosineTable::new()
    }
}

/// A unique and independent instance of the runtime.
pub struct Context {
    config: Config,
    graphs: Vec<Option<Graph>>,
    scheduler: Scheduler,
    routing: Routing,
    hooks: HostHandle,
    pool: BufferPool,
    cosine: CosineTable,
    input_bus: Vec<f32>,
    output_bus: Vec<f32>,
    block_origin_ms: f64,
    delivery_depth: usize,
}

impl Context {
    /// Build a context with the given configuration and host callback.
    pub fn new(config: Config, callback: Box<dyn HostCallback>) -> Result<Self, ContextError> {
        if config.sample_rate <= 0.0 {
            return Err(ContextError::InvalidConfig("sample rate must be positive"));
        }
        if config.block_size == 0 {
            return Err(ContextError::InvalidConfig("block size must be non-zero"));
        }
        let pool = BufferPool::new(config.block_size, POOL_CAPACITY);
        pool.prefill(POOL_PREFILL);
        info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "context created"
        );
        Ok(Context {
            input_bus: vec![0.0; config.block_size * config.input_channels],
            output_bus: vec![0.0; config.block_size * config.output_channels],
            pool,
            config,
            graphs: Vec::new(),
            scheduler: Scheduler::new(),
            routing: Routing::new(),
            hooks: HostHandle::new(callback),
            cosine: CosineTable::new(),
            block_origin_ms: 0.0,
            delivery_depth: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Current logical time in milliseconds.
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    // --- graph management -------------------------------------------------

    /// Create a new, unattached graph; returns its id (also its `$0`).
    pub fn new_graph(&mut self) -> usize {
        let id = self.graphs.len();
        self.graphs.push(Some(Graph::new(
            id,
            self.config.sample_rate,
            self.config.block_size,
        )));
        id
    }

    pub fn graph(&self, id: usize) -> Option<&Graph> {
        self.graphs.get(id).and_then(Option::as_ref)
    }

    pub fn graph_mut(&mut self, id: usize) -> Option<&mut Graph> {
        self.graphs.get_mut(id).and_then(Option::as_mut)
    }

    /// Attach a graph: its objects register named routing and loadbangs
    /// fire. Fast relative to construction, so a graph built on another
    /// thread can be attached without audio dropouts.
    pub fn attach_graph(&mut self, id: usize) -> Result<(), ContextError> {
        let graph = self
            .graphs
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(id))?;
        graph.attach(&mut self.routing, &mut self.scheduler);
        Ok(())
    }

    /// Detach a graph, leaving it inert in memory.
    pub fn detach_graph(&mut self, id: usize) -> Result<(), ContextError> {
        let graph = self
            .graphs
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(id))?;
        graph.detach(&mut self.routing, &mut self.scheduler);
        Ok(())
    }

    /// Detach and destroy a graph. Pending messages to its objects and all
    /// of its routing registrations are purged.
    pub fn remove_graph(&mut self, id: usize) -> Result<(), ContextError> {
        self.detach_graph(id)?;
        let mut graph = self.graphs[id].take().expect("checked by detach_graph");
        for object in graph.objects() {
            self.scheduler.purge_target(id, object);
            self.routing.purge_object(id, object);
        }
        graph.release_buffers(&self.pool);
        debug!(graph = id, "graph removed");
        Ok(())
    }

    // --- object management ------------------------------------------------

    /// Create an object from its textual form, e.g. `"osc~ 440"`, and add it
    /// to the graph. `$0` in the arguments expands to the graph id. Unknown
    /// labels are a load error and fire the `cannot_find_object` notice.
    pub fn create(&mut self, graph_id: usize, text: &str) -> Result<ObjectId, ContextError> {
        let graph = self
            .graphs
            .get(graph_id)
            .and_then(Option::as_ref)
            .ok_or(ContextError::NoSuchGraph(graph_id))?;
        let expanded = graph.expand_dollar_zero(text.trim());
        let new_ctx = NewObjectCtx {
            sample_rate: graph.sample_rate(),
            block_size: graph.block_size(),
            dollar_zero: graph.dollar_zero(),
        };

        let mut parts = expanded.splitn(2, char::is_whitespace);
        let label = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();
        let init = if args.is_empty() {
            Message::new(0.0)
        } else {
            Message::from_str(0.0, args)?
        };

        let Some(object) = objects::create(label, &init, &new_ctx) else {
            self.hooks.cannot_find_object(label);
            return Err(ContextError::UnknownObject(label.to_string()));
        };
        self.add_object(graph_id, object)
    }

    /// Add an already-constructed object. If the graph is attached the
    /// object's registrations are established immediately.
    pub fn add_object(
        &mut self,
        graph_id: usize,
        object: Box<dyn PatchObject>,
    ) -> Result<ObjectId, ContextError> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(graph_id))?;
        let id = graph.add_object(object);
        graph.attach_one(id, &mut self.routing, &mut self.scheduler);
        Ok(id)
    }

    /// Remove an object: wires, routing registrations, and pending messages
    /// all go with it.
    pub fn remove_object(&mut self, graph_id: usize, id: ObjectId) -> Result<(), ContextError> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(graph_id))?;
        let removed = graph.remove_object(id);
        if let Some(mut object) = removed {
            if graph.is_attached() {
                let mut ctx = crate::object::AttachCtx {
                    routing: &mut self.routing,
                    scheduler: &mut self.scheduler,
                    target: Target {
                        graph: graph_id,
                        object: id,
                        inlet: 0,
                    },
                    sample_rate: self.config.sample_rate,
                    block_size: self.config.block_size,
                };
                object.on_detach(&mut ctx);
            }
        }
        self.scheduler.purge_target(graph_id, id);
        self.routing.purge_object(graph_id, id);
        Ok(())
    }

    /// Wire two objects in a graph. Type-checked; signal wires invalidate
    /// the DSP order.
    pub fn connect(
        &mut self,
        graph_id: usize,
        src: ObjectId,
        outlet: usize,
        dst: ObjectId,
        inlet: usize,
    ) -> Result<PortKind, ContextError> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(graph_id))?;
        Ok(graph.connect(src, outlet, dst, inlet)?)
    }

    pub fn disconnect(
        &mut self,
        graph_id: usize,
        src: ObjectId,
        outlet: usize,
        dst: ObjectId,
        inlet: usize,
    ) -> Result<(), ContextError> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .and_then(Option::as_mut)
            .ok_or(ContextError::NoSuchGraph(graph_id))?;
        Ok(graph.disconnect(src, outlet, dst, inlet)?)
    }

    // --- host API ---------------------------------------------------------

    /// Deliver future sends on `name` to the host via the callback.
    pub fn register_receiver(&mut self, name: &str) {
        self.hooks.register_receiver(Symbol::new(name));
    }

    pub fn unregister_receiver(&mut self, name: &str) {
        self.hooks.unregister_receiver(&Symbol::new(name));
    }

    /// Queue a message for the named receiver, merged at the next block
    /// boundary. Safe to call between `process()` calls; for another thread,
    /// detach a sender with [`Context::take_sender`].
    pub fn send_to_receiver(&mut self, name: &str, message: Message) -> bool {
        self.scheduler.push_external(Symbol::new(name), message)
    }

    /// Detach the producer half of the external inbox for a host thread.
    /// Available once; afterwards `send_to_receiver` reports failure.
    pub fn take_sender(&mut self) -> Option<ExternalSender> {
        self.scheduler.take_sender()
    }

    /// Create a named table.
    pub fn add_table(&mut self, name: &str, len: usize) {
        self.routing.add_table(Symbol::new(name), len);
    }

    pub fn table_buffer(&self, name: &str) -> Option<&[f32]> {
        self.routing.table(&Symbol::new(name)).map(|t| t.buffer())
    }

    /// Resize and fill a named table.
    pub fn set_table_buffer(&mut self, name: &str, samples: &[f32]) -> bool {
        match self.routing.table_mut(&Symbol::new(name)) {
            Some(table) => {
                table.set_buffer(samples);
                true
            }
            None => false,
        }
    }

    // --- the block loop ---------------------------------------------------

    /// Advance exactly one block. `input` and `output` are planar f32
    /// frames, `channels * block_size` samples each.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), ContextError> {
        let block = self.config.block_size;
        let want_in = block * self.config.input_channels;
        let want_out = block * self.config.output_channels;
        if input.len() != want_in {
            return Err(ContextError::WrongInputSize {
                got: input.len(),
                want: want_in,
            });
        }
        if output.len() != want_out {
            return Err(ContextError::WrongOutputSize {
                got: output.len(),
                want: want_out,
            });
        }

        self.input_bus.copy_from_slice(input);
        self.output_bus.fill(0.0);
        self.routing.begin_block();
        self.ensure_orders();

        for external in self.scheduler.drain_external() {
            self.route_external(external);
        }

        let block_duration = block as f64 / self.config.sample_rate as f64 * 1000.0;
        let block_end = self.block_origin_ms + block_duration;
        let sample_duration = block_duration / block as f64;
        let mut processed = 0usize;

        loop {
            let Some(head) = self.scheduler.peek_time() else {
                break;
            };
            if head >= block_end {
                break;
            }
            // Late events fire immediately at the current time.
            let t = head.max(self.scheduler.now());
            let split = (((t - self.block_origin_ms) / block_duration) * block as f64)
                .round()
                .clamp(0.0, block as f64) as usize;
            if split > processed {
                self.dispatch_range(processed, split);
                processed = split;
            }
            // Everything within one sample of t is coincident with it.
            while let Some(entry) = self.scheduler.pop_before(t + sample_duration) {
                self.deliver(entry.target, entry.message);
            }
            self.scheduler.set_now(t);
        }

        if processed < block {
            self.dispatch_range(processed, block);
        }
        self.scheduler.set_now(block_end);
        self.block_origin_ms = block_end;
        self.routing.end_block();

        output.copy_from_slice(&self.output_bus);
        Ok(())
    }

    fn ensure_orders(&mut self) {
        for graph in self.graphs.iter_mut().flatten() {
            if graph.is_attached() && graph.order_stale() {
                if let Err(e) = graph.ensure_order(&self.pool) {
                    self.hooks.print_err(&format!("{}", e));
                }
            }
        }
    }

    fn dispatch_range(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let Self {
            graphs,
            routing,
            hooks,
            cosine,
            input_bus,
            output_bus,
            config,
            ..
        } = self;
        let mut ctx = SignalCtx {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            input_channels: config.input_channels,
            output_channels: config.output_channels,
            cosine,
            routing,
            hooks,
            input_bus: input_bus.as_slice(),
            output_bus: output_bus.as_mut_slice(),
        };
        for graph in graphs.iter_mut().flatten() {
            if graph.is_attached() && !graph.order_stale() {
                graph.process_range(from, to, &mut ctx);
            }
        }
    }

    fn route_external(&mut self, external: ExternalMessage) {
        let ExternalMessage { receiver, message } = external;
        if receiver.as_str() == "pd" {
            self.handle_system_message(&message);
            return;
        }
        for target in self.routing.receiver_targets(&receiver) {
            self.scheduler.schedule(target, message.clone());
        }
    }

    fn handle_system_message(&mut self, message: &Message) {
        if message.is_symbol_at(0, "dsp") {
            let enable = message.float_at(1).unwrap_or(0.0) != 0.0;
            self.hooks.switch_dsp(enable);
        }
    }

    /// Deliver a message to one inlet, then fan its emissions out
    /// depth-first. The depth guard cuts zero-delay message cycles.
    fn deliver(&mut self, target: Target, message: Message) {
        if self.delivery_depth >= MAX_DELIVERY_DEPTH {
            self.hooks
                .print_err("stack overflow: message delivery depth exceeded, dropping message");
            return;
        }
        self.delivery_depth += 1;
        self.deliver_inner(target, message);
        self.delivery_depth -= 1;
    }

    fn deliver_inner(&mut self, target: Target, message: Message) {
        let (outbox, symbol_sends) = {
            let Self {
                graphs,
                scheduler,
                hooks,
                config,
                ..
            } = self;
            let Some(graph) = graphs.get_mut(target.graph).and_then(Option::as_mut) else {
                return;
            };
            // Scheduled sends to a destroyed object are discarded here.
            let Some(mut object) = graph.take_object(target.object) else {
                return;
            };
            let mut ctx = MessageCtx::new(
                scheduler,
                hooks,
                target,
                config.sample_rate,
                config.block_size,
            );
            object.receive_message(target.inlet, &message, &mut ctx);
            graph.put_object(target.object, object);
            (
                std::mem::take(&mut ctx.outbox),
                std::mem::take(&mut ctx.symbol_sends),
            )
        };

        for (outlet, emitted) in outbox {
            let Some(graph) = self.graphs.get(target.graph).and_then(Option::as_ref) else {
                return;
            };
            let mut destinations = graph.message_destinations(target.object, outlet);
            if destinations.is_empty() {
                continue;
            }
            let last = destinations.pop().expect("non-empty");
            for (dst, inlet) in destinations {
                self.deliver(
                    Target {
                        graph: target.graph,
                        object: dst,
                        inlet,
                    },
                    emitted.clone(),
                );
            }
            self.deliver(
                Target {
                    graph: target.graph,
                    object: last.0,
                    inlet: last.1,
                },
                emitted,
            );
        }
        for (name, sent) in symbol_sends {
            self.dispatch_symbol_send(name, sent);
        }
    }

    fn dispatch_symbol_send(&mut self, name: Symbol, message: Message) {
        if name.as_str() == "pd" {
            self.handle_system_message(&message);
            return;
        }
        for target in self.routing.receiver_targets(&name) {
            self.deliver(target, message.clone());
        }
        if self.hooks.is_registered(&name) {
            self.hooks.receiver_message(&name, &message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::NullCallback;
    use std::sync::{Arc, Mutex};

    fn quiet_context(config: Config) -> Context {
        Context::new(config, Box::new(NullCallback)).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.input_channels, 2);
        assert_eq!(config.output_channels, 2);
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.block_size, 64);
    }

    #[test]
    fn config_builders() {
        let config = Config::default()
            .with_sample_rate(48000.0)
            .with_block_size(128)
            .with_input_channels(1)
            .with_output_channels(4);
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.block_size, 128);
        assert_eq!(config.input_channels, 1);
        assert_eq!(config.output_channels, 4);
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(Context::new(
            Config::default().with_block_size(0),
            Box::new(NullCallback)
        )
        .is_err());
        assert!(Context::new(
            Config::default().with_sample_rate(0.0),
            Box::new(NullCallback)
        )
        .is_err());
    }

    #[test]
    fn empty_patch_outputs_silence_and_advances_time() {
        let mut context = quiet_context(Config::default().with_input_channels(0));
        let graph = context.new_graph();
        context.attach_graph(graph).unwrap();

        let mut output = vec![1.0; 128];
        context.process(&[], &mut output).unwrap();
        assert!(output.iter().all(|&x| x == 0.0));

        let block_duration = 64.0 / 44100.0 * 1000.0;
        assert!((context.now() - block_duration).abs() < 1e-9);
    }

    #[test]
    fn wrong_frame_sizes_are_rejected() {
        let mut context = quiet_context(Config::default());
        let mut output = vec![0.0; 128];
        assert!(matches!(
            context.process(&[0.0; 3], &mut output),
            Err(ContextError::WrongInputSize { .. })
        ));
        let input = vec![0.0; 128];
        assert!(matches!(
            context.process(&input, &mut [0.0; 3]),
            Err(ContextError::WrongOutputSize { .. })
        ));
    }

    #[test]
    fn unknown_object_label_errors_and_notifies() {
        struct Misses(Arc<Mutex<Vec<String>>>);
        impl HostCallback for Misses {
            fn cannot_find_object(&mut self, name: &str) -> Option<String> {
                self.0.lock().unwrap().push(name.to_string());
                None
            }
        }

        let names = Arc::new(Mutex::new(Vec::new()));
        let mut context =
            Context::new(Config::default(), Box::new(Misses(names.clone()))).unwrap();
        let graph = context.new_graph();
        assert!(matches!(
            context.create(graph, "definitely-not-an-object 1 2"),
            Err(ContextError::UnknownObject(_))
        ));
        assert_eq!(
            names.lock().unwrap().as_slice(),
            &["definitely-not-an-object".to_string()]
        );
    }

    #[test]
    fn cosine_table_endpoints() {
        let table = CosineTable::new();
        assert!((table.lookup(0.0) - 1.0).abs() < 1e-6);
        // Quarter span is cos(pi/2) = 0.
        assert!(table.lookup(table.span() / 4.0).abs() < 1e-3);
        // Clamping instead of panicking.
        let _ = table.lookup(-1.0);
        let _ = table.lookup(table.span() + 10.0);
    }

    #[test]
    fn message_cycle_is_cut_with_an_error() {
        struct Echo;
        impl PatchObject for Echo {
            fn label(&self) -> &'static str {
                "echo"
            }
            fn message_inlets(&self) -> usize {
                1
            }
            fn message_outlets(&self) -> usize {
                1
            }
            fn process_message(
                &mut self,
                _inlet: usize,
                message: &Message,
                ctx: &mut MessageCtx<'_>,
            ) {
                ctx.send(0, message.clone());
            }
        }

        struct Errors(Arc<Mutex<Vec<String>>>);
        impl HostCallback for Errors {
            fn print_err(&mut self, message: &str) {
                self.0.lock().unwrap().push(message.to_string());
            }
        }

        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut context =
            Context::new(Config::default(), Box::new(Errors(errors.clone()))).unwrap();
        let graph = context.new_graph();
        let a = context.add_object(graph, Box::new(Echo)).unwrap();
        let b = context.add_object(graph, Box::new(Echo)).unwrap();
        context.connect(graph, a, 0, b, 0).unwrap();
        context.connect(graph, b, 0, a, 0).unwrap();
        context.attach_graph(graph).unwrap();

        // Kick the cycle off through the scheduler.
        context.scheduler.schedule(
            Target {
                graph,
                object: a,
                inlet: 0,
            },
            Message::bang(0.0),
        );
        let input = vec![0.0; 128];
        let mut output = vec![0.0; 128];
        context.process(&input, &mut output).unwrap();

        let errors = errors.lock().unwrap();
        assert!(!errors.is_empty());
        assert!(errors[0].contains("stack overflow"));
    }
}
