//! The object contract: typed ports, message handling, block processing.
//!
//! Every node in a patch implements [`PatchObject`]. The engine talks to
//! objects through three entry points: `receive_message` (with the standard
//! inlet distribution provided as a default), `process_block` for
//! signal-producing objects, and the attach/detach hooks where named-routing
//! registrations are established and revoked.

use crate::callback::HostHandle;
use crate::context::CosineTable;
use crate::message::{Message, Symbol};
use crate::routing::Routing;
use crate::scheduler::{MessageHandle, Scheduler};

/// Stable identifier of an object within its graph's arena.
pub type ObjectId = usize;

/// Address of one object inlet anywhere in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub graph: usize,
    pub object: ObjectId,
    pub inlet: usize,
}

/// The two wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Message,
    Signal,
}

/// How an object participates in the named signal namespaces. The graph uses
/// this to add the implicit ordering edges (writer before reader, throws
/// before their catch).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoutingRole {
    #[default]
    None,
    DelayWriter(Symbol),
    DelayReader(Symbol),
    Throw(Symbol),
    Catch(Symbol),
}

/// Handed to an object while it processes a message.
///
/// Emissions are collected here and fanned out depth-first after the handler
/// returns, in emission order; an object never holds a borrow into another
/// object while running.
pub struct MessageCtx<'a> {
    pub(crate) outbox: Vec<(usize, Message)>,
    pub(crate) symbol_sends: Vec<(Symbol, Message)>,
    scheduler: &'a mut Scheduler,
    hooks: &'a mut HostHandle,
    target: Target,
    sample_rate: f32,
    block_size: usize,
}

impl<'a> MessageCtx<'a> {
    pub(crate) fn new(
        scheduler: &'a mut Scheduler,
        hooks: &'a mut HostHandle,
        target: Target,
        sample_rate: f32,
        block_size: usize,
    ) -> Self {
        MessageCtx {
            outbox: Vec::new(),
            symbol_sends: Vec::new(),
            scheduler,
            hooks,
            target,
            sample_rate,
            block_size,
        }
    }

    /// Current logical time in milliseconds.
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Emit a message from `outlet`. Delivery to every connected destination
    /// happens right after the current handler returns.
    pub fn send(&mut self, outlet: usize, message: Message) {
        self.outbox.push((outlet, message));
    }

    /// Send into the global send/receive namespace.
    pub fn send_to_symbol(&mut self, name: Symbol, message: Message) {
        self.symbol_sends.push((name, message));
    }

    /// Queue a future delivery to one of this object's own inlets. The
    /// timestamp is taken from the message.
    pub fn schedule_to_self(&mut self, inlet: usize, message: Message) -> MessageHandle {
        let target = Target {
            inlet,
            ..self.target
        };
        self.scheduler.schedule(target, message)
    }

    pub fn cancel(&mut self, handle: MessageHandle) {
        self.scheduler.cancel(handle);
    }

    /// Informational log through the host callback.
    pub fn post(&mut self, text: &str) {
        self.hooks.print_std(text);
    }

    /// Error log through the host callback.
    pub fn error(&mut self, text: &str) {
        self.hooks.print_err(text);
    }
}

/// Handed to signal objects for each processed sub-range. Borrows the shared
/// resources an object may touch: the routing fabric (delay lines, tables,
/// throw busses), the audio busses, and the context's cosine table.
pub struct SignalCtx<'a> {
    pub sample_rate: f32,
    pub block_size: usize,
    pub input_channels: usize,
    pub output_channels: usize,
    pub cosine: &'a CosineTable,
    pub routing: &'a mut Routing,
    pub hooks: &'a mut HostHandle,
    /// Planar input frames, `input_channels * block_size` samples.
    pub input_bus: &'a [f32],
    /// Planar output frames, `output_channels * block_size` samples.
    pub output_bus: &'a mut [f32],
}

/// Handed to objects when their graph attaches to or detaches from a
/// context. Registrations made here are revoked in `on_detach`.
pub struct AttachCtx<'a> {
    pub(crate) routing: &'a mut Routing,
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) target: Target,
    pub sample_rate: f32,
    pub block_size: usize,
}

impl<'a> AttachCtx<'a> {
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn register_receive(&mut self, name: Symbol) {
        self.routing.register_receive(name, self.target);
    }

    pub fn unregister_receive(&mut self, name: &Symbol) {
        self.routing.unregister_receive(name, self.target);
    }

    pub fn declare_delay(&mut self, name: Symbol, len_ms: f32) -> bool {
        self.routing
            .declare_delay(name, len_ms, self.sample_rate, self.block_size)
    }

    pub fn remove_delay(&mut self, name: &Symbol) {
        self.routing.remove_delay(name);
    }

    pub fn declare_throw(&mut self, name: Symbol) {
        self.routing.declare_throw(name, self.block_size);
    }

    pub fn retract_throw(&mut self, name: &Symbol) {
        self.routing.retract_throw(name);
    }

    pub fn add_table(&mut self, name: Symbol, len: usize) {
        self.routing.add_table(name, len);
    }

    pub fn remove_table(&mut self, name: &Symbol) {
        self.routing.remove_table(name);
    }

    /// Queue a delivery to one of this object's own inlets (loadbang).
    pub fn schedule_to_self(&mut self, inlet: usize, message: Message) -> MessageHandle {
        let target = Target {
            inlet,
            ..self.target
        };
        self.scheduler.schedule(target, message)
    }
}

/// A node in a patch graph.
///
/// Port counts are fixed for the lifetime of the object. A physical inlet
/// `i` accepts signal wires when `i < signal_inlets()` and message wires
/// when `i < message_inlets()`; outlet `o` carries signal when
/// `o < signal_outlets()`, message otherwise. Inlet 0 is hot: a message
/// there triggers computation, other inlets update state.
pub trait PatchObject: Send {
    /// The object label, e.g. `"osc~"` or `"metro"`.
    fn label(&self) -> &'static str;

    fn message_inlets(&self) -> usize;
    fn message_outlets(&self) -> usize;

    fn signal_inlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        0
    }

    /// Whether a multi-atom message on the hot inlet is spread across the
    /// message inlets right-to-left before processing. Objects that consume
    /// whole lists opt out.
    fn should_distribute(&self) -> bool {
        true
    }

    /// Participation in the named signal namespaces, fixed at construction.
    fn routing_role(&self) -> RoutingRole {
        RoutingRole::None
    }

    fn is_dsp(&self) -> bool {
        self.signal_inlets() > 0 || self.signal_outlets() > 0
    }

    /// No outgoing wires of either kind.
    fn is_leaf(&self) -> bool {
        self.message_outlets() == 0 && self.signal_outlets() == 0
    }

    /// Entry point for messages from other objects or the scheduler.
    ///
    /// The default applies the standard inlet distribution: a multi-atom
    /// message on the hot inlet updates the cold inlets right-to-left, then
    /// processes the first atom on the hot inlet.
    fn receive_message(&mut self, inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        if inlet == 0
            && self.should_distribute()
            && message.len() > 1
            && self.message_inlets() > 1
        {
            let spread = message.len().min(self.message_inlets());
            for i in (1..spread).rev() {
                let single =
                    Message::new(message.timestamp()).with_atom(message.atom(i).unwrap().clone());
                self.process_message(i, &single, ctx);
            }
            let hot =
                Message::new(message.timestamp()).with_atom(message.atom(0).unwrap().clone());
            self.process_message(0, &hot, ctx);
        } else {
            self.process_message(inlet, message, ctx);
        }
    }

    /// Handle one message on one inlet.
    fn process_message(&mut self, inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>);

    /// Fill outlet buffers for samples `[from, to)` of the current block.
    ///
    /// Must be correct for any sub-range and preserve internal state across
    /// sub-ranges; mid-block messages split the block at arbitrary sample
    /// boundaries.
    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        _outputs: &mut [Vec<f32>],
        _from: usize,
        _to: usize,
        _ctx: &mut SignalCtx<'_>,
    ) {
    }

    /// A signal inlet transitioned between connected and disconnected.
    /// Objects use this to swap between a scalar fast path and a full
    /// signal path.
    fn on_inlet_connection_update(&mut self, _inlet: usize, _connected: bool) {}

    /// The owning graph attached to a context.
    fn on_attach(&mut self, _ctx: &mut AttachCtx<'_>) {}

    /// The owning graph detached; revoke what `on_attach` registered.
    fn on_detach(&mut self, _ctx: &mut AttachCtx<'_>) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal harness for exercising objects outside a context.

    use super::*;
    use crate::callback::{HostCallback, NullCallback};

    pub(crate) struct Bench {
        pub scheduler: Scheduler,
        pub hooks: HostHandle,
        pub target: Target,
        pub sample_rate: f32,
        pub block_size: usize,
    }

    impl Bench {
        pub fn new() -> Self {
            Bench::with_callback(Box::new(NullCallback))
        }

        pub fn with_callback(callback: Box<dyn HostCallback>) -> Self {
            Bench {
                scheduler: Scheduler::new(),
                hooks: HostHandle::new(callback),
                target: Target {
                    graph: 0,
                    object: 0,
                    inlet: 0,
                },
                sample_rate: 44100.0,
                block_size: 64,
            }
        }

        /// Deliver a message and return the object's outlet emissions.
        pub fn deliver(
            &mut self,
            object: &mut dyn PatchObject,
            inlet: usize,
            message: Message,
        ) -> Vec<(usize, Message)> {
            let mut ctx = MessageCtx::new(
                &mut self.scheduler,
                &mut self.hooks,
                Target {
                    inlet,
                    ..self.target
                },
                self.sample_rate,
                self.block_size,
            );
            object.receive_message(inlet, &message, &mut ctx);
            ctx.outbox
        }

        /// Like `deliver`, also returning symbol-domain sends.
        pub fn deliver_all(
            &mut self,
            object: &mut dyn PatchObject,
            inlet: usize,
            message: Message,
        ) -> (Vec<(usize, Message)>, Vec<(Symbol, Message)>) {
            let mut ctx = MessageCtx::new(
                &mut self.scheduler,
                &mut self.hooks,
                Target {
                    inlet,
                    ..self.target
                },
                self.sample_rate,
                self.block_size,
            );
            object.receive_message(inlet, &message, &mut ctx);
            (ctx.outbox, ctx.symbol_sends)
        }
    }

    /// Floats from single-float emissions, for terse assertions.
    pub(crate) fn emitted_floats(outbox: &[(usize, Message)]) -> Vec<f32> {
        outbox
            .iter()
            .filter_map(|(_, message)| message.float_at(0))
            .collect()
    }

    /// Harness for exercising `process_block` outside a context. Two audio
    /// channels, planar busses, fresh routing fabric.
    pub(crate) struct SigBench {
        pub routing: Routing,
        pub hooks: HostHandle,
        pub cosine: crate::context::CosineTable,
        pub input: Vec<f32>,
        pub output: Vec<f32>,
        pub sample_rate: f32,
        pub block_size: usize,
    }

    impl SigBench {
        pub fn new(block_size: usize) -> Self {
            SigBench {
                routing: Routing::new(),
                hooks: HostHandle::new(Box::new(NullCallback)),
                cosine: crate::context::CosineTable::new(),
                input: vec![0.0; block_size * 2],
                output: vec![0.0; block_size * 2],
                sample_rate: 44100.0,
                block_size,
            }
        }

        pub fn ctx(&mut self) -> SignalCtx<'_> {
            SignalCtx {
                sample_rate: self.sample_rate,
                block_size: self.block_size,
                input_channels: 2,
                output_channels: 2,
                cosine: &self.cosine,
                routing: &mut self.routing,
                hooks: &mut self.hooks,
                input_bus: &self.input,
                output_bus: &mut self.output,
            }
        }
    }
}
