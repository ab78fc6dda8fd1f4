//! # Patchbay - Dataflow Patch Runtime
//!
//! Patchbay is an embeddable execution engine for a dataflow patch language
//! in the tradition of graphical audio programming environments. A patch is a
//! directed graph of objects connected by two kinds of wires: discrete
//! timestamped **messages** and continuous block-rate **audio signals**. The
//! engine loads a patch, orders its objects for execution, and advances time
//! one audio block at a time, draining every message that falls inside the
//! block at its exact sample offset.
//!
//! ## Core pieces
//!
//! - [`context::Context`] - one independent runtime instance: clock, message
//!   queue, routing fabric, graphs, host callback (start here!)
//! - [`graph::Graph`] - object arena, wires, and the deterministic DSP order
//! - [`object::PatchObject`] - the contract every object implements
//! - [`message::Message`] - timestamped atom lists
//! - [`routing::Routing`] - send/receive, throw~/catch~, delay lines, tables
//! - [`objects`] - the built-in object library and its label factory
//!
//! ## Quick start
//!
//! ```
//! use patchbay::callback::NullCallback;
//! use patchbay::context::{Config, Context};
//!
//! let mut context = Context::new(Config::default(), Box::new(NullCallback)).unwrap();
//! let patch = context.new_graph();
//!
//! // [osc~ 441] -> [dac~]
//! let osc = context.create(patch, "osc~ 441").unwrap();
//! let dac = context.create(patch, "dac~").unwrap();
//! context.connect(patch, osc, 0, dac, 0).unwrap();
//! context.attach_graph(patch).unwrap();
//!
//! // Pull one block of audio.
//! let input = vec![0.0; 2 * 64];
//! let mut output = vec![0.0; 2 * 64];
//! context.process(&input, &mut output).unwrap();
//! assert!(output[0] > 0.9); // cosine starts at 1.0
//! ```
//!
//! ## Timing model
//!
//! Timestamps are `f64` milliseconds. Within a block, a message timestamp is
//! converted to a sample offset; signal processing runs up to that sample,
//! the message (and everything coincident with it) is delivered, and
//! processing resumes. Messages with equal timestamps fire in insertion
//! order, and synchronous fanout is depth-first, so zero-delay patches are
//! deterministic.
//!
//! ## Threading model
//!
//! Everything runs cooperatively on the audio thread; there is no locking on
//! the audio path. The host feeds messages in through a single-producer ring
//! buffer ([`Context::take_sender`](context::Context::take_sender)) and hears
//! back through the [`callback::HostCallback`] it installs at construction.

pub mod buffer_pool;
pub mod callback;
pub mod context;
pub mod graph;
pub mod message;
pub mod object;
pub mod objects;
pub mod routing;
pub mod scheduler;
pub mod table;

pub use callback::{HostCallback, NullCallback};
pub use context::{Config, Context, ContextError};
pub use graph::{Connection, Graph, GraphError};
pub use message::{Atom, Message, Symbol};
pub use object::{ObjectId, PatchObject, PortKind};
