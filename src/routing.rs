//! The symbol routing fabric: global namespaces that connect objects outside
//! the explicit graph edges.
//!
//! Four parallel namespaces share one registry: message send/receive
//! endpoints, throw/catch signal busses, named delay lines, and named tables.
//! Bindings are late: a reader constructed before its writer stores the
//! symbol and resolves on every lookup, contributing silence (plus a one-shot
//! notice) until the name appears.

use std::collections::{HashMap, HashSet};

use crate::object::Target;
use crate::message::Symbol;
use crate::table::{DelayLine, Table};

struct ThrowBus {
    buffer: Vec<f32>,
    writers: usize,
}

/// All four symbol namespaces.
#[derive(Default)]
pub struct Routing {
    receives: HashMap<Symbol, Vec<Target>>,
    throws: HashMap<Symbol, ThrowBus>,
    delays: HashMap<Symbol, DelayLine>,
    tables: HashMap<Symbol, Table>,
    missing_reported: HashSet<Symbol>,
}

impl Default for ThrowBus {
    fn default() -> Self {
        ThrowBus {
            buffer: Vec::new(),
            writers: 0,
        }
    }
}

impl Routing {
    pub fn new() -> Self {
        Routing {
            receives: HashMap::new(),
            throws: HashMap::new(),
            delays: HashMap::new(),
            tables: HashMap::new(),
            missing_reported: HashSet::new(),
        }
    }

    // --- send / receive ---------------------------------------------------

    /// Register a receive endpoint. Endpoints fire in registration order.
    pub fn register_receive(&mut self, name: Symbol, target: Target) {
        self.receives.entry(name).or_default().push(target);
    }

    pub fn unregister_receive(&mut self, name: &Symbol, target: Target) {
        if let Some(endpoints) = self.receives.get_mut(name) {
            endpoints.retain(|t| *t != target);
            if endpoints.is_empty() {
                self.receives.remove(name);
            }
        }
    }

    /// The endpoints currently bound to `name`, in registration order.
    pub fn receiver_targets(&self, name: &Symbol) -> Vec<Target> {
        self.receives.get(name).cloned().unwrap_or_default()
    }

    /// Drop every registration owned by a destroyed object.
    pub fn purge_object(&mut self, graph: usize, object: usize) {
        self.receives.retain(|_, endpoints| {
            endpoints.retain(|t| !(t.graph == graph && t.object == object));
            !endpoints.is_empty()
        });
    }

    // --- throw / catch ----------------------------------------------------

    pub fn declare_throw(&mut self, name: Symbol, block_size: usize) {
        let bus = self.throws.entry(name).or_default();
        if bus.buffer.len() != block_size {
            bus.buffer = vec![0.0; block_size];
        }
        bus.writers += 1;
    }

    pub fn retract_throw(&mut self, name: &Symbol) {
        if let Some(bus) = self.throws.get_mut(name) {
            bus.writers = bus.writers.saturating_sub(1);
            if bus.writers == 0 {
                self.throws.remove(name);
            }
        }
    }

    /// Sum `input[from..to]` into the named throw bus.
    pub fn throw_add(&mut self, name: &Symbol, input: &[f32], from: usize, to: usize) {
        if let Some(bus) = self.throws.get_mut(name) {
            for i in from..to {
                bus.buffer[i] += input[i];
            }
        }
    }

    /// The summed throw signal for `name`, if any writer exists.
    pub fn throw_read(&self, name: &Symbol) -> Option<&[f32]> {
        self.throws.get(name).map(|bus| bus.buffer.as_slice())
    }

    /// Names of all live throw busses.
    pub fn throw_names(&self) -> Vec<Symbol> {
        self.throws.keys().cloned().collect()
    }

    // --- delay lines ------------------------------------------------------

    /// Create the named delay line. The first writer wins; a second
    /// declaration with the same name is ignored and reported.
    pub fn declare_delay(
        &mut self,
        name: Symbol,
        len_ms: f32,
        sample_rate: f32,
        block_size: usize,
    ) -> bool {
        if self.delays.contains_key(&name) {
            return false;
        }
        self.delays
            .insert(name, DelayLine::new(len_ms, sample_rate, block_size));
        true
    }

    pub fn remove_delay(&mut self, name: &Symbol) {
        self.delays.remove(name);
    }

    pub fn delay(&self, name: &Symbol) -> Option<&DelayLine> {
        self.delays.get(name)
    }

    pub fn delay_mut(&mut self, name: &Symbol) -> Option<&mut DelayLine> {
        self.delays.get_mut(name)
    }

    // --- tables -----------------------------------------------------------

    pub fn add_table(&mut self, name: Symbol, len: usize) {
        self.tables.insert(name, Table::new(len));
    }

    pub fn remove_table(&mut self, name: &Symbol) {
        self.tables.remove(name);
    }

    pub fn table(&self, name: &Symbol) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &Symbol) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    // --- block lifecycle and diagnostics ----------------------------------

    /// Zero the throw busses for a fresh block.
    pub fn begin_block(&mut self) {
        for bus in self.throws.values_mut() {
            bus.buffer.fill(0.0);
        }
    }

    /// Advance all delay-line write heads past the finished block.
    pub fn end_block(&mut self) {
        for line in self.delays.values_mut() {
            line.end_block();
        }
    }

    /// True the first time an unresolved `name` is reported, so readers log
    /// once rather than every block.
    pub fn report_missing_once(&mut self, name: &Symbol) -> bool {
        self.missing_reported.insert(name.clone())
    }
}
