//! `delread~` - read a named delay line with a fractional-sample delay.
//!
//! Binding is late: the reader stores the symbol and resolves it on every
//! block, so construction order against the writer does not matter. An
//! unresolved name outputs silence and raises a one-time notice. A float on
//! the inlet sets the delay time in milliseconds.
//!
//! For ordering purposes the reader has no signal predecessors; the graph
//! inserts the writer-before-reader edge unless the patch feeds the reader
//! back into the writer, in which case reads lag by one block.

use crate::message::{Message, Symbol};
use crate::object::{MessageCtx, PatchObject, RoutingRole, SignalCtx};

pub struct DelRead {
    name: Symbol,
    delay_ms: f32,
}

impl DelRead {
    pub fn new(init: &Message) -> Option<Self> {
        Some(DelRead {
            name: init.symbol_at(0)?.clone(),
            delay_ms: init.float_at(1).unwrap_or(0.0).max(0.0),
        })
    }
}

impl PatchObject for DelRead {
    fn label(&self) -> &'static str {
        "delread~"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn routing_role(&self) -> RoutingRole {
        RoutingRole::DelayReader(self.name.clone())
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        if let Some(f) = message.float_at(0) {
            self.delay_ms = f.max(0.0);
        }
    }

    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        let resolved = ctx.routing.delay(&self.name).is_some();
        if resolved {
            let delay_samples = self.delay_ms * ctx.sample_rate / 1000.0;
            if let Some(line) = ctx.routing.delay(&self.name) {
                line.read_range(&mut outputs[0], from, to, delay_samples);
            }
        } else {
            outputs[0][from..to].fill(0.0);
            if ctx.routing.report_missing_once(&self.name) {
                ctx.hooks.cannot_find_object(self.name.as_str());
                ctx.hooks
                    .print_err(&format!("delread~: no delay line named {}", self.name));
            }
        }
    }
}
