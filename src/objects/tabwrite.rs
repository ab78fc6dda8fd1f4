//! `tabwrite~` - record a signal into a named table, one shot per bang.
//!
//! A bang rewinds to index zero and starts recording; writing stops when
//! the table is full.

use crate::message::{Message, Symbol};
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct TabWrite {
    name: Symbol,
    index: usize,
    stopped: bool,
}

impl TabWrite {
    pub fn new(init: &Message) -> Option<Self> {
        Some(TabWrite {
            name: init.symbol_at(0)?.clone(),
            index: 0,
            stopped: true,
        })
    }
}

impl PatchObject for TabWrite {
    fn label(&self) -> &'static str {
        "tabwrite~"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        if message.is_bang_at(0) {
            self.index = 0;
            self.stopped = false;
        }
    }

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        _outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        if self.stopped {
            return;
        }
        if ctx.routing.table(&self.name).is_none() {
            if ctx.routing.report_missing_once(&self.name) {
                ctx.hooks.cannot_find_object(self.name.as_str());
                ctx.hooks
                    .print_err(&format!("tabwrite~: no table named {}", self.name));
            }
            return;
        }
        if let Some(table) = ctx.routing.table_mut(&self.name) {
            let buffer = table.buffer_mut();
            let input = inputs[0];
            for i in from..to {
                if self.index >= buffer.len() {
                    self.stopped = true;
                    break;
                }
                buffer[self.index] = input[i];
                self.index += 1;
            }
        }
    }
}
