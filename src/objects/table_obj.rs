//! `table` - declare a named table in the routing fabric.
//!
//! The table exists while the owning graph is attached; `tabread~` and
//! `tabwrite~` resolve it by name. Hosts can also create tables directly on
//! the context.

use crate::message::{Message, Symbol};
use crate::object::{AttachCtx, MessageCtx, PatchObject};

const DEFAULT_LENGTH: usize = 100;

pub struct TableObject {
    name: Symbol,
    len: usize,
}

impl TableObject {
    pub fn new(init: &Message) -> Option<Self> {
        let len = match init.float_at(1) {
            Some(f) if f >= 1.0 => f as usize,
            _ => DEFAULT_LENGTH,
        };
        Some(TableObject {
            name: init.symbol_at(0)?.clone(),
            len,
        })
    }
}

impl PatchObject for TableObject {
    fn label(&self) -> &'static str {
        "table"
    }

    fn message_inlets(&self) -> usize {
        0
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.add_table(self.name.clone(), self.len);
    }

    fn on_detach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.remove_table(&self.name);
    }

    fn process_message(&mut self, _inlet: usize, _message: &Message, _ctx: &mut MessageCtx<'_>) {}
}
