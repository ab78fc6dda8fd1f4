//! `send` - forward messages into the global send/receive namespace.
//!
//! Delivery is unbuffered and synchronous: every matching `receive` fires in
//! registration order before the sender's handler chain continues, and
//! host-registered receiver names reach the host callback.

use crate::message::{Message, Symbol};
use crate::object::{MessageCtx, PatchObject};

pub struct Send {
    name: Symbol,
}

impl Send {
    /// The name is mandatory; a `send` with no destination is a load error.
    pub fn new(init: &Message) -> Option<Self> {
        Some(Send {
            name: init.symbol_at(0)?.clone(),
        })
    }
}

impl PatchObject for Send {
    fn label(&self) -> &'static str {
        "send"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn should_distribute(&self) -> bool {
        false
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        ctx.send_to_symbol(self.name.clone(), message.clone());
    }
}
