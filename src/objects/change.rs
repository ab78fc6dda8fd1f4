//! `change` - pass floats only when they differ from the previous one.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Change {
    previous: f32,
}

impl Change {
    pub fn new(init: &Message) -> Self {
        Change {
            previous: init.float_at(0).unwrap_or(0.0),
        }
    }
}

impl PatchObject for Change {
    fn label(&self) -> &'static str {
        "change"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        if let Some(f) = message.float_at(0) {
            if f != self.previous {
                self.previous = f;
                ctx.send(0, Message::float(message.timestamp(), f));
            }
        } else if message.is_bang_at(0) {
            // Force output of the stored value.
            ctx.send(0, Message::float(message.timestamp(), self.previous));
        } else if message.is_symbol_at(0, "set") {
            if let Some(f) = message.float_at(1) {
                self.previous = f;
            }
        }
    }

    fn should_distribute(&self) -> bool {
        false
    }
}
