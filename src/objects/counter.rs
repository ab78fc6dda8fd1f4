//! `counter` - count bangs.
//!
//! A bang emits the current count and increments it; a float resets the
//! count. The optional init atom sets the starting value.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Counter {
    count: f32,
}

impl Counter {
    pub fn new(init: &Message) -> Self {
        Counter {
            count: init.float_at(0).unwrap_or(0.0),
        }
    }
}

impl PatchObject for Counter {
    fn label(&self) -> &'static str {
        "counter"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        if message.is_bang_at(0) {
            ctx.send(0, Message::float(message.timestamp(), self.count));
            self.count += 1.0;
        } else if let Some(f) = message.float_at(0) {
            self.count = f;
        }
    }
}
