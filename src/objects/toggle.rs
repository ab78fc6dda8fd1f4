//! `toggle` - on/off switch.
//!
//! A bang flips the state and emits the on-value or 0; a float sets the
//! state directly and is passed through. The on-value defaults to 1 and is
//! remembered from the last non-zero float.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Toggle {
    is_on: bool,
    on_output: f32,
}

impl Toggle {
    pub fn new(init: &Message) -> Self {
        let on_output = match init.float_at(0) {
            Some(f) if f != 0.0 => f,
            _ => 1.0,
        };
        Toggle {
            is_on: init.float_at(0).map(|f| f != 0.0).unwrap_or(false),
            on_output,
        }
    }
}

impl PatchObject for Toggle {
    fn label(&self) -> &'static str {
        "toggle"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        if message.is_bang_at(0) {
            self.is_on = !self.is_on;
            let value = if self.is_on { self.on_output } else { 0.0 };
            ctx.send(0, Message::float(message.timestamp(), value));
        } else if let Some(f) = message.float_at(0) {
            self.is_on = f != 0.0;
            if self.is_on {
                self.on_output = f;
            }
            ctx.send(0, Message::float(message.timestamp(), f));
        }
    }
}
