//! `min` - the smaller of the input and the stored operand.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Minimum {
    operand: f32,
    last_output: f32,
}

impl Minimum {
    pub fn new(init: &Message) -> Self {
        Minimum {
            operand: init.float_at(0).unwrap_or(0.0),
            last_output: 0.0,
        }
    }
}

impl PatchObject for Minimum {
    fn label(&self) -> &'static str {
        "min"
    }

    fn message_inlets(&self) -> usize {
        2
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        match inlet {
            0 => {
                if let Some(f) = message.float_at(0) {
                    self.last_output = f.min(self.operand);
                    ctx.send(0, Message::float(message.timestamp(), self.last_output));
                } else if message.is_bang_at(0) {
                    ctx.send(0, Message::float(message.timestamp(), self.last_output));
                }
            }
            1 => {
                if let Some(f) = message.float_at(0) {
                    self.operand = f;
                }
            }
            _ => {}
        }
    }
}
