//! `mod` - integer remainder of the input and the stored operand.
//!
//! Values truncate toward zero before the operation, C-style; a zero
//! operand yields zero instead of trapping.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Modulus {
    operand: f32,
    last_output: f32,
}

impl Modulus {
    pub fn new(init: &Message) -> Self {
        Modulus {
            operand: init.float_at(0).unwrap_or(0.0),
            last_output: 0.0,
        }
    }
}

impl PatchObject for Modulus {
    fn label(&self) -> &'static str {
        "mod"
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
                    let divisor = self.operand as i64;
                    self.last_output = if divisor == 0 {
                        0.0
                    } else {
                        ((f as i64) % divisor) as f32
                    };
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
