//! `wrap` - fold floats into a `[lower, upper)` range by repeatedly adding
//! or subtracting the range width.
//!
//! With no init atoms the range is `[0, 1)`; one atom sets the upper bound;
//! two set both, swapped if reversed. The right inlet replaces the range the
//! same way.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Wrap {
    lower: f32,
    upper: f32,
}

impl Wrap {
    pub fn new(init: &Message) -> Self {
        let (lower, upper) = match init.len() {
            0 => (0.0, 1.0),
            1 => (0.0, init.float_at(0).unwrap_or(1.0)),
            _ => ordered(
                init.float_at(0).unwrap_or(0.0),
                init.float_at(1).unwrap_or(1.0),
            ),
        };
        Wrap { lower, upper }
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

impl PatchObject for Wrap {
    fn label(&self) -> &'static str {
        "wrap"
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
                    let range = self.upper - self.lower;
                    let mut value = f;
                    if range > 0.0 {
                        while value >= self.upper {
                            value -= range;
                        }
                        while value < self.lower {
                            value += range;
                        }
                    } else {
                        value = self.lower;
                    }
                    ctx.send(0, Message::float(message.timestamp(), value));
                }
            }
            1 => {
                if let Some(f) = message.float_at(0) {
                    let (lower, upper) = if let Some(g) = message.float_at(1) {
                        ordered(f, g)
                    } else {
                        ordered(f, 0.0)
                    };
                    self.lower = lower;
                    self.upper = upper;
                }
            }
            _ => {}
        }
    }
}
