//! `bang` - collapse any incoming message to a bang.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Bang;

impl Bang {
    pub fn new() -> Self {
        Bang
    }
}

impl Default for Bang {
    fn default() -> Self {
        Bang::new()
    }
}

impl PatchObject for Bang {
    fn label(&self) -> &'static str {
        "bang"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        ctx.send(0, Message::bang(message.timestamp()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Atom;
    use crate::object::test_support::Bench;

    #[test]
    fn anything_becomes_a_bang() {
        let mut bench = Bench::new();
        let mut bang = Bang::new();

        for message in [
            Message::bang(1.0),
            Message::float(2.0, 3.5),
            Message::symbol(3.0, "go"),
        ] {
            let timestamp = message.timestamp();
            let out = bench.deliver(&mut bang, 0, message);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].1.atom(0), Some(&Atom::Bang));
            assert_eq!(out[0].1.timestamp(), timestamp);
        }
    }
}
