//! `receive` - the listening end of the send/receive namespace.
//!
//! Registers its name when the graph attaches; matching sends are delivered
//! straight to its hot inlet and pass through the single outlet.

use crate::message::{Message, Symbol};
use crate::object::{AttachCtx, MessageCtx, PatchObject};

pub struct Receive {
    name: Symbol,
}

impl Receive {
    pub fn new(init: &Message) -> Option<Self> {
        Some(Receive {
            name: init.symbol_at(0)?.clone(),
        })
    }
}

impl PatchObject for Receive {
    fn label(&self) -> &'static str {
        "receive"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn should_distribute(&self) -> bool {
        false
    }

    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.register_receive(self.name.clone());
    }

    fn on_detach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.unregister_receive(&self.name);
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        ctx.send(0, message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::Bench;

    #[test]
    fn needs_a_name() {
        assert!(Receive::new(&Message::new(0.0)).is_none());
        assert!(Receive::new(&Message::symbol(0.0, "x")).is_some());
    }

    #[test]
    fn passes_messages_through() {
        let mut bench = Bench::new();
        let mut receive = Receive::new(&Message::symbol(0.0, "x")).unwrap();
        let out = bench.deliver(&mut receive, 0, Message::from_str(3.0, "a 1").unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 0);
        assert!(out[0].1.is_symbol_at(0, "a"));
    }
}
