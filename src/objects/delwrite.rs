//! `delwrite~` - write a signal into a named circular delay line.
//!
//! The init atoms give the line's name and its length in milliseconds. The
//! line itself lives in the routing fabric and is created when the graph
//! attaches; the first writer on a name sizes it.

use crate::message::{Message, Symbol};
use crate::object::{AttachCtx, MessageCtx, PatchObject, RoutingRole, SignalCtx};

const DEFAULT_LENGTH_MS: f32 = 1000.0;

pub struct DelWrite {
    name: Symbol,
    length_ms: f32,
}

impl DelWrite {
    pub fn new(init: &Message) -> Option<Self> {
        Some(DelWrite {
            name: init.symbol_at(0)?.clone(),
            length_ms: init.float_at(1).unwrap_or(DEFAULT_LENGTH_MS),
        })
    }
}

impl PatchObject for DelWrite {
    fn label(&self) -> &'static str {
        "delwrite~"
    }

    fn message_inlets(&self) -> usize {
        0
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn routing_role(&self) -> RoutingRole {
        RoutingRole::DelayWriter(self.name.clone())
    }

    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.declare_delay(self.name.clone(), self.length_ms);
    }

    fn on_detach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.remove_delay(&self.name);
    }

    fn process_message(&mut self, _inlet: usize, _message: &Message, _ctx: &mut MessageCtx<'_>) {}

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        _outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        if let Some(line) = ctx.routing.delay_mut(&self.name) {
            line.write_range(inputs[0], from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::SigBench;

    #[test]
    fn needs_a_name() {
        assert!(DelWrite::new(&Message::new(0.0)).is_none());
        assert!(DelWrite::new(&Message::from_str(0.0, "line 250").unwrap()).is_some());
    }

    #[test]
    fn writes_into_the_declared_line() {
        let mut bench = SigBench::new(4);
        let name = Symbol::new("line");
        bench.routing.declare_delay(name.clone(), 10.0, 44100.0, 4);

        let mut writer = DelWrite::new(&Message::from_str(0.0, "line 10").unwrap()).unwrap();
        let signal = vec![1.0, 2.0, 3.0, 4.0];
        {
            let mut ctx = bench.ctx();
            writer.process_block(&[&signal], &mut [], 0, 4, &mut ctx);
        }
        let mut read = vec![0.0; 4];
        bench.routing.delay(&name).unwrap().read_range(&mut read, 0, 4, 0.0);
        assert_eq!(read, signal);
    }
}
