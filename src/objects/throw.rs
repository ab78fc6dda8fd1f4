//! `throw~` - add a signal into a named summing bus.
//!
//! Every `throw~` on a name contributes; the matching `catch~` reads the
//! sum. A throw with no catch simply goes nowhere.

use crate::message::{Message, Symbol};
use crate::object::{AttachCtx, MessageCtx, PatchObject, RoutingRole, SignalCtx};

pub struct Throw {
    name: Symbol,
}

impl Throw {
    pub fn new(init: &Message) -> Option<Self> {
        Some(Throw {
            name: init.symbol_at(0)?.clone(),
        })
    }
}

impl PatchObject for Throw {
    fn label(&self) -> &'static str {
        "throw~"
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
        RoutingRole::Throw(self.name.clone())
    }

    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.declare_throw(self.name.clone());
    }

    fn on_detach(&mut self, ctx: &mut AttachCtx<'_>) {
        ctx.retract_throw(&self.name);
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
        ctx.routing.throw_add(&self.name, inputs[0], from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::SigBench;

    #[test]
    fn contributes_to_the_bus() {
        let mut bench = SigBench::new(4);
        let name = Symbol::new("bus");
        bench.routing.declare_throw(name.clone(), 4);

        let mut throw = Throw::new(&Message::symbol(0.0, "bus")).unwrap();
        let signal = vec![0.25; 4];
        {
            let mut ctx = bench.ctx();
            throw.process_block(&[&signal], &mut [], 0, 4, &mut ctx);
            throw.process_block(&[&signal], &mut [], 0, 4, &mut ctx);
        }
        assert_eq!(bench.routing.throw_read(&name).unwrap(), &[0.5; 4]);
    }

    #[test]
    fn role_names_the_bus() {
        let throw = Throw::new(&Message::symbol(0.0, "bus")).unwrap();
        assert_eq!(throw.routing_role(), RoutingRole::Throw(Symbol::new("bus")));
        assert!(throw.is_leaf());
    }
}
