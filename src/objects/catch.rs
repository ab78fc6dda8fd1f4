//! `catch~` - read the sum of all matching `throw~` busses.
//!
//! Ordered after its throws by the graph; with no throw on the name it
//! outputs silence, which is not an error.

use crate::message::{Message, Symbol};
use crate::object::{MessageCtx, PatchObject, RoutingRole, SignalCtx};

pub struct Catch {
    name: Symbol,
}

impl Catch {
    pub fn new(init: &Message) -> Option<Self> {
        Some(Catch {
            name: init.symbol_at(0)?.clone(),
        })
    }
}

impl PatchObject for Catch {
    fn label(&self) -> &'static str {
        "catch~"
    }

    fn message_inlets(&self) -> usize {
        0
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn routing_role(&self) -> RoutingRole {
        RoutingRole::Catch(self.name.clone())
    }

    fn process_message(&mut self, _inlet: usize, _message: &Message, _ctx: &mut MessageCtx<'_>) {}

    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        match ctx.routing.throw_read(&self.name) {
            Some(bus) => outputs[0][from..to].copy_from_slice(&bus[from..to]),
            None => outputs[0][from..to].fill(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::SigBench;

    #[test]
    fn reads_the_summed_bus() {
        let mut bench = SigBench::new(4);
        let name = Symbol::new("bus");
        bench.routing.declare_throw(name.clone(), 4);
        bench.routing.throw_add(&name, &[1.0, 2.0, 3.0, 4.0], 0, 4);

        let mut catch = Catch::new(&Message::symbol(0.0, "bus")).unwrap();
        let mut outputs = vec![vec![0.0; 4]];
        {
            let mut ctx = bench.ctx();
            catch.process_block(&[], &mut outputs, 0, 4, &mut ctx);
        }
        assert_eq!(outputs[0], vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn unmatched_name_is_silent() {
        let mut bench = SigBench::new(4);
        let mut catch = Catch::new(&Message::symbol(0.0, "nothing")).unwrap();
        let mut outputs = vec![vec![9.0; 4]];
        {
            let mut ctx = bench.ctx();
            catch.process_block(&[], &mut outputs, 0, 4, &mut ctx);
        }
        assert_eq!(outputs[0], vec![0.0; 4]);
    }
}
