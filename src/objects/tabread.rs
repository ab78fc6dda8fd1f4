//! `tabread~` - index a named table with a signal, linear-interpolated.
//!
//! The inlet signal is the sample index; out-of-range indices clamp to the
//! table edges. A missing table outputs silence and raises a one-time
//! notice.

use crate::message::{Message, Symbol};
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct TabRead {
    name: Symbol,
}

impl TabRead {
    pub fn new(init: &Message) -> Option<Self> {
        Some(TabRead {
            name: init.symbol_at(0)?.clone(),
        })
    }
}

impl PatchObject for TabRead {
    fn label(&self) -> &'static str {
        "tabread~"
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

    fn signal_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, _message: &Message, _ctx: &mut MessageCtx<'_>) {}

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        let resolved = ctx.routing.table(&self.name).is_some();
        if !resolved {
            outputs[0][from..to].fill(0.0);
            if ctx.routing.report_missing_once(&self.name) {
                ctx.hooks.cannot_find_object(self.name.as_str());
                ctx.hooks
                    .print_err(&format!("tabread~: no table named {}", self.name));
            }
            return;
        }
        if let Some(table) = ctx.routing.table(&self.name) {
            let index = inputs[0];
            let output = &mut outputs[0];
            for i in from..to {
                output[i] = table.read_interpolated(index[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::SigBench;

    #[test]
    fn indexes_with_interpolation() {
        let mut bench = SigBench::new(4);
        bench.routing.add_table(Symbol::new("t"), 4);
        bench
            .routing
            .table_mut(&Symbol::new("t"))
            .unwrap()
            .set_buffer(&[0.0, 10.0, 20.0, 30.0]);

        let mut reader = TabRead::new(&Message::symbol(0.0, "t")).unwrap();
        let index = vec![0.0, 1.5, 3.0, 99.0];
        let mut outputs = vec![vec![0.0; 4]];
        {
            let mut ctx = bench.ctx();
            reader.process_block(&[&index], &mut outputs, 0, 4, &mut ctx);
        }
        assert_eq!(outputs[0], vec![0.0, 15.0, 30.0, 30.0]);
    }

    #[test]
    fn missing_table_is_silent() {
        let mut bench = SigBench::new(4);
        let mut reader = TabRead::new(&Message::symbol(0.0, "ghost")).unwrap();
        let index = vec![0.0; 4];
        let mut outputs = vec![vec![7.0; 4]];
        {
            let mut ctx = bench.ctx();
            reader.process_block(&[&index], &mut outputs, 0, 4, &mut ctx);
        }
        assert_eq!(outputs[0], vec![0.0; 4]);
    }
}
