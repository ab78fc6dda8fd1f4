//! `sig~` - turn floats into a constant signal.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct Sig {
    value: f32,
}

impl Sig {
    pub fn new(init: &Message) -> Self {
        Sig {
            value: init.float_at(0).unwrap_or(0.0),
        }
    }
}

impl PatchObject for Sig {
    fn label(&self) -> &'static str {
        "sig~"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        if let Some(f) = message.float_at(0) {
            self.value = f;
        }
    }

    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        _ctx: &mut SignalCtx<'_>,
    ) {
        outputs[0][from..to].fill(self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::{Bench, SigBench};

    #[test]
    fn fills_with_the_value() {
        let mut bench = SigBench::new(16);
        let mut ctx = bench.ctx();
        let mut sig = Sig::new(&Message::float(0.0, 2.5));
        let mut outputs = vec![vec![0.0; 16]];
        sig.process_block(&[], &mut outputs, 0, 16, &mut ctx);
        assert_eq!(outputs[0], vec![2.5; 16]);
    }

    #[test]
    fn float_updates_mid_block_ranges() {
        let mut bench = SigBench::new(8);
        let mut message_bench = Bench::new();
        let mut sig = Sig::new(&Message::new(0.0));

        let mut outputs = vec![vec![0.0; 8]];
        {
            let mut ctx = bench.ctx();
            sig.process_block(&[], &mut outputs, 0, 4, &mut ctx);
        }
        message_bench.deliver(&mut sig, 0, Message::float(0.0, 1.0));
        {
            let mut ctx = bench.ctx();
            sig.process_block(&[], &mut outputs, 4, 8, &mut ctx);
        }
        assert_eq!(outputs[0], vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }
}
