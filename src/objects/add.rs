//! `+~` - add two signals, or a signal and a scalar operand.
//!
//! With nothing wired into the right inlet the object runs its scalar fast
//! path against the stored operand (init atom or last float on the right
//! inlet).

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct Add {
    operand: f32,
    signal_right: bool,
}

impl Add {
    pub fn new(init: &Message) -> Self {
        Add {
            operand: init.float_at(0).unwrap_or(0.0),
            signal_right: false,
        }
    }
}

impl PatchObject for Add {
    fn label(&self) -> &'static str {
        "+~"
    }

    fn message_inlets(&self) -> usize {
        2
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        2
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn on_inlet_connection_update(&mut self, inlet: usize, connected: bool) {
        if inlet == 1 {
            self.signal_right = connected;
        }
    }

    fn process_message(&mut self, inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        if inlet == 1 {
            if let Some(f) = message.float_at(0) {
                self.operand = f;
            }
        }
    }

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        _ctx: &mut SignalCtx<'_>,
    ) {
        let output = &mut outputs[0];
        if self.signal_right {
            let (left, right) = (inputs[0], inputs[1]);
            for i in from..to {
                output[i] = left[i] + right[i];
            }
        } else {
            let left = inputs[0];
            for i in from..to {
                output[i] = left[i] + self.operand;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::{Bench, SigBench};

    #[test]
    fn scalar_path_uses_the_operand() {
        let mut bench = SigBench::new(4);
        let mut ctx = bench.ctx();
        let mut add = Add::new(&Message::float(0.0, 10.0));
        let left = vec![1.0, 2.0, 3.0, 4.0];
        let mut outputs = vec![vec![0.0; 4]];
        add.process_block(&[&left, &[]], &mut outputs, 0, 4, &mut ctx);
        assert_eq!(outputs[0], vec![11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn signal_path_adds_per_sample() {
        let mut bench = SigBench::new(4);
        let mut ctx = bench.ctx();
        let mut add = Add::new(&Message::new(0.0));
        add.on_inlet_connection_update(1, true);
        let left = vec![1.0; 4];
        let right = vec![0.5, 1.5, 2.5, 3.5];
        let mut outputs = vec![vec![0.0; 4]];
        add.process_block(&[&left, &right], &mut outputs, 0, 4, &mut ctx);
        assert_eq!(outputs[0], vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn float_on_the_right_inlet_retunes_the_scalar() {
        let mut bench = Bench::new();
        let mut add = Add::new(&Message::new(0.0));
        bench.deliver(&mut add, 1, Message::float(0.0, 7.0));
        assert_eq!(add.operand, 7.0);
    }
}
