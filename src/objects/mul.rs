//! `*~` - multiply two signals, or a signal and a scalar operand.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct Mul {
    operand: f32,
    signal_right: bool,
}

impl Mul {
    pub fn new(init: &Message) -> Self {
        Mul {
            operand: init.float_at(0).unwrap_or(0.0),
            signal_right: false,
        }
    }
}

impl PatchObject for Mul {
    fn label(&self) -> &'static str {
        "*~"
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
                output[i] = left[i] * right[i];
            }
        } else {
            let left = inputs[0];
            for i in from..to {
                output[i] = left[i] * self.operand;
            }
        }
    }
}
