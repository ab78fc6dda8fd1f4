//! `samphold~` - sample the left signal whenever the right control signal
//! strictly decreases, and hold it otherwise.
//!
//! Driving the control with a phasor samples once per cycle, at the wrap.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct SampHold {
    last_control: f32,
    sample: f32,
}

impl SampHold {
    pub fn new() -> Self {
        SampHold {
            last_control: 0.0,
            sample: 0.0,
        }
    }
}

impl Default for SampHold {
    fn default() -> Self {
        SampHold::new()
    }
}

impl PatchObject for SampHold {
    fn label(&self) -> &'static str {
        "samphold~"
    }

    fn message_inlets(&self) -> usize {
        0
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

    fn process_message(&mut self, _inlet: usize, _message: &Message, _ctx: &mut MessageCtx<'_>) {}

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        _ctx: &mut SignalCtx<'_>,
    ) {
        let (input, control) = (inputs[0], inputs[1]);
        let output = &mut outputs[0];
        for i in from..to {
            if self.last_control > control[i] {
                self.sample = input[i];
            }
            self.last_control = control[i];
            output[i] = self.sample;
        }
    }
}
