//! `osc~` - cosine oscillator reading the context's shared lookup table.
//!
//! With nothing wired into the left inlet the frequency is a scalar (init
//! atom or the last float received) and the per-sample increment is hoisted
//! out of the loop; a signal connection switches to per-sample frequency.
//! The right inlet sets the phase, normalized to one cycle.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct Osc {
    frequency: f32,
    /// Normalized phase in `[0, 1)`.
    phase: f32,
    signal_input: bool,
}

impl Osc {
    pub fn new(init: &Message) -> Self {
        Osc {
            frequency: init.float_at(0).map(f32::abs).unwrap_or(440.0),
            phase: 0.0,
            signal_input: false,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl PatchObject for Osc {
    fn label(&self) -> &'static str {
        "osc~"
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
        if inlet == 0 {
            self.signal_input = connected;
        }
    }

    fn process_message(&mut self, inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        match inlet {
            0 => {
                if let Some(f) = message.float_at(0) {
                    self.frequency = f.abs();
                }
            }
            1 => {
                if let Some(f) = message.float_at(0) {
                    self.phase = f.rem_euclid(1.0);
                }
            }
            _ => {}
        }
    }

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        let span = ctx.cosine.span();
        let mut phase = self.phase;
        let output = &mut outputs[0];

        if self.signal_input {
            let input = inputs[0];
            for i in from..to {
                output[i] = ctx.cosine.lookup(phase * span);
                phase += input[i] / ctx.sample_rate;
                phase -= phase.floor();
            }
        } else {
            let step = self.frequency / ctx.sample_rate;
            for i in from..to {
                output[i] = ctx.cosine.lookup(phase * span);
                phase += step;
                if phase >= 1.0 {
                    phase -= 1.0;
                }
            }
        }

        if !phase.is_finite() {
            phase = 0.0;
        }
        self.phase = phase;
    }
}
