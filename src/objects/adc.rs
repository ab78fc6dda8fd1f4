//! `adc~` - read the context's input bus onto signal outlets.
//!
//! Init atoms pick the 1-based input channels (default `1 2`).

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

pub struct Adc {
    /// Zero-based input channel per signal outlet.
    channels: Vec<usize>,
}

impl Adc {
    pub fn new(init: &Message) -> Self {
        let mut channels: Vec<usize> = init
            .atoms()
            .iter()
            .filter_map(|a| a.as_float())
            .filter(|&f| f >= 1.0)
            .map(|f| f as usize - 1)
            .collect();
        if channels.is_empty() {
            channels = vec![0, 1];
        }
        Adc { channels }
    }
}

impl PatchObject for Adc {
    fn label(&self) -> &'static str {
        "adc~"
    }

    fn message_inlets(&self) -> usize {
        0
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        self.channels.len()
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
        for (slot, &channel) in self.channels.iter().enumerate() {
            if channel >= ctx.input_channels {
                outputs[slot][from..to].fill(0.0);
                continue;
            }
            let base = channel * ctx.block_size;
            outputs[slot][from..to].copy_from_slice(&ctx.input_bus[base + from..base + to]);
        }
    }
}
