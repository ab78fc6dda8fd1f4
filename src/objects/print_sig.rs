//! `print~` - log the head of the next processed block on bang.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject, SignalCtx};

const SAMPLES_SHOWN: usize = 8;

pub struct PrintSig {
    name: String,
    pending: bool,
}

impl PrintSig {
    pub fn new(init: &Message) -> Self {
        let name = init
            .symbol_at(0)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "print~".to_string());
        PrintSig {
            name,
            pending: false,
        }
    }
}

impl PatchObject for PrintSig {
    fn label(&self) -> &'static str {
        "print~"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, _ctx: &mut MessageCtx<'_>) {
        if message.is_bang_at(0) {
            self.pending = true;
        }
    }

    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        _outputs: &mut [Vec<f32>],
        from: usize,
        to: usize,
        ctx: &mut SignalCtx<'_>,
    ) {
        if !self.pending || from != 0 {
            return;
        }
        self.pending = false;
        let shown = SAMPLES_SHOWN.min(to);
        let samples: Vec<String> = inputs[0][..shown]
            .iter()
            .map(|s| format!("{:.4}", s))
            .collect();
        ctx.hooks
            .print_std(&format!("{}: {}", self.name, samples.join(" ")));
    }
}
