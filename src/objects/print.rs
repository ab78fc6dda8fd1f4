//! `print` - log incoming messages through the host callback.

use crate::message::Message;
use crate::object::{MessageCtx, PatchObject};

pub struct Print {
    name: String,
}

impl Print {
    pub fn new(init: &Message) -> Self {
        let name = init
            .symbol_at(0)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "print".to_string());
        Print { name }
    }
}

impl PatchObject for Print {
    fn label(&self) -> &'static str {
        "print"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        0
    }

    fn should_distribute(&self) -> bool {
        false
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        ctx.post(&format!("{}: {}", self.name, message));
    }
}
