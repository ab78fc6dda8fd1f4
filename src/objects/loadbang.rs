//! `loadbang` - emit a bang when the owning graph attaches to its context.

use crate::message::Message;
use crate::object::{AttachCtx, MessageCtx, PatchObject};

pub struct Loadbang;

impl Loadbang {
    pub fn new() -> Self {
        Loadbang
    }
}

impl Default for Loadbang {
    fn default() -> Self {
        Loadbang::new()
    }
}

impl PatchObject for Loadbang {
    fn label(&self) -> &'static str {
        "loadbang"
    }

    fn message_inlets(&self) -> usize {
        0
    }

    fn message_outlets(&self) -> usize {
        1
    }

    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        let now = ctx.now();
        ctx.schedule_to_self(0, Message::bang(now));
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        ctx.send(0, Message::bang(message.timestamp()));
    }
}
