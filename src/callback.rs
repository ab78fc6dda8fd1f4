//! The narrow outward channel from the engine to its host.
//!
//! Everything the runtime wants to tell the embedding application goes
//! through one [`HostCallback`] implementation: log lines, the DSP on/off
//! advisory, messages landing on host-registered receivers, and unresolved
//! name notices. Callbacks are invoked synchronously from the audio thread
//! and must not block.

use std::collections::HashSet;

use crate::message::{Message, Symbol};

/// Host-side handler for engine events. All methods default to no-ops.
pub trait HostCallback: Send {
    /// Informational log line (the `print` objects land here).
    fn print_std(&mut self, _message: &str) {}

    /// Error log line.
    fn print_err(&mut self, _message: &str) {}

    /// Advisory to start or stop signal processing.
    fn switch_dsp(&mut self, _enable: bool) {}

    /// A `send` landed on a receiver name the host registered.
    fn receiver_message(&mut self, _receiver: &Symbol, _message: &Message) {}

    /// An object or abstraction name could not be resolved. The host may
    /// return a path that supplies the definition.
    fn cannot_find_object(&mut self, _name: &str) -> Option<String> {
        None
    }
}

/// A callback that ignores everything.
#[derive(Debug, Default)]
pub struct NullCallback;

impl HostCallback for NullCallback {}

/// Engine-side owner of the callback and the set of host-registered
/// receiver names.
pub struct HostHandle {
    callback: Box<dyn HostCallback>,
    receivers: HashSet<Symbol>,
}

impl HostHandle {
    pub(crate) fn new(callback: Box<dyn HostCallback>) -> Self {
        HostHandle {
            callback,
            receivers: HashSet::new(),
        }
    }

    pub(crate) fn register_receiver(&mut self, name: Symbol) {
        self.receivers.insert(name);
    }

    pub(crate) fn unregister_receiver(&mut self, name: &Symbol) {
        self.receivers.remove(name);
    }

    pub(crate) fn is_registered(&self, name: &Symbol) -> bool {
        self.receivers.contains(name)
    }

    pub fn print_std(&mut self, message: &str) {
        self.callback.print_std(message);
    }

    pub fn print_err(&mut self, message: &str) {
        self.callback.print_err(message);
    }

    pub fn switch_dsp(&mut self, enable: bool) {
        self.callback.switch_dsp(enable);
    }

    pub fn receiver_message(&mut self, receiver: &Symbol, message: &Message) {
        self.callback.receiver_message(receiver, message);
    }

    pub fn cannot_find_object(&mut self, name: &str) -> Option<String> {
        self.callback.cannot_find_object(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl HostCallback for Recorder {
        fn print_std(&mut self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn handle_forwards_prints() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut handle = HostHandle::new(Box::new(Recorder {
            lines: lines.clone(),
        }));
        handle.print_std("hello");
        assert_eq!(lines.lock().unwrap().as_slice(), &["hello".to_string()]);
    }

    #[test]
    fn receiver_registration() {
        let mut handle = HostHandle::new(Box::new(NullCallback));
        let name = Symbol::new("meter");
        assert!(!handle.is_registered(&name));
        handle.register_receiver(name.clone());
        assert!(handle.is_registered(&name));
        handle.unregister_receiver(&name);
        assert!(!handle.is_registered(&name));
    }
}
