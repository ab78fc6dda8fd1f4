//! Message-object semantics through the whole engine: host in, host out.

use std::sync::{Arc, Mutex};

use patchbay::callback::HostCallback;
use patchbay::context::{Config, Context};
use patchbay::message::{Message, Symbol};

#[derive(Clone, Default)]
struct Recorder {
    values: Arc<Mutex<Vec<f32>>>,
}

impl HostCallback for Recorder {
    fn receiver_message(&mut self, _receiver: &Symbol, message: &Message) {
        if let Some(f) = message.float_at(0) {
            self.values.lock().unwrap().push(f);
        }
    }
}

fn control_config() -> Config {
    Config::default()
        .with_input_channels(0)
        .with_output_channels(1)
}

/// Build `[receive in] -> [object] -> [send out]` and run the inputs
/// through it, returning what the host hears back.
fn run_through(object: &str, inputs: Vec<Message>) -> Vec<f32> {
    let recorder = Recorder::default();
    let values = recorder.values.clone();
    let mut context = Context::new(control_config(), Box::new(recorder)).unwrap();
    let patch = context.new_graph();
    let receive = context.create(patch, "receive in").unwrap();
    let middle = context.create(patch, object).unwrap();
    let send = context.create(patch, "send out").unwrap();
    context.connect(patch, receive, 0, middle, 0).unwrap();
    context.connect(patch, middle, 0, send, 0).unwrap();
    context.register_receiver("out");
    context.attach_graph(patch).unwrap();

    for message in inputs {
        context.send_to_receiver("in", message);
    }
    let mut output = vec![0.0; 64];
    context.process(&[], &mut output).unwrap();

    let values = values.lock().unwrap().clone();
    values
}

#[test]
fn wrap_folds_into_its_range() {
    let outputs = run_through(
        "wrap 0 10",
        [3.0, 13.0, -7.0, 27.0]
            .iter()
            .map(|&f| Message::float(0.0, f))
            .collect(),
    );
    assert_eq!(outputs, vec![3.0, 3.0, 3.0, 7.0]);
}

#[test]
fn max_clamps_and_repeats_on_bang() {
    let outputs = run_through(
        "max 5",
        vec![
            Message::float(0.0, 2.0),
            Message::float(0.0, 7.0),
            Message::bang(0.0),
            Message::float(0.0, 3.0),
            Message::bang(0.0),
        ],
    );
    assert_eq!(outputs, vec![5.0, 7.0, 7.0, 5.0, 5.0]);
}

#[test]
fn counter_chain_counts() {
    let outputs = run_through(
        "counter",
        std::iter::repeat_with(|| Message::bang(0.0)).take(5).collect(),
    );
    assert_eq!(outputs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn change_deduplicates_a_stream() {
    let outputs = run_through(
        "change",
        [5.0, 5.0, 6.0, 6.0, 5.0]
            .iter()
            .map(|&f| Message::float(0.0, f))
            .collect(),
    );
    assert_eq!(outputs, vec![5.0, 6.0, 5.0]);
}

#[test]
fn depth_first_fanout_preserves_sibling_order() {
    // [receive in] fans out to two [send out] objects; the first-connected
    // branch completes before the second starts.
    #[derive(Clone, Default)]
    struct Tagged {
        log: Arc<Mutex<Vec<String>>>,
    }
    impl HostCallback for Tagged {
        fn receiver_message(&mut self, receiver: &Symbol, _message: &Message) {
            self.log.lock().unwrap().push(receiver.to_string());
        }
    }

    let tagged = Tagged::default();
    let log = tagged.log.clone();
    let mut context = Context::new(control_config(), Box::new(tagged)).unwrap();
    let patch = context.new_graph();
    let receive = context.create(patch, "receive in").unwrap();
    let send_b = context.create(patch, "send b").unwrap();
    let send_a = context.create(patch, "send a").unwrap();
    // Wire b first: it must fire first regardless of creation order.
    context.connect(patch, receive, 0, send_b, 0).unwrap();
    context.connect(patch, receive, 0, send_a, 0).unwrap();
    context.register_receiver("a");
    context.register_receiver("b");
    context.attach_graph(patch).unwrap();

    context.send_to_receiver("in", Message::bang(0.0));
    let mut output = vec![0.0; 64];
    context.process(&[], &mut output).unwrap();

    assert_eq!(log.lock().unwrap().as_slice(), &["b".to_string(), "a".to_string()]);
}

#[test]
fn poly_routes_voices_through_the_graph() {
    // [receive in] -> [poly 2 1], voice outlet into [send out].
    let recorder = Recorder::default();
    let values = recorder.values.clone();
    let mut context = Context::new(control_config(), Box::new(recorder)).unwrap();
    let patch = context.new_graph();
    let receive = context.create(patch, "receive in").unwrap();
    let poly = context.create(patch, "poly 2 1").unwrap();
    let send = context.create(patch, "send out").unwrap();
    context.connect(patch, receive, 0, poly, 0).unwrap();
    context.connect(patch, poly, 0, send, 0).unwrap();
    context.register_receiver("out");
    context.attach_graph(patch).unwrap();

    for (pitch, velocity) in [(60.0, 100.0), (64.0, 100.0), (67.0, 100.0)] {
        context.send_to_receiver(
            "in",
            Message::new(0.0)
                .with_atom(patchbay::Atom::Float(pitch))
                .with_atom(patchbay::Atom::Float(velocity)),
        );
    }
    let mut output = vec![0.0; 64];
    context.process(&[], &mut output).unwrap();

    // Voices 1 and 2, then the steal releases and retakes voice 1.
    assert_eq!(*values.lock().unwrap(), vec![1.0, 2.0, 1.0, 1.0]);
}
