//! `unpack` - spread the atoms of a list across outlets, right to left.
//!
//! The init atoms are a template: a float or `f` accepts floats, `s`
//! accepts symbols. Two floats is the default template. Atoms that do not
//! match their slot are skipped with no output on that outlet.

use crate::message::{Atom, Message};
use crate::object::{MessageCtx, PatchObject};

#[derive(Clone, Copy, PartialEq)]
enum Slot {
    Float,
    Symbol,
}

pub struct Unpack {
    template: Vec<Slot>,
}

impl Unpack {
    pub fn new(init: &Message) -> Self {
        let mut template: Vec<Slot> = init
            .atoms()
            .iter()
            .map(|atom| match atom {
                Atom::Symbol(s) if s.as_str() == "s" => Slot::Symbol,
                _ => Slot::Float,
            })
            .collect();
        if template.is_empty() {
            template = vec![Slot::Float, Slot::Float];
        }
        Unpack { template }
    }
}

impl PatchObject for Unpack {
    fn label(&self) -> &'static str {
        "unpack"
    }

    fn message_inlets(&self) -> usize {
        1
    }

    fn message_outlets(&self) -> usize {
        self.template.len()
    }

    fn should_distribute(&self) -> bool {
        false
    }

    fn process_message(&mut self, _inlet: usize, message: &Message, ctx: &mut MessageCtx<'_>) {
        let count = self.template.len().min(message.len());
        for i in (0..count).rev() {
            let atom = message.atom(i).unwrap();
            let matches = match (self.template[i], atom) {
                (Slot::Float, Atom::Float(_)) => true,
                (Slot::Symbol, Atom::Symbol(_)) => true,
                _ => false,
            };
            if matches {
                ctx.send(
                    i,
                    Message::new(message.timestamp()).with_atom(atom.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::Bench;

    #[test]
    fn default_template_splits_two_floats() {
        let mut bench = Bench::new();
        let mut unpack = Unpack::new(&Message::new(0.0));
        let out = bench.deliver(&mut unpack, 0, Message::from_str(0.0, "1 2").unwrap());

        // Right-to-left emission order.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, 1);
        assert_eq!(out[0].1.float_at(0), Some(2.0));
        assert_eq!(out[1].0, 0);
        assert_eq!(out[1].1.float_at(0), Some(1.0));
    }

    #[test]
    fn mixed_template_checks_types() {
        let mut bench = Bench::new();
        let mut unpack = Unpack::new(&Message::from_str(0.0, "f s").unwrap());
        let out = bench.deliver(&mut unpack, 0, Message::from_str(0.0, "3.5 hello").unwrap());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, 1);
        assert!(out[0].1.is_symbol_at(0, "hello"));
        assert_eq!(out[1].1.float_at(0), Some(3.5));
    }

    #[test]
    fn mismatched_atoms_are_skipped() {
        let mut bench = Bench::new();
        let mut unpack = Unpack::new(&Message::from_str(0.0, "f f").unwrap());
        let out = bench.deliver(&mut unpack, 0, Message::from_str(0.0, "oops 2").unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 1);
        assert_eq!(out[0].1.float_at(0), Some(2.0));
    }

    #[test]
    fn extra_atoms_are_ignored() {
        let mut bench = Bench::new();
        let mut unpack = Unpack::new(&Message::from_str(0.0, "f").unwrap());
        let out = bench.deliver(&mut unpack, 0, Message::from_str(0.0, "1 2 3").unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.float_at(0), Some(1.0));
    }
}
