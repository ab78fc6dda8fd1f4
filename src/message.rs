//! Messages: timestamped, ordered sequences of typed atoms.
//!
//! A message is immutable once sent. Equality is structural, so two messages
//! with the same timestamp and the same atom sequence compare equal no matter
//! where they were built.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A routing/table/atom name. Cheap to clone and to compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single typed value carried inside a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(Symbol),
    Bang,
}

impl Atom {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Atom::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(v) => write!(f, "{}", v),
            Atom::Symbol(s) => f.write_str(s.as_str()),
            Atom::Bang => f.write_str("bang"),
        }
    }
}

/// A timestamped list of atoms.
///
/// Build one with the chaining constructors and send it into a context or an
/// object inlet:
///
/// ```
/// use patchbay::message::{Atom, Message};
///
/// let msg = Message::new(12.5)
///     .with_atom(Atom::Float(1.2))
///     .with_atom(Atom::Symbol("foo".into()));
/// assert_eq!(msg.len(), 2);
/// assert_eq!(msg.to_string(), "1.2 foo");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    timestamp: f64,
    atoms: Vec<Atom>,
}

impl Message {
    /// An empty message at `timestamp` milliseconds.
    pub fn new(timestamp: f64) -> Self {
        Message {
            timestamp,
            atoms: Vec::new(),
        }
    }

    /// A single-bang message.
    pub fn bang(timestamp: f64) -> Self {
        Message::new(timestamp).with_atom(Atom::Bang)
    }

    /// A single-float message.
    pub fn float(timestamp: f64, value: f32) -> Self {
        Message::new(timestamp).with_atom(Atom::Float(value))
    }

    /// A single-symbol message.
    pub fn symbol(timestamp: f64, name: &str) -> Self {
        Message::new(timestamp).with_atom(Atom::Symbol(name.into()))
    }

    /// Append an atom.
    pub fn with_atom(mut self, atom: Atom) -> Self {
        self.atoms.push(atom);
        self
    }

    /// Parse a message from whitespace-separated text, e.g. `"1.0 foo bang"`.
    ///
    /// Tokens that parse as numbers become floats, the literal `bang` becomes
    /// a bang, everything else a symbol.
    pub fn from_str(timestamp: f64, text: &str) -> Result<Self, ParseError> {
        let mut msg = Message::new(timestamp);
        for token in text.split_whitespace() {
            let atom = if let Ok(f) = token.parse::<f32>() {
                Atom::Float(f)
            } else if token == "bang" {
                Atom::Bang
            } else {
                Atom::Symbol(token.into())
            };
            msg.atoms.push(atom);
        }
        if msg.atoms.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(msg)
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// The same atoms stamped with a different delivery time.
    pub fn retimed(&self, timestamp: f64) -> Self {
        Message {
            timestamp,
            atoms: self.atoms.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// The float at `index`, if that atom is a float.
    pub fn float_at(&self, index: usize) -> Option<f32> {
        self.atoms.get(index).and_then(Atom::as_float)
    }

    pub fn symbol_at(&self, index: usize) -> Option<&Symbol> {
        self.atoms.get(index).and_then(Atom::as_symbol)
    }

    pub fn is_bang_at(&self, index: usize) -> bool {
        matches!(self.atoms.get(index), Some(Atom::Bang))
    }

    /// True when the atom at `index` is the given symbol text.
    pub fn is_symbol_at(&self, index: usize, name: &str) -> bool {
        self.symbol_at(index).map(Symbol::as_str) == Some(name)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, atom) in self.atoms.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", atom)?;
        }
        Ok(())
    }
}

/// Message parse errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text contained no atoms.
    #[error("cannot parse an empty message")]
    Empty,
}
