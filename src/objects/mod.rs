//! The built-in object library and its label factory.
//!
//! One object per file, grouped by domain:
//!
//! # Message domain
//! - [`bang::Bang`] - collapse any message to a bang
//! - [`toggle::Toggle`] - on/off switch
//! - [`loadbang::Loadbang`] - bang when the graph attaches
//! - [`metro::Metro`] - periodic bangs with a millisecond interval
//! - [`counter::Counter`] - count bangs
//! - [`change::Change`] - pass floats only when they differ
//! - [`wrap::Wrap`] - fold floats into a range
//! - [`maximum::Maximum`] / [`minimum::Minimum`] - binary max/min
//! - [`modulus::Modulus`] - integer remainder
//! - [`greater_than::GreaterThan`] - comparison, 1 or 0
//! - [`unpack::Unpack`] - spread a list across outlets
//! - [`poly::Poly`] - polyphonic voice allocator
//! - [`print::Print`] - log messages through the host callback
//! - [`send::Send`] / [`receive::Receive`] - named message routing
//!
//! # Signal domain
//! - [`osc::Osc`] - cosine oscillator over the shared lookup table
//! - [`sig::Sig`] - constant signal set by message
//! - [`add::Add`] / [`mul::Mul`] - signal arithmetic with scalar fallback
//! - [`dac::Dac`] / [`adc::Adc`] - audio bus sinks and sources
//! - [`throw::Throw`] / [`catch::Catch`] - named summing signal busses
//! - [`delwrite::DelWrite`] / [`delread::DelRead`] - named delay lines
//! - [`samphold::SampHold`] - sample on falling control
//! - [`tabwrite::TabWrite`] / [`tabread::TabRead`] - named table access
//! - [`print_sig::PrintSig`] - log a block of samples on bang
//! - [`table_obj::TableObject`] - declare a named table
//!
//! The [`create`] factory maps a textual label plus init atoms to a boxed
//! object, the way patches instantiate them.

pub mod adc;
pub mod add;
pub mod bang;
pub mod catch;
pub mod change;
pub mod counter;
pub mod dac;
pub mod delread;
pub mod delwrite;
pub mod greater_than;
pub mod loadbang;
pub mod maximum;
pub mod metro;
pub mod minimum;
pub mod modulus;
pub mod mul;
pub mod osc;
pub mod poly;
pub mod print;
pub mod print_sig;
pub mod receive;
pub mod samphold;
pub mod send;
pub mod sig;
pub mod table_obj;
pub mod tabread;
pub mod tabwrite;
pub mod throw;
pub mod toggle;
pub mod unpack;
pub mod wrap;

use crate::message::Message;
use crate::object::PatchObject;

/// What a constructor knows about its surroundings.
pub struct NewObjectCtx {
    pub sample_rate: f32,
    pub block_size: usize,
    /// The owning graph's `$0` value.
    pub dollar_zero: usize,
}

/// Build an object from its label and init atoms. Returns `None` for an
/// unknown label or an init list the object cannot live without (e.g. a
/// `send` with no name).
pub fn create(
    label: &str,
    init: &Message,
    ctx: &NewObjectCtx,
) -> Option<Box<dyn PatchObject>> {
    let object: Box<dyn PatchObject> = match label {
        "bang" | "b" => Box::new(bang::Bang::new()),
        "toggle" | "tgl" => Box::new(toggle::Toggle::new(init)),
        "loadbang" => Box::new(loadbang::Loadbang::new()),
        "metro" => Box::new(metro::Metro::new(init)),
        "counter" => Box::new(counter::Counter::new(init)),
        "change" => Box::new(change::Change::new(init)),
        "wrap" => Box::new(wrap::Wrap::new(init)),
        "max" => Box::new(maximum::Maximum::new(init)),
        "min" => Box::new(minimum::Minimum::new(init)),
        "mod" | "%" => Box::new(modulus::Modulus::new(init)),
        ">" => Box::new(greater_than::GreaterThan::new(init)),
        "unpack" => Box::new(unpack::Unpack::new(init)),
        "poly" => Box::new(poly::Poly::new(init)),
        "print" => Box::new(print::Print::new(init)),
        "send" | "s" => Box::new(send::Send::new(init)?),
        "receive" | "r" => Box::new(receive::Receive::new(init)?),
        "table" => Box::new(table_obj::TableObject::new(init)?),
        "osc~" => Box::new(osc::Osc::new(init)),
        "sig~" => Box::new(sig::Sig::new(init)),
        "+~" => Box::new(add::Add::new(init)),
        "*~" => Box::new(mul::Mul::new(init)),
        "dac~" => Box::new(dac::Dac::new(init)),
        "adc~" => Box::new(adc::Adc::new(init)),
        "throw~" => Box::new(throw::Throw::new(init)?),
        "catch~" => Box::new(catch::Catch::new(init)?),
        "delwrite~" => Box::new(delwrite::DelWrite::new(init)?),
        "delread~" => Box::new(delread::DelRead::new(init)?),
        "samphold~" => Box::new(samphold::SampHold::new()),
        "tabwrite~" => Box::new(tabwrite::TabWrite::new(init)?),
        "tabread~" => Box::new(tabread::TabRead::new(init)?),
        "print~" => Box::new(print_sig::PrintSig::new(init)),
        _ => return None,
    };
    Some(object)
}
