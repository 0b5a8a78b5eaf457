//! Collections: the flat/hierarchical views results are gathered into, and
//! the concurrent backreference store strategies consult for embedded
//! struct sizes.

mod hierarchic;
mod reference;

pub use hierarchic::{Flat, Hierarchic};
pub use reference::{Reference, SizeAlign};
