//! Hierarchical Triangular Mesh (HTM) trixel algebra (spec §4.A).
//!
//! A trixel is identified either by its internal name — a string over
//! `{0,1,2,3}`, depth = level — or, at the maximum level, by a 56-bit
//! big-endian integer range used for storage. This crate implements the
//! set algebra over trixel-name lists and the name/range conversions;
//! the cover generator that turns a geometry into a trixel-name list is
//! black-boxed per spec §4.A (the generator for real geometries is
//! outside this core's scope).

mod algebra;
mod cover;
mod ranges;

pub use algebra::{and, or, sibling_expand, xor};
pub use cover::{CoverGenerator, NullCover};
pub use ranges::{id_range_of, merge_ranges, TrixelRange};

/// Maximum HTM subdivision depth this implementation supports. Each
/// level consumes 2 bits of the 56-bit max-level identifier
/// (`2 * MAX_LEVEL == 56`), matching spec §6's 56-bit storage range.
pub const MAX_LEVEL: u32 = 28;

/// `true` iff every character of `name` is a valid trixel digit.
pub fn is_valid_trixel_name(name: &str) -> bool {
    !name.is_empty() && name.len() as u32 <= MAX_LEVEL && name.chars().all(|c| matches!(c, '0'..='3'))
}

/// `A` covers `B` iff `A` is a (non-strict) prefix of `B` — a shallower
/// (or equal) trixel always covers every trixel nested beneath it.
pub fn covers(a: &str, b: &str) -> bool {
    b.starts_with(a)
}
