//! Source locations.
//!
//! A [`Loc`] is diagnostic metadata only — byte offsets into whatever
//! source the surrounding tool parsed the IR from. Rewrites copy the
//! location of a replaced operation onto its replacements so that the
//! minimizer's output still points at the original source.

/// Byte range in the original source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Loc {
    pub start: u32,
    pub end: u32,
}

impl Loc {
    /// Location for operations with no source attribution (e.g.
    /// synthesized replacements in tests).
    pub const UNKNOWN: Loc = Loc { start: 0, end: 0 };

    /// Create a location from a byte range.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}
