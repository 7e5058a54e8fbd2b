//! Wire identifiers.

/// Dense identifier for a circuit wire, either an input bit or the output of
/// exactly one gate.
///
/// Once allocated by a [`crate::Circuit`], a `WireId` is never reissued,
/// never reassigned, and stays valid for the circuit's entire lifetime.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct WireId(u32);

impl WireId {
    /// The reserved input wire carrying the constant `false`.
    pub const FALSE: WireId = WireId(0);

    /// The reserved input wire carrying the constant `true`.
    pub const TRUE: WireId = WireId(1);

    /// Builds a wire id from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index backing this wire id.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The constant wire for a given boolean value.
    #[inline]
    pub const fn constant(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }
}

impl From<u32> for WireId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<WireId> for u32 {
    #[inline]
    fn from(value: WireId) -> Self {
        value.0
    }
}

impl From<WireId> for usize {
    #[inline]
    fn from(value: WireId) -> Self {
        value.0 as usize
    }
}

impl nohash_hasher::IsEnabled for WireId {}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}
