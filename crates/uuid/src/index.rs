//! Positions in the cyclic 122-bit index space.

use crate::{ScrollError, ScrollResult};
use std::{fmt, str::FromStr};

/// Number of bits a version-4 UUID leaves free after the version and variant bits.
pub const ENTROPY_BITS: u32 = 122;

/// Mask selecting the low [`ENTROPY_BITS`] bits of a `u128`.
pub const INDEX_MASK: u128 = (1 << ENTROPY_BITS) - 1;

/// A position in the enumeration of all version-4 UUIDs.
///
/// This wrapper guarantees that the contained value lies in `[0, 2^122)`. The top six bits of
/// the `u128` are always zero.
///
/// # Construction
/// - [`UuidIndex::new`] validates a raw value and rejects anything out of range.
/// - [`UuidIndex::wrapping`] reduces any `u128` modulo `2^122`.
/// - [`FromStr`] parses a decimal string, as sent by clients that cannot hold 122-bit numbers.
///
/// # Serialisation
/// With the `serde` feature enabled the index serialises as a decimal string, since JSON
/// numbers lose precision beyond 2^53 in most clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct UuidIndex(u128);

impl UuidIndex {
    /// The first index.
    pub const FIRST: Self = Self(0);

    /// The last index, `2^122 - 1`.
    pub const LAST: Self = Self(INDEX_MASK);

    /// Validates and wraps a raw index.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollError::InvalidIndex`] if `value >= 2^122`.
    pub fn new(value: u128) -> ScrollResult<Self> {
        if value > INDEX_MASK {
            return Err(ScrollError::InvalidIndex(format!(
                "index must be below 2^{}, got: {}",
                ENTROPY_BITS, value
            )));
        }
        Ok(Self(value))
    }

    /// Wraps `value` into the index space by discarding bits above the entropy width.
    pub const fn wrapping(value: u128) -> Self {
        Self(value & INDEX_MASK)
    }

    /// Returns the raw index value.
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Moves `delta` positions in `direction`, wrapping at both ends.
    ///
    /// 2^128 is a multiple of 2^122, so wrapping `u128` arithmetic followed by masking is exact
    /// modular arithmetic in the index space.
    pub fn step(self, delta: u128, direction: Direction) -> Self {
        match direction {
            Direction::Forward => Self::wrapping(self.0.wrapping_add(delta)),
            Direction::Backward => Self::wrapping(self.0.wrapping_sub(delta)),
        }
    }

    /// Returns how many steps in `direction` lead from `self` to `other`.
    pub fn distance_to(self, other: Self, direction: Direction) -> u128 {
        match direction {
            Direction::Forward => other.0.wrapping_sub(self.0) & INDEX_MASK,
            Direction::Backward => self.0.wrapping_sub(other.0) & INDEX_MASK,
        }
    }
}

impl fmt::Display for UuidIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UuidIndex {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u128>().map_err(|e| {
            ScrollError::InvalidIndex(format!("expected a decimal integer, got '{}': {}", s, e))
        })?;
        Self::new(value)
    }
}

impl TryFrom<u128> for UuidIndex {
    type Error = ScrollError;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for UuidIndex {
    type Error = ScrollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UuidIndex> for String {
    fn from(index: UuidIndex) -> Self {
        index.to_string()
    }
}

impl From<UuidIndex> for u128 {
    fn from(index: UuidIndex) -> Self {
        index.0
    }
}

/// Direction of travel through the index space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Direction {
    /// Towards higher indexes (`+1`).
    #[default]
    Forward,
    /// Towards lower indexes (`-1`).
    Backward,
}

impl Direction {
    /// Returns `+1` for forward and `-1` for backward.
    pub const fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    pub const fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// True when `candidate` lies strictly beyond `origin` in this direction (no wrapping).
    pub(crate) fn is_beyond(self, candidate: u128, origin: u128) -> bool {
        match self {
            Direction::Forward => candidate > origin,
            Direction::Backward => candidate < origin,
        }
    }

    /// The free-bit value that keeps a diverged solution closest to its origin.
    pub(crate) fn nearest_free_bit(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

impl TryFrom<i8> for Direction {
    type Error = ScrollError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(ScrollError::InvalidDirection(format!(
                "direction must be +1 or -1, got: {}",
                other
            ))),
        }
    }
}

impl FromStr for Direction {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "next" | "1" | "+1" => Ok(Direction::Forward),
            "backward" | "previous" | "prev" | "-1" => Ok(Direction::Backward),
            _ => Err(ScrollError::InvalidDirection(format!(
                "expected forward or backward, got: '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}
