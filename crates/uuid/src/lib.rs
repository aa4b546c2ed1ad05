//! Index-addressable version-4 UUIDs.
//!
//! Every valid version-4 UUID carries 122 bits of entropy. This crate numbers all 2^122 of them
//! with a keyed, invertible linear bijection so that a caller can scroll through "every UUID"
//! as if it were a list: jump to any position, read the UUID there, and find the next or
//! previous UUID whose text contains a given fragment.
//!
//! ## Index space
//! - An index is an integer in `[0, 2^122)` wrapped in [`UuidIndex`].
//! - All index arithmetic is cyclic: stepping past the last index wraps to `0` and vice versa.
//! - Index `n` maps to `M * (n + offset)` over GF(2), where `M` is a fixed 122×122 invertible
//!   bit matrix derived from a public seed (see [`KeyMaterial`]).
//!
//! The transform hides ordering, it is not a cipher: the seed and matrix are public.
//!
//! ## Canonical text form
//! - Format: `xxxxxxxx-xxxx-4xxx-Vxxx-xxxxxxxxxxxx` with `V` one of `8`, `9`, `a`, `b`
//! - Lowercase on output, case-insensitive on input
//! - Example: `445b67e7-c2b3-45e2-8516-2e4c0e44d685` (index `0`)
//!
//! ## Search
//! [`find_next_index`] returns the nearest index, strictly after (or before) a start index,
//! whose UUID contains a query. Queries of one or two characters are found by scanning;
//! longer queries are turned into linear constraints on the index bits and solved directly,
//! so the cost does not depend on how far away the match is.

mod codec;
mod config;
pub mod gf2;
mod index;
mod keys;
mod pattern;
mod search;

// Re-export public types
pub use codec::{
    encrypt, index_to_uuid, index_to_uuid_value, random_index, uuid_page, uuid_to_index,
    uuid_value_to_index, INDEX_OFFSET,
};
pub use config::SearchConfig;
pub use index::{Direction, UuidIndex, ENTROPY_BITS, INDEX_MASK};
pub use keys::{init, KeyMaterial, KEY_SEED};
pub use pattern::{Pattern, UUID_LEN};
pub use search::{
    find_next_index, find_next_index_for_pattern, find_next_index_with, BRUTE_FORCE_MAX_LEN,
};

/// Error type for index and UUID operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScrollError {
    /// The string is not a version-4, RFC 4122 variant UUID in `8-4-4-4-12` form.
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),
    /// The value is outside `[0, 2^122)` or is not a decimal integer.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),
    /// Direction other than forward/backward (or `+1`/`-1`).
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
    /// Pattern template that cannot match any version-4 UUID.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    /// A capped brute-force scan gave up before finding a match.
    #[error("no match within {scanned} scanned indexes")]
    ScanLimitExceeded { scanned: u64 },
}

/// Result type for index and UUID operations.
pub type ScrollResult<T> = Result<T, ScrollError>;
