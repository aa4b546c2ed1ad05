//! Key material for the index transform.
//!
//! The key is one 122×122 invertible matrix over GF(2) and its inverse. It is derived from a
//! fixed public seed, so every process (and every implementation following the same derivation)
//! maps indexes to the same UUIDs.
//!
//! ## Derivation
//! - A byte stream is seeded with [`KEY_SEED`].
//! - Each 16-byte draw is the first half of `SHA-256(state)`, and the draw becomes the next state.
//! - Each row is a draw read as a big-endian `u128`, masked to 122 bits.
//! - If the 122 rows are not full rank, all 122 are drawn again.

use crate::gf2;
use crate::index::{ENTROPY_BITS, INDEX_MASK};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Public seed for the key matrix.
pub const KEY_SEED: &[u8] = b"42";

const ROW_BYTES: usize = 16;

static KEYS: OnceLock<KeyMaterial> = OnceLock::new();

/// Deterministic byte stream chained through SHA-256.
#[derive(Clone, Debug)]
pub(crate) struct SeededBytes {
    state: Vec<u8>,
}

impl SeededBytes {
    pub(crate) fn new(seed: &[u8]) -> Self {
        Self {
            state: seed.to_vec(),
        }
    }

    pub(crate) fn next_block(&mut self) -> [u8; ROW_BYTES] {
        let digest = Sha256::digest(&self.state);
        let mut block = [0u8; ROW_BYTES];
        block.copy_from_slice(&digest[..ROW_BYTES]);
        self.state = block.to_vec();
        block
    }

    fn next_row(&mut self) -> u128 {
        u128::from_be_bytes(self.next_block()) & INDEX_MASK
    }
}

/// Draws `size` rows at a time until they form a full-rank matrix.
///
/// Returns the matrix and the number of draws it took.
pub(crate) fn random_invertible_matrix(size: usize, bytes: &mut SeededBytes) -> (Vec<u128>, usize) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let matrix: Vec<u128> = (0..size).map(|_| bytes.next_row()).collect();
        if gf2::is_invertible(&matrix) {
            return (matrix, attempts);
        }
    }
}

/// The matrix pair `(M, M⁻¹)` used to encode and decode indexes.
///
/// Immutable once built. Use [`KeyMaterial::global`] to share one instance for the life of the
/// process; [`KeyMaterial::generate`] rebuilds it from scratch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMaterial {
    matrix: Vec<u128>,
    inverse: Vec<u128>,
}

impl KeyMaterial {
    /// Derives the key pair from [`KEY_SEED`].
    pub fn generate() -> Self {
        let mut bytes = SeededBytes::new(KEY_SEED);
        let (matrix, attempts) = random_invertible_matrix(ENTROPY_BITS as usize, &mut bytes);
        tracing::debug!(attempts, "derived {}-bit key matrix", ENTROPY_BITS);

        let inverse = gf2::invert(&matrix).expect("full-rank matrix must be invertible");
        Self { matrix, inverse }
    }

    /// Returns the process-wide key pair, deriving it on first use.
    pub fn global() -> &'static Self {
        KEYS.get_or_init(Self::generate)
    }

    /// Rows of `M`; row `i` produces bit `i` of the encoded value.
    pub fn matrix(&self) -> &[u128] {
        &self.matrix
    }

    /// Rows of `M⁻¹`.
    pub fn inverse(&self) -> &[u128] {
        &self.inverse
    }
}

/// Derives the process-wide key pair now rather than on first use.
///
/// Call this at startup before handing work to multiple threads so that no request pays the
/// derivation cost.
pub fn init() -> &'static KeyMaterial {
    KeyMaterial::global()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_bytes_are_deterministic() {
        let mut a = SeededBytes::new(KEY_SEED);
        let mut b = SeededBytes::new(KEY_SEED);

        for _ in 0..4 {
            assert_eq!(a.next_block(), b.next_block());
        }
    }

    #[test]
    fn test_seeded_bytes_chain_through_output() {
        let mut stream = SeededBytes::new(KEY_SEED);
        let first = stream.next_block();
        let second = stream.next_block();

        let mut restarted = SeededBytes::new(&first);
        assert_eq!(restarted.next_block(), second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_generated_matrix_is_invertible() {
        let keys = KeyMaterial::global();

        assert_eq!(keys.matrix().len(), ENTROPY_BITS as usize);
        assert!(gf2::is_invertible(keys.matrix()));
        assert!(keys.matrix().iter().all(|row| row & !INDEX_MASK == 0));
    }

    #[test]
    fn test_inverse_undoes_matrix() {
        let keys = KeyMaterial::global();

        for value in [0u128, 1, INDEX_MASK, 0x0123_4567_89ab_cdef_0123_4567_89ab_cdef & INDEX_MASK] {
            let encoded = gf2::multiply(keys.matrix(), value);
            assert_eq!(gf2::multiply(keys.inverse(), encoded), value);
        }
    }

    #[test]
    fn test_known_rows() {
        let keys = KeyMaterial::global();

        assert_eq!(keys.matrix()[0], 494230286654654342905613886003049483);
        assert_eq!(keys.matrix()[121], 271050479884326059104590710063982603);
        assert_eq!(keys.inverse()[0], 4394312389366092128955158256929928908);
    }

    #[test]
    fn test_generation_takes_several_draws() {
        let mut bytes = SeededBytes::new(KEY_SEED);
        let (matrix, attempts) = random_invertible_matrix(ENTROPY_BITS as usize, &mut bytes);

        assert_eq!(attempts, 16);
        assert_eq!(matrix, KeyMaterial::global().matrix());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(init(), KeyMaterial::global()));
    }
}
