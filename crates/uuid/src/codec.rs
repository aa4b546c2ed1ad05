//! Conversion between indexes, 122-bit encoded values, and UUID text.
//!
//! ## Bit layout
//! The 122-bit encoded value is spread over the 128-bit UUID around the fixed bits:
//!
//! ```text
//! UUID bits   128..80   80..76   76..64   64..62   62..0
//! contents    v[122..74] 0100    v[74..62]  10      v[62..0]
//! ```
//!
//! The version nibble is hex digit 12 (text position 14) and the variant bits are the top of
//! hex digit 16 (text position 19).

use crate::gf2;
use crate::index::{UuidIndex, ENTROPY_BITS, INDEX_MASK};
use crate::keys::KeyMaterial;
use crate::pattern::{UUID_LEN, VARIANT_POS, VERSION_POS};
use crate::{ScrollError, ScrollResult};
use rand::Rng;
use uuid::{Uuid, Variant};

/// Added to an index before encoding so that index 0 does not map to the nil-like UUID
/// `00000000-0000-4000-8000-000000000000`.
pub const INDEX_OFFSET: u128 = 1_237_834_238_432;

const LOW_BITS: u32 = 62;
const MID_BITS: u32 = 12;
const LOW_MASK: u128 = (1 << LOW_BITS) - 1;
const MID_MASK: u128 = (1 << MID_BITS) - 1;
const VERSION_BITS: u128 = 0b0100 << 76;
const VARIANT_BITS: u128 = 0b10 << 62;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Applies the linear transform `matrix` to a 122-bit value.
///
/// Encoding uses `M` and decoding uses `M⁻¹`; both are the same matrix-vector product.
pub fn encrypt(value: u128, matrix: &[u128]) -> u128 {
    gf2::multiply(&matrix[..matrix.len().min(ENTROPY_BITS as usize)], value)
}

pub(crate) fn offset(index: u128) -> u128 {
    index.wrapping_add(INDEX_OFFSET) & INDEX_MASK
}

pub(crate) fn unoffset(value: u128) -> u128 {
    value.wrapping_sub(INDEX_OFFSET) & INDEX_MASK
}

/// Spreads a 122-bit value over the UUID layout and sets the version and variant bits.
pub(crate) fn pack(value: u128) -> u128 {
    ((value >> (LOW_BITS + MID_BITS)) << 80)
        | VERSION_BITS
        | (((value >> LOW_BITS) & MID_MASK) << 64)
        | VARIANT_BITS
        | (value & LOW_MASK)
}

/// Inverse of [`pack`]; the version and variant bits are dropped.
pub(crate) fn unpack(bits: u128) -> u128 {
    (bits & LOW_MASK)
        | (((bits >> 64) & MID_MASK) << LOW_BITS)
        | ((bits >> 80) << (LOW_BITS + MID_BITS))
}

fn is_delimiter(position: usize) -> bool {
    matches!(position, 8 | 13 | 18 | 23)
}

/// Renders packed UUID bits as the 36 canonical lowercase characters.
pub(crate) fn render(bits: u128) -> [u8; UUID_LEN] {
    let mut out = [b'-'; UUID_LEN];
    let mut nibble = 0u32;
    for (position, slot) in out.iter_mut().enumerate() {
        if is_delimiter(position) {
            continue;
        }
        let shift = 124 - 4 * nibble;
        *slot = HEX_DIGITS[((bits >> shift) & 0xf) as usize];
        nibble += 1;
    }
    out
}

/// Encodes an index to its scrambled 122-bit value, ready for [`pack`].
pub(crate) fn encode(index: UuidIndex, keys: &KeyMaterial) -> u128 {
    encrypt(offset(index.value()), keys.matrix())
}

pub(crate) fn render_index(index: UuidIndex, keys: &KeyMaterial) -> [u8; UUID_LEN] {
    render(pack(encode(index, keys)))
}

fn is_valid_uuid(bytes: &[u8]) -> bool {
    bytes.len() == UUID_LEN
        && bytes.iter().enumerate().all(|(position, b)| match position {
            p if is_delimiter(p) => *b == b'-',
            VERSION_POS => *b == b'4',
            VARIANT_POS => matches!(b.to_ascii_lowercase(), b'8' | b'9' | b'a' | b'b'),
            _ => b.is_ascii_hexdigit(),
        })
}

/// Validates a UUID string and returns its 122 entropy bits.
///
/// Accepts upper or lower case.
///
/// # Errors
///
/// Returns [`ScrollError::InvalidUuid`] on wrong length, misplaced or missing hyphens, a version
/// nibble other than `4`, a variant nibble outside `8 9 a b`, or non-hex characters.
pub(crate) fn parse_uuid_value(uuid: &str) -> ScrollResult<u128> {
    let bytes = uuid.as_bytes();
    if !is_valid_uuid(bytes) {
        return Err(ScrollError::InvalidUuid(format!(
            "expected xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx, got: '{}'",
            uuid
        )));
    }

    let bits = bytes
        .iter()
        .filter(|b| **b != b'-')
        .fold(0u128, |acc, b| (acc << 4) | u128::from(hex_value(*b)));
    Ok(unpack(bits))
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

/// Returns the UUID at `index`, in canonical lowercase form.
pub fn index_to_uuid(index: UuidIndex) -> String {
    String::from_utf8_lossy(&render_index(index, KeyMaterial::global())).into_owned()
}

/// Returns the index of a UUID string.
///
/// # Errors
///
/// Returns [`ScrollError::InvalidUuid`] if `uuid` is not a version-4 UUID in `8-4-4-4-12` form.
pub fn uuid_to_index(uuid: &str) -> ScrollResult<UuidIndex> {
    let value = parse_uuid_value(uuid)?;
    let decoded = encrypt(value, KeyMaterial::global().inverse());
    Ok(UuidIndex::wrapping(unoffset(decoded)))
}

/// Returns the UUID at `index` as a [`Uuid`].
pub fn index_to_uuid_value(index: UuidIndex) -> Uuid {
    Uuid::from_u128(pack(encode(index, KeyMaterial::global())))
}

/// Returns the index of a [`Uuid`].
///
/// # Errors
///
/// Returns [`ScrollError::InvalidUuid`] unless the UUID is version 4 with the RFC 4122 variant.
pub fn uuid_value_to_index(uuid: &Uuid) -> ScrollResult<UuidIndex> {
    if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
        return Err(ScrollError::InvalidUuid(format!(
            "expected a version 4 RFC 4122 UUID, got: '{}'",
            uuid
        )));
    }
    let decoded = encrypt(unpack(uuid.as_u128()), KeyMaterial::global().inverse());
    Ok(UuidIndex::wrapping(unoffset(decoded)))
}

/// Renders `count` consecutive UUIDs starting at `start`, wrapping past the last index.
pub fn uuid_page(start: UuidIndex, count: usize) -> Vec<(UuidIndex, String)> {
    let keys = KeyMaterial::global();
    let mut index = start;
    let mut page = Vec::with_capacity(count);
    for _ in 0..count {
        let text = String::from_utf8_lossy(&render_index(index, keys)).into_owned();
        page.push((index, text));
        index = index.step(1, crate::Direction::Forward);
    }
    page
}

/// Draws a uniformly random index.
pub fn random_index<R: Rng + ?Sized>(rng: &mut R) -> UuidIndex {
    UuidIndex::wrapping(rng.gen::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_canonical(uuid: &str) -> bool {
        is_valid_uuid(uuid.as_bytes()) && uuid.bytes().all(|b| !b.is_ascii_uppercase())
    }

    #[test]
    fn test_golden_values() {
        assert_eq!(
            index_to_uuid(UuidIndex::FIRST),
            "445b67e7-c2b3-45e2-8516-2e4c0e44d685"
        );
        assert_eq!(
            index_to_uuid(UuidIndex::wrapping(1)),
            "ab6fdab2-7090-416d-b8cf-14ff36a36ce0"
        );
        assert_eq!(
            index_to_uuid(UuidIndex::wrapping(2)),
            "c6d3abd4-9820-4175-bec1-d0ec272532ac"
        );
        assert_eq!(
            index_to_uuid(UuidIndex::wrapping(123_456_789)),
            "1a909ea2-2b35-4138-909b-7f7fe8682a85"
        );
        assert_eq!(
            index_to_uuid(UuidIndex::LAST),
            "d2f892e1-dc46-4d71-9fb4-13ae698418da"
        );
    }

    #[test]
    fn test_first_index_is_not_trivial() {
        assert_ne!(
            index_to_uuid(UuidIndex::FIRST),
            "00000000-0000-4000-8000-000000000000"
        );
    }

    #[test]
    fn test_trivial_uuid_maps_to_negative_offset() {
        let index = uuid_to_index("00000000-0000-4000-8000-000000000000").unwrap();

        assert_eq!(index.value(), (1u128 << 122) - INDEX_OFFSET);
    }

    #[test]
    fn test_decode_known_uuids() {
        assert_eq!(
            uuid_to_index("445b67e7-c2b3-45e2-8516-2e4c0e44d685").unwrap(),
            UuidIndex::FIRST
        );
        assert_eq!(
            uuid_to_index("ffffffff-ffff-4fff-bfff-ffffffffffff")
                .unwrap()
                .value(),
            597_963_638_084_689_328_448_509_777_041_536_319
        );
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(
            uuid_to_index("AB6FDAB2-7090-416D-B8CF-14FF36A36CE0").unwrap(),
            UuidIndex::wrapping(1)
        );
    }

    #[test]
    fn test_bijection_on_random_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let index = random_index(&mut rng);
            let uuid = index_to_uuid(index);

            assert!(is_canonical(&uuid), "not canonical: {}", uuid);
            assert_eq!(uuid_to_index(&uuid).unwrap(), index);
        }
    }

    #[test]
    fn test_every_uuid_decodes_to_itself() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let bits = pack(rng.gen::<u128>() & INDEX_MASK);
            let uuid = String::from_utf8_lossy(&render(bits)).into_owned();
            let index = uuid_to_index(&uuid).unwrap();

            assert_eq!(index_to_uuid(index), uuid);
        }
    }

    #[test]
    fn test_matrix_inverse_round_trip() {
        let keys = KeyMaterial::global();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let value = rng.gen::<u128>() & INDEX_MASK;
            assert_eq!(encrypt(encrypt(value, keys.matrix()), keys.inverse()), value);
        }
    }

    #[test]
    fn test_pack_sets_fixed_bits() {
        let packed = pack(0);
        assert_eq!(
            String::from_utf8_lossy(&render(packed)),
            "00000000-0000-4000-8000-000000000000"
        );

        let packed = pack(INDEX_MASK);
        assert_eq!(
            String::from_utf8_lossy(&render(packed)),
            "ffffffff-ffff-4fff-bfff-ffffffffffff"
        );
        assert_eq!(unpack(packed), INDEX_MASK);
    }

    #[test]
    fn test_pack_places_bit_groups() {
        // Bit 62 is the lowest bit above the variant, bit 74 the lowest above the version.
        assert_eq!(pack(1 << 62), VERSION_BITS | VARIANT_BITS | (1 << 64));
        assert_eq!(pack(1 << 74), VERSION_BITS | VARIANT_BITS | (1 << 80));
        assert_eq!(pack(1 << 61), VERSION_BITS | VARIANT_BITS | (1 << 61));
    }

    #[test]
    fn test_offset_wraps() {
        assert_eq!(unoffset(offset(INDEX_MASK)), INDEX_MASK);
        assert_eq!(offset(INDEX_MASK), INDEX_OFFSET - 1);
        assert_eq!(unoffset(0), (1u128 << 122) - INDEX_OFFSET);
    }

    #[test]
    fn test_uuid_value_round_trip() {
        let index = UuidIndex::wrapping(987_654_321);
        let uuid = index_to_uuid_value(index);

        assert_eq!(uuid.get_version_num(), 4);
        assert_eq!(uuid.get_variant(), Variant::RFC4122);
        assert_eq!(uuid.hyphenated().to_string(), index_to_uuid(index));
        assert_eq!(uuid_value_to_index(&uuid).unwrap(), index);
    }

    #[test]
    fn test_uuid_value_rejects_other_versions() {
        let nil = Uuid::nil();
        assert!(matches!(
            uuid_value_to_index(&nil),
            Err(ScrollError::InvalidUuid(_))
        ));

        let v1 = Uuid::parse_str("550e8400-e29b-11d4-a716-446655440000").unwrap();
        assert!(uuid_value_to_index(&v1).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let cases = [
            "not-a-uuid",
            "",
            "445b67e7c2b345e285162e4c0e44d685",
            "445b67e7-c2b3-45e2-8516-2e4c0e44d68",
            "445b67e7-c2b3-45e2-8516-2e4c0e44d6855",
            "445b67e7-c2b3-55e2-8516-2e4c0e44d685",
            "445b67e7-c2b3-45e2-c516-2e4c0e44d685",
            "445b67e7-c2b3-45e2-8516-2e4c0e44d68g",
            "445b67e7_c2b3-45e2-8516-2e4c0e44d685",
            "{445b67e7-c2b3-45e2-8516-2e4c0e44d6}",
        ];

        for case in cases {
            match uuid_to_index(case) {
                Err(ScrollError::InvalidUuid(msg)) => assert!(msg.contains(case)),
                other => panic!("Expected InvalidUuid for '{}', got {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_page_is_consecutive_and_wraps() {
        let page = uuid_page(UuidIndex::LAST.step(1, crate::Direction::Backward), 4);

        let indexes: Vec<u128> = page.iter().map(|(index, _)| index.value()).collect();
        assert_eq!(indexes, vec![INDEX_MASK - 1, INDEX_MASK, 0, 1]);
        assert_eq!(page[1].1, "d2f892e1-dc46-4d71-9fb4-13ae698418da");
        assert_eq!(page[2].1, "445b67e7-c2b3-45e2-8516-2e4c0e44d685");
    }

    #[test]
    fn test_empty_page() {
        assert!(uuid_page(UuidIndex::FIRST, 0).is_empty());
    }

    #[test]
    fn test_random_index_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            assert!(random_index(&mut rng).value() <= INDEX_MASK);
        }
    }
}
