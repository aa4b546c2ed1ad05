//! UUID templates with wildcards.
//!
//! A pattern is 36 characters laid out like a UUID, where `*` stands for any hex digit. A query
//! fragment becomes one pattern per position it could occupy in the UUID text.

use crate::index::ENTROPY_BITS;
use crate::{ScrollError, ScrollResult};
use std::fmt;

/// Length of the canonical UUID text.
pub const UUID_LEN: usize = 36;

pub(crate) const VERSION_POS: usize = 14;
pub(crate) const VARIANT_POS: usize = 19;

const DELIMITERS: [usize; 4] = [8, 13, 18, 23];
const WILDCARD: u8 = b'*';

/// A validated 36-character UUID template.
///
/// Guarantees hyphens at the delimiter positions, `4` or `*` at the version position, one of
/// `8 9 a b *` at the variant position, and lowercase hex or `*` everywhere else.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    chars: [u8; UUID_LEN],
}

impl Pattern {
    /// Validates a full template, lowercasing it and turning `*` at delimiter positions into
    /// hyphens.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollError::InvalidPattern`] if the template has the wrong length or cannot
    /// match any version-4 UUID.
    pub fn parse(input: &str) -> ScrollResult<Self> {
        let lower = input.to_ascii_lowercase();
        let chars: [u8; UUID_LEN] = lower.as_bytes().try_into().map_err(|_| {
            ScrollError::InvalidPattern(format!(
                "pattern must be {} characters, got {}: '{}'",
                UUID_LEN,
                input.chars().count(),
                input
            ))
        })?;

        Self::from_template(chars).ok_or_else(|| {
            ScrollError::InvalidPattern(format!(
                "pattern cannot match a version 4 UUID: '{}'",
                input
            ))
        })
    }

    /// Returns one pattern for every offset at which `query` fits the UUID layout.
    ///
    /// Placements that would put a hyphen off a delimiter, a hex digit on a delimiter, or a
    /// wrong digit on the version or variant position are discarded. `query` is expected to be
    /// lowercase.
    pub fn placements(query: &str) -> Vec<Self> {
        let query = query.as_bytes();
        if query.len() > UUID_LEN {
            return Vec::new();
        }

        (0..=UUID_LEN - query.len())
            .filter_map(|offset| {
                let mut chars = [WILDCARD; UUID_LEN];
                chars[offset..offset + query.len()].copy_from_slice(query);
                Self::from_template(chars)
            })
            .collect()
    }

    fn from_template(mut chars: [u8; UUID_LEN]) -> Option<Self> {
        for position in DELIMITERS {
            if chars[position] == WILDCARD {
                chars[position] = b'-';
            }
        }
        is_valid(&chars).then_some(Self { chars })
    }

    /// True when `uuid` (lowercase canonical text) fits this template.
    pub fn matches(&self, uuid: &str) -> bool {
        uuid.len() == UUID_LEN
            && self
                .chars
                .iter()
                .zip(uuid.bytes())
                .all(|(p, u)| *p == WILDCARD || *p == u)
    }

    /// Number of non-wildcard hex digits.
    pub fn fixed_digits(&self) -> usize {
        self.chars
            .iter()
            .filter(|c| **c != WILDCARD && **c != b'-')
            .count()
    }

    pub fn as_str(&self) -> &str {
        // Validated patterns are ASCII.
        std::str::from_utf8(&self.chars).unwrap_or_default()
    }

    /// Known bits of the encoded value, indexed like the value itself.
    ///
    /// Hex digits are read from the last to the first, each least significant bit first,
    /// giving the 128 UUID bits. The six version and variant bits are skipped, leaving one
    /// entry per encoded bit: `Some(bit)` where the pattern fixes it, `None` under a wildcard.
    pub(crate) fn constraints(&self) -> [Option<bool>; ENTROPY_BITS as usize] {
        let mut uuid_bits = [None; 128];
        for (digit, c) in self.chars.iter().filter(|c| **c != b'-').rev().enumerate() {
            let Some(value) = (*c as char).to_digit(16) else {
                continue;
            };
            for bit in 0..4 {
                uuid_bits[4 * digit + bit] = Some((value >> bit) & 1 == 1);
            }
        }

        let mut constraints = [None; ENTROPY_BITS as usize];
        for (i, slot) in constraints.iter_mut().enumerate() {
            *slot = match i {
                0..=61 => uuid_bits[i],
                62..=73 => uuid_bits[i + 2],
                _ => uuid_bits[i + 6],
            };
        }
        constraints
    }
}

fn is_valid(chars: &[u8; UUID_LEN]) -> bool {
    chars.iter().enumerate().all(|(position, &c)| match position {
        8 | 13 | 18 | 23 => c == b'-',
        VERSION_POS => matches!(c, b'4' | WILDCARD),
        VARIANT_POS => matches!(c, b'8' | b'9' | b'a' | b'b' | WILDCARD),
        _ => matches!(c, b'0'..=b'9' | b'a'..=b'f' | WILDCARD),
    })
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inserts_hyphens() {
        let pattern = Pattern::parse("**************4****8************abcd").unwrap();

        assert_eq!(pattern.as_str(), "********-****-4***-8***-********abcd");
        assert_eq!(pattern.fixed_digits(), 6);
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let pattern = Pattern::parse("DEADBEEF-****-****-****-************").unwrap();
        assert_eq!(pattern.to_string(), "deadbeef-****-****-****-************");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        match Pattern::parse("abc") {
            Err(ScrollError::InvalidPattern(msg)) => assert!(msg.contains("36 characters")),
            _ => panic!("Expected InvalidPattern error"),
        }
    }

    #[test]
    fn test_parse_rejects_fixed_bit_conflicts() {
        assert!(Pattern::parse("********-****-5***-****-************").is_err());
        assert!(Pattern::parse("********-****-****-c***-************").is_err());
        assert!(Pattern::parse("********a****-****-****-************").is_err());
        assert!(Pattern::parse("****-***-****-****-****-************").is_err());
        assert!(Pattern::parse("********-****-****-****-***********g").is_err());
    }

    #[test]
    fn test_parse_accepts_each_allowed_digit() {
        assert!(Pattern::parse("********-****-4***-****-************").is_ok());
        for variant in ["8", "9", "a", "b"] {
            let template = format!("********-****-****-{}***-************", variant);
            assert!(Pattern::parse(&template).is_ok(), "variant {}", variant);
        }
        assert!(Pattern::parse("0123abcd-ef45-4678-9abc-def012345678").is_ok());
    }

    #[test]
    fn test_placements_of_short_query() {
        let patterns = Pattern::placements("ab");

        // Two characters fit at 35 offsets; those covering a delimiter or the version digit
        // are rejected, the variant position accepts 'a' and 'b'.
        assert!(patterns.iter().all(|p| p.as_str().contains("ab")));
        assert!(patterns
            .iter()
            .any(|p| p.as_str() == "********-****-****-ab**-************"));
        assert!(!patterns.iter().any(|p| &p.as_str()[13..15] == "ab"));
        assert_eq!(patterns.len(), 26);
    }

    #[test]
    fn test_placements_with_hyphen() {
        let patterns: Vec<String> = Pattern::placements("4-8")
            .iter()
            .map(|p| p.to_string())
            .collect();

        assert_eq!(
            patterns,
            vec![
                "*******4-8***-****-****-************",
                "********-****-***4-8***-************",
                "********-****-****-***4-8***********",
            ]
        );
    }

    #[test]
    fn test_placements_reject_misplaced_hyphens() {
        assert!(Pattern::placements("--").is_empty());
        assert!(Pattern::placements("-4-").is_empty());
        assert!(Pattern::placements("a-b-c").is_empty());
    }

    #[test]
    fn test_placements_of_full_uuid() {
        let patterns = Pattern::placements("445b67e7-c2b3-45e2-8516-2e4c0e44d685");

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].fixed_digits(), 32);
        assert!(patterns[0].matches("445b67e7-c2b3-45e2-8516-2e4c0e44d685"));
    }

    #[test]
    fn test_placements_of_long_query() {
        assert!(Pattern::placements(&"a".repeat(37)).is_empty());
    }

    #[test]
    fn test_matches_wildcards() {
        let pattern = Pattern::parse("445b****-****-4***-****-************").unwrap();

        assert!(pattern.matches("445b67e7-c2b3-45e2-8516-2e4c0e44d685"));
        assert!(!pattern.matches("ab6fdab2-7090-416d-b8cf-14ff36a36ce0"));
        assert!(!pattern.matches("445b"));
    }

    #[test]
    fn test_constraints_skip_fixed_bits() {
        let pattern = Pattern::parse("********-****-4***-8***-***********1").unwrap();
        let constraints = pattern.constraints();

        assert_eq!(constraints[0], Some(true));
        assert_eq!(constraints[1..4], [Some(false); 3]);
        assert!(constraints[4..60].iter().all(Option::is_none));
        // The variant digit '8' also pins the two entropy bits below the variant.
        assert_eq!(constraints[60..62], [Some(false); 2]);
        assert!(constraints[62..].iter().all(Option::is_none));
    }

    #[test]
    fn test_constraints_map_digit_groups() {
        // Lowest digit of the fourth group holds value bits 48..52, and bits 60..62 sit under
        // the variant digit.
        let pattern = Pattern::parse("********-****-****-*3*f-************").unwrap();
        let constraints = pattern.constraints();

        assert_eq!(constraints[48..52], [Some(true); 4]);
        assert_eq!(constraints[56..60], [Some(true), Some(true), Some(false), Some(false)]);
        assert!(constraints[60..].iter().all(Option::is_none));
    }

    #[test]
    fn test_constraints_above_version() {
        // Lowest digit of the second group holds value bits 74..78.
        let pattern = Pattern::parse("********-***f-****-****-************").unwrap();
        let constraints = pattern.constraints();

        assert_eq!(constraints[74..78], [Some(true); 4]);
        assert_eq!(constraints.iter().filter(|c| c.is_some()).count(), 4);
    }
}
