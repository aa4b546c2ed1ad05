//! Nearest-match search through the index space.
//!
//! [`find_next_index`] finds the closest index, strictly after (forward) or strictly before
//! (backward) a start index, whose UUID contains a query string.
//!
//! ## Strategy
//! - Queries of at most [`BRUTE_FORCE_MAX_LEN`] characters occur within a few hundred indexes
//!   of almost anywhere, so they are found by stepping through consecutive indexes.
//! - Longer queries are expanded into one [`Pattern`] per placement. Each pattern fixes some
//!   bits of the encoded value `M * (index + offset)`, which is a linear system in the index
//!   bits. The system is reduced to row-echelon form and solved from the most significant bit
//!   down for the solution nearest the start. The nearest solution across all patterns wins.
//!
//! The scan has no proven bound. [`SearchConfig::max_scan`] caps it for callers that need one.

use crate::codec;
use crate::config::SearchConfig;
use crate::gf2::{self, Equation};
use crate::index::{Direction, UuidIndex, ENTROPY_BITS};
use crate::keys::KeyMaterial;
use crate::pattern::Pattern;
use crate::{ScrollError, ScrollResult};

/// Queries up to this length are found by scanning consecutive indexes.
pub const BRUTE_FORCE_MAX_LEN: usize = 2;

fn is_query_byte(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'f' | b'-')
}

/// Returns the nearest index beyond `start` in `direction` whose UUID contains `query`.
///
/// The query is case-insensitive. Returns `None` when the query contains characters other
/// than hex digits and hyphens, or cannot appear anywhere in a version-4 UUID.
///
/// One- and two-character queries are scanned without limit; see [`find_next_index_with`] to
/// cap the scan.
pub fn find_next_index(query: &str, start: UuidIndex, direction: Direction) -> Option<UuidIndex> {
    // An unbounded scan runs until it matches, so it cannot fail.
    find_next_index_with(query, start, direction, &SearchConfig::unbounded()).unwrap_or(None)
}

/// Like [`find_next_index`], with explicit search configuration.
///
/// # Errors
///
/// Returns [`ScrollError::ScanLimitExceeded`] if a capped scan gives up. This is distinct from
/// `Ok(None)`, which means no UUID can contain the query.
pub fn find_next_index_with(
    query: &str,
    start: UuidIndex,
    direction: Direction,
    config: &SearchConfig,
) -> ScrollResult<Option<UuidIndex>> {
    let query = query.to_ascii_lowercase();
    if !query.bytes().all(is_query_byte) {
        tracing::debug!(%query, "query contains characters outside [0-9a-f-]");
        return Ok(None);
    }

    let patterns = Pattern::placements(&query);
    if patterns.is_empty() {
        tracing::debug!(%query, "query fits no placement in a version 4 UUID");
        return Ok(None);
    }

    let keys = KeyMaterial::global();
    if query.len() <= BRUTE_FORCE_MAX_LEN {
        tracing::debug!(%query, %start, %direction, "scanning for short query");
        return scan(&query, start, direction, config.max_scan, keys).map(Some);
    }

    tracing::debug!(%query, %start, %direction, patterns = patterns.len(), "solving for query");
    Ok(nearest_solution(&patterns, start, direction, keys))
}

/// Returns the nearest index beyond `start` in `direction` whose UUID fits `pattern`.
///
/// `pattern` is a 36-character template where `*` matches any hex digit, for example
/// `"dead****-****-4***-****-************"`. It is always solved algebraically, whatever the
/// number of fixed digits.
///
/// # Errors
///
/// Returns [`ScrollError::InvalidPattern`] if the template is malformed or conflicts with the
/// version and variant digits.
pub fn find_next_index_for_pattern(
    pattern: &str,
    start: UuidIndex,
    direction: Direction,
) -> ScrollResult<Option<UuidIndex>> {
    let pattern = Pattern::parse(pattern)?;
    Ok(solve_pattern(&pattern, start, direction, KeyMaterial::global()))
}

fn scan(
    query: &str,
    start: UuidIndex,
    direction: Direction,
    max_scan: Option<u64>,
    keys: &KeyMaterial,
) -> ScrollResult<UuidIndex> {
    let needle = query.as_bytes();
    let mut index = start;
    let mut scanned: u64 = 0;

    loop {
        if max_scan.is_some_and(|limit| scanned >= limit) {
            tracing::warn!(%query, %start, scanned, "scan limit reached without a match");
            return Err(ScrollError::ScanLimitExceeded { scanned });
        }

        index = index.step(1, direction);
        scanned += 1;

        let uuid = codec::render_index(index, keys);
        if needle.is_empty() || uuid.windows(needle.len()).any(|w| w == needle) {
            tracing::debug!(%query, %index, scanned, "scan matched");
            return Ok(index);
        }
    }
}

/// Solves every pattern and keeps the solution closest to `start`; ties go to the earliest
/// pattern.
fn nearest_solution(
    patterns: &[Pattern],
    start: UuidIndex,
    direction: Direction,
    keys: &KeyMaterial,
) -> Option<UuidIndex> {
    let mut best: Option<(u128, UuidIndex)> = None;

    for pattern in patterns {
        let Some(solution) = solve_pattern(pattern, start, direction, keys) else {
            continue;
        };
        let distance = start.distance_to(solution, direction);
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, solution));
        }
    }

    best.map(|(_, solution)| solution)
}

fn solve_pattern(
    pattern: &Pattern,
    start: UuidIndex,
    direction: Direction,
    keys: &KeyMaterial,
) -> Option<UuidIndex> {
    let mut equations: Vec<Equation> = keys
        .matrix()
        .iter()
        .zip(pattern.constraints())
        .filter_map(|(row, known)| known.map(|target| Equation::new(*row, target)))
        .collect();

    if !gf2::to_row_echelon_form(&mut equations) {
        tracing::debug!(%pattern, "constraint system is inconsistent");
        return None;
    }

    let solution = nearest_assignment(
        &mut equations,
        codec::offset(start.value()),
        ENTROPY_BITS,
        direction,
    );
    let index = UuidIndex::wrapping(codec::unoffset(solution));
    tracing::trace!(%pattern, %index, "solved pattern");
    Some(index)
}

/// Finds the assignment of the low `bits` variables nearest to `origin` in `direction`.
///
/// `equations` must be in row-echelon form with its highest pivot last. Bits are fixed from
/// the most significant down:
/// - a bit pinned by the last equation takes the forced value;
/// - once the prefix differs from `origin`, free bits take the value that keeps the rest
///   closest (`0` forward, `1` backward);
/// - while the prefix still equals `origin`, a free bit first copies `origin`'s bit and the
///   lower bits are solved on a copy of the system. The copy is kept if it lands strictly
///   beyond `origin`, otherwise the bit is flipped and solving continues.
///
/// If nothing lies beyond `origin` within these bits, the result wraps to the solution
/// furthest back (forward) or furthest ahead (backward), which is the nearest one cyclically.
fn nearest_assignment(
    equations: &mut Vec<Equation>,
    origin: u128,
    bits: u32,
    direction: Direction,
) -> u128 {
    let mut solution = 0u128;

    for i in (0..bits).rev() {
        let mask = 1u128 << i;
        let above = !((mask << 1).wrapping_sub(1));

        let forced = match equations.last() {
            Some(last) if last.row == mask => Some(last.target),
            _ => None,
        };

        let bit = if let Some(target) = forced {
            equations.pop();
            target
        } else if origin & above != solution {
            direction.nearest_free_bit()
        } else {
            let guess = origin & mask != 0;
            let below = origin & (mask - 1);

            let mut branch = equations.clone();
            gf2::back_substitute(&mut branch, i, guess);
            let candidate = nearest_assignment(&mut branch, below, i, direction);
            if direction.is_beyond(candidate, below) {
                return candidate | (origin & !(mask - 1));
            }
            !guess
        };

        gf2::back_substitute(equations, i, bit);
        if bit {
            solution |= mask;
        }
    }

    solution
}
