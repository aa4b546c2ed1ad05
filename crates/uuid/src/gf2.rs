//! Linear algebra over GF(2).
//!
//! Rows are bit-vectors packed into a `u128`: bit `j` of a row is the coefficient of variable
//! `j`. Addition is XOR and multiplication is AND. A matrix is a slice of rows in row-major
//! order.
//!
//! Two shapes of system are handled here:
//! - Square matrices (rank, inversion) for key generation.
//! - Lists of [`Equation`]s, each a constraint row paired with its target bit, for search.

/// One linear equation `row · x = target` over GF(2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Equation {
    pub row: u128,
    pub target: bool,
}

impl Equation {
    pub const fn new(row: u128, target: bool) -> Self {
        Self { row, target }
    }
}

/// Parity of the set bits in `value`.
#[inline]
pub fn parity(value: u128) -> bool {
    value.count_ones() & 1 == 1
}

/// Matrix-vector product: output bit `i` is `parity(matrix[i] & vector)`.
pub fn multiply(matrix: &[u128], vector: u128) -> u128 {
    matrix
        .iter()
        .enumerate()
        .filter(|(_, row)| parity(*row & vector))
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

/// Returns the number of linearly independent rows.
///
/// Eliminates on the lowest bit: a row with bit 0 set becomes the pivot, is XORed into every
/// other row sharing that bit, and everything shifts right by one. The loop runs at most 128
/// times.
pub fn rank(rows: &[u128]) -> usize {
    let mut rows: Vec<u128> = rows.iter().copied().filter(|row| *row != 0).collect();
    let mut rank = 0;

    while !rows.is_empty() {
        if let Some(pivot) = rows.iter().copied().find(|row| row & 1 == 1) {
            rank += 1;
            for row in rows.iter_mut() {
                if *row & 1 == 1 {
                    *row ^= pivot;
                }
            }
        }
        for row in rows.iter_mut() {
            *row >>= 1;
        }
        rows.retain(|row| *row != 0);
    }

    rank
}

/// True when the square matrix has full rank.
pub fn is_invertible(matrix: &[u128]) -> bool {
    rank(matrix) == matrix.len()
}

/// Inverts a square matrix by Gauss-Jordan elimination.
///
/// Each row is paired with the matching identity row; eliminating the left side down to the
/// identity leaves the inverse on the right.
///
/// Returns `None` if the matrix is singular.
pub fn invert(matrix: &[u128]) -> Option<Vec<u128>> {
    let size = matrix.len();
    if size > u128::BITS as usize {
        return None;
    }

    let mut pairs: Vec<(u128, u128)> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| (*row, 1 << i))
        .collect();

    for column in 0..size {
        let mask = 1u128 << column;
        let pivot = (column..size).find(|&i| pairs[i].0 & mask != 0)?;
        pairs.swap(column, pivot);

        let (pivot_row, pivot_inverse) = pairs[column];
        for (i, pair) in pairs.iter_mut().enumerate() {
            if i != column && pair.0 & mask != 0 {
                pair.0 ^= pivot_row;
                pair.1 ^= pivot_inverse;
            }
        }
    }

    Some(pairs.into_iter().map(|(_, inverse)| inverse).collect())
}

/// Reduces a system of equations to row-echelon form.
///
/// Pivots are taken at increasing columns, so each row's lowest set bit lies strictly to the
/// left of the next row's and the last row holds the highest pivot. Trivially satisfied
/// equations (`0 = 0`) are dropped.
///
/// Returns `false` if the system is inconsistent (some equation reduces to `0 = 1`).
pub fn to_row_echelon_form(equations: &mut Vec<Equation>) -> bool {
    let mut row = 0;
    let mut column = 0;

    while row < equations.len() && column < u128::BITS {
        let mask = 1u128 << column;
        let Some(pivot) = (row..equations.len()).find(|&i| equations[i].row & mask != 0) else {
            if equations[row..].iter().any(|eq| eq.row != 0) {
                column += 1;
                continue;
            }
            break;
        };
        equations.swap(row, pivot);

        let pivot_eq = equations[row];
        for eq in equations[row + 1..].iter_mut() {
            if eq.row & mask != 0 {
                eq.row ^= pivot_eq.row;
                eq.target ^= pivot_eq.target;
            }
        }

        row += 1;
        column += 1;
    }

    // Everything from `row` onwards has been reduced to zero rows.
    let consistent = equations[row..].iter().all(|eq| !eq.target);
    equations.truncate(row);
    consistent
}

/// Substitutes the known `value` of variable `column` into the system.
///
/// Every equation with a coefficient at `column` absorbs the value into its target and has that
/// column, and any column above it, cleared. Callers assign variables from the most significant
/// down, so higher columns are already eliminated and the call can be repeated as each new
/// variable becomes known.
pub fn back_substitute(equations: &mut [Equation], column: u32, value: bool) {
    let mask = 1u128 << column;
    for eq in equations.iter_mut() {
        if eq.row & mask != 0 {
            eq.row &= mask - 1;
            eq.target ^= value;
        }
    }
}
