//! Search configuration.
//!
//! Resolved once by the caller (CLI flags, server environment) and passed into each search, so
//! no search reads process-wide state.

/// Tunables for [`find_next_index_with`](crate::find_next_index_with).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Upper bound on indexes visited by the brute-force scan used for one- and two-character
    /// queries. `None` scans until a match is found.
    pub max_scan: Option<u64>,
}

impl SearchConfig {
    /// A configuration that scans without limit.
    pub const fn unbounded() -> Self {
        Self { max_scan: None }
    }

    pub const fn with_max_scan(max_scan: u64) -> Self {
        Self {
            max_scan: Some(max_scan),
        }
    }
}
