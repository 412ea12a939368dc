//! Multi-value cell splitting.

/// Split a PIC or department cell into its owners.
///
/// Separators are `,` and `/`. Entries are trimmed and upper-cased; empty
/// entries are dropped.
pub fn split_owners(field: &str) -> Vec<String> {
    field
        .split([',', '/'])
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
