//! Cell identity for the grid arena.
//!
//! A `CellId` is a `(row, col)` index pair into the grid. All cross-cell
//! relations (dependency edges, events, commands) are expressed through
//! `CellId`s rather than cell references.

use serde::{Deserialize, Serialize};

/// Unique identifier for a cell in a grid.
///
/// Used as graph nodes in the dependency graph and as the address carried
/// by events and commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based, at most 25: single-letter columns only)
    pub col: usize,
}

impl CellId {
    /// Create a new CellId.
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The cell's display name, e.g. `(0, 0)` → "A1".
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'A' + self.col as u8) as char, self.row + 1)
    }
}

/// Parse an "A1"-style name into a CellId.
///
/// Accepts a single column letter (case-insensitive) followed by a 1-based
/// row number. Returns `None` for anything else; bounds against an actual
/// grid are the caller's concern.
pub fn parse_name(name: &str) -> Option<CellId> {
    let mut chars = name.chars();
    let col_ch = chars.next()?;
    if !col_ch.is_ascii_alphabetic() {
        return None;
    }
    let col = (col_ch.to_ascii_uppercase() as u8 - b'A') as usize;

    let row_str = chars.as_str();
    if row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: usize = row_str.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some(CellId::new(row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CellId::new(0, 0).to_string(), "A1");
        assert_eq!(CellId::new(9, 25).to_string(), "Z10");
        assert_eq!(CellId::new(41, 1).name(), "B42");
    }

    #[test]
    fn test_parse_name_valid() {
        assert_eq!(parse_name("A1"), Some(CellId::new(0, 0)));
        assert_eq!(parse_name("Z10"), Some(CellId::new(9, 25)));
        assert_eq!(parse_name("b42"), Some(CellId::new(41, 1)));
    }

    #[test]
    fn test_parse_name_round_trip() {
        let id = CellId::new(7, 3);
        assert_eq!(parse_name(&id.name()), Some(id));
    }

    #[test]
    fn test_parse_name_invalid() {
        assert_eq!(parse_name(""), None);
        assert_eq!(parse_name("A"), None);
        assert_eq!(parse_name("1"), None);
        assert_eq!(parse_name("1A"), None);
        assert_eq!(parse_name("A0"), None);
        assert_eq!(parse_name("AA1"), None); // multi-letter columns unsupported
        assert_eq!(parse_name("A1B"), None);
        assert_eq!(parse_name("A 1"), None);
    }

    #[test]
    fn test_cell_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(CellId::new(0, 0));
        set.insert(CellId::new(0, 0)); // duplicate
        set.insert(CellId::new(1, 0));

        assert_eq!(set.len(), 2);
    }
}
