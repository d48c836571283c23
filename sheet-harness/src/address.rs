//! A1-style spreadsheet addresses.
//!
//! Rows and columns are **1-based** here, matching what the agent sees:
//! `A1` is `row = 1, col = 1`.

use std::fmt;

use thiserror::Error;

/// Last column Excel accepts (`XFD`).
pub const MAX_COLS: u32 = 16_384;
/// Last row Excel accepts.
pub const MAX_ROWS: u32 = 1_048_576;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty reference")]
    Empty,
    #[error("missing column letters")]
    MissingColumn,
    #[error("missing row number")]
    MissingRow,
    #[error("invalid column")]
    InvalidColumn,
    #[error("invalid row")]
    InvalidRow,
    #[error("trailing characters")]
    TrailingCharacters,
}

/// Convert column letters to a 1-based index (`A` -> 1, `AA` -> 27).
pub fn column_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::MissingColumn);
    }
    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(AddressError::InvalidColumn);
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .ok_or(AddressError::InvalidColumn)?;
    }
    Ok(col)
}

/// Convert a 1-based column index to letters (27 -> `AA`). Zero yields `""`.
pub fn column_letters(index: u32) -> String {
    let mut n = index;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse `A1`, `$B$2`, `c3`. Surrounding whitespace is ignored.
    pub fn parse(a1: &str) -> Result<Self, AddressError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let bytes = s.as_bytes();
        let mut idx = 0usize;
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }
        if idx == col_start {
            return Err(AddressError::MissingColumn);
        }
        let col_str = &s[col_start..idx];

        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == row_start {
            return Err(AddressError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(AddressError::TrailingCharacters);
        }

        let col = column_index(col_str)?;
        if col > MAX_COLS {
            return Err(AddressError::InvalidColumn);
        }
        let row: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| AddressError::InvalidRow)?;
        if row == 0 || row > MAX_ROWS {
            return Err(AddressError::InvalidRow);
        }

        Ok(Self { row, col })
    }

    /// Shift by a row/column delta. Returns `None` when the result leaves the grid.
    pub fn offset(self, rows: i64, cols: i64) -> Option<Self> {
        let row = self.row as i64 + rows;
        let col = self.col as i64 + cols;
        if row < 1 || col < 1 || row > MAX_ROWS as i64 || col > MAX_COLS as i64 {
            return None;
        }
        Some(Self::new(row as u32, col as u32))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// An inclusive rectangle, normalized so `start` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `A1:B2`, `$A$1:$B$2`, or a single cell `C3`.
    pub fn parse(a1: &str) -> Result<Self, AddressError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        match s.split_once(':') {
            None => {
                let cell = CellRef::parse(s)?;
                Ok(Self::new(cell, cell))
            }
            Some((a, b)) => Ok(Self::new(CellRef::parse(a)?, CellRef::parse(b)?)),
        }
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_round_trip_boundaries() {
        assert_eq!(column_index("A").unwrap(), 1);
        assert_eq!(column_index("z").unwrap(), 26);
        assert_eq!(column_index("AA").unwrap(), 27);
        assert_eq!(column_index("XFD").unwrap(), MAX_COLS);
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
        assert_eq!(column_letters(0), "");
    }

    #[test]
    fn test_column_index_rejects_garbage() {
        assert_eq!(column_index(""), Err(AddressError::MissingColumn));
        assert_eq!(column_index("A1"), Err(AddressError::InvalidColumn));
        assert_eq!(column_index("ZZZZZZZZZZZZ"), Err(AddressError::InvalidColumn));
    }

    #[test]
    fn test_parse_cell_variants() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(1, 1));
        assert_eq!(CellRef::parse("$B$2").unwrap(), CellRef::new(2, 2));
        assert_eq!(CellRef::parse(" d10 ").unwrap(), CellRef::new(10, 4));
        assert_eq!(CellRef::parse("AA100").unwrap().to_string(), "AA100");
    }

    #[test]
    fn test_parse_cell_errors() {
        assert_eq!(CellRef::parse(""), Err(AddressError::Empty));
        assert_eq!(CellRef::parse("12"), Err(AddressError::MissingColumn));
        assert_eq!(CellRef::parse("1A"), Err(AddressError::MissingColumn));
        assert_eq!(CellRef::parse("A"), Err(AddressError::MissingRow));
        assert_eq!(CellRef::parse("A0"), Err(AddressError::InvalidRow));
        assert_eq!(CellRef::parse("A1B"), Err(AddressError::TrailingCharacters));
        assert_eq!(CellRef::parse("XFE1"), Err(AddressError::InvalidColumn));
        assert_eq!(CellRef::parse("A1048577"), Err(AddressError::InvalidRow));
    }

    #[test]
    fn test_parse_range_normalizes() {
        let r = CellRange::parse("C5:A1").unwrap();
        assert_eq!(r.start, CellRef::new(1, 1));
        assert_eq!(r.end, CellRef::new(5, 3));
        assert_eq!(r.rows(), 5);
        assert_eq!(r.cols(), 3);
        assert_eq!(r.to_string(), "A1:C5");

        let single = CellRange::parse("$B$2").unwrap();
        assert!(single.is_single_cell());
        assert_eq!(single.to_string(), "B2");
    }

    #[test]
    fn test_range_contains_and_offset() {
        let r = CellRange::parse("B2:C3").unwrap();
        assert!(r.contains(CellRef::new(2, 2)));
        assert!(r.contains(CellRef::new(3, 3)));
        assert!(!r.contains(CellRef::new(1, 2)));
        assert_eq!(CellRef::new(2, 2).offset(1, -1), Some(CellRef::new(3, 1)));
        assert_eq!(CellRef::new(1, 1).offset(-1, 0), None);
    }

    #[test]
    fn test_parse_range_bad_half() {
        assert_eq!(CellRange::parse("A1:"), Err(AddressError::Empty));
        assert_eq!(CellRange::parse("A1:B"), Err(AddressError::MissingRow));
    }
}
