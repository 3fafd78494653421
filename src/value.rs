//! Cell values exchanged with the workbook.
//!
//! `CellValue` is a closed variant over the value kinds the underlying
//! spreadsheet library round-trips: empty, number, boolean, text, and a
//! row-major table for multi-cell ranges. Anything richer (formats, charts,
//! formulas) stays with the spreadsheet library.

/// A value read from or written to a cell range.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    /// Row-major rows of scalar values, produced by multi-cell reads and
    /// accepted by multi-cell writes. Rows may be ragged.
    Table(Vec<Vec<CellValue>>),
}

impl CellValue {
    /// The numeric value, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The text content, if this is a `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The table rows, if this is a `Table`.
    pub fn as_table(&self) -> Option<&[Vec<CellValue>]> {
        match self {
            CellValue::Table(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

/// Lossy above 2^53: spreadsheet numbers are f64, so very large integers
/// round to the nearest representable value on conversion.
impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<Vec<Vec<CellValue>>> for CellValue {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        CellValue::Table(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_expected_variant() {
        assert_eq!(CellValue::from(42.0), CellValue::Number(42.0));
        assert_eq!(CellValue::from(7), CellValue::Number(7.0));
        assert_eq!(CellValue::from(41i64), CellValue::Number(41.0));
        // i64 -> f64 rounds above 2^53.
        assert_eq!(
            CellValue::from((1i64 << 53) + 1),
            CellValue::Number(9_007_199_254_740_992.0)
        );
        assert_eq!(CellValue::from(true), CellValue::Bool(true));
        assert_eq!(CellValue::from("hi"), CellValue::Text("hi".to_string()));
        assert_eq!(
            CellValue::from(vec![vec![CellValue::Empty]]),
            CellValue::Table(vec![vec![CellValue::Empty]])
        );
    }

    #[test]
    fn accessors_are_variant_exact() {
        assert_eq!(CellValue::Number(1.5).as_number(), Some(1.5));
        assert_eq!(CellValue::Text("1.5".into()).as_number(), None);
        assert_eq!(CellValue::Bool(false).as_bool(), Some(false));
        assert_eq!(CellValue::Text("yes".into()).as_str(), Some("yes"));
        assert!(CellValue::Empty.is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }
}
