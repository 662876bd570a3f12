use crate::error::CpfSheetError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Excel-style rectangle limiting the cells read from a sheet.
/// Bounds are 0-based and inclusive; `None` leaves that side open.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Range {
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Range {
    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        !self.before_row(row)
            && !self.after_row(row)
            && self.col_lower_bound.map(|lower| lower <= col).unwrap_or(true)
            && self.col_upper_bound.map(|upper| col <= upper).unwrap_or(true)
    }

    pub(crate) fn before_row(&self, row: usize) -> bool {
        self.row_lower_bound.map(|lower| row < lower).unwrap_or(false)
    }

    /// True once `row` is past the last row of the range; decoders stop there.
    pub(crate) fn after_row(&self, row: usize) -> bool {
        self.row_upper_bound.map(|upper| upper < row).unwrap_or(false)
    }
}

impl TryFrom<&str> for Range {
    type Error = CpfSheetError;

    /// Parses `A1`, `B2:C5`, `A3:`, `B:D` or `2:100`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let value = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let bound = |index: usize, parse: fn(&str) -> Option<usize>| {
            captures
                .get(index)
                .map(|matcher| matcher.as_str())
                .filter(|text| !text.is_empty())
                .map(|text| parse(text).ok_or_else(|| RangeError::FormatError(value.to_owned())))
                .transpose()
        };
        Ok(Range {
            col_lower_bound: bound(1, col_to_index)?,
            row_lower_bound: bound(2, row_to_index)?,
            col_upper_bound: bound(4, col_to_index)?,
            row_upper_bound: bound(5, row_to_index)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(value: &str) -> Range {
        Range::try_from(value).unwrap()
    }

    #[test]
    fn full_range() {
        assert_eq!(
            range("a2:c10"),
            Range {
                row_lower_bound: Some(1),
                row_upper_bound: Some(9),
                col_lower_bound: Some(0),
                col_upper_bound: Some(2),
            }
        );
    }

    #[test]
    fn open_ranges() {
        assert_eq!(
            range("A3:"),
            Range {
                row_lower_bound: Some(2),
                col_lower_bound: Some(0),
                ..Range::default()
            }
        );
        assert_eq!(
            range("B:D"),
            Range {
                col_lower_bound: Some(1),
                col_upper_bound: Some(3),
                ..Range::default()
            }
        );
        assert_eq!(
            range("2:100"),
            Range {
                row_lower_bound: Some(1),
                row_upper_bound: Some(99),
                ..Range::default()
            }
        );
    }

    #[test]
    fn invalid_ranges() {
        assert!(Range::try_from("A1-C3").is_err());
        assert!(Range::try_from("1A").is_err());
        assert!(Range::try_from("A0").is_err());
    }

    #[test]
    fn containment() {
        let range = range("B2:C3");
        assert!(range.contains(1, 1));
        assert!(range.contains(2, 2));
        assert!(!range.contains(0, 1));
        assert!(!range.contains(1, 0));
        assert!(!range.contains(1, 3));
        assert!(range.after_row(3));
        assert!(range.before_row(0));
        assert!(Range::default().contains(1_000_000, 16_383));
    }
}
