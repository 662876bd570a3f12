use crate::error::CpfSheetError;
use crate::ingest::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;

/// How the raw text of a cell is to be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// `1`/`0` or `true`/`false`
    Boolean,
    /// Decimal number text, e.g. `52998224725` or `1.2E+10`
    Number,
    /// Literal text
    InlineString,
    /// Index into the workbook's shared string table
    SharedString,
}

/// A decoded cell before conversion to a row value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// 0-based row index
    pub(crate) row: usize,
    /// 0-based column index
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn text(row: usize, col: usize, value: &str) -> Self {
        Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        }
    }

    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the raw text into a typed value.
    ///
    /// Empty text and empty shared strings resolve to `CellValue::Empty` so that
    /// lookups treat them as absent.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<CellValue, CpfSheetError> {
        let value = match self.kind {
            CellType::Empty => CellValue::Empty,
            CellType::Boolean => CellValue::Boolean(matches!(self.value.trim(), "1" | "true" | "TRUE")),
            CellType::Number => CellValue::Number(self.value.trim().parse::<f64>().map_err(|_| self.invalid())?),
            CellType::InlineString => CellValue::from(self.value.as_str()),
            CellType::SharedString => {
                let index = self.value.trim().parse::<usize>()?;
                let text = shared_strings.get(index).ok_or_else(|| self.invalid())?;
                CellValue::from(text.as_str())
            }
        };
        Ok(match value {
            CellValue::Text(text) if text.is_empty() => CellValue::Empty,
            value => value,
        })
    }

    fn invalid(&self) -> SpreadsheetError {
        SpreadsheetError::CellValueError(self.reference(), self.value.to_owned())
    }
}
