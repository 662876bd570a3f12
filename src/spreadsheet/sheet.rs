use crate::database::range::Range;
use crate::error::CpfSheetError;
use crate::ingest::CellValue;
use crate::ingest::Row;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::index_to_col;
use std::collections::HashMap;
use std::collections::HashSet;

/// Key given to a column whose header cell is empty.
pub(crate) const EMPTY_HEADER: &str = "__EMPTY";

/// Cells collected from one sheet, inside the requested range.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    range: Range,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str, range: Range) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            range,
        }
    }

    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        self.range.contains(row, col)
    }

    /// Decoders stop reading once this holds; rows arrive in ascending order.
    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.after_row(row)
    }

    /// Adds a cell if it lies inside the range.
    pub(crate) fn push(&mut self, cell: Cell) {
        if self.contains(cell.row, cell.col) {
            self.cells.push(cell);
        }
    }

    /// Converts the cells into header-keyed row objects.
    ///
    /// With `criteria.header` the first non-empty row names the columns: empty
    /// names become `__EMPTY`, `__EMPTY_1`, ... and repeated names get `_1`, `_2`,
    /// ... suffixes. Without it the column letters are the keys. Empty cells are
    /// left out of each row. Rows with no value at all are dropped when
    /// `criteria.skip_empty_rows` is set and kept as empty rows otherwise.
    pub(crate) fn into_rows(self, criteria: &Criteria, shared_strings: &[String]) -> Result<Vec<Row>, CpfSheetError> {
        let mut values = Vec::<(usize, usize, CellValue)>::with_capacity(self.cells.len());
        for cell in &self.cells {
            let value = cell.to_value(shared_strings)?;
            if !value.is_empty() {
                values.push((cell.row, cell.col, value));
            }
        }
        values.sort_by_key(|(row, col, _)| (*row, *col));

        let (Some(col_lower), Some(col_upper)) = (
            values.iter().map(|(_, col, _)| *col).min(),
            values.iter().map(|(_, col, _)| *col).max(),
        ) else {
            return Ok(Vec::new());
        };

        let mut lines = group_by_row(values).into_iter().peekable();
        let header_row = if criteria.header { lines.peek().map(|(row, _)| *row) } else { None };
        let (keys, mut previous_row) = match header_row {
            Some(header_row) => {
                let mut names = vec![String::new(); col_upper - col_lower + 1];
                if let Some((_, cells)) = lines.next() {
                    for (col, value) in cells {
                        names[col - col_lower] = value.to_string();
                    }
                }
                (header_keys(names), Some(header_row))
            }
            None => ((col_lower..=col_upper).map(index_to_col).collect(), None),
        };

        let mut rows = Vec::<Row>::new();
        for (row, cells) in lines {
            if !criteria.skip_empty_rows {
                if let Some(previous_row) = previous_row {
                    for _ in previous_row + 1..row {
                        rows.push(Row::new());
                    }
                }
            }
            previous_row = Some(row);
            rows.push(
                cells
                    .into_iter()
                    .map(|(col, value)| (keys[col - col_lower].to_owned(), value))
                    .collect(),
            );
        }

        tracing::debug!(
            file = %self.file_name,
            sheet = %self.name,
            columns = keys.len(),
            rows = rows.len(),
            "decoded sheet rows"
        );
        Ok(rows)
    }
}

/// Groups row-major sorted values into `(row, [(col, value)])`.
fn group_by_row(values: Vec<(usize, usize, CellValue)>) -> Vec<(usize, Vec<(usize, CellValue)>)> {
    let mut lines = Vec::<(usize, Vec<(usize, CellValue)>)>::new();
    for (row, col, value) in values {
        match lines.last_mut() {
            Some((last_row, cells)) if *last_row == row => cells.push((col, value)),
            _ => lines.push((row, vec![(col, value)])),
        }
    }
    lines
}

/// Makes header names unique and non-empty.
pub(crate) fn header_keys(names: Vec<String>) -> Vec<String> {
    let mut counters = HashMap::<String, usize>::new();
    let mut used = HashSet::<String>::new();
    names
        .into_iter()
        .map(|name| {
            let base = if name.is_empty() { EMPTY_HEADER.to_owned() } else { name };
            let mut key = base.to_owned();
            while used.contains(&key) {
                let counter = counters.entry(base.to_owned()).or_insert(0);
                *counter += 1;
                key = format!("{base}_{counter}");
            }
            used.insert(key.to_owned());
            key
        })
        .collect()
}
