use std::fmt::Display;

/// Scalar held by one cell of a row object.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CellValue {
    /// Absent or null; lookups treat it as if the key were missing
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl CellValue {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl Display for CellValue {
    /// Renders the value the way spreadsheet-to-JSON conversion stringifies it:
    /// integral numbers without fraction or exponent, booleans as `true`/`false`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) if *value == 0.0 => f.write_str("0"),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

/// One spreadsheet row keyed by column name, in source column order.
///
/// Column names are not known in advance and vary from file to file.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a cell; order of insertion is the iteration order.
    pub(crate) fn push<K: Into<String>, V: Into<CellValue>>(&mut self, key: K, value: V) {
        self.cells.push((key.into(), value.into()));
    }

    /// Returns the first non-empty value stored under exactly `key`.
    pub(crate) fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, value)| name == key && !value.is_empty())
            .map(|(_, value)| value)
    }

    /// Returns the first non-empty cell in column order with its key.
    pub(crate) fn first_value(&self) -> Option<(&str, &CellValue)> {
        self.cells
            .iter()
            .find(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.as_str(), value))
    }

    /// True when the row holds no non-empty cell.
    pub(crate) fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_empty())
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.push(key, value);
        }
        row
    }
}

#[cfg(test)]
impl Row {
    /// Number of cells, empty ones included.
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }
}
