use thiserror::Error;

/// Main error type for the CPF sheet extension.
/// Aggregates errors from the standard library, dependencies and the caller-side modules.
/// The CPF core itself never fails.
#[derive(Error, Debug)]
pub(crate) enum CpfSheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Third-party library errors
    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    UnifiedReaderError(#[from] crate::helpers::reader::UnifiedReaderError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Database module errors
    #[error("{0}")]
    RangeError(#[from] crate::database::range::RangeError),

    // Extension module errors
    #[error("{0}")]
    ExtensionError(#[from] crate::extension::ExtensionError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, CpfSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| CpfSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::SpreadsheetError;

    #[test]
    fn prefix_wraps_message() {
        let result: Result<(), CpfSheetError> = Err(SpreadsheetError::EmptyError("Cadastro".to_owned()).into());
        let error = result.with_prefix("cadastro.xlsx").unwrap_err();
        assert!(matches!(error, CpfSheetError::WithContextError(_)));
        assert_eq!(error.to_string(), "cadastro.xlsx: No data rows in sheet 'Cadastro'");
    }

    #[test]
    fn prefix_keeps_ok() {
        let result: Result<usize, CpfSheetError> = Ok(3);
        assert_eq!(result.with_prefix("ignored").unwrap(), 3);
    }
}
