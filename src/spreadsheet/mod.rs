//! # Spreadsheet Decoding
//!
//! Turns an uploaded file into the header-keyed row objects consumed by the
//! ingestion mapper. Supported containers are Office Open XML workbooks
//! (`.xlsx`, `.xlsm`), OpenDocument spreadsheets (`.ods`) and delimited text
//! (`.csv`, `.tsv`, `.txt`).
pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod delimited;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::CpfSheetError;
use crate::ingest::Row;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::delimited::DelimitedSpreadsheet;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum SpreadsheetError {
    #[error("Unsupported file format '{0}', expected .xlsx, .xlsm, .ods, .csv, .tsv or .txt")]
    FormatError(String),

    #[error("Missing '{0}' in spreadsheet container")]
    FileError(String),

    #[error("No sheet matches '{0}'")]
    SheetNotFoundError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    PasswordProtectedError(String),

    #[error("No data rows in sheet '{0}'")]
    EmptyError(String),

    #[error("Invalid value '{1}' at {0}")]
    CellValueError(String, String),
}

/// A workbook opened for reading.
pub(crate) trait Spreadsheet {
    /// File name or URL the spreadsheet was opened from
    fn name(&self) -> String;

    /// Loads the shared string table; formats without one return an empty table.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, CpfSheetError>;

    /// Reads the first sheet accepted by `criteria`, or `None` if no sheet matches.
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, CpfSheetError>;
}

/// Row objects decoded from one sheet.
#[derive(Debug)]
pub(crate) struct SheetRows {
    pub(crate) file_name: String,
    pub(crate) sheet_name: String,
    pub(crate) rows: Vec<Row>,
}

/// Opens a spreadsheet, choosing the decoder from the file extension.
pub(crate) fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, CpfSheetError> {
    let extension = extension(file_name);
    tracing::debug!(file = file_name, extension = %extension, "opening spreadsheet");
    match extension.as_str() {
        "xlsx" | "xlsm" => Ok(Box::new(XlsxSpreadsheet::open(file_name)?)),
        "ods" => Ok(Box::new(OdsSpreadsheet::open(file_name)?)),
        "csv" => Ok(Box::new(DelimitedSpreadsheet::open(file_name, b',')?)),
        "tsv" | "txt" => Ok(Box::new(DelimitedSpreadsheet::open(file_name, b'\t')?)),
        _ => Err(SpreadsheetError::FormatError(file_name.to_owned()))?,
    }
}

/// Decodes the sheet selected by `criteria` into row objects.
pub(crate) fn read_rows(file_name: &str, criteria: &Criteria) -> Result<SheetRows, CpfSheetError> {
    let mut spreadsheet = open_spreadsheet(file_name)?;
    let shared_strings = spreadsheet.load_shared_strings()?;
    let sheet = spreadsheet.read_sheet(criteria)?.ok_or_else(|| {
        let pattern = criteria
            .sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.to_string())
            .unwrap_or_else(|| "*".to_owned());
        SpreadsheetError::SheetNotFoundError(pattern)
    })?;
    let sheet_name = sheet.name.to_owned();
    let rows = sheet.into_rows(criteria, &shared_strings)?;
    Ok(SheetRows {
        file_name: spreadsheet.name(),
        sheet_name,
        rows,
    })
}

/// Lower-cased extension of a path or URL, ignoring any query string.
fn extension(file_name: &str) -> String {
    let path = file_name.split(['?', '#']).next().unwrap_or(file_name);
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Writes a ZIP container with the given entries to a temporary file
    /// whose name ends in `suffix`.
    pub(crate) fn zip_fixture(suffix: &str, entries: &[(&str, &str)]) -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        let mut writer = ZipWriter::new(file.reopen().unwrap());
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    pub(crate) fn text_fixture(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    pub(crate) fn path(file: &NamedTempFile) -> &str {
        file.path().to_str().unwrap()
    }

    #[test]
    fn extensions() {
        assert_eq!(extension("cadastro.XLSX"), "xlsx");
        assert_eq!(extension("/uploads/lote.2024.csv"), "csv");
        assert_eq!(extension("https://example.com/lote.ods?token=a.b"), "ods");
        assert_eq!(extension("s3://bucket/dir.v2/arquivo"), "");
        assert_eq!(extension("arquivo"), "");
    }

    #[test]
    fn rejects_unknown_formats() {
        let error = open_spreadsheet("cadastro.pdf").err().unwrap();
        assert!(matches!(error, CpfSheetError::SpreadsheetError(SpreadsheetError::FormatError(_))));
    }

    #[test]
    fn reads_rows_from_csv() {
        let file = text_fixture(".csv", b"nome,cpf\nAna,529.982.247-25\n");
        let rows = read_rows(path(&file), &Criteria::default()).unwrap();
        assert_eq!(rows.rows.len(), 1);
        assert_eq!(rows.file_name, path(&file));
        assert_eq!(rows.rows[0].get("cpf").map(ToString::to_string).as_deref(), Some("529.982.247-25"));
    }

    #[test]
    fn reports_missing_sheet() {
        let file = text_fixture(".csv", b"cpf\n52998224725\n");
        let criteria = Criteria {
            sheet_name_pattern: Some(glob::Pattern::new("Resumo").unwrap()),
            ..Criteria::default()
        };
        let error = read_rows(path(&file), &criteria).unwrap_err();
        assert_eq!(error.to_string(), "No sheet matches 'Resumo'");
    }
}
