use crate::error::CpfSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

const MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged cell
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Comment attached to a cell
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of `text:c` spaces
const SPACE: QName = QName(b"text:s");
const TAB: QName = QName(b"text:tab");
const LINE_BREAK: QName = QName(b"text:line-break");
const FILE_ENTRY: QName = QName(b"manifest:file-entry");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

#[derive(Error, Debug)]
pub(crate) enum OdsError {
    #[error("Invalid ODS MIME type '{0}'")]
    MimeTypeError(String),
}

/// An OpenDocument spreadsheet (`.ods`).
pub(crate) struct OdsSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<UnifiedReader>,
}

impl OdsSpreadsheet {
    pub(crate) fn open(file_name: &str) -> Result<Self, CpfSheetError> {
        let mut zip = ZipArchive::new(UnifiedReader::new(file_name)?)?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::PasswordProtectedError(file_name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: file_name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    /// Strings are stored inline in `content.xml`.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, CpfSheetError> {
        Ok(Vec::new())
    }

    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, CpfSheetError> {
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
        let mut selected = None::<Sheet>;

        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut element_context = false; // reading the text children of a string cell
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::Start(event) if selected.is_none() && event.name() == TABLE => {
                let table_name = event
                    .get_attribute_value("table:name")?
                    .map(Cow::into_owned)
                    .unwrap_or_default();
                if criteria.accept(&table_name) {
                    selected = Some(Sheet::new(&self.name, &table_name, criteria.range()));
                }
            }
            Event::End(event) if selected.is_some() && event.name() == TABLE => break,
            Event::Start(event) if selected.is_some() && event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                if let Some(sheet) = &selected {
                    row += row_count;
                    if sheet.after_row_upper_bound(row) {
                        break;
                    }
                }
            }
            Event::Start(event) if selected.is_some() && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
                value.clear();
                col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                let is_error = event
                    .get_attribute_value("calcext:value-type")?
                    .map(|value_type| value_type == "error")
                    .unwrap_or(false);
                (kind, element_context) = match value_type.as_deref() {
                    None => (CellType::Empty, false),
                    Some(_) if is_error => (CellType::Empty, false),
                    Some("string") => (CellType::InlineString, true),
                    Some("boolean") => {
                        let truth = event
                            .get_attribute_value("office:boolean-value")?
                            .map(|truth| truth != "false" && truth != "0")
                            .unwrap_or(false);
                        value.push_str(if truth { "1" } else { "0" });
                        (CellType::Boolean, false)
                    }
                    Some("date") => {
                        value.push_str(&event.get_attribute_value("office:date-value")?.unwrap_or_default());
                        (CellType::InlineString, false)
                    }
                    Some("time") => {
                        value.push_str(&event.get_attribute_value("office:time-value")?.unwrap_or_default());
                        (CellType::InlineString, false)
                    }
                    // float, percentage and currency
                    Some(_) => {
                        value.push_str(&event.get_attribute_value("office:value")?.unwrap_or_default());
                        (CellType::Number, false)
                    }
                };
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(sheet) = &mut selected {
                    if kind != CellType::Empty && !value.is_empty() {
                        for row_number in row..row + row_count {
                            if sheet.after_row_upper_bound(row_number) {
                                break;
                            }
                            for col_number in col..col + col_count {
                                sheet.push(Cell {
                                    row: row_number,
                                    col: col_number,
                                    kind,
                                    value: value.to_owned(),
                                });
                            }
                        }
                    }
                    col += col_count;
                }
                kind = CellType::Empty;
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == SPACE => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.extend(std::iter::repeat(' ').take(count));
            }
            Event::Start(event) if element_context && !comment_context && event.name() == TAB => value.push('\t'),
            Event::Start(event) if element_context && !comment_context && event.name() == LINE_BREAK => value.push('\n'),
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });

        if let Some(sheet) = &selected {
            tracing::debug!(file = %self.name, sheet = %sheet.name, cells = sheet.cells.len(), "read ods sheet");
        }
        Ok(selected)
    }
}

/// Rejects containers whose `mimetype` entry names another document type.
fn check_mime(zip: &mut ZipArchive<UnifiedReader>) -> Result<(), CpfSheetError> {
    if let Some(mut file) = zip.file("mimetype")? {
        let mut mime_type = String::new();
        file.read_to_string(&mut mime_type)?;
        if mime_type.trim() != MIME_TYPE {
            Err(OdsError::MimeTypeError(mime_type.trim().to_owned()))?;
        }
    }
    Ok(())
}

/// Encrypted entries carry `manifest:encryption-data` in the manifest.
fn is_password_protected(zip: &mut ZipArchive<UnifiedReader>) -> Result<bool, CpfSheetError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}
