//! # Extension Core Module
//!
//! Parameter handling shared by the table functions and the decode-then-map
//! step they run at bind time.
use crate::database::range::Range;
use crate::error::CpfSheetError;
use crate::ingest::map_rows;
use crate::ingest::CpfBatch;
use crate::ingest::MappingOptions;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::read_rows;
use crate::spreadsheet::SpreadsheetError;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use glob::Pattern;
use thiserror::Error;

pub(crate) mod check_cpf;
pub(crate) mod read_cpf_sheet;
pub(crate) mod summarize_cpf_sheet;
pub(crate) mod writer;

/// Rows handed out per `func` call.
pub(crate) const CHUNK_SIZE: usize = 2048;

#[derive(Error, Debug)]
pub(crate) enum ExtensionError {
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

/// A positional parameter.
pub(crate) trait Param<T> {
    fn kind() -> LogicalTypeHandle;

    fn read(bind: &BindInfo, index: u64) -> Result<T, CpfSheetError>;
}

/// A named parameter; absent parameters read as `None`.
pub(crate) trait NamedParam<T> {
    fn name() -> &'static str;

    fn kind() -> LogicalTypeHandle;

    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    fn read(bind: &BindInfo) -> Result<Option<T>, CpfSheetError>;
}

fn varchar() -> LogicalTypeHandle {
    LogicalTypeHandle::from(LogicalTypeId::Varchar)
}

fn boolean() -> LogicalTypeHandle {
    LogicalTypeHandle::from(LogicalTypeId::Boolean)
}

fn named_varchar(bind: &BindInfo, name: &str) -> Option<String> {
    bind.get_named_parameter(name).map(|value| value.to_string())
}

/// Parses DuckDB's text rendering of a BOOLEAN.
fn parse_bool(name: &str, value: &str) -> Result<bool, CpfSheetError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(ExtensionError::InvalidParameter {
            name: name.to_owned(),
            message: format!("'{value}' is not a boolean"),
        })?,
    }
}

/// Column names must not be blank.
fn parse_column_name(name: &str, value: String) -> Result<String, CpfSheetError> {
    if value.trim().is_empty() {
        Err(ExtensionError::InvalidParameter {
            name: name.to_owned(),
            message: "column name is empty".to_owned(),
        })?;
    }
    Ok(value)
}

/// Spreadsheet path or URL
pub(crate) struct FileParam;

/// Text to normalize
pub(crate) struct ValueParam;

pub(crate) struct SheetParam;

pub(crate) struct RangeParam;

pub(crate) struct HeaderParam;

pub(crate) struct SkipEmptyRowsParam;

pub(crate) struct CpfColumnParam;

pub(crate) struct NameColumnParam;

pub(crate) struct PhoneColumnParam;

impl Param<String> for FileParam {
    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo, index: u64) -> Result<String, CpfSheetError> {
        let file_name = bind.get_parameter(index).to_string();
        if file_name.trim().is_empty() {
            Err(ExtensionError::InvalidParameter {
                name: "file".to_owned(),
                message: "file name is empty".to_owned(),
            })?;
        }
        Ok(file_name)
    }
}

impl Param<String> for ValueParam {
    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo, index: u64) -> Result<String, CpfSheetError> {
        Ok(bind.get_parameter(index).to_string())
    }
}

impl NamedParam<Pattern> for SheetParam {
    fn name() -> &'static str {
        "sheet"
    }

    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo) -> Result<Option<Pattern>, CpfSheetError> {
        match named_varchar(bind, Self::name()) {
            Some(pattern) => Ok(Some(Pattern::new(&pattern)?)),
            None => Ok(None),
        }
    }
}

impl NamedParam<Range> for RangeParam {
    fn name() -> &'static str {
        "range"
    }

    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo) -> Result<Option<Range>, CpfSheetError> {
        match named_varchar(bind, Self::name()) {
            Some(range) => Ok(Some(Range::try_from(range.as_str())?)),
            None => Ok(None),
        }
    }
}

impl NamedParam<bool> for HeaderParam {
    fn name() -> &'static str {
        "header"
    }

    fn kind() -> LogicalTypeHandle {
        boolean()
    }

    fn read(bind: &BindInfo) -> Result<Option<bool>, CpfSheetError> {
        named_varchar(bind, Self::name())
            .map(|value| parse_bool(Self::name(), &value))
            .transpose()
    }
}

impl NamedParam<bool> for SkipEmptyRowsParam {
    fn name() -> &'static str {
        "skip_empty_rows"
    }

    fn kind() -> LogicalTypeHandle {
        boolean()
    }

    fn read(bind: &BindInfo) -> Result<Option<bool>, CpfSheetError> {
        named_varchar(bind, Self::name())
            .map(|value| parse_bool(Self::name(), &value))
            .transpose()
    }
}

impl NamedParam<String> for CpfColumnParam {
    fn name() -> &'static str {
        "cpf_column"
    }

    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, CpfSheetError> {
        named_varchar(bind, Self::name())
            .map(|value| parse_column_name(Self::name(), value))
            .transpose()
    }
}

impl NamedParam<String> for NameColumnParam {
    fn name() -> &'static str {
        "name_column"
    }

    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, CpfSheetError> {
        named_varchar(bind, Self::name())
            .map(|value| parse_column_name(Self::name(), value))
            .transpose()
    }
}

impl NamedParam<String> for PhoneColumnParam {
    fn name() -> &'static str {
        "phone_column"
    }

    fn kind() -> LogicalTypeHandle {
        varchar()
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, CpfSheetError> {
        named_varchar(bind, Self::name())
            .map(|value| parse_column_name(Self::name(), value))
            .transpose()
    }
}

/// Parameters shared by `read_cpf_sheet` and `summarize_cpf_sheet`.
#[derive(Debug)]
pub(crate) struct SheetParameters {
    pub(crate) file_name: String,
    pub(crate) sheet_name: Option<Pattern>,
    pub(crate) range: Option<Range>,
    pub(crate) header: Option<bool>,
    pub(crate) skip_empty_rows: Option<bool>,
    pub(crate) cpf_column: Option<String>,
    pub(crate) name_column: Option<String>,
    pub(crate) phone_column: Option<String>,
}

impl TryFrom<&BindInfo> for SheetParameters {
    type Error = CpfSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(SheetParameters {
            file_name: FileParam::read(bind, 0)?,
            sheet_name: SheetParam::read(bind)?,
            range: RangeParam::read(bind)?,
            header: HeaderParam::read(bind)?,
            skip_empty_rows: SkipEmptyRowsParam::read(bind)?,
            cpf_column: CpfColumnParam::read(bind)?,
            name_column: NameColumnParam::read(bind)?,
            phone_column: PhoneColumnParam::read(bind)?,
        })
    }
}

impl SheetParameters {
    pub(crate) fn positional() -> Vec<LogicalTypeHandle> {
        vec![FileParam::kind()]
    }

    pub(crate) fn named() -> Vec<(String, LogicalTypeHandle)> {
        vec![
            SheetParam::definition(),
            RangeParam::definition(),
            HeaderParam::definition(),
            SkipEmptyRowsParam::definition(),
            CpfColumnParam::definition(),
            NameColumnParam::definition(),
            PhoneColumnParam::definition(),
        ]
    }

    fn criteria(&self) -> Criteria {
        let defaults = Criteria::default();
        Criteria {
            sheet_name_pattern: self.sheet_name.to_owned(),
            range: self.range,
            header: self.header.unwrap_or(defaults.header),
            skip_empty_rows: self.skip_empty_rows.unwrap_or(defaults.skip_empty_rows),
        }
    }

    fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            cpf_column: self.cpf_column.to_owned(),
            name_column: self.name_column.to_owned(),
            phone_column: self.phone_column.to_owned(),
        }
    }
}

/// A mapped batch with the sheet it came from.
#[derive(Debug)]
pub(crate) struct LoadedBatch {
    pub(crate) file_name: String,
    pub(crate) sheet_name: String,
    pub(crate) batch: CpfBatch,
}

/// Decodes the selected sheet and maps its rows to CPF records.
///
/// A sheet without any data row is an error rather than an empty batch.
pub(crate) fn load_batch(parameters: &SheetParameters) -> Result<LoadedBatch, CpfSheetError> {
    let sheet = read_rows(&parameters.file_name, &parameters.criteria())?;
    let batch = map_rows(&sheet.rows, &parameters.mapping_options());
    if batch.is_empty() {
        Err(SpreadsheetError::EmptyError(sheet.sheet_name.to_owned()))?;
    }
    tracing::info!(
        file = %sheet.file_name,
        sheet = %sheet.sheet_name,
        total = batch.len(),
        valid = batch.valid_count(),
        "loaded cpf batch"
    );
    Ok(LoadedBatch {
        file_name: sheet.file_name,
        sheet_name: sheet.sheet_name,
        batch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultMessage;
    use crate::spreadsheet::tests::path;
    use crate::spreadsheet::tests::text_fixture;

    fn parameters(file_name: &str) -> SheetParameters {
        SheetParameters {
            file_name: file_name.to_owned(),
            sheet_name: None,
            range: None,
            header: None,
            skip_empty_rows: None,
            cpf_column: None,
            name_column: None,
            phone_column: None,
        }
    }

    #[test]
    fn parses_booleans() {
        assert!(parse_bool("header", "true").unwrap());
        assert!(parse_bool("header", "TRUE").unwrap());
        assert!(!parse_bool("header", "false").unwrap());
        let error = parse_bool("header", "talvez").unwrap_err();
        assert_eq!(error.to_string(), "Invalid parameter 'header': 'talvez' is not a boolean");
    }

    #[test]
    fn rejects_blank_column_names() {
        assert_eq!(parse_column_name("cpf_column", "Documento".to_owned()).unwrap(), "Documento");
        assert!(parse_column_name("cpf_column", "  ".to_owned()).is_err());
    }

    #[test]
    fn defaults_follow_criteria() {
        let criteria = parameters("lote.csv").criteria();
        assert!(criteria.header);
        assert!(criteria.skip_empty_rows);
        assert!(criteria.sheet_name_pattern.is_none());

        let mut explicit = parameters("lote.csv");
        explicit.header = Some(false);
        explicit.skip_empty_rows = Some(false);
        explicit.cpf_column = Some("B".to_owned());
        let criteria = explicit.criteria();
        assert!(!criteria.header);
        assert!(!criteria.skip_empty_rows);
        assert_eq!(explicit.mapping_options().cpf_column.as_deref(), Some("B"));
    }

    #[test]
    fn loads_and_maps_a_sheet() {
        let file = text_fixture(
            ".csv",
            b"Nome;CPF;Telefone\nAna;529.982.247-25;(11) 5555-0000\nBeto;111.111.111-11;\n",
        );
        let loaded = load_batch(&parameters(path(&file))).unwrap();
        assert_eq!(loaded.sheet_name, "Sheet1");
        assert_eq!(loaded.batch.len(), 2);
        assert_eq!(loaded.batch.valid_count(), 1);
        assert_eq!(loaded.batch.invalid_count(), 1);

        let first = &loaded.batch.records[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.nome, "Ana");
        assert_eq!(first.cpf, "529.982.247-25");
        assert_eq!(first.telefone, "(11) 5555-0000");
        assert!(first.is_valid);
    }

    #[test]
    fn header_only_sheet_is_an_error() {
        let file = text_fixture(".csv", b"nome,cpf\n");
        let error = load_batch(&parameters(path(&file))).unwrap_err();
        assert!(matches!(
            error,
            CpfSheetError::SpreadsheetError(SpreadsheetError::EmptyError(_))
        ));
        assert_eq!(error.to_string(), "No data rows in sheet 'Sheet1'");
        let prefixed = Err::<(), _>(error).with_prefix(path(&file)).unwrap_err();
        assert_eq!(prefixed.to_string(), format!("{}: No data rows in sheet 'Sheet1'", path(&file)));
    }

    #[test]
    fn explicit_cpf_column_without_header() {
        let file = text_fixture(".csv", b"Ana,52998224725\n");
        let mut parameters = parameters(path(&file));
        parameters.header = Some(false);
        parameters.cpf_column = Some("B".to_owned());
        parameters.name_column = Some("A".to_owned());
        let loaded = load_batch(&parameters).unwrap();
        assert_eq!(loaded.batch.records[0].nome, "Ana");
        assert_eq!(loaded.batch.records[0].cpf, "529.982.247-25");
        assert!(loaded.batch.records[0].is_valid);
    }
}
