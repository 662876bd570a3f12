//! # Batch Ingestion
//!
//! Turns header-keyed spreadsheet rows of arbitrary shape into canonical CPF
//! records. Column names are matched against fixed synonym lists; the mapper
//! never fails on a row, it only marks the record invalid or fills in
//! placeholders.
use crate::cpf;
use std::collections::BTreeSet;

pub(crate) mod row;

pub(crate) use row::CellValue;
pub(crate) use row::Row;

/// Column spellings recognized as the CPF, in priority order.
pub(crate) const CPF_COLUMNS: &[&str] = &[
    "cpf", "CPF", "Cpf", "documento", "Documento", "DOCUMENTO", "doc", "Doc", "DOC",
];

/// Column spellings recognized as the person's name, in priority order.
pub(crate) const NAME_COLUMNS: &[&str] = &["nome", "Nome", "NOME", "name", "Name", "NAME"];

/// Column spellings recognized as the phone number, in priority order.
pub(crate) const PHONE_COLUMNS: &[&str] = &[
    "telefone", "Telefone", "TELEFONE", "phone", "Phone", "PHONE", "celular", "Celular",
    "CELULAR",
];

/// Placeholder used when a row has no phone column.
pub(crate) const MISSING_PHONE: &str = "-";

/// Explicit column choices that replace the synonym scan for a field.
///
/// A named column is the only one consulted for its field; for the CPF this
/// also disables the first-column fallback.
#[derive(Clone, Debug, Default)]
pub(crate) struct MappingOptions {
    pub(crate) cpf_column: Option<String>,
    pub(crate) name_column: Option<String>,
    pub(crate) phone_column: Option<String>,
}

/// Canonical, validated representation of one input row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CpfRecord {
    /// 1-based position in the batch
    pub(crate) id: usize,
    pub(crate) nome: String,
    /// Display form of the padded digits (`ddd.ddd.ddd-dd`)
    pub(crate) cpf: String,
    pub(crate) telefone: String,
    pub(crate) is_valid: bool,
}

/// Ordered record set produced from one row set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CpfBatch {
    pub(crate) records: Vec<CpfRecord>,
}

impl CpfBatch {
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn valid_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_valid).count()
    }

    pub(crate) fn invalid_count(&self) -> usize {
        self.len() - self.valid_count()
    }
}

/// Maps every row to exactly one record, preserving order.
///
/// # Arguments
/// * `rows` - Row objects decoded from a sheet; may be empty
/// * `options` - Explicit column choices, `MappingOptions::default()` for the heuristics
///
/// # Returns
/// A batch with `rows.len()` records
pub(crate) fn map_rows(rows: &[Row], options: &MappingOptions) -> CpfBatch {
    let mut fallback_columns = BTreeSet::<String>::new();
    let mut fallback_rows = 0usize;
    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let (record, fallback) = map_row(index, row, options);
            if let Some(column) = fallback {
                fallback_rows += 1;
                fallback_columns.insert(column);
            }
            record
        })
        .collect();
    let batch = CpfBatch { records };
    let blank_rows = rows.iter().filter(|row| row.is_blank()).count();

    if fallback_rows > 0 {
        tracing::warn!(
            rows = fallback_rows,
            columns = ?fallback_columns,
            "no recognized CPF column; using the first non-empty column instead"
        );
    }
    tracing::debug!(
        total = batch.len(),
        valid = batch.valid_count(),
        invalid = batch.invalid_count(),
        blank = blank_rows,
        "mapped CPF batch"
    );
    batch
}

/// Maps one row at 0-based `index`.
///
/// Returns the record and, when the CPF came from the first-column fallback,
/// the name of that column.
fn map_row(index: usize, row: &Row, options: &MappingOptions) -> (CpfRecord, Option<String>) {
    let mut fallback = None;
    let cpf_value = match &options.cpf_column {
        Some(column) => row.get(column).map(CellValue::to_string),
        None => lookup(row, CPF_COLUMNS).map(CellValue::to_string).or_else(|| {
            row.first_value().map(|(column, value)| {
                fallback = Some(column.to_owned());
                value.to_string()
            })
        }),
    }
    .unwrap_or_default();
    let normalized = cpf::normalize(&cpf_value);

    let nome = field(row, options.name_column.as_deref(), NAME_COLUMNS)
        .unwrap_or_else(|| format!("Registro {}", index + 1));
    let telefone = field(row, options.phone_column.as_deref(), PHONE_COLUMNS)
        .unwrap_or_else(|| MISSING_PHONE.to_owned());

    let record = CpfRecord {
        id: index + 1,
        nome,
        cpf: normalized.formatted,
        telefone,
        is_valid: normalized.is_valid,
    };
    (record, fallback)
}

/// First non-empty value among `synonyms`, in list order.
fn lookup<'a>(row: &'a Row, synonyms: &[&str]) -> Option<&'a CellValue> {
    synonyms.iter().find_map(|key| row.get(key))
}

/// Reads a field from an explicit column, or from the synonym list when none is given.
fn field(row: &Row, column: Option<&str>, synonyms: &[&str]) -> Option<String> {
    match column {
        Some(column) => row.get(column),
        None => lookup(row, synonyms),
    }
    .map(CellValue::to_string)
}
