//! Writing record fields into DuckDB vectors.

use crate::cpf::Normalized;
use crate::ingest::CpfRecord;
use duckdb::core::FlatVector;
use duckdb::core::Inserter;

/// A single field value headed for an output column.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldValue<'a> {
    Text(&'a str),
    BigInt(i64),
    Boolean(bool),
}

#[cfg(test)]
impl<'a> FieldValue<'a> {
    pub(crate) fn kind(&self) -> crate::database::column::ColumnType {
        use crate::database::column::ColumnType;
        match self {
            FieldValue::Text(_) => ColumnType::Varchar,
            FieldValue::BigInt(_) => ColumnType::BigInt,
            FieldValue::Boolean(_) => ColumnType::Boolean,
        }
    }
}

/// Field `col` of a record, in `RECORD_COLUMNS` order.
pub(crate) fn record_field(record: &CpfRecord, col: usize) -> Option<FieldValue<'_>> {
    match col {
        0 => Some(FieldValue::BigInt(record.id as i64)),
        1 => Some(FieldValue::Text(&record.nome)),
        2 => Some(FieldValue::Text(&record.cpf)),
        3 => Some(FieldValue::Text(&record.telefone)),
        4 => Some(FieldValue::Boolean(record.is_valid)),
        _ => None,
    }
}

/// Field `col` of a `check_cpf` result, in `CHECK_COLUMNS` order.
pub(crate) fn check_field<'a>(input: &'a str, normalized: &'a Normalized, col: usize) -> Option<FieldValue<'a>> {
    match col {
        0 => Some(FieldValue::Text(input)),
        1 => Some(FieldValue::Text(&normalized.digits)),
        2 => Some(FieldValue::Text(&normalized.formatted)),
        3 => Some(FieldValue::Boolean(normalized.is_valid)),
        _ => None,
    }
}

/// Writes a field to row `row` of `vector`; unknown fields become NULL.
pub(super) fn write_to_vector(vector: &mut FlatVector, row: usize, value: Option<FieldValue>) {
    match value {
        Some(FieldValue::Text(text)) => vector.insert(row, text),
        Some(FieldValue::BigInt(number)) => write_primitive(vector, row, number),
        Some(FieldValue::Boolean(flag)) => write_primitive(vector, row, flag),
        None => vector.set_null(row),
    }
}

/// Writes a primitive value directly to a vector using pointer arithmetic.
fn write_primitive<T>(vector: &mut FlatVector, index: usize, value: T) {
    let pointer: *mut T = unsafe { vector.as_mut_ptr() };
    unsafe {
        std::ptr::write(pointer.add(index), value);
    }
}
