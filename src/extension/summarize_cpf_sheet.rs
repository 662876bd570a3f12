use crate::database::column::SUMMARY_COLUMNS;
use crate::error::ResultMessage;
use crate::extension::load_batch;
use crate::extension::writer::write_to_vector;
use crate::extension::writer::FieldValue;
use crate::extension::LoadedBatch;
use crate::extension::SheetParameters;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Per-batch counts reported by `summarize_cpf_sheet`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    file_name: String,
    sheet_name: String,
    total: i64,
    valid_count: i64,
    invalid_count: i64,
}

impl From<LoadedBatch> for BatchSummary {
    fn from(loaded: LoadedBatch) -> Self {
        BatchSummary {
            total: loaded.batch.len() as i64,
            valid_count: loaded.batch.valid_count() as i64,
            invalid_count: loaded.batch.invalid_count() as i64,
            file_name: loaded.file_name,
            sheet_name: loaded.sheet_name,
        }
    }
}

impl BatchSummary {
    /// Field `col`, in `SUMMARY_COLUMNS` order.
    fn field(&self, col: usize) -> Option<FieldValue<'_>> {
        match col {
            0 => Some(FieldValue::Text(&self.file_name)),
            1 => Some(FieldValue::Text(&self.sheet_name)),
            2 => Some(FieldValue::BigInt(self.total)),
            3 => Some(FieldValue::BigInt(self.valid_count)),
            4 => Some(FieldValue::BigInt(self.invalid_count)),
            _ => None,
        }
    }
}

#[repr(C)]
pub(crate) struct SummarizeCpfSheetBindData {
    summary: BatchSummary,
}

#[repr(C)]
pub(crate) struct SummarizeCpfSheetInitData {
    done: AtomicBool,
    projections: Vec<usize>,
}

/// `summarize_cpf_sheet(file, ...)`: a single row with the batch counts.
pub(crate) struct SummarizeCpfSheetTableFunction;

impl VTab for SummarizeCpfSheetTableFunction {
    type InitData = SummarizeCpfSheetInitData;
    type BindData = SummarizeCpfSheetBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = SheetParameters::try_from(bind)?;
        let loaded = load_batch(&parameters).with_prefix(parameters.file_name.as_str())?;
        for column in &SUMMARY_COLUMNS {
            bind.add_result_column(column.name, column.kind.to_logical_type());
        }
        Ok(SummarizeCpfSheetBindData {
            summary: BatchSummary::from(loaded),
        })
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        let projections = init
            .get_column_indices()
            .into_iter()
            .map(|index| index as usize)
            .collect::<Vec<_>>();
        Ok(SummarizeCpfSheetInitData {
            done: AtomicBool::new(false),
            projections,
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        if init.done.swap(true, Ordering::Relaxed) {
            output.set_len(0);
        } else {
            for (index, col) in init.projections.iter().enumerate() {
                let mut vector = output.flat_vector(index);
                write_to_vector(&mut vector, 0, bind.summary.field(*col));
            }
            output.set_len(1);
        }
        Ok(())
    }

    fn supports_pushdown() -> bool {
        true
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(SheetParameters::positional())
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(SheetParameters::named())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::CpfBatch;
    use crate::ingest::CpfRecord;

    fn record(id: usize, is_valid: bool) -> CpfRecord {
        CpfRecord {
            id,
            nome: format!("Registro {id}"),
            cpf: "000.000.000-00".to_owned(),
            telefone: "-".to_owned(),
            is_valid,
        }
    }

    #[test]
    fn counts_batch() {
        let summary = BatchSummary::from(LoadedBatch {
            file_name: "lote.xlsx".to_owned(),
            sheet_name: "Cadastro".to_owned(),
            batch: CpfBatch {
                records: vec![record(1, true), record(2, false), record(3, true)],
            },
        });
        assert_eq!(summary.field(0), Some(FieldValue::Text("lote.xlsx")));
        assert_eq!(summary.field(1), Some(FieldValue::Text("Cadastro")));
        assert_eq!(summary.field(2), Some(FieldValue::BigInt(3)));
        assert_eq!(summary.field(3), Some(FieldValue::BigInt(2)));
        assert_eq!(summary.field(4), Some(FieldValue::BigInt(1)));
        assert_eq!(summary.field(5), None);
    }

    #[test]
    fn fields_follow_schema() {
        let summary = BatchSummary::from(LoadedBatch {
            file_name: "lote.csv".to_owned(),
            sheet_name: "Sheet1".to_owned(),
            batch: CpfBatch::default(),
        });
        for (col, column) in SUMMARY_COLUMNS.iter().enumerate() {
            assert_eq!(summary.field(col).map(|value| value.kind()), Some(column.kind));
        }
    }
}
