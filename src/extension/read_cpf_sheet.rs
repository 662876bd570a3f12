use crate::database::column::RECORD_COLUMNS;
use crate::error::ResultMessage;
use crate::extension::load_batch;
use crate::extension::writer::record_field;
use crate::extension::writer::write_to_vector;
use crate::extension::SheetParameters;
use crate::extension::CHUNK_SIZE;
use crate::ingest::CpfBatch;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

#[repr(C)]
/// Records mapped from the whole sheet at bind time
pub(crate) struct ReadCpfSheetBindData {
    batch: CpfBatch,
}

#[repr(C)]
pub(crate) struct ReadCpfSheetInitData {
    /// Offset of the next chunk
    index: AtomicUsize,
    /// Requested output columns
    projections: Vec<usize>,
}

/// `read_cpf_sheet(file, ...)`: one canonical CPF record per spreadsheet row.
pub(crate) struct ReadCpfSheetTableFunction;

impl VTab for ReadCpfSheetTableFunction {
    type InitData = ReadCpfSheetInitData;
    type BindData = ReadCpfSheetBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = SheetParameters::try_from(bind)?;
        let loaded = load_batch(&parameters).with_prefix(parameters.file_name.as_str())?;
        for column in &RECORD_COLUMNS {
            bind.add_result_column(column.name, column.kind.to_logical_type());
        }
        Ok(ReadCpfSheetBindData { batch: loaded.batch })
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        let projections = init
            .get_column_indices()
            .into_iter()
            .map(|index| index as usize)
            .collect::<Vec<_>>();
        Ok(ReadCpfSheetInitData {
            index: AtomicUsize::new(0),
            projections,
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        let lower = init.index.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
        let upper = bind.batch.len().min(lower + CHUNK_SIZE);
        if lower < upper {
            let mut vectors: Vec<_> = (0..init.projections.len()).map(|index| output.flat_vector(index)).collect();
            for (row, record) in bind.batch.records[lower..upper].iter().enumerate() {
                for (index, col) in init.projections.iter().enumerate() {
                    write_to_vector(&mut vectors[index], row, record_field(record, *col));
                }
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
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
