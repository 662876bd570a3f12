use crate::cpf::normalize;
use crate::cpf::Normalized;
use crate::database::column::CHECK_COLUMNS;
use crate::extension::writer::check_field;
use crate::extension::writer::write_to_vector;
use crate::extension::Param;
use crate::extension::ValueParam;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

#[repr(C)]
pub(crate) struct CheckCpfBindData {
    input: String,
    normalized: Normalized,
}

#[repr(C)]
pub(crate) struct CheckCpfInitData {
    done: AtomicBool,
    projections: Vec<usize>,
}

/// `check_cpf(value)`: runs the normalization pipeline on a single value.
pub(crate) struct CheckCpfTableFunction;

impl VTab for CheckCpfTableFunction {
    type InitData = CheckCpfInitData;
    type BindData = CheckCpfBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let input = ValueParam::read(bind, 0)?;
        let normalized = normalize(&input);
        tracing::debug!(digits = %normalized.digits, is_valid = normalized.is_valid, "checked cpf");
        for column in &CHECK_COLUMNS {
            bind.add_result_column(column.name, column.kind.to_logical_type());
        }
        Ok(CheckCpfBindData { input, normalized })
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        let projections = init
            .get_column_indices()
            .into_iter()
            .map(|index| index as usize)
            .collect::<Vec<_>>();
        Ok(CheckCpfInitData {
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
                write_to_vector(&mut vector, 0, check_field(&bind.input, &bind.normalized, *col));
            }
            output.set_len(1);
        }
        Ok(())
    }

    fn supports_pushdown() -> bool {
        true
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![ValueParam::kind()])
    }
}
