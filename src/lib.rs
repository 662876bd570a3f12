//! # CPF Sheet Extension
//!
//! A DuckDB extension that reads spreadsheets of Brazilian taxpayer records
//! and turns every row into a canonical CPF record: digits cleaned and zero
//! padded, check digits verified, display formatted as `ddd.ddd.ddd-dd`.
//!
//! ## Table Functions
//!
//! - `read_cpf_sheet`: one record `(id, nome, cpf, telefone, is_valid)` per source row
//! - `summarize_cpf_sheet`: total, valid and invalid counts of a sheet
//! - `check_cpf`: the normalization pipeline applied to a single value
//!
//! Supported inputs are `.xlsx`/`.xlsm`, `.ods`, `.csv` and `.tsv`/`.txt`,
//! from a local path or any URL DuckDB can read.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod cpf;
mod database;
mod error;
mod extension;
mod helpers;
mod ingest;
mod spreadsheet;
mod telemetry;

use crate::extension::check_cpf::CheckCpfTableFunction;
use crate::extension::read_cpf_sheet::ReadCpfSheetTableFunction;
use crate::extension::summarize_cpf_sheet::SummarizeCpfSheetTableFunction;
use anyhow::{Context, Result};
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;

/// Extension entry point for DuckDB.
///
/// Installs the log subscriber when `CPF_SHEET_LOG` is set, then registers
/// the three table functions.
///
/// # Errors
///
/// Returns an error if a table function fails to register with DuckDB.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    telemetry::init();
    connection
        .register_table_function::<ReadCpfSheetTableFunction>("read_cpf_sheet")
        .context("Failed to register read_cpf_sheet table function")?;
    connection
        .register_table_function::<SummarizeCpfSheetTableFunction>("summarize_cpf_sheet")
        .context("Failed to register summarize_cpf_sheet table function")?;
    connection
        .register_table_function::<CheckCpfTableFunction>("check_cpf")
        .context("Failed to register check_cpf table function")?;
    tracing::debug!("registered cpf_sheet table functions");
    Ok(())
}
