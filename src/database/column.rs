use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;

/// Column types produced by the table functions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ColumnType {
    Boolean,
    /// 64-bit signed integers
    BigInt,
    Varchar,
}

/// A named output column.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Column {
    pub(crate) name: &'static str,
    pub(crate) kind: ColumnType,
}

impl ColumnType {
    pub(crate) const fn to_logical_type_id(&self) -> LogicalTypeId {
        match self {
            Self::Boolean => LogicalTypeId::Boolean,
            Self::BigInt => LogicalTypeId::Bigint,
            Self::Varchar => LogicalTypeId::Varchar,
        }
    }

    pub(crate) fn to_logical_type(&self) -> LogicalTypeHandle {
        LogicalTypeHandle::from(self.to_logical_type_id())
    }
}

impl Column {
    const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self { name, kind }
    }
}

/// Output of `read_cpf_sheet`: one canonical record per source row.
pub(crate) const RECORD_COLUMNS: [Column; 5] = [
    Column::new("id", ColumnType::BigInt),
    Column::new("nome", ColumnType::Varchar),
    Column::new("cpf", ColumnType::Varchar),
    Column::new("telefone", ColumnType::Varchar),
    Column::new("is_valid", ColumnType::Boolean),
];

/// Output of `summarize_cpf_sheet`.
pub(crate) const SUMMARY_COLUMNS: [Column; 5] = [
    Column::new("file_name", ColumnType::Varchar),
    Column::new("sheet_name", ColumnType::Varchar),
    Column::new("total", ColumnType::BigInt),
    Column::new("valid_count", ColumnType::BigInt),
    Column::new("invalid_count", ColumnType::BigInt),
];

/// Output of `check_cpf`.
pub(crate) const CHECK_COLUMNS: [Column; 4] = [
    Column::new("input", ColumnType::Varchar),
    Column::new("digits", ColumnType::Varchar),
    Column::new("cpf", ColumnType::Varchar),
    Column::new("is_valid", ColumnType::Boolean),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(columns: &[Column]) -> Vec<String> {
        columns
            .iter()
            .map(|column| format!("{} {:?}", column.name, column.kind))
            .collect()
    }

    #[test]
    fn output_schemas() {
        assert_eq!(
            describe(&RECORD_COLUMNS),
            vec!["id BigInt", "nome Varchar", "cpf Varchar", "telefone Varchar", "is_valid Boolean"]
        );
        assert_eq!(
            describe(&SUMMARY_COLUMNS),
            vec![
                "file_name Varchar",
                "sheet_name Varchar",
                "total BigInt",
                "valid_count BigInt",
                "invalid_count BigInt"
            ]
        );
        assert_eq!(describe(&CHECK_COLUMNS), vec!["input Varchar", "digits Varchar", "cpf Varchar", "is_valid Boolean"]);
    }

    #[test]
    fn logical_types() {
        assert_eq!(ColumnType::BigInt.to_logical_type_id(), LogicalTypeId::Bigint);
        assert_eq!(ColumnType::Varchar.to_logical_type_id(), LogicalTypeId::Varchar);
        assert_eq!(ColumnType::Boolean.to_logical_type_id(), LogicalTypeId::Boolean);
    }
}
