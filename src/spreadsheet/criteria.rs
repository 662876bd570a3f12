use crate::database::range::Range;
use glob::Pattern;

/// Which sheet and which cells of a spreadsheet to turn into rows.
#[derive(Clone, Debug)]
pub(crate) struct Criteria {
    /// Glob on the sheet name; the first sheet when absent.
    pub(crate) sheet_name_pattern: Option<Pattern>,

    pub(crate) range: Option<Range>,

    /// First non-empty row holds the column names.
    pub(crate) header: bool,

    /// Drop rows without any non-empty cell.
    pub(crate) skip_empty_rows: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            sheet_name_pattern: None,
            range: None,
            header: true,
            skip_empty_rows: true,
        }
    }
}

impl Criteria {
    /// Checks if a sheet name matches the pattern; any name matches without one.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }

    pub(crate) fn range(&self) -> Range {
        self.range.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_patterns() {
        let criteria = Criteria {
            sheet_name_pattern: Some(Pattern::new("Cadastro*").unwrap()),
            ..Criteria::default()
        };
        assert!(criteria.accept("Cadastro 2024"));
        assert!(!criteria.accept("Resumo"));
        assert!(Criteria::default().accept("Planilha1"));
    }
}
