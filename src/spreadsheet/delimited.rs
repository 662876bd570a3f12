use crate::error::CpfSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::text::decode_text;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use std::io::Read;

/// Name of the single sheet of a delimited text file.
pub(crate) const SHEET_NAME: &str = "Sheet1";

/// Delimited text (`.csv`, `.tsv`) read as a one-sheet workbook.
///
/// Every field is text. Leading zeros of CPFs typed into a CSV are therefore
/// kept as written.
pub(crate) struct DelimitedSpreadsheet {
    name: String,
    text: String,
    delimiter: char,
}

impl DelimitedSpreadsheet {
    /// Reads and decodes the whole file.
    ///
    /// For `,` the delimiter is sniffed from the first line: spreadsheets saved
    /// as CSV with a Portuguese locale separate fields with `;`.
    pub(crate) fn open(file_name: &str, delimiter: u8) -> Result<Self, CpfSheetError> {
        let mut reader = UnifiedReader::new(file_name)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let (text, encoding) = decode_text(&bytes);
        let text = text.into_owned();
        let delimiter = match delimiter {
            b',' => sniff_delimiter(&text),
            other => other as char,
        };
        tracing::debug!(
            file = file_name,
            encoding = encoding.name(),
            delimiter = %delimiter.escape_default(),
            "decoded delimited text"
        );
        Ok(DelimitedSpreadsheet {
            name: file_name.to_owned(),
            text,
            delimiter,
        })
    }
}

impl Spreadsheet for DelimitedSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn load_shared_strings(&mut self) -> Result<Vec<String>, CpfSheetError> {
        Ok(Vec::new())
    }

    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, CpfSheetError> {
        if !criteria.accept(SHEET_NAME) {
            return Ok(None);
        }
        let mut sheet = Sheet::new(&self.name, SHEET_NAME, criteria.range());
        for (row, fields) in parse_records(&self.text, self.delimiter).into_iter().enumerate() {
            if sheet.after_row_upper_bound(row) {
                break;
            }
            for (col, field) in fields.iter().enumerate() {
                sheet.push(Cell::text(row, col, field));
            }
        }
        Ok(Some(sheet))
    }
}

/// Picks `;` over `,` when the first line has more of them outside quotes.
fn sniff_delimiter(text: &str) -> char {
    let mut in_quotes = false;
    let (mut commas, mut semicolons) = (0usize, 0usize);
    for character in text.chars() {
        match character {
            '"' => in_quotes = !in_quotes,
            '\n' | '\r' if !in_quotes => break,
            ',' if !in_quotes => commas += 1,
            ';' if !in_quotes => semicolons += 1,
            _ => (),
        }
    }
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Splits delimited text into records of fields.
///
/// A quote opens a quoted field only at the start of a field; inside one,
/// `""` is a literal quote and delimiters and line breaks are data. Records
/// end at `\n`, `\r\n` or a lone `\r`.
fn parse_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::<Vec<String>>::new();
    let mut fields = Vec::<String>::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(character) = chars.next() {
        match character {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            '\r' | '\n' if !in_quotes => {
                if character == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
                quoted = false;
            }
            _ if character == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut field));
                quoted = false;
            }
            _ => field.push(character),
        }
    }
    if !field.is_empty() || !fields.is_empty() || quoted {
        fields.push(field);
        records.push(fields);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::CellValue;
    use crate::spreadsheet::read_rows;
    use crate::spreadsheet::tests::path;
    use crate::spreadsheet::tests::text_fixture;

    fn strings(records: &[&[&str]]) -> Vec<Vec<String>> {
        records
            .iter()
            .map(|fields| fields.iter().map(|field| field.to_string()).collect())
            .collect()
    }

    #[test]
    fn splits_plain_records() {
        assert_eq!(
            parse_records("nome,cpf\r\nAna,52998224725\n", ','),
            strings(&[&["nome", "cpf"], &["Ana", "52998224725"]])
        );
        assert_eq!(parse_records("a\tb", '\t'), strings(&[&["a", "b"]]));
        assert_eq!(parse_records("", ','), strings(&[]));
    }

    #[test]
    fn handles_quotes() {
        assert_eq!(
            parse_records("\"Souza, Ana\",\"ele disse \"\"oi\"\"\"\n\"linha\num\",x\"y\"\n\"\"\n", ','),
            strings(&[
                &["Souza, Ana", "ele disse \"oi\""],
                &["linha\num", "x\"y\""],
                &[""],
            ])
        );
    }

    #[test]
    fn keeps_blank_lines_and_trailing_fields() {
        assert_eq!(
            parse_records("cpf\n\n191,\n", ','),
            strings(&[&["cpf"], &[""], &["191", ""]])
        );
    }

    #[test]
    fn sniffs_semicolons() {
        assert_eq!(sniff_delimiter("nome;cpf;telefone\nAna;1,5;x"), ';');
        assert_eq!(sniff_delimiter("nome,cpf\n"), ',');
        assert_eq!(sniff_delimiter("\"a;b;c\",d\n"), ',');
        assert_eq!(sniff_delimiter("cpf\n"), ',');
    }

    #[test]
    fn reads_windows_1252_semicolon_csv() {
        let file = text_fixture(".csv", b"Nome;CPF;Telefone\r\nJo\xE3o;001.234.567-89;(11) 5555-0000\r\n");
        let sheet = read_rows(path(&file), &Criteria::default()).unwrap();
        assert_eq!(sheet.sheet_name, SHEET_NAME);
        assert_eq!(sheet.rows.len(), 1);
        let row = &sheet.rows[0];
        assert_eq!(row.get("Nome"), Some(&CellValue::from("João")));
        // text cells keep the leading zeros
        assert_eq!(row.get("CPF"), Some(&CellValue::from("001.234.567-89")));
        assert_eq!(row.get("Telefone"), Some(&CellValue::from("(11) 5555-0000")));
    }

    #[test]
    fn reads_tsv_with_range() {
        let file = text_fixture(".tsv", b"relatorio\n\nid\tcpf\n1\t52998224725\n2\t11144477735\n");
        let criteria = Criteria {
            range: Some(crate::database::range::Range::try_from("B3:B4").unwrap()),
            ..Criteria::default()
        };
        let sheet = read_rows(path(&file), &criteria).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].keys().collect::<Vec<_>>(), vec!["cpf"]);
        assert_eq!(sheet.rows[0].get("cpf"), Some(&CellValue::from("52998224725")));
    }
}
