//! Entry lookup inside the ZIP containers of `.xlsx` and `.ods` files.

use crate::error::CpfSheetError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Entry by name, ignoring ASCII case and accepting `\` as separator.
    /// Writers disagree on both, e.g. `xl/SharedStrings.xml`.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, CpfSheetError>;

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, CpfSheetError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, CpfSheetError> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(&file_name.replace('\\', "/")))
            .map(str::to_owned);
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, CpfSheetError> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(entries: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn finds_entries_ignoring_case() {
        let mut zip = archive(&[("xl/SharedStrings.xml", "<sst/>")]);
        let mut content = String::new();
        zip.file("xl/sharedStrings.xml").unwrap().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<sst/>");
        assert!(zip.file("xl\\sharedstrings.XML").unwrap().is_some());
        assert!(zip.file("xl/styles.xml").unwrap().is_none());
        assert!(zip.xml_reader("content.xml").unwrap().is_none());
    }
}
