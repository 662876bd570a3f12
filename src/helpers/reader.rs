use crate::error::CpfSheetError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub(crate) enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// Byte source for an uploaded sheet: a local file, or a remote object
/// downloaded in full.
pub(crate) enum UnifiedReader {
    Local(BufReader<File>),
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens `file_name` as a local path, or as a URL when it carries a
    /// non-`file` scheme (`https://`, `s3://`, `gs://`, ...).
    ///
    /// Remote objects are fetched through DuckDB's `read_blob`, so the
    /// secrets and `httpfs` settings of the host database apply.
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, CpfSheetError> {
        if Self::is_remote_url(file_name) {
            tracing::debug!(url = file_name, "fetching remote sheet");
            Self::read_blob_with_duckdb(file_name)
        } else {
            let file = File::open(file_name)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        Url::parse(file_name)
            .map(|url| url.scheme() != "file" && !Self::is_windows_drive(&url))
            .unwrap_or(false)
    }

    /// `C:\cadastro.xlsx` parses as a URL with scheme `c`.
    fn is_windows_drive(url: &Url) -> bool {
        url.scheme().len() == 1
    }

    /// Reads the whole remote object into memory.
    fn read_blob_with_duckdb(file_name: &str) -> Result<UnifiedReader, CpfSheetError> {
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> =
            connection.query_row("SELECT content FROM read_blob(?)", [file_name], |row| row.get(0));
        connection.close().map_err(|(_, e)| e)?;

        let bytes = result?;
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        tracing::debug!(url = file_name, bytes = bytes.len(), "fetched remote sheet");
        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}
