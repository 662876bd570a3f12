//! Character set detection for delimited text uploads.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

/// Decodes raw file bytes into text.
///
/// A byte order mark selects its encoding (UTF-8 or UTF-16) and is stripped.
/// Without one, valid UTF-8 is taken as is and anything else is read as
/// Windows-1252, the ANSI code page of Brazilian Windows installs.
///
/// # Returns
/// The text and the encoding that was applied
pub(crate) fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return (text, encoding);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), UTF_8),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text, WINDOWS_1252)
        }
    }
}
