//! Thin layer over `quick_xml` shared by the OOXML and OpenDocument decoders.

use crate::error::CpfSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    ParseEntityError(String),

    #[error("Unexpected attribute value '{0}'")]
    ParseAttributeValueError(String),
}

/// Event reader with a reusable buffer.
///
/// Empty elements are expanded into start/end pairs so that decoders only
/// have to match `Event::Start` and `Event::End`. Whitespace is kept because
/// cell text may start or end with spaces.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, or `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, CpfSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, CpfSheetError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, CpfSheetError> {
        Ok(self.unescape_value()?)
    }
}

/// Attribute lookup on start tags by qualified name (`table:name`, `r`, ...).
pub(crate) trait XmlNodeHelper<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, CpfSheetError>;

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, CpfSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, CpfSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, CpfSheetError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => {
                let value = attribute.get_value()?;
                value
                    .parse()
                    .map(Some)
                    .map_err(|_| XmlError::ParseAttributeValueError(value.to_string()).into())
            }
            None => Ok(None),
        }
    }
}

/// Accumulates cell text from text and entity reference events.
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), CpfSheetError>;

    /// Resolves `&amp;`-style entities and `&#NN;`/`&#xNN;` character references.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), CpfSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), CpfSheetError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), CpfSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Drives an `XmlReader` to the end of the document, dispatching each event
/// to the given match arms. Unmatched events are ignored; `break` leaves the loop.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::name::QName;

    fn read_text(xml: &str) -> Result<String, CpfSheetError> {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Text(event) => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        Ok(text)
    }

    #[test]
    fn resolves_entities_and_character_references() {
        let text = read_text("<t>Jo&#227;o &amp; Maria &#x41;</t>").unwrap();
        assert_eq!(text, "João & Maria A");
    }

    #[test]
    fn rejects_unknown_entity() {
        assert!(read_text("<t>&cpf;</t>").is_err());
    }

    #[test]
    fn reads_and_parses_attributes() -> Result<(), CpfSheetError> {
        let mut reader = XmlReader::new(r#"<c r="B2" n="3" bad="x"/>"#.as_bytes());
        let mut seen = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == QName(b"c") => {
                assert_eq!(event.get_attribute_value("r").unwrap().as_deref(), Some("B2"));
                assert_eq!(event.get_attribute_value("missing").unwrap(), None);
                assert_eq!(event.parse_attribute_value::<usize>("n").unwrap(), Some(3));
                assert!(event.parse_attribute_value::<usize>("bad").is_err());
                seen = true;
            }
        });
        assert!(seen);
        Ok(())
    }
}
