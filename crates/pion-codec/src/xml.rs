//! XML codec: one element per event, document framing.

use crate::codec::Codec;
use crate::config::{format_value, parse_value, CodecConfig, CodecDef, Field};
use crate::error::CodecError;
use pion_event::{Event, TermRef, Vocabulary};
use pion_types::PluginId;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

const ROOT_ELEMENT: &str = "Events";
const RECORD_ELEMENT: &str = "Event";

/// Codec for XML records.
///
/// Each event serializes to one `<Event>` element with one child per
/// defined field; the record stream is framed as a document:
///
/// ```text
/// <Events>
/// <Event><remotehost>10.0.19.111</remotehost><status>404</status></Event>
/// </Events>
/// ```
///
/// `write` emits the document root lazily, `finish` closes it. Field
/// names double as element names, so they must be valid XML names.
pub struct XmlCodec {
    def: CodecDef,
    started: bool,
}

impl XmlCodec {
    /// Creates an unconfigured XML codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            def: CodecDef::unconfigured(),
            started: false,
        }
    }

    fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.def.fields.iter().find(|f| f.name == name)
    }

    fn write_record(&self, output: &mut dyn Write, event: &Event) -> Result<(), CodecError> {
        let mut writer = Writer::new(&mut *output);
        writer
            .write_event(XmlEvent::Start(BytesStart::new(RECORD_ELEMENT)))
            .map_err(xml_error)?;
        for field in &self.def.fields {
            let Some(value) = event.value(field.term_ref) else {
                continue;
            };
            let text = format_value(value, field);
            writer
                .write_event(XmlEvent::Start(BytesStart::new(field.name.as_str())))
                .map_err(xml_error)?;
            writer
                .write_event(XmlEvent::Text(BytesText::new(&text)))
                .map_err(xml_error)?;
            writer
                .write_event(XmlEvent::End(BytesEnd::new(field.name.as_str())))
                .map_err(xml_error)?;
        }
        writer
            .write_event(XmlEvent::End(BytesEnd::new(RECORD_ELEMENT)))
            .map_err(xml_error)?;
        output.write_all(b"\n")?;
        Ok(())
    }

    fn read_record(
        &self,
        input: &mut dyn BufRead,
        event: &mut Event,
    ) -> Result<bool, CodecError> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::new();

        // find the next record element
        loop {
            match reader.read_event_into(&mut buf).map_err(xml_error)? {
                XmlEvent::Start(e) if e.name().as_ref() == RECORD_ELEMENT.as_bytes() => break,
                XmlEvent::Start(e) if e.name().as_ref() == ROOT_ELEMENT.as_bytes() => {}
                XmlEvent::End(e) if e.name().as_ref() == ROOT_ELEMENT.as_bytes() => {}
                XmlEvent::Empty(e) if e.name().as_ref() == RECORD_ELEMENT.as_bytes() => {
                    return Ok(true); // record with no fields
                }
                XmlEvent::Decl(_) | XmlEvent::Text(_) | XmlEvent::Comment(_) => {}
                XmlEvent::Eof => {
                    event.clear();
                    return Ok(false);
                }
                other => {
                    return Err(CodecError::Malformed(format!(
                        "unexpected XML content: {other:?}"
                    )))
                }
            }
            buf.clear();
        }

        // collect the record's field elements
        let mut current: Option<String> = None;
        let mut text = String::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(xml_error)? {
                XmlEvent::Start(e) => {
                    current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    text.clear();
                }
                XmlEvent::Text(t) => {
                    if current.is_some() {
                        text.push_str(&t.unescape().map_err(xml_error)?);
                    }
                }
                XmlEvent::End(e) if e.name().as_ref() == RECORD_ELEMENT.as_bytes() => break,
                XmlEvent::End(_) => {
                    if let Some(name) = current.take() {
                        if let Some(field) = self.field_by_name(&name) {
                            event.insert(field.term_ref, parse_value(&text, field)?);
                        }
                        text.clear();
                    }
                }
                XmlEvent::Empty(_) => current = None,
                XmlEvent::Eof => {
                    return Err(CodecError::Malformed("unterminated record element".into()))
                }
                _ => {}
            }
        }
        Ok(true)
    }
}

fn xml_error(err: impl std::fmt::Display) -> CodecError {
    CodecError::Malformed(err.to_string())
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for XmlCodec {
    fn plugin_type(&self) -> &'static str {
        "XMLCodec"
    }

    fn content_type(&self) -> &'static str {
        "text/xml"
    }

    fn id(&self) -> &PluginId {
        &self.def.id
    }

    fn name(&self) -> &str {
        &self.def.name
    }

    fn comment(&self) -> &str {
        &self.def.comment
    }

    fn event_type(&self) -> TermRef {
        self.def.event_type
    }

    fn set_config(&mut self, vocab: &Vocabulary, config: &CodecConfig) -> Result<(), CodecError> {
        self.def = CodecDef::resolve(vocab, config)?;
        self.started = false;
        Ok(())
    }

    fn read(&mut self, input: &mut dyn BufRead, event: &mut Event) -> Result<bool, CodecError> {
        if !self.def.read_gate(event)? {
            return Ok(false);
        }
        self.read_record(input, event)
    }

    fn write(&mut self, output: &mut dyn Write, event: &Event) -> Result<(), CodecError> {
        if !self.started {
            output.write_all(b"<Events>\n")?;
            self.started = true;
        }
        self.write_record(output, event)
    }

    fn finish(&mut self, output: &mut dyn Write) -> Result<(), CodecError> {
        if !self.started {
            output.write_all(b"<Events>\n")?;
        }
        output.write_all(b"</Events>\n")?;
        output.flush()?;
        self.started = false;
        Ok(())
    }

    fn clone_codec(&self) -> Box<dyn Codec> {
        Box::new(Self {
            def: self.def.clone(),
            started: false,
        })
    }

    fn update_vocabulary(&mut self, vocab: &Vocabulary) -> Result<(), CodecError> {
        self.def.update_vocabulary(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use chrono::NaiveDate;
    use pion_event::TermType;

    struct Fixture {
        vocab: Vocabulary,
        event_type: TermRef,
        host: TermRef,
        status: TermRef,
        date: TermRef,
    }

    impl Fixture {
        fn new() -> Self {
            let mut vocab = Vocabulary::new();
            vocab.add_namespace("urn:vocab:test", false).unwrap();
            let event_type = vocab
                .add_term("urn:vocab:test#http-request", TermType::Object)
                .unwrap();
            let host = vocab
                .add_term("urn:vocab:test#remotehost", TermType::String)
                .unwrap();
            let status = vocab.add_term("urn:vocab:test#status", TermType::UInt).unwrap();
            let date = vocab
                .add_term("urn:vocab:test#date", TermType::DateTime)
                .unwrap();
            Self {
                vocab,
                event_type,
                host,
                status,
                date,
            }
        }

        fn codec(&self) -> XmlCodec {
            let config = CodecConfig {
                name: "XML".into(),
                event_type: "urn:vocab:test#http-request".into(),
                fields: vec![
                    FieldConfig::new("urn:vocab:test#remotehost", "remotehost"),
                    FieldConfig::new("urn:vocab:test#status", "status"),
                    FieldConfig::new("urn:vocab:test#date", "date"),
                ],
                ..CodecConfig::for_plugin("XMLCodec")
            };
            let mut codec = XmlCodec::new();
            codec.set_config(&self.vocab, &config).unwrap();
            codec
        }

        fn sample_event(&self) -> Event {
            let mut event = Event::new(self.event_type);
            event.set_string(self.host, "10.0.19.111");
            event.set_uint(self.status, 404);
            event.set_datetime(
                self.date,
                NaiveDate::from_ymd_opt(2007, 4, 5)
                    .unwrap()
                    .and_hms_opt(5, 37, 11)
                    .unwrap(),
            );
            event
        }
    }

    #[test]
    fn document_framing() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let event = fx.sample_event();

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        codec.finish(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<Events>\n<Event>"));
        assert!(text.ends_with("</Events>\n"));
        assert!(text.contains("<remotehost>10.0.19.111</remotehost>"));
        assert!(text.contains("<status>404</status>"));
    }

    #[test]
    fn round_trip_after_finish() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let event = fx.sample_event();

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        codec.finish(&mut out).unwrap();

        let mut input: &[u8] = &out;
        let mut back = Event::new(codec.event_type());
        assert!(codec.read(&mut input, &mut back).unwrap());
        assert_eq!(back, event);

        assert!(!codec.read(&mut input, &mut back).unwrap());
        assert!(back.is_empty());
    }

    #[test]
    fn reads_multiple_records() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let mut input: &[u8] = b"<Events>\n\
              <Event><remotehost>a</remotehost><status>1</status></Event>\n\
              <Event><remotehost>b</remotehost><status>2</status></Event>\n\
              </Events>\n";

        let mut event = Event::new(codec.event_type());
        assert!(codec.read(&mut input, &mut event).unwrap());
        assert_eq!(event.string(fx.host).unwrap(), "a");

        event.clear();
        assert!(codec.read(&mut input, &mut event).unwrap());
        assert_eq!(event.string(fx.host).unwrap(), "b");
        assert_eq!(event.uint(fx.status).unwrap(), 2);

        event.clear();
        assert!(!codec.read(&mut input, &mut event).unwrap());
        assert!(event.is_empty());
    }

    #[test]
    fn markup_in_values_is_escaped() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let mut event = Event::new(fx.event_type);
        event.set_string(fx.host, "a<b>&\"c\"");

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        codec.finish(&mut out).unwrap();

        let mut input: &[u8] = &out;
        let mut back = Event::new(fx.event_type);
        assert!(codec.read(&mut input, &mut back).unwrap());
        assert_eq!(back.string(fx.host).unwrap(), "a<b>&\"c\"");
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let mut input: &[u8] =
            b"<Events><Event><mystery>x</mystery><status>7</status></Event></Events>";

        let mut event = Event::new(fx.event_type);
        assert!(codec.read(&mut input, &mut event).unwrap());
        assert_eq!(event.uint(fx.status).unwrap(), 7);
        assert!(!event.is_defined(fx.host));
    }

    #[test]
    fn unterminated_record_is_malformed() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let mut input: &[u8] = b"<Events><Event><status>7</status>";

        let mut event = Event::new(fx.event_type);
        assert!(codec.read(&mut input, &mut event).is_err());
    }

    #[test]
    fn finish_without_records_writes_empty_document() {
        let fx = Fixture::new();
        let mut codec = fx.codec();
        let mut out = Vec::new();
        codec.finish(&mut out).unwrap();
        assert_eq!(out, b"<Events>\n</Events>\n");
    }
}
