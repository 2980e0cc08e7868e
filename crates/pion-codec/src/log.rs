//! Line-oriented log codec (Common, Combined, and Extended log formats).

use crate::codec::Codec;
use crate::config::{format_value, parse_value, CodecConfig, CodecDef, Field};
use crate::error::CodecError;
use pion_event::{Event, TermRef, Vocabulary};
use pion_types::PluginId;
use std::io::{BufRead, Write};

/// Codec for newline-terminated log records.
///
/// Fields are separated by single spaces, in field-map order. Three
/// renderings cover the classic web-log conventions:
///
/// - an undelimited undefined field renders `-`
/// - a field configured with delimiters always renders them, so an
///   undefined common-log date is `[]` and an undefined quoted request
///   is `""`
/// - an undelimited string value containing spaces is double-quoted on
///   write, and quoted tokens are accepted anywhere on read
///
/// With `headers = true` the codec speaks the Extended Log Format:
/// the first write emits `#Version: 1.0` and `#Fields: <names>` lines,
/// and reads skip `#` comment lines.
///
/// ```text
/// 10.0.19.111 - - [05/Apr/2007:05:37:11 -0600] "GET /robots.txt HTTP/1.0" 404 208
/// └────┬────┘ ┬ ┬ └──────────┬─────────────┘ └──────────┬───────────┘ └┬┘ └┬┘
/// remotehost  │ │           date                      request      status bytes
///        rfc931 authuser (undefined)
/// ```
pub struct LogCodec {
    def: CodecDef,
    wrote_header: bool,
}

impl LogCodec {
    /// Creates an unconfigured log codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            def: CodecDef::unconfigured(),
            wrote_header: false,
        }
    }

    fn parse_record(&self, line: &str, event: &mut Event) -> Result<(), CodecError> {
        let bytes = line.as_bytes();
        let mut pos = 0usize;

        for field in &self.def.fields {
            while pos < bytes.len() && bytes[pos] == b' ' {
                pos += 1;
            }
            if pos >= bytes.len() {
                break; // remaining fields are undefined
            }

            let token = match field.start {
                Some(start) if bytes[pos] == start as u8 => {
                    let end = field.end.unwrap_or(start);
                    Self::delimited_token(line, &mut pos, end, &field.name)?
                }
                _ if bytes[pos] == b'"' => Self::delimited_token(line, &mut pos, '"', &field.name)?,
                _ => Self::bare_token(line, &mut pos),
            };

            if let Some(token) = token {
                event.insert(field.term_ref, parse_value(token, field)?);
            }
        }
        Ok(())
    }

    /// Consumes a delimited token. `pos` sits on the opening delimiter.
    /// Empty content means the field is undefined.
    fn delimited_token<'a>(
        line: &'a str,
        pos: &mut usize,
        end: char,
        field: &str,
    ) -> Result<Option<&'a str>, CodecError> {
        *pos += 1;
        let rest = &line[*pos..];
        let close = rest.find(end).ok_or_else(|| {
            CodecError::Malformed(format!("field '{field}': missing closing '{end}'"))
        })?;
        let token = &rest[..close];
        *pos += close + end.len_utf8();
        Ok((!token.is_empty()).then_some(token))
    }

    /// Consumes a space-terminated token. A bare `-` means undefined.
    fn bare_token<'a>(line: &'a str, pos: &mut usize) -> Option<&'a str> {
        let rest = &line[*pos..];
        let len = rest.find(' ').unwrap_or(rest.len());
        let token = &rest[..len];
        *pos += len;
        (token != "-").then_some(token)
    }

    fn write_record(&self, event: &Event) -> Result<String, CodecError> {
        let mut line = String::new();
        for (index, field) in self.def.fields.iter().enumerate() {
            if index > 0 {
                line.push(' ');
            }
            match event.value(field.term_ref) {
                None => match (field.start, field.end) {
                    (Some(start), end) => {
                        line.push(start);
                        line.push(end.unwrap_or(start));
                    }
                    (None, _) => line.push('-'),
                },
                Some(value) => {
                    let text = format_value(value, field);
                    match (field.start, field.end) {
                        (Some(start), end) => {
                            line.push(start);
                            line.push_str(&text);
                            line.push(end.unwrap_or(start));
                        }
                        (None, _) if text.contains(' ') => {
                            line.push('"');
                            line.push_str(&text);
                            line.push('"');
                        }
                        (None, _) => line.push_str(&text),
                    }
                }
            }
        }
        line.push('\n');
        Ok(line)
    }

    fn header_lines(fields: &[Field]) -> String {
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        format!("#Version: 1.0\n#Fields: {}\n", names.join(" "))
    }
}

impl Default for LogCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for LogCodec {
    fn plugin_type(&self) -> &'static str {
        "LogCodec"
    }

    fn content_type(&self) -> &'static str {
        "text/ascii"
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
        self.wrote_header = false;
        Ok(())
    }

    fn read(&mut self, input: &mut dyn BufRead, event: &mut Event) -> Result<bool, CodecError> {
        if !self.def.read_gate(event)? {
            return Ok(false);
        }

        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                event.clear();
                return Ok(false);
            }
            let record = line.trim_end_matches(['\r', '\n']);
            if record.is_empty() {
                continue;
            }
            if self.def.headers && record.starts_with('#') {
                continue;
            }
            self.parse_record(record, event)?;
            return Ok(true);
        }
    }

    fn write(&mut self, output: &mut dyn Write, event: &Event) -> Result<(), CodecError> {
        if self.def.headers && !self.wrote_header {
            output.write_all(Self::header_lines(&self.def.fields).as_bytes())?;
            self.wrote_header = true;
        }
        let line = self.write_record(event)?;
        output.write_all(line.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self, output: &mut dyn Write) -> Result<(), CodecError> {
        output.flush()?;
        self.wrote_header = false;
        Ok(())
    }

    fn clone_codec(&self) -> Box<dyn Codec> {
        Box::new(Self {
            def: self.def.clone(),
            wrote_header: false,
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
    use chrono::{NaiveDate, NaiveDateTime};
    use pion_event::TermType;
    use pion_types::ErrorCode;

    const NS: &str = "urn:vocab:clickstream";

    struct Fixture {
        vocab: Vocabulary,
        event_type: TermRef,
    }

    impl Fixture {
        fn new() -> Self {
            let mut vocab = Vocabulary::new();
            vocab.add_namespace(NS, false).unwrap();
            let event_type = vocab
                .add_term("urn:vocab:clickstream#http-request", TermType::Object)
                .unwrap();
            for (name, ty) in [
                ("remotehost", TermType::String),
                ("rfc931", TermType::String),
                ("authuser", TermType::String),
                ("date", TermType::DateTime),
                ("request", TermType::String),
                ("status", TermType::UInt),
                ("bytes", TermType::UInt),
                ("referer", TermType::String),
            ] {
                vocab
                    .add_term(format!("urn:vocab:clickstream#{name}"), ty)
                    .unwrap();
            }
            Self { vocab, event_type }
        }

        fn term(&self, name: &str) -> TermRef {
            self.vocab
                .find_term(&format!("urn:vocab:clickstream#{name}"))
                .expect("term registered")
        }

        /// Common Log Format field map.
        fn common_config(&self) -> CodecConfig {
            CodecConfig {
                name: "Common Log Format".into(),
                event_type: "urn:vocab:clickstream#http-request".into(),
                fields: vec![
                    FieldConfig::new("urn:vocab:clickstream#remotehost", "remotehost"),
                    FieldConfig::new("urn:vocab:clickstream#rfc931", "rfc931"),
                    FieldConfig::new("urn:vocab:clickstream#authuser", "authuser"),
                    FieldConfig::new("urn:vocab:clickstream#date", "date").delimited('[', ']'),
                    FieldConfig::new("urn:vocab:clickstream#request", "request").quoted(),
                    FieldConfig::new("urn:vocab:clickstream#status", "status"),
                    FieldConfig::new("urn:vocab:clickstream#bytes", "bytes"),
                ],
                ..CodecConfig::for_plugin("LogCodec")
            }
        }

        /// Extended Log Format field map.
        fn extended_config(&self) -> CodecConfig {
            CodecConfig {
                name: "Extended Log Format".into(),
                headers: true,
                event_type: "urn:vocab:clickstream#http-request".into(),
                fields: vec![
                    FieldConfig::new("urn:vocab:clickstream#date", "date"),
                    FieldConfig::new("urn:vocab:clickstream#remotehost", "remotehost"),
                    FieldConfig::new("urn:vocab:clickstream#request", "request").quoted(),
                    FieldConfig::new("urn:vocab:clickstream#referer", "cs(Referer)").quoted(),
                    FieldConfig::new("urn:vocab:clickstream#status", "status"),
                ],
                ..CodecConfig::for_plugin("LogCodec")
            }
        }

        fn common_codec(&self) -> LogCodec {
            let mut codec = LogCodec::new();
            codec.set_config(&self.vocab, &self.common_config()).unwrap();
            codec
        }

        fn extended_codec(&self) -> LogCodec {
            let mut codec = LogCodec::new();
            codec
                .set_config(&self.vocab, &self.extended_config())
                .unwrap();
            codec
        }
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .expect("valid date")
            .and_hms_opt(h, min, s)
            .expect("valid time")
    }

    #[test]
    fn read_common_log_record() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut input: &[u8] =
            b"10.0.19.111 - - [05/Apr/2007:05:37:11 -0600] \"GET /robots.txt HTTP/1.0\" 404 208\n";

        let mut event = Event::new(codec.event_type());
        assert!(codec.read(&mut input, &mut event).unwrap());

        assert_eq!(event.string(fx.term("remotehost")).unwrap(), "10.0.19.111");
        assert!(!event.is_defined(fx.term("rfc931")));
        assert!(!event.is_defined(fx.term("authuser")));
        assert_eq!(
            event.datetime(fx.term("date")).unwrap(),
            dt(2007, 4, 5, 5, 37, 11)
        );
        assert_eq!(
            event.string(fx.term("request")).unwrap(),
            "GET /robots.txt HTTP/1.0"
        );
        assert_eq!(event.uint(fx.term("status")).unwrap(), 404);
        assert_eq!(event.uint(fx.term("bytes")).unwrap(), 208);

        // clean end of stream
        event.clear();
        assert!(!codec.read(&mut input, &mut event).unwrap());
        assert!(event.is_empty());
    }

    #[test]
    fn write_common_log_just_one_field() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut event = Event::new(codec.event_type());
        event.set_string(fx.term("remotehost"), "192.168.0.1");

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        assert_eq!(out, b"192.168.0.1 - - [] \"\" - -\n");
    }

    #[test]
    fn write_common_log_all_fields() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut event = Event::new(codec.event_type());
        event.set_string(fx.term("remotehost"), "192.168.10.10");
        event.set_string(fx.term("rfc931"), "greg");
        event.set_string(fx.term("authuser"), "bob");
        event.set_datetime(fx.term("date"), dt(2008, 1, 10, 12, 31, 0));
        event.set_string(fx.term("request"), "GET / HTTP/1.1");
        event.set_uint(fx.term("status"), 302);
        event.set_uint(fx.term("bytes"), 116);

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "192.168.10.10 greg bob [10/Jan/2008:12:31:00 ] \"GET / HTTP/1.1\" 302 116\n"
        );
    }

    #[test]
    fn common_log_round_trip() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut event = Event::new(codec.event_type());
        event.set_string(fx.term("remotehost"), "10.0.19.111");
        event.set_datetime(fx.term("date"), dt(2007, 4, 5, 5, 37, 11));
        event.set_string(fx.term("request"), "GET /robots.txt HTTP/1.0");
        event.set_uint(fx.term("status"), 404);
        event.set_uint(fx.term("bytes"), 208);

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        codec.finish(&mut out).unwrap();

        let mut input: &[u8] = &out;
        let mut back = Event::new(codec.event_type());
        assert!(codec.read(&mut input, &mut back).unwrap());
        // entries come back in field-map order, which is how they went in
        assert_eq!(back, event);

        assert!(!codec.read(&mut input, &mut back).unwrap());
        assert!(back.is_empty());
    }

    #[test]
    fn extended_log_emits_header_once() {
        let fx = Fixture::new();
        let mut codec = fx.extended_codec();
        let mut event = Event::new(codec.event_type());
        event.set_string(fx.term("remotehost"), "192.168.10.10");
        event.set_datetime(fx.term("date"), dt(2008, 1, 10, 12, 31, 0));
        event.set_string(fx.term("request"), "GET / HTTP/1.1");
        event.set_string(fx.term("referer"), "http://www.atomiclabs.com/");
        event.set_uint(fx.term("status"), 302);

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();
        codec.write(&mut out, &event).unwrap();

        let expected = "#Version: 1.0\n#Fields: date remotehost request cs(Referer) status\n\
             \"10/Jan/2008:12:31:00 \" 192.168.10.10 \"GET / HTTP/1.1\" \"http://www.atomiclabs.com/\" 302\n\
             \"10/Jan/2008:12:31:00 \" 192.168.10.10 \"GET / HTTP/1.1\" \"http://www.atomiclabs.com/\" 302\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn extended_log_reads_skip_headers() {
        let fx = Fixture::new();
        let mut codec = fx.extended_codec();
        let mut input: &[u8] = b"#Version: 1.0\n\
              #Fields: date remotehost request cs(Referer) status\n\
              \"10/Jan/2008:12:31:00 \" 192.168.10.10 \"GET / HTTP/1.1\" \"http://www.atomiclabs.com/\" 302\n";

        let mut event = Event::new(codec.event_type());
        assert!(codec.read(&mut input, &mut event).unwrap());
        assert_eq!(event.string(fx.term("remotehost")).unwrap(), "192.168.10.10");
        assert_eq!(event.uint(fx.term("status")).unwrap(), 302);
        assert!(!codec.read(&mut input, &mut event).unwrap());
    }

    #[test]
    fn wrong_event_type_rejected() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let other_type = fx.term("remotehost");
        let mut input: &[u8] = b"some text\n";

        let mut event = Event::new(other_type);
        let err = codec.read(&mut input, &mut event).unwrap_err();
        assert_eq!(err.code(), "CODEC_WRONG_EVENT_TYPE");
    }

    #[test]
    fn undefined_event_type_is_lenient_by_default() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut input: &[u8] = b"some text\n";

        let mut event = Event::undefined();
        assert!(!codec.read(&mut input, &mut event).unwrap());
        assert!(event.is_empty());
    }

    #[test]
    fn undefined_event_type_strict_mode_rejects() {
        let fx = Fixture::new();
        let mut config = fx.common_config();
        config.strict = true;
        let mut codec = LogCodec::new();
        codec.set_config(&fx.vocab, &config).unwrap();

        let mut input: &[u8] = b"some text\n";
        let mut event = Event::undefined();
        let err = codec.read(&mut input, &mut event).unwrap_err();
        assert_eq!(err.code(), "CODEC_WRONG_EVENT_TYPE");
    }

    #[test]
    fn malformed_number_is_an_error() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut input: &[u8] = b"host - - [] \"\" notanumber 1\n";

        let mut event = Event::new(codec.event_type());
        let err = codec.read(&mut input, &mut event).unwrap_err();
        assert_eq!(err.code(), "CODEC_MALFORMED");
    }

    #[test]
    fn unterminated_delimiter_is_an_error() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();
        let mut input: &[u8] = b"host - - [05/Apr/2007:05:37:11\n";

        let mut event = Event::new(codec.event_type());
        let err = codec.read(&mut input, &mut event).unwrap_err();
        assert_eq!(err.code(), "CODEC_MALFORMED");
    }

    #[test]
    fn clone_has_fresh_header_state() {
        let fx = Fixture::new();
        let mut codec = fx.extended_codec();
        let event = Event::new(codec.event_type());

        let mut out = Vec::new();
        codec.write(&mut out, &event).unwrap();

        let mut clone = codec.clone_codec();
        assert_eq!(clone.event_type(), codec.event_type());
        let mut out2 = Vec::new();
        clone.write(&mut out2, &event).unwrap();
        assert!(String::from_utf8(out2).unwrap().starts_with("#Version: 1.0\n"));
    }

    #[test]
    fn update_vocabulary_after_term_removal() {
        let fx = Fixture::new();
        let mut codec = fx.common_codec();

        let mut vocab = fx.vocab.clone();
        vocab.remove_term("urn:vocab:clickstream#bytes").unwrap();

        let err = codec.update_vocabulary(&vocab).unwrap_err();
        assert_eq!(err.code(), "CODEC_TERM_NO_LONGER_DEFINED");
    }
}
