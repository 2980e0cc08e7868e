//! JSON codec: one object per event, array framing.

use crate::codec::Codec;
use crate::config::{format_value, parse_datetime, CodecConfig, CodecDef, Field};
use crate::error::CodecError;
use pion_event::{Event, EventValue, TermRef, TermType, Vocabulary};
use pion_types::PluginId;
use serde_json::{Map, Number, Value};
use std::io::{BufRead, Write};

/// Codec for JSON records.
///
/// Each event serializes to one object keyed by field name; the record
/// stream is framed as a JSON array:
///
/// ```text
/// [{"remotehost":"10.0.19.111","status":404},
/// {"remotehost":"10.0.31.104","status":200}]
/// ```
///
/// `write` opens the array lazily, `finish` closes it. The reader
/// accepts array framing, bare separators, and plain concatenated
/// objects; datetime values use the field's format pattern (or the
/// common-log default).
pub struct JsonCodec {
    def: CodecDef,
    started: bool,
}

impl JsonCodec {
    /// Creates an unconfigured JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            def: CodecDef::unconfigured(),
            started: false,
        }
    }

    fn record_object(&self, event: &Event) -> Result<Value, CodecError> {
        let mut map = Map::new();
        for field in &self.def.fields {
            let Some(value) = event.value(field.term_ref) else {
                continue;
            };
            if map.contains_key(&field.name) {
                continue;
            }
            map.insert(field.name.clone(), json_value(value, field)?);
        }
        Ok(Value::Object(map))
    }

    fn populate(&self, map: &Map<String, Value>, event: &mut Event) -> Result<(), CodecError> {
        for field in &self.def.fields {
            let Some(value) = map.get(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            event.insert(field.term_ref, event_value(value, field)?);
        }
        Ok(())
    }

    /// Scans the next balanced top-level object out of the stream.
    ///
    /// Framing bytes (`[`, `]`, `,`, whitespace) before the object are
    /// skipped; `None` means clean end of input.
    fn next_object(input: &mut dyn BufRead) -> Result<Option<String>, CodecError> {
        let mut byte = [0u8; 1];
        loop {
            if input.read(&mut byte)? == 0 {
                return Ok(None);
            }
            match byte[0] {
                b'{' => break,
                b'[' | b']' | b',' | b' ' | b'\t' | b'\r' | b'\n' => {}
                other => {
                    return Err(CodecError::Malformed(format!(
                        "unexpected byte 0x{other:02x} before JSON object"
                    )))
                }
            }
        }

        let mut buf = vec![b'{'];
        let mut depth = 1u32;
        let mut in_string = false;
        let mut escaped = false;
        while depth > 0 {
            if input.read(&mut byte)? == 0 {
                return Err(CodecError::Malformed("unterminated JSON object".into()));
            }
            let b = byte[0];
            buf.push(b);
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
            } else {
                match b {
                    b'"' => in_string = true,
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
            }
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|err| CodecError::Malformed(format!("invalid utf-8 in record: {err}")))
    }
}

fn json_value(value: &EventValue, field: &Field) -> Result<Value, CodecError> {
    Ok(match value {
        EventValue::UInt(v) => Value::Number(Number::from(*v)),
        EventValue::Int(v) => Value::Number(Number::from(*v)),
        EventValue::Float(v) => number_from_f64(f64::from(*v), field)?,
        EventValue::Double(v) => number_from_f64(*v, field)?,
        EventValue::Str(v) => Value::String(v.clone()),
        EventValue::DateTime(_) => Value::String(format_value(value, field)),
    })
}

fn number_from_f64(v: f64, field: &Field) -> Result<Value, CodecError> {
    Number::from_f64(v).map(Value::Number).ok_or_else(|| {
        CodecError::Malformed(format!("field '{}': non-finite number", field.name))
    })
}

fn event_value(value: &Value, field: &Field) -> Result<EventValue, CodecError> {
    let wrong_type = || {
        CodecError::Malformed(format!(
            "field '{}': expected {}, got {value}",
            field.name, field.term_type
        ))
    };
    match field.term_type {
        TermType::UInt => value.as_u64().map(EventValue::UInt).ok_or_else(wrong_type),
        TermType::Int => value.as_i64().map(EventValue::Int).ok_or_else(wrong_type),
        TermType::Float => value
            .as_f64()
            .map(|v| EventValue::Float(v as f32))
            .ok_or_else(wrong_type),
        TermType::Double => value.as_f64().map(EventValue::Double).ok_or_else(wrong_type),
        TermType::String => value
            .as_str()
            .map(|s| EventValue::Str(s.to_owned()))
            .ok_or_else(wrong_type),
        TermType::DateTime => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            parse_datetime(text, field).map(EventValue::DateTime)
        }
        TermType::Null | TermType::Object => Err(wrong_type()),
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn plugin_type(&self) -> &'static str {
        "JSONCodec"
    }

    fn content_type(&self) -> &'static str {
        "text/json"
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
        let Some(text) = Self::next_object(input)? else {
            event.clear();
            return Ok(false);
        };
        let value: Value = serde_json::from_str(&text)
            .map_err(|err| CodecError::Malformed(format!("bad JSON record: {err}")))?;
        let map = value
            .as_object()
            .ok_or_else(|| CodecError::Malformed("record is not a JSON object".into()))?;
        self.populate(map, event)?;
        Ok(true)
    }

    fn write(&mut self, output: &mut dyn Write, event: &Event) -> Result<(), CodecError> {
        if self.started {
            output.write_all(b",\n")?;
        } else {
            output.write_all(b"[")?;
            self.started = true;
        }
        let record = self.record_object(event)?;
        serde_json::to_writer(&mut *output, &record)
            .map_err(|err| CodecError::Malformed(format!("cannot serialize record: {err}")))?;
        Ok(())
    }

    fn finish(&mut self, output: &mut dyn Write) -> Result<(), CodecError> {
        if self.started {
            output.write_all(b"]\n")?;
        } else {
            output.write_all(b"[]\n")?;
        }
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
