//! Codec configuration model and field-map resolution.

use crate::error::CodecError;
use chrono::NaiveDateTime;
use pion_event::{EventValue, TermRef, TermType, Vocabulary, UNDEFINED_TERM_REF};
use pion_types::PluginId;
use serde::{Deserialize, Serialize};

/// Default pattern for datetime fields, the common-log clock format.
pub(crate) const DEFAULT_DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

/// Declarative configuration of one codec instance.
///
/// Carries the same data as the platform's configuration elements:
/// plugin type, display name, comment, event-type URN, and the ordered
/// field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Registry id; generated when omitted.
    #[serde(default)]
    pub id: Option<PluginId>,
    /// Plugin type name, e.g. `"LogCodec"`.
    pub plugin: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub comment: String,
    /// URN of the event-type term. Must resolve to an `object` term.
    pub event_type: String,
    /// Ordered field map.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// When true, reading into an event of the undefined event-type is
    /// an error instead of an empty `false` read.
    #[serde(default)]
    pub strict: bool,
    /// When true, the log codec emits `#Version`/`#Fields` header lines
    /// before the first record (extended log format).
    #[serde(default)]
    pub headers: bool,
}

impl CodecConfig {
    /// Starts a configuration for a plugin type with empty defaults.
    #[must_use]
    pub fn for_plugin(plugin: impl Into<String>) -> Self {
        Self {
            id: None,
            plugin: plugin.into(),
            name: String::new(),
            comment: String::new(),
            event_type: String::new(),
            fields: Vec::new(),
            strict: false,
            headers: false,
        }
    }
}

/// One entry of a codec's ordered field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// URN of the bound vocabulary term.
    pub term: String,
    /// Wire name of the field.
    pub name: String,
    /// Opening delimiter (single ASCII character), e.g. `[` for
    /// common-log dates.
    #[serde(default)]
    pub start: Option<String>,
    /// Closing delimiter; defaults to `start` when omitted.
    #[serde(default)]
    pub end: Option<String>,
    /// Format pattern override (datetime fields).
    #[serde(default)]
    pub format: Option<String>,
}

impl FieldConfig {
    /// Creates an undelimited field binding.
    #[must_use]
    pub fn new(term: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            name: name.into(),
            start: None,
            end: None,
            format: None,
        }
    }

    /// Sets the delimiter pair.
    #[must_use]
    pub fn delimited(mut self, start: char, end: char) -> Self {
        self.start = Some(start.to_string());
        self.end = Some(end.to_string());
        self
    }

    /// Sets double-quote delimiters.
    #[must_use]
    pub fn quoted(self) -> Self {
        self.delimited('"', '"')
    }

    /// Sets the format pattern.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// A resolved field binding.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub term_ref: TermRef,
    pub term_type: TermType,
    pub urn: String,
    pub name: String,
    pub start: Option<char>,
    pub end: Option<char>,
    pub format: Option<String>,
}

/// Resolved codec state shared by every built-in codec.
#[derive(Debug, Clone)]
pub(crate) struct CodecDef {
    pub id: PluginId,
    pub name: String,
    pub comment: String,
    pub event_type: TermRef,
    pub event_type_urn: String,
    pub fields: Vec<Field>,
    pub strict: bool,
    pub headers: bool,
}

impl CodecDef {
    /// State of a codec that has not been configured yet.
    pub fn unconfigured() -> Self {
        Self {
            id: PluginId::new(""),
            name: String::new(),
            comment: String::new(),
            event_type: UNDEFINED_TERM_REF,
            event_type_urn: String::new(),
            fields: Vec::new(),
            strict: false,
            headers: false,
        }
    }

    /// Resolves a configuration against a vocabulary snapshot.
    pub fn resolve(vocab: &Vocabulary, config: &CodecConfig) -> Result<Self, CodecError> {
        if config.event_type.is_empty() {
            return Err(CodecError::InvalidConfig(
                "missing event_type element".into(),
            ));
        }
        let event_type = vocab
            .find_term(&config.event_type)
            .ok_or_else(|| CodecError::UnknownEventType(config.event_type.clone()))?;
        if vocab.term(event_type)?.term_type != TermType::Object {
            return Err(CodecError::NotAnObject(config.event_type.clone()));
        }

        let mut fields = Vec::with_capacity(config.fields.len());
        for fc in &config.fields {
            let term_ref = vocab
                .find_term(&fc.term)
                .ok_or_else(|| CodecError::UnknownTerm(fc.term.clone()))?;
            let term_type = vocab.term(term_ref)?.term_type;
            if matches!(term_type, TermType::Object | TermType::Null) {
                return Err(CodecError::InvalidConfig(format!(
                    "field '{}' binds a composite term",
                    fc.name
                )));
            }
            let start = parse_delim(fc.start.as_deref(), &fc.name)?;
            let end = parse_delim(fc.end.as_deref(), &fc.name)?.or(start);
            fields.push(Field {
                term_ref,
                term_type,
                urn: fc.term.clone(),
                name: fc.name.clone(),
                start,
                end,
                format: fc.format.clone(),
            });
        }

        Ok(Self {
            id: config.id.clone().unwrap_or_else(|| PluginId::new("")),
            name: config.name.clone(),
            comment: config.comment.clone(),
            event_type,
            event_type_urn: config.event_type.clone(),
            fields,
            strict: config.strict,
            headers: config.headers,
        })
    }

    /// Re-resolves every referenced term against a new vocabulary.
    ///
    /// # Errors
    ///
    /// `CODEC_TERM_NO_LONGER_DEFINED` naming the first vanished term.
    pub fn update_vocabulary(&mut self, vocab: &Vocabulary) -> Result<(), CodecError> {
        if self.event_type != UNDEFINED_TERM_REF {
            self.event_type = vocab.find_term(&self.event_type_urn).ok_or_else(|| {
                CodecError::TermNoLongerDefined {
                    urn: self.event_type_urn.clone(),
                }
            })?;
        }
        for field in &mut self.fields {
            let term_ref =
                vocab
                    .find_term(&field.urn)
                    .ok_or_else(|| CodecError::TermNoLongerDefined {
                        urn: field.urn.clone(),
                    })?;
            field.term_ref = term_ref;
            field.term_type = vocab.term(term_ref)?.term_type;
        }
        Ok(())
    }

    /// Gate applied at the top of every `read`.
    ///
    /// Returns `true` when the record read should proceed. Returns
    /// `false` when the call must yield an empty `false` read: either
    /// side has the undefined event-type and the codec is lenient.
    pub fn read_gate(&self, event: &mut pion_event::Event) -> Result<bool, CodecError> {
        if self.event_type == UNDEFINED_TERM_REF || event.event_type() == UNDEFINED_TERM_REF {
            if self.strict {
                return Err(CodecError::WrongEventType {
                    expected: self.event_type,
                    actual: event.event_type(),
                });
            }
            event.clear();
            return Ok(false);
        }
        if event.event_type() != self.event_type {
            return Err(CodecError::WrongEventType {
                expected: self.event_type,
                actual: event.event_type(),
            });
        }
        Ok(true)
    }
}

fn parse_delim(raw: Option<&str>, field: &str) -> Result<Option<char>, CodecError> {
    match raw {
        None => Ok(None),
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != ' ' => Ok(Some(c)),
                _ => Err(CodecError::InvalidConfig(format!(
                    "field '{field}': delimiter must be one non-space ASCII character"
                ))),
            }
        }
    }
}

/// Renders a value for a text wire format.
pub(crate) fn format_value(value: &EventValue, field: &Field) -> String {
    match value {
        EventValue::UInt(v) => v.to_string(),
        EventValue::Int(v) => v.to_string(),
        EventValue::Float(v) => v.to_string(),
        EventValue::Double(v) => v.to_string(),
        EventValue::Str(v) => v.clone(),
        EventValue::DateTime(v) => match &field.format {
            Some(fmt) => v.format(fmt).to_string(),
            // default format carries a trailing zone slot
            None => format!("{} ", v.format(DEFAULT_DATE_FORMAT)),
        },
    }
}

/// Parses a wire token into the field's value type.
pub(crate) fn parse_value(token: &str, field: &Field) -> Result<EventValue, CodecError> {
    match field.term_type {
        TermType::String => Ok(EventValue::Str(token.to_owned())),
        TermType::UInt => token
            .parse::<u64>()
            .map(EventValue::UInt)
            .map_err(|_| malformed_token(token, field)),
        TermType::Int => token
            .parse::<i64>()
            .map(EventValue::Int)
            .map_err(|_| malformed_token(token, field)),
        TermType::Float => token
            .parse::<f32>()
            .map(EventValue::Float)
            .map_err(|_| malformed_token(token, field)),
        TermType::Double => token
            .parse::<f64>()
            .map(EventValue::Double)
            .map_err(|_| malformed_token(token, field)),
        TermType::DateTime => parse_datetime(token, field).map(EventValue::DateTime),
        TermType::Null | TermType::Object => Err(malformed_token(token, field)),
    }
}

/// Parses a datetime token.
///
/// With the default pattern, a trailing timezone token (`-0600`) is
/// accepted and ignored; the stored value is the local clock reading.
pub(crate) fn parse_datetime(token: &str, field: &Field) -> Result<NaiveDateTime, CodecError> {
    let (text, fmt) = match &field.format {
        Some(fmt) => (token, fmt.as_str()),
        None => (
            token.split_once(' ').map_or(token, |(clock, _)| clock),
            DEFAULT_DATE_FORMAT,
        ),
    };
    NaiveDateTime::parse_from_str(text, fmt).map_err(|err| {
        CodecError::Malformed(format!(
            "field '{}': bad datetime '{token}': {err}",
            field.name
        ))
    })
}

fn malformed_token(token: &str, field: &Field) -> CodecError {
    CodecError::Malformed(format!(
        "field '{}': cannot parse '{token}' as {}",
        field.name, field.term_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_types::ErrorCode;

    fn vocab() -> Vocabulary {
        let mut v = Vocabulary::new();
        v.add_namespace("urn:vocab:test", false).unwrap();
        v.add_term("urn:vocab:test#http-request", TermType::Object)
            .unwrap();
        v.add_term("urn:vocab:test#bytes", TermType::UInt).unwrap();
        v.add_term("urn:vocab:test#date", TermType::DateTime).unwrap();
        v
    }

    fn config() -> CodecConfig {
        CodecConfig {
            event_type: "urn:vocab:test#http-request".into(),
            fields: vec![FieldConfig::new("urn:vocab:test#bytes", "bytes")],
            ..CodecConfig::for_plugin("LogCodec")
        }
    }

    #[test]
    fn resolve_binds_fields() {
        let def = CodecDef::resolve(&vocab(), &config()).unwrap();
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].term_type, TermType::UInt);
        assert_ne!(def.event_type, UNDEFINED_TERM_REF);
    }

    #[test]
    fn missing_event_type_rejected() {
        let mut cfg = config();
        cfg.event_type.clear();
        let err = CodecDef::resolve(&vocab(), &cfg).unwrap_err();
        assert_eq!(err.code(), "CODEC_INVALID_CONFIG");
    }

    #[test]
    fn unknown_event_type_rejected() {
        let mut cfg = config();
        cfg.event_type = "urn:vocab:test#nope".into();
        let err = CodecDef::resolve(&vocab(), &cfg).unwrap_err();
        assert_eq!(err.code(), "CODEC_UNKNOWN_EVENT_TYPE");
    }

    #[test]
    fn non_object_event_type_rejected() {
        let mut cfg = config();
        cfg.event_type = "urn:vocab:test#bytes".into();
        let err = CodecDef::resolve(&vocab(), &cfg).unwrap_err();
        assert_eq!(err.code(), "CODEC_NOT_AN_OBJECT");
    }

    #[test]
    fn unknown_field_term_rejected() {
        let mut cfg = config();
        cfg.fields.push(FieldConfig::new("urn:vocab:test#ghost", "ghost"));
        let err = CodecDef::resolve(&vocab(), &cfg).unwrap_err();
        assert_eq!(err.code(), "CODEC_UNKNOWN_TERM");
    }

    #[test]
    fn multichar_delimiter_rejected() {
        let mut cfg = config();
        cfg.fields[0].start = Some("[[".into());
        let err = CodecDef::resolve(&vocab(), &cfg).unwrap_err();
        assert_eq!(err.code(), "CODEC_INVALID_CONFIG");
    }

    #[test]
    fn update_vocabulary_detects_removed_term() {
        let mut v = vocab();
        let mut def = CodecDef::resolve(&v, &config()).unwrap();

        v.remove_term("urn:vocab:test#bytes").unwrap();
        let err = def.update_vocabulary(&v).unwrap_err();
        assert_eq!(err.code(), "CODEC_TERM_NO_LONGER_DEFINED");
    }

    #[test]
    fn default_datetime_parse_ignores_zone() {
        let field = Field {
            term_ref: 1,
            term_type: TermType::DateTime,
            urn: String::new(),
            name: "date".into(),
            start: None,
            end: None,
            format: None,
        };
        let parsed = parse_datetime("05/Apr/2007:05:37:11 -0600", &field).unwrap();
        assert_eq!(parsed.to_string(), "2007-04-05 05:37:11");
    }
}
