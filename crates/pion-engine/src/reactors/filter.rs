//! Processing reactor that forwards events matching a rule set.

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use pion_event::{EventPtr, EventValue, TermRef, TermType, Vocabulary};
use pion_reactor::{
    Reactor, ReactorConfig, ReactorContext, ReactorCore, ReactorError, ReactorType,
};
use serde::Deserialize;
use std::sync::Arc;

const FILTER_DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

#[derive(Debug, Deserialize)]
struct FilterOptions {
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
struct RuleConfig {
    term: String,
    op: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Clone)]
enum FilterOp {
    Defined,
    NotDefined,
    Equals(EventValue),
    NotEquals(EventValue),
    Contains(String),
}

#[derive(Debug, Clone)]
struct FilterRule {
    urn: String,
    term_ref: TermRef,
    op: FilterOp,
}

impl FilterRule {
    fn matches(&self, event: &pion_event::Event) -> bool {
        match &self.op {
            FilterOp::Defined => event.is_defined(self.term_ref),
            FilterOp::NotDefined => !event.is_defined(self.term_ref),
            FilterOp::Equals(expected) => event.values(self.term_ref).any(|v| v == expected),
            FilterOp::NotEquals(expected) => event.values(self.term_ref).all(|v| v != expected),
            FilterOp::Contains(needle) => event.values(self.term_ref).any(|v| match v {
                EventValue::Str(s) => s.contains(needle),
                _ => false,
            }),
        }
    }
}

/// Forwards an event when every configured rule matches it.
///
/// With no rules configured every event passes, which makes the bare
/// reactor a pass-through node.
///
/// # Options
///
/// ```toml
/// [[options.rules]]
/// term = "urn:vocab:clickstream#status"
/// op = "equals"        # defined | not-defined | equals | not-equals | contains
/// value = "404"
/// ```
pub struct FilterReactor {
    core: Arc<ReactorCore>,
    rules: RwLock<Vec<FilterRule>>,
}

impl FilterReactor {
    /// Creates an unconfigured filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(ReactorCore::unconfigured(ReactorType::Processing)),
            rules: RwLock::new(Vec::new()),
        }
    }

    fn resolve_rules(
        vocab: &Vocabulary,
        options: &FilterOptions,
    ) -> Result<Vec<FilterRule>, ReactorError> {
        options
            .rules
            .iter()
            .map(|rule| Self::resolve_rule(vocab, rule))
            .collect()
    }

    fn resolve_rule(vocab: &Vocabulary, rule: &RuleConfig) -> Result<FilterRule, ReactorError> {
        let term_ref = vocab.find_term(&rule.term).ok_or_else(|| {
            ReactorError::InvalidConfig(format!("unknown rule term: {}", rule.term))
        })?;
        let term_type = vocab.term(term_ref)?.term_type;

        let value = || {
            rule.value.as_deref().ok_or_else(|| {
                ReactorError::InvalidConfig(format!("rule op '{}' requires a value", rule.op))
            })
        };
        let op = match rule.op.as_str() {
            "defined" => FilterOp::Defined,
            "not-defined" => FilterOp::NotDefined,
            "equals" => FilterOp::Equals(parse_rule_value(value()?, term_type, &rule.term)?),
            "not-equals" => FilterOp::NotEquals(parse_rule_value(value()?, term_type, &rule.term)?),
            "contains" => {
                if term_type != TermType::String {
                    return Err(ReactorError::InvalidConfig(format!(
                        "rule op 'contains' requires a string term, got {term_type}"
                    )));
                }
                FilterOp::Contains(value()?.to_owned())
            }
            other => {
                return Err(ReactorError::InvalidConfig(format!(
                    "unknown rule op: {other}"
                )))
            }
        };

        Ok(FilterRule {
            urn: rule.term.clone(),
            term_ref,
            op,
        })
    }
}

fn parse_rule_value(
    raw: &str,
    term_type: TermType,
    term: &str,
) -> Result<EventValue, ReactorError> {
    let invalid =
        || ReactorError::InvalidConfig(format!("cannot parse '{raw}' as {term_type} for {term}"));
    match term_type {
        TermType::String => Ok(EventValue::Str(raw.to_owned())),
        TermType::UInt => raw.parse().map(EventValue::UInt).map_err(|_| invalid()),
        TermType::Int => raw.parse().map(EventValue::Int).map_err(|_| invalid()),
        TermType::Float => raw.parse().map(EventValue::Float).map_err(|_| invalid()),
        TermType::Double => raw.parse().map(EventValue::Double).map_err(|_| invalid()),
        TermType::DateTime => NaiveDateTime::parse_from_str(raw, FILTER_DATE_FORMAT)
            .map(EventValue::DateTime)
            .map_err(|_| invalid()),
        TermType::Null | TermType::Object => Err(invalid()),
    }
}

impl Default for FilterReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor for FilterReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn set_config(
        &mut self,
        vocab: &Vocabulary,
        config: &ReactorConfig,
    ) -> Result<(), ReactorError> {
        let options: FilterOptions = config.parse_options()?;
        let rules = Self::resolve_rules(vocab, &options)?;
        self.core = Arc::new(ReactorCore::from_config(ReactorType::Processing, config));
        *self.rules.write() = rules;
        Ok(())
    }

    fn start(&self, _ctx: &ReactorContext) -> Result<(), ReactorError> {
        if self.core.is_running() {
            return Err(ReactorError::AlreadyRunning);
        }
        self.core.set_running(true);
        Ok(())
    }

    fn stop(&self) -> Result<(), ReactorError> {
        self.core.set_running(false);
        Ok(())
    }

    fn process(&self, event: EventPtr) -> Result<Vec<EventPtr>, ReactorError> {
        let rules = self.rules.read();
        if rules.iter().all(|rule| rule.matches(&event)) {
            Ok(vec![event])
        } else {
            Ok(Vec::new())
        }
    }

    fn update_vocabulary(&self, vocab: &Arc<Vocabulary>) -> Result<(), ReactorError> {
        let mut rules = self.rules.write();
        for rule in rules.iter_mut() {
            rule.term_ref = vocab.find_term(&rule.urn).ok_or_else(|| {
                pion_codec::CodecError::TermNoLongerDefined {
                    urn: rule.urn.clone(),
                }
            })?;
        }
        Ok(())
    }
}
