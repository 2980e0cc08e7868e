//! The term catalog, partitioned into lockable namespaces.

use crate::error::VocabError;
use crate::term::{namespace_of, Term, TermRef, TermType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A namespace partition of the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Namespace {
    name: String,
    locked: bool,
}

/// An ordered catalog of [`Term`]s.
///
/// Term references index into an append-only table, so a reference
/// handed out once stays valid for the lifetime of the vocabulary.
/// Removing a term leaves a tombstone: the slot is cleared but never
/// reused, and lookups for the removed reference fail.
///
/// Mutation is namespace-guarded: every term belongs to the namespace
/// named by its URN prefix, and a locked namespace rejects add, update,
/// and remove.
///
/// `Vocabulary` is a plain value; concurrent access and change
/// notification live in [`VocabularyManager`](crate::VocabularyManager).
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Term table indexed by `TermRef`. Slot 0 is reserved for
    /// `UNDEFINED_TERM_REF`; removed terms become `None`.
    terms: Vec<Option<Term>>,
    /// URN to reference index over live terms.
    urn_index: HashMap<String, TermRef>,
    namespaces: Vec<Namespace>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Creates an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terms: vec![None],
            urn_index: HashMap::new(),
            namespaces: Vec::new(),
        }
    }

    /// Registers a namespace.
    ///
    /// # Errors
    ///
    /// `VOCAB_DUPLICATE_NAMESPACE` if the name is already registered.
    pub fn add_namespace(&mut self, name: impl Into<String>, locked: bool) -> Result<(), VocabError> {
        let name = name.into();
        if self.namespaces.iter().any(|ns| ns.name == name) {
            return Err(VocabError::DuplicateNamespace(name));
        }
        self.namespaces.push(Namespace { name, locked });
        Ok(())
    }

    /// Returns whether a namespace is registered.
    #[must_use]
    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.name == name)
    }

    /// Returns whether a namespace is locked.
    ///
    /// # Errors
    ///
    /// `VOCAB_NAMESPACE_NOT_FOUND` if the namespace is unknown.
    pub fn is_locked(&self, name: &str) -> Result<bool, VocabError> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == name)
            .map(|ns| ns.locked)
            .ok_or_else(|| VocabError::NamespaceNotFound(name.to_owned()))
    }

    /// Locks or unlocks a namespace.
    ///
    /// # Errors
    ///
    /// `VOCAB_NAMESPACE_NOT_FOUND` if the namespace is unknown.
    pub fn set_locked(&mut self, name: &str, locked: bool) -> Result<(), VocabError> {
        let ns = self
            .namespaces
            .iter_mut()
            .find(|ns| ns.name == name)
            .ok_or_else(|| VocabError::NamespaceNotFound(name.to_owned()))?;
        ns.locked = locked;
        Ok(())
    }

    /// Registers a new term and returns its reference.
    ///
    /// The term's namespace (URN prefix up to `#`) must be registered
    /// and unlocked.
    ///
    /// # Errors
    ///
    /// `VOCAB_NAMESPACE_NOT_FOUND`, `VOCAB_NAMESPACE_LOCKED`, or
    /// `VOCAB_DUPLICATE_TERM`.
    pub fn add_term(
        &mut self,
        urn: impl Into<String>,
        term_type: TermType,
    ) -> Result<TermRef, VocabError> {
        self.add_term_full(urn, term_type, String::new(), None)
    }

    /// Registers a new term with comment and format pattern.
    ///
    /// # Errors
    ///
    /// Same as [`add_term`](Self::add_term).
    pub fn add_term_full(
        &mut self,
        urn: impl Into<String>,
        term_type: TermType,
        comment: String,
        format: Option<String>,
    ) -> Result<TermRef, VocabError> {
        let urn = urn.into();
        self.check_unlocked(&urn)?;
        if self.urn_index.contains_key(&urn) {
            return Err(VocabError::DuplicateTerm(urn));
        }

        let term_ref = self.terms.len() as TermRef;
        self.urn_index.insert(urn.clone(), term_ref);
        self.terms.push(Some(Term {
            term_ref,
            urn,
            term_type,
            comment,
            format,
        }));
        Ok(term_ref)
    }

    /// Replaces the definition of an existing term, keeping its reference.
    ///
    /// # Errors
    ///
    /// `VOCAB_NAMESPACE_LOCKED` or `VOCAB_TERM_NOT_FOUND`.
    pub fn update_term(&mut self, term: Term) -> Result<(), VocabError> {
        self.check_unlocked(&term.urn)?;
        let term_ref = self
            .urn_index
            .get(&term.urn)
            .copied()
            .ok_or_else(|| VocabError::TermNotFound(term.urn.clone()))?;
        self.terms[term_ref as usize] = Some(Term { term_ref, ..term });
        Ok(())
    }

    /// Removes a term, leaving a tombstone so other references stay stable.
    ///
    /// Codecs and reactors holding the removed reference discover the
    /// removal on their next vocabulary update notification.
    ///
    /// # Errors
    ///
    /// `VOCAB_NAMESPACE_LOCKED` or `VOCAB_TERM_NOT_FOUND`.
    pub fn remove_term(&mut self, urn: &str) -> Result<(), VocabError> {
        self.check_unlocked(urn)?;
        let term_ref = self
            .urn_index
            .remove(urn)
            .ok_or_else(|| VocabError::TermNotFound(urn.to_owned()))?;
        self.terms[term_ref as usize] = None;
        Ok(())
    }

    /// Looks up a term reference by URN.
    #[must_use]
    pub fn find_term(&self, urn: &str) -> Option<TermRef> {
        self.urn_index.get(urn).copied()
    }

    /// Returns the term for a reference.
    ///
    /// # Errors
    ///
    /// `VOCAB_TERM_NOT_FOUND` for the undefined reference, removed
    /// terms, and out-of-range references.
    pub fn term(&self, term_ref: TermRef) -> Result<&Term, VocabError> {
        self.terms
            .get(term_ref as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| VocabError::TermNotFound(format!("ref {term_ref}")))
    }

    /// Returns whether a reference names a live term.
    #[must_use]
    pub fn is_defined(&self, term_ref: TermRef) -> bool {
        self.terms
            .get(term_ref as usize)
            .is_some_and(Option::is_some)
    }

    /// Iterates live terms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter_map(Option::as_ref)
    }

    /// Number of live terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urn_index.len()
    }

    /// Returns whether the vocabulary has no live terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urn_index.is_empty()
    }

    fn check_unlocked(&self, urn: &str) -> Result<(), VocabError> {
        let namespace = namespace_of(urn);
        match self.is_locked(namespace)? {
            true => Err(VocabError::NamespaceLocked(namespace.to_owned())),
            false => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::UNDEFINED_TERM_REF;
    use pion_types::ErrorCode;

    const NS: &str = "urn:vocab:test";

    fn vocab_with_ns() -> Vocabulary {
        let mut vocab = Vocabulary::new();
        vocab.add_namespace(NS, false).expect("add namespace");
        vocab
    }

    #[test]
    fn add_and_find() {
        let mut vocab = vocab_with_ns();
        let r = vocab.add_term("urn:vocab:test#bytes", TermType::UInt).unwrap();
        assert_eq!(vocab.find_term("urn:vocab:test#bytes"), Some(r));
        assert_eq!(vocab.term(r).unwrap().term_type, TermType::UInt);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn undefined_ref_is_never_a_term() {
        let vocab = vocab_with_ns();
        assert!(!vocab.is_defined(UNDEFINED_TERM_REF));
        assert!(vocab.term(UNDEFINED_TERM_REF).is_err());
    }

    #[test]
    fn refs_are_stable_across_removal() {
        let mut vocab = vocab_with_ns();
        let a = vocab.add_term("urn:vocab:test#a", TermType::String).unwrap();
        let b = vocab.add_term("urn:vocab:test#b", TermType::UInt).unwrap();

        vocab.remove_term("urn:vocab:test#a").unwrap();
        assert!(!vocab.is_defined(a));
        assert!(vocab.find_term("urn:vocab:test#a").is_none());
        // b keeps its slot
        assert_eq!(vocab.term(b).unwrap().urn, "urn:vocab:test#b");

        // new registrations never reuse the tombstoned slot
        let c = vocab.add_term("urn:vocab:test#c", TermType::Int).unwrap();
        assert_ne!(c, a);
    }

    #[test]
    fn locked_namespace_rejects_mutation() {
        let mut vocab = vocab_with_ns();
        let term_ref = vocab.add_term("urn:vocab:test#a", TermType::String).unwrap();
        vocab.set_locked(NS, true).unwrap();

        let err = vocab
            .add_term("urn:vocab:test#b", TermType::String)
            .unwrap_err();
        assert_eq!(err.code(), "VOCAB_NAMESPACE_LOCKED");
        assert!(vocab.remove_term("urn:vocab:test#a").is_err());

        // reads are unaffected
        assert!(vocab.is_defined(term_ref));

        vocab.set_locked(NS, false).unwrap();
        assert!(vocab.remove_term("urn:vocab:test#a").is_ok());
    }

    #[test]
    fn update_keeps_reference() {
        let mut vocab = vocab_with_ns();
        let r = vocab.add_term("urn:vocab:test#a", TermType::String).unwrap();

        let mut term = vocab.term(r).unwrap().clone();
        term.comment = "updated".into();
        vocab.update_term(term).unwrap();

        assert_eq!(vocab.term(r).unwrap().comment, "updated");
        assert_eq!(vocab.find_term("urn:vocab:test#a"), Some(r));
    }

    #[test]
    fn duplicate_term_rejected() {
        let mut vocab = vocab_with_ns();
        vocab.add_term("urn:vocab:test#a", TermType::String).unwrap();
        let err = vocab.add_term("urn:vocab:test#a", TermType::UInt).unwrap_err();
        assert_eq!(err.code(), "VOCAB_DUPLICATE_TERM");
    }

    #[test]
    fn unknown_namespace_rejected() {
        let mut vocab = Vocabulary::new();
        let err = vocab.add_term("urn:vocab:other#a", TermType::String).unwrap_err();
        assert_eq!(err.code(), "VOCAB_NAMESPACE_NOT_FOUND");
    }

    #[test]
    fn iteration_is_in_registration_order() {
        let mut vocab = vocab_with_ns();
        vocab.add_term("urn:vocab:test#a", TermType::String).unwrap();
        vocab.add_term("urn:vocab:test#b", TermType::UInt).unwrap();
        vocab.add_term("urn:vocab:test#c", TermType::Int).unwrap();

        let names: Vec<_> = vocab.iter().map(Term::local_name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
