//! Concurrent vocabulary owner with change notification.
//!
//! [`VocabularyManager`] holds the live [`Vocabulary`] behind a
//! copy-on-write snapshot:
//!
//! - **Reads**: [`snapshot`](VocabularyManager::snapshot) clones an
//!   `Arc<Vocabulary>` under a read lock; lookups never contend with
//!   mutation.
//! - **Writes**: each mutation clones the catalog, applies the change,
//!   and swaps the snapshot in place. Mutations are rare (configuration
//!   time) so the clone cost is irrelevant.
//!
//! After every successful mutation the manager notifies registered
//! [`VocabularyObserver`]s with the new snapshot, outside the write
//! critical section. Observers that reject the update (a codec whose
//! mapped term was removed) are logged; the mutation itself stands.

use crate::error::VocabError;
use crate::vocabulary::Vocabulary;
use crate::{Term, TermRef, TermType};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Receiver of vocabulary change notifications.
///
/// Codec factories and the reaction engine register themselves so that
/// configured plugins can refresh their term references. The callback
/// runs synchronously on the mutating thread; implementations must
/// finish it before processing further events.
pub trait VocabularyObserver: Send + Sync {
    /// Short key identifying the observer in logs.
    fn observer_key(&self) -> &str;

    /// Called with the new snapshot after every vocabulary change.
    ///
    /// # Errors
    ///
    /// Return an error to record that the observer can no longer
    /// operate against the new vocabulary (for example, a term it
    /// references was removed). The manager logs the failure.
    fn vocabulary_updated(&self, vocab: &Arc<Vocabulary>) -> Result<(), VocabError>;
}

/// Shared owner of the vocabulary.
pub struct VocabularyManager {
    vocab: RwLock<Arc<Vocabulary>>,
    observers: Mutex<Vec<Weak<dyn VocabularyObserver>>>,
}

impl VocabularyManager {
    /// Creates a manager over an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vocabulary(Vocabulary::new())
    }

    /// Creates a manager over a pre-populated vocabulary.
    #[must_use]
    pub fn with_vocabulary(vocab: Vocabulary) -> Self {
        Self {
            vocab: RwLock::new(Arc::new(vocab)),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current snapshot.
    ///
    /// The snapshot is immutable; it stays valid while later mutations
    /// swap in new snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vocabulary> {
        self.vocab.read().clone()
    }

    /// Registers an observer for change notifications.
    ///
    /// Registration holds a weak reference; dropping the observer
    /// deregisters it automatically.
    pub fn register_observer(&self, observer: Weak<dyn VocabularyObserver>) {
        self.observers.lock().push(observer);
    }

    /// Applies a mutation and notifies observers with the new snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the mutation's error; observers are only notified
    /// when the mutation succeeded.
    pub fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Vocabulary) -> Result<R, VocabError>,
    ) -> Result<R, VocabError> {
        // observer callbacks run after the write lock is released
        let (result, snapshot) = {
            let mut guard = self.vocab.write();
            let mut next = (**guard).clone();
            let result = f(&mut next)?;
            *guard = Arc::new(next);
            (result, Arc::clone(&guard))
        };
        self.notify(&snapshot);
        Ok(result)
    }

    /// Registers a namespace. See [`Vocabulary::add_namespace`].
    pub fn add_namespace(&self, name: &str, locked: bool) -> Result<(), VocabError> {
        self.mutate(|v| v.add_namespace(name, locked))
    }

    /// Registers a term. See [`Vocabulary::add_term`].
    pub fn add_term(&self, urn: &str, term_type: TermType) -> Result<TermRef, VocabError> {
        self.mutate(|v| v.add_term(urn, term_type))
    }

    /// Replaces a term definition. See [`Vocabulary::update_term`].
    pub fn update_term(&self, term: Term) -> Result<(), VocabError> {
        self.mutate(|v| v.update_term(term))
    }

    /// Removes a term. See [`Vocabulary::remove_term`].
    pub fn remove_term(&self, urn: &str) -> Result<(), VocabError> {
        self.mutate(|v| v.remove_term(urn))
    }

    /// Locks or unlocks a namespace.
    pub fn set_locked(&self, namespace: &str, locked: bool) -> Result<(), VocabError> {
        self.mutate(|v| v.set_locked(namespace, locked))
    }

    fn notify(&self, snapshot: &Arc<Vocabulary>) {
        let observers: Vec<Arc<dyn VocabularyObserver>> = {
            let mut guard = self.observers.lock();
            guard.retain(|weak| weak.strong_count() > 0);
            guard.iter().filter_map(Weak::upgrade).collect()
        };

        for observer in observers {
            match observer.vocabulary_updated(snapshot) {
                Ok(()) => debug!(observer = observer.observer_key(), "vocabulary update applied"),
                Err(err) => warn!(
                    observer = observer.observer_key(),
                    error = %err,
                    "observer rejected vocabulary update"
                ),
            }
        }
    }
}

impl Default for VocabularyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NS: &str = "urn:vocab:test";

    struct CountingObserver {
        seen: AtomicUsize,
        reject: bool,
    }

    impl CountingObserver {
        fn new(reject: bool) -> Arc<Self> {
            Arc::new(Self {
                seen: AtomicUsize::new(0),
                reject,
            })
        }
    }

    impl VocabularyObserver for CountingObserver {
        fn observer_key(&self) -> &str {
            "counting"
        }

        fn vocabulary_updated(&self, _vocab: &Arc<Vocabulary>) -> Result<(), VocabError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Err(VocabError::ObserverRejected {
                    observer: "counting".into(),
                    reason: "test".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn snapshot_is_stable_across_mutation() {
        let mgr = VocabularyManager::new();
        mgr.add_namespace(NS, false).unwrap();
        let before = mgr.snapshot();
        mgr.add_term("urn:vocab:test#a", TermType::String).unwrap();

        assert!(before.find_term("urn:vocab:test#a").is_none());
        assert!(mgr.snapshot().find_term("urn:vocab:test#a").is_some());
    }

    #[test]
    fn observers_see_every_change() {
        let mgr = VocabularyManager::new();
        let observer = CountingObserver::new(false);
        mgr.register_observer(Arc::downgrade(&observer) as Weak<dyn VocabularyObserver>);

        mgr.add_namespace(NS, false).unwrap();
        mgr.add_term("urn:vocab:test#a", TermType::String).unwrap();

        assert_eq!(observer.seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn rejecting_observer_does_not_block_mutation() {
        let mgr = VocabularyManager::new();
        let observer = CountingObserver::new(true);
        mgr.register_observer(Arc::downgrade(&observer) as Weak<dyn VocabularyObserver>);

        mgr.add_namespace(NS, false).unwrap();
        let r = mgr.add_term("urn:vocab:test#a", TermType::String).unwrap();
        assert!(mgr.snapshot().is_defined(r));
    }

    #[test]
    fn dropped_observer_is_pruned() {
        let mgr = VocabularyManager::new();
        let observer = CountingObserver::new(false);
        mgr.register_observer(Arc::downgrade(&observer) as Weak<dyn VocabularyObserver>);
        drop(observer);

        // must not panic or notify anything
        mgr.add_namespace(NS, false).unwrap();
    }

    #[test]
    fn failed_mutation_skips_notification() {
        let mgr = VocabularyManager::new();
        let observer = CountingObserver::new(false);
        mgr.register_observer(Arc::downgrade(&observer) as Weak<dyn VocabularyObserver>);

        assert!(mgr.remove_term("urn:vocab:test#missing").is_err());
        assert_eq!(observer.seen.load(Ordering::SeqCst), 0);
    }
}
