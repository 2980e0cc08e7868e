//! The codec trait and the provider seam used by reactors.

use crate::config::CodecConfig;
use crate::error::CodecError;
use pion_event::{Event, TermRef, Vocabulary};
use pion_types::PluginId;
use std::io::{BufRead, Write};

/// A configured transformer between a byte stream and events of one
/// event-type.
///
/// # Lifecycle
///
/// ```text
/// factory create → set_config → read/write (reused across events)
///       │                          │
///       │                          ├─ clone_codec  (private per-worker state)
///       │                          └─ update_vocabulary  (on vocab change)
///       └─ dropped on config remove
/// ```
///
/// Codec instances are not internally synchronized; give each worker a
/// clone or serialize access externally.
pub trait Codec: Send {
    /// Plugin type name, e.g. `"LogCodec"`.
    fn plugin_type(&self) -> &'static str;

    /// MIME-ish content type of the wire format.
    fn content_type(&self) -> &'static str;

    /// Registry id. Empty until configured with one.
    fn id(&self) -> &PluginId;

    /// Display name from configuration.
    fn name(&self) -> &str;

    /// Free-form comment from configuration.
    fn comment(&self) -> &str;

    /// Reference of the event-type this codec produces and consumes.
    /// `UNDEFINED_TERM_REF` until configured.
    fn event_type(&self) -> TermRef;

    /// Applies a configuration against a vocabulary snapshot.
    ///
    /// # Errors
    ///
    /// `CODEC_INVALID_CONFIG`, `CODEC_UNKNOWN_EVENT_TYPE`,
    /// `CODEC_NOT_AN_OBJECT`, or `CODEC_UNKNOWN_TERM`.
    fn set_config(&mut self, vocab: &Vocabulary, config: &CodecConfig) -> Result<(), CodecError>;

    /// Consumes one record from the stream and populates the event.
    ///
    /// Returns `false` at clean end-of-stream with the event left
    /// empty.
    ///
    /// # Errors
    ///
    /// `CODEC_WRONG_EVENT_TYPE` when the event's type does not match
    /// this codec's; `CODEC_MALFORMED` on parse failure (the stream
    /// position is undefined afterwards, callers typically close).
    fn read(&mut self, input: &mut dyn BufRead, event: &mut Event) -> Result<bool, CodecError>;

    /// Serializes one record.
    ///
    /// # Errors
    ///
    /// `CODEC_IO` on stream failure.
    fn write(&mut self, output: &mut dyn Write, event: &Event) -> Result<(), CodecError>;

    /// Emits any trailer and resets framing state.
    ///
    /// Line formats emit nothing; the JSON codec closes its array, the
    /// XML codec closes its document root.
    ///
    /// # Errors
    ///
    /// `CODEC_IO` on stream failure.
    fn finish(&mut self, output: &mut dyn Write) -> Result<(), CodecError>;

    /// Produces an independent instance with identical configuration
    /// and fresh framing state.
    fn clone_codec(&self) -> Box<dyn Codec>;

    /// Refreshes term references after a vocabulary change.
    ///
    /// # Errors
    ///
    /// `CODEC_TERM_NO_LONGER_DEFINED` when a referenced term vanished.
    fn update_vocabulary(&mut self, vocab: &Vocabulary) -> Result<(), CodecError>;
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("plugin_type", &self.plugin_type())
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// Hands out configured codec clones by id.
///
/// Implemented by the codec factory; reactors and services depend on
/// this seam instead of the factory type.
pub trait CodecProvider: Send + Sync {
    /// Returns an independent clone of the codec registered under `id`.
    ///
    /// # Errors
    ///
    /// `CODEC_NOT_FOUND` when no codec is registered under the id.
    fn codec(&self, id: &PluginId) -> Result<Box<dyn Codec>, CodecError>;
}
