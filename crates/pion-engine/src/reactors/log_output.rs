//! Storage reactor that appends events to a log file.

use parking_lot::Mutex;
use pion_codec::{Codec, CodecProvider};
use pion_event::{EventPtr, Vocabulary};
use pion_reactor::{
    Reactor, ReactorConfig, ReactorContext, ReactorCore, ReactorError, ReactorType,
};
use pion_types::PluginId;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
struct OutputOptions {
    /// File to append records to.
    file: PathBuf,
    /// Id of the codec used to encode records.
    codec: PluginId,
}

struct OutputState {
    codec: Box<dyn Codec>,
    writer: BufWriter<File>,
}

/// Appends every delivered event to a file through a codec.
///
/// A storage reactor: consumes terminally and produces nothing
/// downstream. The codec's trailer is written when the reactor stops.
///
/// # Options
///
/// ```toml
/// [options]
/// file = "/var/log/filtered.log"
/// codec = "common-log"
/// ```
pub struct LogOutputReactor {
    core: Arc<ReactorCore>,
    options: Option<OutputOptions>,
    state: Mutex<Option<OutputState>>,
}

impl LogOutputReactor {
    /// Creates an unconfigured output reactor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(ReactorCore::unconfigured(ReactorType::Storage)),
            options: None,
            state: Mutex::new(None),
        }
    }
}

impl Default for LogOutputReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor for LogOutputReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn set_config(
        &mut self,
        _vocab: &Vocabulary,
        config: &ReactorConfig,
    ) -> Result<(), ReactorError> {
        let options: OutputOptions = config.parse_options()?;
        self.core = Arc::new(ReactorCore::from_config(ReactorType::Storage, config));
        self.options = Some(options);
        Ok(())
    }

    fn start(&self, ctx: &ReactorContext) -> Result<(), ReactorError> {
        if self.core.is_running() {
            return Err(ReactorError::AlreadyRunning);
        }
        let options = self
            .options
            .as_ref()
            .ok_or_else(|| ReactorError::InvalidConfig("reactor is not configured".into()))?;

        let codec = ctx.codecs.codec(&options.codec)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&options.file)?;
        *self.state.lock() = Some(OutputState {
            codec,
            writer: BufWriter::new(file),
        });
        self.core.set_running(true);
        Ok(())
    }

    fn stop(&self) -> Result<(), ReactorError> {
        self.core.set_running(false);
        if let Some(mut state) = self.state.lock().take() {
            state.codec.finish(&mut state.writer)?;
            state.writer.flush()?;
        }
        Ok(())
    }

    fn process(&self, event: EventPtr) -> Result<Vec<EventPtr>, ReactorError> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().ok_or(ReactorError::NotRunning)?;
        state.codec.write(&mut state.writer, &event)?;
        Ok(Vec::new())
    }

    fn update_codecs(&self, codecs: &dyn CodecProvider) -> Result<(), ReactorError> {
        let Some(options) = self.options.as_ref() else {
            return Ok(());
        };
        let mut guard = self.state.lock();
        if let Some(state) = guard.as_mut() {
            match codecs.codec(&options.codec) {
                Ok(codec) => state.codec = codec,
                Err(err) => {
                    warn!(reactor = %self.core.id(), error = %err, "codec refresh failed");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_event::Event;
    use pion_types::ErrorCode;

    #[test]
    fn process_requires_start() {
        let reactor = LogOutputReactor::new();
        let err = reactor
            .process(Arc::new(Event::undefined()))
            .unwrap_err();
        assert_eq!(err.code(), "REACTOR_NOT_RUNNING");
    }

    #[test]
    fn missing_options_rejected() {
        let mut reactor = LogOutputReactor::new();
        let config = ReactorConfig::for_plugin("LogOutputReactor").with_id("out");
        let err = reactor.set_config(&Vocabulary::new(), &config).unwrap_err();
        assert_eq!(err.code(), "REACTOR_INVALID_CONFIG");
    }
}
