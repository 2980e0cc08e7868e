//! Collection reactor that reads events out of a log file.

use pion_event::{Event, EventPtr, Vocabulary};
use pion_reactor::{
    Reactor, ReactorConfig, ReactorContext, ReactorCore, ReactorError, ReactorType,
};
use pion_types::{ErrorCode, PluginId};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
struct InputOptions {
    /// File to read records from.
    file: PathBuf,
    /// Id of the codec used to decode records.
    codec: PluginId,
}

/// Reads a log file through a codec and delivers every event
/// downstream.
///
/// The file is consumed on a blocking scheduler task started by
/// `start`; the task ends at end-of-file, on the first decode error, or
/// when the reactor stops. External `process` calls are rejected, as
/// for any collection reactor.
///
/// # Options
///
/// ```toml
/// [options]
/// file = "/var/log/access.log"
/// codec = "common-log"
/// ```
pub struct LogInputReactor {
    core: Arc<ReactorCore>,
    options: Option<InputOptions>,
}

impl LogInputReactor {
    /// Creates an unconfigured input reactor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(ReactorCore::unconfigured(ReactorType::Collection)),
            options: None,
        }
    }

    fn run_input(
        core: &Arc<ReactorCore>,
        ctx: &ReactorContext,
        options: &InputOptions,
    ) -> Result<u64, ReactorError> {
        let mut codec = ctx.codecs.codec(&options.codec)?;
        let file = File::open(&options.file)?;
        let mut reader = BufReader::new(file);

        let mut records = 0u64;
        while core.is_running() {
            let mut event = Event::new(codec.event_type());
            if !codec.read(&mut reader, &mut event)? {
                break;
            }
            records += 1;
            ctx.deliver(core, Arc::new(event));
        }
        Ok(records)
    }
}

impl Default for LogInputReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor for LogInputReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn set_config(
        &mut self,
        _vocab: &Vocabulary,
        config: &ReactorConfig,
    ) -> Result<(), ReactorError> {
        let options: InputOptions = config.parse_options()?;
        self.core = Arc::new(ReactorCore::from_config(ReactorType::Collection, config));
        self.options = Some(options);
        Ok(())
    }

    fn start(&self, ctx: &ReactorContext) -> Result<(), ReactorError> {
        if self.core.is_running() {
            return Err(ReactorError::AlreadyRunning);
        }
        let options = self
            .options
            .clone()
            .ok_or_else(|| ReactorError::InvalidConfig("reactor is not configured".into()))?;
        self.core.set_running(true);

        let core = Arc::clone(&self.core);
        let task_ctx = ctx.clone();
        ctx.spawner.spawn_blocking_task(Box::new(move || {
            match Self::run_input(&core, &task_ctx, &options) {
                Ok(records) => {
                    info!(reactor = %core.id(), records, file = %options.file.display(), "log input finished")
                }
                Err(err) => {
                    core.record_error(err.to_string());
                    warn!(
                        reactor = %core.id(),
                        code = err.code(),
                        error = %err,
                        "log input failed"
                    );
                }
            }
        }));
        Ok(())
    }

    fn stop(&self) -> Result<(), ReactorError> {
        self.core.set_running(false);
        Ok(())
    }

    fn process(&self, _event: EventPtr) -> Result<Vec<EventPtr>, ReactorError> {
        Err(ReactorError::NotSupported(
            "collection reactors do not accept delivered events".into(),
        ))
    }
}
