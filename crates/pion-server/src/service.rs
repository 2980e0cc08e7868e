//! The service contract and built-in services.

use crate::error::ServiceError;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use pion_codec::CodecProvider;
use pion_event::Event;
use pion_reactor::EngineHandle;
use pion_types::PluginId;
use std::sync::Arc;
use tracing::debug;

/// A pluggable HTTP request handler bound to a path prefix.
///
/// Handlers run to completion on a scheduler worker and must not
/// block; the connection driver owns the response write and the
/// keep-alive decision.
#[async_trait]
pub trait HttpService: Send + Sync {
    /// Produces the response for one request.
    ///
    /// # Errors
    ///
    /// Any error is logged at the dispatch boundary and answered with
    /// a 500.
    async fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, ServiceError>;
}

/// The canonical smoke-test service.
pub struct HelloService;

#[async_trait]
impl HttpService for HelloService {
    async fn handle(&self, _request: &HttpRequest) -> Result<HttpResponse, ServiceError> {
        Ok(HttpResponse::ok("<html><body>Hello World!</body></html>"))
    }
}

/// Injects posted records into the reaction graph.
///
/// The request body is decoded with a configured codec and every
/// resulting event is sent to a configured reactor. Decode failures
/// answer 400 with the failure text; the events decoded before the
/// failure are already in flight (at-most-once, no transactionality).
pub struct IngestService {
    codecs: Arc<dyn CodecProvider>,
    engine: EngineHandle,
    codec_id: PluginId,
    reactor_id: PluginId,
}

impl IngestService {
    /// Creates an ingest endpoint for one codec/reactor pair.
    #[must_use]
    pub fn new(
        codecs: Arc<dyn CodecProvider>,
        engine: EngineHandle,
        codec_id: PluginId,
        reactor_id: PluginId,
    ) -> Self {
        Self {
            codecs,
            engine,
            codec_id,
            reactor_id,
        }
    }
}

#[async_trait]
impl HttpService for IngestService {
    async fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, ServiceError> {
        let mut codec = self.codecs.codec(&self.codec_id)?;
        let mut input: &[u8] = request.body();

        let mut delivered = 0u64;
        loop {
            let mut event = Event::new(codec.event_type());
            match codec.read(&mut input, &mut event) {
                Ok(true) => {
                    self.engine.send(&self.reactor_id, Arc::new(event));
                    delivered += 1;
                }
                Ok(false) => break,
                Err(err) => {
                    debug!(
                        codec = %self.codec_id,
                        error = %err,
                        "rejecting unparseable ingest payload"
                    );
                    return Ok(HttpResponse::new(400)
                        .with_content_type("text/plain")
                        .with_body(format!("malformed record: {err}\n")));
                }
            }
        }

        Ok(HttpResponse::ok(format!("{delivered} events accepted\n"))
            .with_content_type("text/plain"))
    }
}

/// Default handler for paths no service claims.
pub(crate) fn not_found(path: &str) -> HttpResponse {
    HttpResponse::new(404).with_body(format!(
        "<html><body><h1>404 Not Found</h1><p>{path}</p></body></html>"
    ))
}
