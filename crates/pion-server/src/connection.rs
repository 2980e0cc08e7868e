//! Per-connection driver: parse, dispatch, respond, repeat.

use crate::config::ServerConfig;
use crate::dispatch::ServiceDispatcher;
use crate::parser::RequestParser;
use crate::response::HttpResponse;
use crate::service::not_found;
use bytes::BytesMut;
use pion_types::ErrorCode;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Serves one accepted socket until it closes.
///
/// The loop is the protocol state machine: requests are parsed
/// incrementally out of `buf`, responses are written back-to-back, and
/// leftover bytes feed the next request, so pipelining needs no extra
/// handling. Read waits are bounded by the keep-alive deadline between
/// requests and the read deadline inside one; both expire into a
/// silent close.
pub(crate) async fn drive(
    mut stream: TcpStream,
    config: Arc<ServerConfig>,
    dispatcher: Arc<ServiceDispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = BytesMut::with_capacity(4096);
    let mut parser = RequestParser::new(&config);

    loop {
        // parse phase: drain the buffer, then read more
        let request = loop {
            match parser.advance(&mut buf) {
                Ok(Some(request)) => break request,
                Ok(None) => {}
                Err(err) => {
                    debug!(status = err.status(), reason = err.message(), "rejecting request");
                    let response = HttpResponse::new(err.status())
                        .with_content_type("text/plain")
                        .with_body(format!("{}\n", err.message()));
                    let _ = timeout(
                        config.write_timeout(),
                        stream.write_all(&response.encode(false)),
                    )
                    .await;
                    let _ = stream.shutdown().await;
                    return;
                }
            }

            let idle = if parser.is_idle() {
                config.keep_alive_timeout()
            } else {
                config.read_timeout()
            };
            tokio::select! {
                read = timeout(idle, stream.read_buf(&mut buf)) => match read {
                    Ok(Ok(0)) => return,          // peer closed
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => {
                        debug!(error = %err, "connection read failed");
                        return;
                    }
                    Err(_) => return,             // idle deadline, close silently
                },
                _ = shutdown.changed() => return, // server stopping
            }
        };

        let keep_alive = request.keep_alive();
        let response = match dispatcher.find(request.path()) {
            Some(service) => match service.handle(&request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(
                        path = request.path(),
                        code = err.code(),
                        error = %err,
                        "service failed; responding 500"
                    );
                    HttpResponse::new(500)
                        .with_body("<html><body><h1>500 Internal Server Error</h1></body></html>")
                }
            },
            None => not_found(request.path()),
        };

        let encoded = response.encode(keep_alive);
        match timeout(config.write_timeout(), stream.write_all(&encoded)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(error = %err, "connection write failed");
                return;
            }
            Err(_) => {
                debug!("write deadline expired; aborting connection");
                return;
            }
        }

        if !keep_alive {
            let _ = stream.shutdown().await;
            return;
        }
    }
}
