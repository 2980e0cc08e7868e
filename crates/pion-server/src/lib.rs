//! Asynchronous TCP/HTTP server core.
//!
//! One [`HttpServer`] listens on one port, owns its accepted
//! connections, and dispatches parsed requests to [`HttpService`]s by
//! longest path-prefix match. All I/O runs on the shared scheduler.
//!
//! # Connection lifecycle
//!
//! ```text
//! accept ──► pool insert ──► ReadRequestLine ──► ReadHeaders ──► ReadBody?
//!                                  ▲                                │
//!                                  │ keep-alive                     ▼
//!                             flush response ◄── service handle ◄── dispatch
//!                                  │
//!                                  └── close ──► pool remove
//! ```
//!
//! Requests are parsed incrementally out of a per-connection buffer, so
//! pipelined requests are served back-to-back without waiting on the
//! socket. Every state has an idle deadline; connections that exceed it
//! are closed without a response.
//!
//! # Failure semantics
//!
//! I/O errors close the affected connection only. A service error is
//! logged and answered with a 500 (the response is built only after the
//! handler returns, so no partial bytes precede it).

mod config;
mod connection;
mod dispatch;
mod error;
mod parser;
mod request;
mod response;
mod server;
mod service;

pub use config::ServerConfig;
pub use dispatch::ServiceDispatcher;
pub use error::{ServerError, ServiceError};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use server::HttpServer;
pub use service::{HelloService, HttpService, IngestService};
