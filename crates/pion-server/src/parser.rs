//! Incremental HTTP/1.x request parser.
//!
//! Pulls complete requests out of a connection's read buffer:
//!
//! ```text
//! RequestLine ──► Headers ──► Body(Length) ─┐
//!      ▲                └───► Body(Chunked) ─┼──► complete
//!      └────────────── reset ◄──────────────┘
//! ```
//!
//! [`RequestParser::advance`] consumes what it can and returns
//! `Ok(None)` when more bytes are needed, leaving any pipelined
//! residue in the buffer for the next request.

use crate::config::ServerConfig;
use crate::request::HttpRequest;
use bytes::{Buf, Bytes, BytesMut};

/// Parse failure, carrying the status code of the error response.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParseError {
    /// 400: malformed request line, header, or chunk framing.
    BadRequest(&'static str),
    /// 413: header block or body over the configured cap.
    TooLarge,
    /// 501: transfer coding this server does not speak.
    NotImplemented,
}

impl ParseError {
    pub(crate) fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::TooLarge => 413,
            Self::NotImplemented => 501,
        }
    }

    pub(crate) fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(msg) => msg,
            Self::TooLarge => "request too large",
            Self::NotImplemented => "transfer coding not implemented",
        }
    }
}

#[derive(Debug)]
enum State {
    RequestLine,
    Headers {
        method: String,
        target: String,
        version_minor: u8,
    },
    BodyLength {
        remaining: usize,
    },
    BodyChunked {
        chunk: ChunkState,
        body: BytesMut,
    },
}

#[derive(Debug)]
enum ChunkState {
    Size,
    Data { remaining: usize },
    DataCrlf,
    Trailer,
}

/// Header fields captured while a request is in flight.
#[derive(Debug, Default)]
struct Partial {
    method: String,
    target: String,
    version_minor: u8,
    headers: Vec<(String, String)>,
}

/// Incremental parser with per-connection state.
pub(crate) struct RequestParser {
    max_header_bytes: usize,
    max_body_bytes: usize,
    state: State,
    partial: Partial,
    /// Bytes consumed by the current header section, for the 413 cap.
    header_bytes: usize,
}

impl RequestParser {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        Self {
            max_header_bytes: config.max_header_bytes,
            max_body_bytes: config.max_body_bytes,
            state: State::RequestLine,
            partial: Partial::default(),
            header_bytes: 0,
        }
    }

    /// Whether the parser sits between requests.
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.state, State::RequestLine) && self.header_bytes == 0
    }

    /// Consumes buffered bytes, returning a request once one is
    /// complete. `Ok(None)` means the buffer ran dry mid-request.
    pub(crate) fn advance(
        &mut self,
        buf: &mut BytesMut,
    ) -> Result<Option<HttpRequest>, ParseError> {
        loop {
            match &mut self.state {
                State::RequestLine => {
                    let Some(line) = take_line(buf, self.max_header_bytes, &mut self.header_bytes)?
                    else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        // tolerate a stray CRLF between pipelined requests
                        continue;
                    }
                    let (method, target, version_minor) = parse_request_line(&line)?;
                    self.state = State::Headers {
                        method,
                        target,
                        version_minor,
                    };
                }
                State::Headers {
                    method,
                    target,
                    version_minor,
                } => {
                    let Some(line) = take_line(buf, self.max_header_bytes, &mut self.header_bytes)?
                    else {
                        return Ok(None);
                    };
                    if !line.is_empty() {
                        let (name, value) = parse_header_line(&line)?;
                        self.partial.headers.push((name, value));
                        continue;
                    }

                    // header section complete
                    self.partial.method = std::mem::take(method);
                    self.partial.target = std::mem::take(target);
                    self.partial.version_minor = *version_minor;

                    let chunked = match self.header("transfer-encoding") {
                        Some(coding) => {
                            if !coding.eq_ignore_ascii_case("chunked") {
                                return Err(ParseError::NotImplemented);
                            }
                            true
                        }
                        None => false,
                    };
                    if chunked {
                        self.state = State::BodyChunked {
                            chunk: ChunkState::Size,
                            body: BytesMut::new(),
                        };
                        continue;
                    }

                    let declared = match self.header("content-length") {
                        None => 0usize,
                        Some(raw) => raw
                            .trim()
                            .parse()
                            .map_err(|_| ParseError::BadRequest("bad content-length"))?,
                    };
                    if declared > self.max_body_bytes {
                        return Err(ParseError::TooLarge);
                    }
                    if declared == 0 {
                        return Ok(Some(self.complete(Bytes::new())));
                    }
                    self.state = State::BodyLength {
                        remaining: declared,
                    };
                }
                State::BodyLength { remaining } => {
                    if buf.len() < *remaining {
                        return Ok(None);
                    }
                    let body = buf.split_to(*remaining).freeze();
                    return Ok(Some(self.complete(body)));
                }
                State::BodyChunked { chunk, body } => match chunk {
                    ChunkState::Size => {
                        let Some(line) = take_raw_line(buf) else {
                            return Ok(None);
                        };
                        let size_text = line.split(';').next().unwrap_or("").trim();
                        let size = usize::from_str_radix(size_text, 16)
                            .map_err(|_| ParseError::BadRequest("bad chunk size"))?;
                        if body.len() + size > self.max_body_bytes {
                            return Err(ParseError::TooLarge);
                        }
                        *chunk = if size == 0 {
                            ChunkState::Trailer
                        } else {
                            ChunkState::Data { remaining: size }
                        };
                    }
                    ChunkState::Data { remaining } => {
                        if buf.len() < *remaining {
                            return Ok(None);
                        }
                        body.extend_from_slice(&buf.split_to(*remaining));
                        *chunk = ChunkState::DataCrlf;
                    }
                    ChunkState::DataCrlf => {
                        if buf.len() < 2 {
                            return Ok(None);
                        }
                        if &buf[..2] != b"\r\n" {
                            return Err(ParseError::BadRequest("missing chunk terminator"));
                        }
                        buf.advance(2);
                        *chunk = ChunkState::Size;
                    }
                    ChunkState::Trailer => {
                        let Some(line) = take_raw_line(buf) else {
                            return Ok(None);
                        };
                        if line.is_empty() {
                            let body = std::mem::take(body).freeze();
                            return Ok(Some(self.complete(body)));
                        }
                        // trailer fields are accepted and ignored
                    }
                },
            }
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.partial
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn complete(&mut self, body: Bytes) -> HttpRequest {
        let partial = std::mem::take(&mut self.partial);
        self.state = State::RequestLine;
        self.header_bytes = 0;
        HttpRequest::new(
            partial.method,
            &partial.target,
            partial.version_minor,
            partial.headers,
            body,
        )
    }
}

/// Takes one CRLF-terminated line, enforcing the header-section cap.
fn take_line(
    buf: &mut BytesMut,
    max_header_bytes: usize,
    header_bytes: &mut usize,
) -> Result<Option<String>, ParseError> {
    match find_crlf(buf) {
        Some(end) => {
            *header_bytes += end + 2;
            if *header_bytes > max_header_bytes {
                return Err(ParseError::TooLarge);
            }
            let line = buf.split_to(end);
            buf.advance(2);
            String::from_utf8(line.to_vec())
                .map(Some)
                .map_err(|_| ParseError::BadRequest("header is not valid utf-8"))
        }
        None => {
            if buf.len() > max_header_bytes {
                return Err(ParseError::TooLarge);
            }
            Ok(None)
        }
    }
}

/// Takes one CRLF-terminated line without the header cap (chunk
/// framing lines).
fn take_raw_line(buf: &mut BytesMut) -> Option<String> {
    let end = find_crlf(buf)?;
    let line = buf.split_to(end);
    buf.advance(2);
    Some(String::from_utf8_lossy(&line).into_owned())
}

fn find_crlf(buf: &BytesMut) -> Option<usize> {
    buf.windows(2).position(|pair| pair == b"\r\n")
}

fn parse_request_line(line: &str) -> Result<(String, String, u8), ParseError> {
    let mut parts = line.split(' ');
    let method = parts
        .next()
        .filter(|m| !m.is_empty() && m.chars().all(|c| c.is_ascii_uppercase()))
        .ok_or(ParseError::BadRequest("bad method"))?;
    let target = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::BadRequest("bad request target"))?;
    let version = parts.next().ok_or(ParseError::BadRequest("bad version"))?;
    if parts.next().is_some() {
        return Err(ParseError::BadRequest("bad request line"));
    }
    let version_minor = match version {
        "HTTP/1.0" => 0,
        "HTTP/1.1" => 1,
        _ => return Err(ParseError::BadRequest("unsupported version")),
    };
    Ok((method.to_owned(), target.to_owned(), version_minor))
}

fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (name, value) = line
        .split_once(':')
        .ok_or(ParseError::BadRequest("bad header line"))?;
    if name.is_empty() || name.contains(' ') {
        return Err(ParseError::BadRequest("bad header name"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
