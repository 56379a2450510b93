//! The response side of a transport.
//!
//! [`Output`] accumulates the whole response (status, headers, body) in memory and writes it
//! to its sink only when asked to. Nothing is streamed: the head, when the transport needs
//! one, and the body are each sent at most once. On the HTTP transport the head is a CGI
//! head (`Status: 200 OK` plus header fields) unless the output was built with
//! [`Output::nph`].

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use mime::Mime;
use tracing::{debug, trace, warn};

use crate::codec::{HeadStyle, encode_head};
use crate::protocol::{SendError, Transport};

/// Response-side adapter: a fully buffered response plus the sink it is flushed to.
pub struct Output {
    transport: Transport,
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    sink: Box<dyn Write + Send>,
    head_style: HeadStyle,
    head_sent: bool,
    body_sent: bool,
}

impl Output {
    pub fn new<W: Write + Send + 'static>(transport: Transport, sink: W) -> Self {
        let mut output = Self {
            transport,
            status: StatusCode::OK,
            headers: HeaderMap::with_capacity(8),
            body: BytesMut::new(),
            sink: Box::new(sink),
            head_style: HeadStyle::Cgi,
            head_sent: false,
            body_sent: false,
        };
        output.set_content_type(&mime::TEXT_HTML_UTF_8);
        output
    }

    /// HTTP output for a non-parsed-header script or a raw connection: the head starts with
    /// an `HTTP/1.1` status line instead of the CGI `Status` field.
    pub fn nph<W: Write + Send + 'static>(sink: W) -> Self {
        let mut output = Self::new(Transport::Http, sink);
        output.head_style = HeadStyle::StatusLine;
        output
    }

    /// Output flushed to the process stdout.
    pub fn stdout(transport: Transport) -> Self {
        Self::new(transport, std::io::stdout())
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn head_style(&self) -> HeadStyle {
        self.head_style
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn set_content_type(&mut self, mime: &Mime) -> &mut Self {
        match HeaderValue::from_str(mime.as_ref()) {
            Ok(value) => self.set_header(header::CONTENT_TYPE, value),
            Err(e) => {
                warn!(mime = %mime, cause = %e, "ignoring content type that is not a valid header value");
                self
            }
        }
    }

    /// Appends to the body.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.put_slice(bytes);
        self
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl AsRef<[u8]>) -> &mut Self {
        self.body.clear();
        self.body.put_slice(body.as_ref());
        self
    }

    pub fn clear_body(&mut self) -> &mut Self {
        self.body.clear();
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_head_sent(&self) -> bool {
        self.head_sent
    }

    pub fn is_sent(&self) -> bool {
        self.body_sent
    }

    /// Writes the status and headers to the sink.
    ///
    /// Only the HTTP transport has a head; for the command-line transport, and once the head
    /// has been written, this does nothing.
    pub fn send_header(&mut self) -> Result<(), SendError> {
        if self.transport != Transport::Http || self.head_sent {
            return Ok(());
        }

        let mut head = BytesMut::new();
        encode_head(self.head_style, self.status, &self.headers, self.body.len(), &mut head)?;
        self.sink.write_all(&head)?;
        self.head_sent = true;
        trace!(status = self.status.as_u16(), "response head sent");
        Ok(())
    }

    /// Writes the body to the sink and flushes it. Does nothing once the body has been sent.
    pub fn send_body(&mut self) -> Result<(), SendError> {
        if self.body_sent {
            return Ok(());
        }

        self.sink.write_all(&self.body)?;
        self.sink.flush()?;
        self.body_sent = true;
        debug!(status = self.status.as_u16(), body_len = self.body.len(), "response sent");
        Ok(())
    }

    /// Sends the head (when the transport has one) followed by the body.
    pub fn send(&mut self) -> Result<(), SendError> {
        self.send_header()?;
        self.send_body()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("transport", &self.transport)
            .field("head_style", &self.head_style)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("head_sent", &self.head_sent)
            .field("body_sent", &self.body_sent)
            .finish_non_exhaustive()
    }
}

/// An in-memory sink that can be cloned and inspected after the output has been sent.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
