//! Response head serialization.
//!
//! Writes the status and headers of a buffered response into raw bytes. Since a response is
//! always fully buffered before it is sent, the exact body length is known and is written as
//! `Content-Length`.

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, StatusCode, header};
use std::io;
use std::io::Write;

/// Initial buffer size allocated for head serialization
const INIT_HEAD_SIZE: usize = 1024;

/// How the status of a response is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadStyle {
    /// A CGI response: a `Status: <code> <reason>` header field that the gateway turns into
    /// the real status line.
    #[default]
    Cgi,
    /// A non-parsed-header response written straight to the client: `HTTP/1.1 <code> <reason>`.
    StatusLine,
}

/// Encodes the status in `style`, the headers and a `Content-Length` of `body_len`.
///
/// A `Content-Length` header already present in `headers` is replaced.
pub fn encode_head(
    style: HeadStyle,
    status: StatusCode,
    headers: &HeaderMap,
    body_len: usize,
    dst: &mut BytesMut,
) -> io::Result<()> {
    dst.reserve(INIT_HEAD_SIZE);
    let reason = status.canonical_reason().unwrap_or_default();
    match style {
        HeadStyle::Cgi => write!(FastWrite(dst), "Status: {} {}\r\n", status.as_str(), reason)?,
        HeadStyle::StatusLine => write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason)?,
    }

    for (header_name, header_value) in headers {
        if *header_name == header::CONTENT_LENGTH {
            continue;
        }
        dst.put_slice(header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }

    write!(FastWrite(dst), "{}: {}\r\n", header::CONTENT_LENGTH, body_len)?;
    dst.put_slice(b"\r\n");
    Ok(())
}

/// Writer over `BytesMut` used by the `write!` calls above.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
