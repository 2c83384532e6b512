//! Framing of JSON texts on an ordered byte stream
//!
//! ovsdb-server writes JSON texts back to back with no delimiter. The
//! reader scans incoming bytes once, tracking bracket depth and string
//! state across reads, and hands `serde_json` only a complete text.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use ovsdb_core::{Error, Result};

const READ_CHUNK: usize = 8192;

/// Where the scan of the current text stands
#[derive(Debug, Default)]
struct Scanner {
    /// Bytes of the buffer already examined
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scanner {
    /// Advance over `buf`; returns the end of the first complete text
    fn scan(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        while self.offset < buf.len() {
            let byte = buf[self.offset];
            self.offset += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let end = self.offset;
                        *self = Scanner::default();
                        return Ok(Some(end));
                    }
                }
                b'"' if self.depth > 0 => self.in_string = true,
                b if b.is_ascii_whitespace() => {}
                b if self.depth == 0 => {
                    return Err(Error::protocol(format!(
                        "unexpected byte {:?} between JSON texts",
                        char::from(b)
                    )));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Nothing but whitespace has been seen since the last complete text
    fn is_idle(&self) -> bool {
        self.depth == 0 && !self.in_string
    }
}

/// Reads successive JSON values from a byte stream
pub struct FrameReader<R> {
    reader: R,
    buf: Vec<u8>,
    scanner: Scanner,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            scanner: Scanner::default(),
        }
    }

    /// Next complete value, or `None` on a clean end of stream
    pub async fn next_frame(&mut self) -> Result<Option<Value>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(end) = self.scanner.scan(&self.buf)? {
                let value = serde_json::from_slice(&self.buf[..end]);
                self.buf.drain(..end);
                return Ok(Some(value?));
            }
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                if self.scanner.is_idle() {
                    self.buf.clear();
                    self.scanner = Scanner::default();
                    return Ok(None);
                }
                return Err(Error::protocol("stream ended inside a JSON text"));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Write one JSON value followed by a newline
pub async fn write_frame<W: AsyncWrite + Unpin + ?Sized>(writer: &mut W, value: &Value) -> Result<()> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
