//! Message framing on the engine byte stream.
//!
//! The reference engine writes one JSON object per reply with no terminator
//! and no length prefix. [`Framing::Json`] copes with that by buffering
//! until exactly one complete JSON value is available, so segments that
//! arrive fragmented or coalesced are still split correctly. Engines that
//! frame explicitly can use [`Framing::Newline`] or
//! [`Framing::LengthPrefixed`].

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BytesMut};
use serde::de::IgnoredAny;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::EngineError;

/// Length of the big-endian prefix used by [`Framing::LengthPrefixed`].
const LENGTH_PREFIX_LEN: usize = 4;

/// How messages are delimited on the engine socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Self-delimiting JSON values, nothing between them but whitespace.
    #[default]
    Json,
    /// One message per `\n`-terminated line.
    Newline,
    /// `u32` big-endian payload length, then the payload.
    LengthPrefixed,
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "newline" | "line" => Ok(Self::Newline),
            "length_prefixed" | "length-prefixed" => Ok(Self::LengthPrefixed),
            other => Err(format!(
                "unknown engine framing {other:?} (expected json, newline, or length_prefixed)"
            )),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Newline => f.write_str("newline"),
            Self::LengthPrefixed => f.write_str("length_prefixed"),
        }
    }
}

/// Writes one framed message and flushes.
///
/// # Errors
///
/// Returns [`EngineError::FrameTooLarge`] if a length-prefixed payload does
/// not fit in `u32`, or [`EngineError::ConnectionLost`] on socket failure.
pub async fn write_frame<W>(writer: &mut W, framing: Framing, payload: &[u8]) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin,
{
    let mut out = Vec::with_capacity(payload.len().saturating_add(LENGTH_PREFIX_LEN));
    match framing {
        Framing::Json => out.extend_from_slice(payload),
        Framing::Newline => {
            out.extend_from_slice(payload);
            out.push(b'\n');
        }
        Framing::LengthPrefixed => {
            let len = u32::try_from(payload.len()).map_err(|_| EngineError::FrameTooLarge {
                len: payload.len(),
                limit: u32::MAX as usize,
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(payload);
        }
    }
    writer.write_all(&out).await.map_err(|e| EngineError::lost(&e))?;
    writer.flush().await.map_err(|e| EngineError::lost(&e))?;
    Ok(())
}

/// Buffered frame reader for one connection.
#[derive(Debug)]
pub struct FrameReader {
    framing: Framing,
    max_frame_bytes: usize,
    buf: BytesMut,
}

impl FrameReader {
    /// Creates a reader with an empty buffer.
    #[must_use]
    pub fn new(framing: Framing, max_frame_bytes: usize) -> Self {
        Self {
            framing,
            max_frame_bytes,
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Framing in use.
    #[must_use]
    pub const fn framing(&self) -> Framing {
        self.framing
    }

    /// Number of buffered bytes that are not inter-message whitespace.
    ///
    /// Anything non-zero between exchanges means the stream is out of step.
    #[must_use]
    pub fn pending(&self) -> usize {
        match self.framing {
            Framing::LengthPrefixed => self.buf.len(),
            Framing::Json | Framing::Newline => {
                self.buf.iter().filter(|b| !b.is_ascii_whitespace()).count()
            }
        }
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Reads until one complete frame is available and returns its payload.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ConnectionLost`] on EOF or socket failure.
    /// - [`EngineError::FrameTooLarge`] if the frame exceeds the limit.
    /// - [`EngineError::MalformedResponse`] if JSON framing sees bytes that
    ///   can never become a valid value.
    pub async fn read_frame<R>(&mut self, reader: &mut R) -> Result<Vec<u8>, EngineError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(frame) = self.try_split()? {
                return Ok(frame);
            }
            if self.buf.len() > self.max_frame_bytes {
                return Err(EngineError::FrameTooLarge {
                    len: self.buf.len(),
                    limit: self.max_frame_bytes,
                });
            }
            let read = reader
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| EngineError::lost(&e))?;
            if read == 0 {
                return Err(EngineError::ConnectionLost(
                    "engine closed the connection".to_string(),
                ));
            }
        }
    }

    fn try_split(&mut self) -> Result<Option<Vec<u8>>, EngineError> {
        match self.framing {
            Framing::Json => self.split_json(),
            Framing::Newline => Ok(self.split_line()),
            Framing::LengthPrefixed => self.split_length_prefixed(),
        }
    }

    fn split_json(&mut self) -> Result<Option<Vec<u8>>, EngineError> {
        let leading = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buf.advance(leading);
        if self.buf.is_empty() {
            return Ok(None);
        }

        let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<IgnoredAny>();
        match values.next() {
            None => Ok(None),
            Some(Ok(_)) => {
                let end = values.byte_offset();
                Ok(Some(self.buf.split_to(end).to_vec()))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(EngineError::MalformedResponse(e.to_string())),
        }
    }

    fn split_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos.saturating_add(1)).to_vec();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(line);
        }
        None
    }

    fn split_length_prefixed(&mut self) -> Result<Option<Vec<u8>>, EngineError> {
        let Some(prefix) = self.buf.get(..LENGTH_PREFIX_LEN) else {
            return Ok(None);
        };
        let mut len_bytes = [0u8; LENGTH_PREFIX_LEN];
        len_bytes.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > self.max_frame_bytes {
            return Err(EngineError::FrameTooLarge {
                len,
                limit: self.max_frame_bytes,
            });
        }
        if self.buf.len() < LENGTH_PREFIX_LEN.saturating_add(len) {
            return Ok(None);
        }
        self.buf.advance(LENGTH_PREFIX_LEN);
        Ok(Some(self.buf.split_to(len).to_vec()))
    }
}
