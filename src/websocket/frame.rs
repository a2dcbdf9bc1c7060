//! Multiplexed log frames.
//!
//! A non-TTY container's log stream is a sequence of frames, each prefixed by
//! an 8-byte header: one byte stream type (0 stdin, 1 stdout, 2 stderr),
//! three reserved bytes, then the payload length as a big-endian u32.
//!
//! The Docker engine client already demultiplexes this format into
//! `LogOutput`, so live streams arrive as `LogFrame`s through `From`.
//! `FrameDecoder` handles the raw byte form for engines that hand back the
//! undecoded stream, such as the in-memory engine used by the tests.

use bollard::container::LogOutput;
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
    /// Unframed output (TTY containers)
    Console,
}

impl StreamKind {
    fn from_header_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(StreamKind::Stdin),
            1 => Some(StreamKind::Stdout),
            2 => Some(StreamKind::Stderr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFrame {
    pub kind: StreamKind,
    pub payload: Bytes,
}

impl LogFrame {
    pub fn new(kind: StreamKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Payload split on `\r?\n`, empty lines dropped.
    pub fn lines(&self) -> Vec<String> {
        split_lines(&self.payload)
    }
}

impl From<LogOutput> for LogFrame {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::StdIn { message } => LogFrame::new(StreamKind::Stdin, message),
            LogOutput::StdOut { message } => LogFrame::new(StreamKind::Stdout, message),
            LogOutput::StdErr { message } => LogFrame::new(StreamKind::Stderr, message),
            LogOutput::Console { message } => LogFrame::new(StreamKind::Console, message),
        }
    }
}

pub fn split_lines(payload: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(payload)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Unknown stream type {0} in frame header")]
    UnknownStream(u8),
}

/// Incremental decoder for raw multiplexed bytes. Chunks may split a header
/// or payload anywhere; incomplete frames stay buffered until the rest arrives.
/// A header with an unknown stream type discards everything buffered, since
/// the frame boundary is lost.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<LogFrame>, FrameError> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while self.buf.len() >= HEADER_LEN {
            let Some(kind) = StreamKind::from_header_byte(self.buf[0]) else {
                let byte = self.buf[0];
                self.buf.clear();
                return Err(FrameError::UnknownStream(byte));
            };
            let len = u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]);
            let len = len as usize;
            if self.buf.len() < HEADER_LEN + len {
                break;
            }
            self.buf.advance(HEADER_LEN);
            let payload = self.buf.split_to(len).freeze();
            frames.push(LogFrame { kind, payload });
        }

        Ok(frames)
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Header + payload, the inverse of `FrameDecoder`.
pub fn encode_frame(kind: StreamKind, payload: &[u8]) -> Vec<u8> {
    let type_byte = match kind {
        StreamKind::Stdin => 0,
        StreamKind::Stdout | StreamKind::Console => 1,
        StreamKind::Stderr => 2,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(type_byte);
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}
