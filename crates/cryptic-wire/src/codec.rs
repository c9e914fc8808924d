//! Streaming codec for concatenated JSON values.
//!
//! The hub writes envelopes back to back with no delimiter, and TCP may cut
//! them anywhere. The decoder tracks brace depth and string state across
//! calls so each emitted frame is exactly one top-level value. Bytes that
//! cannot start an object or array are emitted as their own frame up to the
//! next opening bracket or newline outside a quoted run.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::Frame;

/// Largest frame the decoder accepts before failing the stream.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Errors raised while framing the hub byte stream.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying socket failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A single frame exceeded the configured ceiling.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Bytes buffered for the frame so far.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },
    /// An outbound frame could not be serialised.
    #[error("failed to serialise frame: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Structured,
    Garbage,
}

#[derive(Debug, Default, Clone, Copy)]
struct Scan {
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    kind: Option<FrameKind>,
}

/// Splits a byte stream into top-level JSON values and writes [`Frame`]s as
/// compact JSON.
#[derive(Debug)]
pub struct JsonObjectCodec {
    scan: Scan,
    max_frame: usize,
}

impl Default for JsonObjectCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonObjectCodec {
    /// Creates a codec with the [`MAX_FRAME_BYTES`] ceiling.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_frame(MAX_FRAME_BYTES)
    }

    /// Creates a codec with a custom frame ceiling.
    #[must_use]
    pub const fn with_max_frame(max_frame: usize) -> Self {
        Self {
            scan: Scan {
                offset: 0,
                depth: 0,
                in_string: false,
                escaped: false,
                kind: None,
            },
            max_frame,
        }
    }

    /// Returns the frame ceiling in bytes.
    #[must_use]
    pub const fn max_frame(&self) -> usize {
        self.max_frame
    }

    /// Continues scanning a bracketed value, returning its length once the
    /// outermost bracket closes.
    fn scan_structured(&mut self, src: &BytesMut) -> Option<usize> {
        let scan = &mut self.scan;
        for (index, byte) in src.iter().enumerate().skip(scan.offset) {
            if scan.in_string {
                if scan.escaped {
                    scan.escaped = false;
                } else if *byte == b'\\' {
                    scan.escaped = true;
                } else if *byte == b'"' {
                    scan.in_string = false;
                }
                continue;
            }
            match byte {
                b'"' => scan.in_string = true,
                b'{' | b'[' => scan.depth += 1,
                b'}' | b']' => {
                    scan.depth = scan.depth.saturating_sub(1);
                    if scan.depth == 0 {
                        return Some(index + 1);
                    }
                }
                _ => {}
            }
        }
        scan.offset = src.len();
        None
    }

    /// Continues scanning a run of bytes that cannot start a value.
    ///
    /// Quoted text is kept whole, so a bracket inside a top-level string does
    /// not split the run. An unterminated quote waits for more input.
    fn scan_garbage(&mut self, src: &BytesMut) -> Option<usize> {
        let scan = &mut self.scan;
        for (index, byte) in src.iter().enumerate().skip(scan.offset) {
            if scan.in_string {
                if scan.escaped {
                    scan.escaped = false;
                } else if *byte == b'\\' {
                    scan.escaped = true;
                } else if *byte == b'"' {
                    scan.in_string = false;
                }
                continue;
            }
            match byte {
                b'"' => scan.in_string = true,
                b'{' | b'[' | b'\n' => return Some(index),
                _ => {}
            }
        }
        scan.offset = src.len();
        (!scan.in_string).then_some(src.len())
    }

    fn reset(&mut self) {
        self.scan = Scan::default();
    }
}

fn trim_trailing_whitespace(frame: Bytes) -> Bytes {
    let kept = frame
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |last| last + 1);
    frame.slice(..kept)
}

fn skip_whitespace(src: &mut BytesMut) {
    let leading = src
        .iter()
        .take_while(|byte| byte.is_ascii_whitespace())
        .count();
    src.advance(leading);
}

impl Decoder for JsonObjectCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.scan.kind.is_none() {
            skip_whitespace(src);
            let Some(first) = src.first() else {
                return Ok(None);
            };
            self.scan.kind = Some(if matches!(first, b'{' | b'[') {
                FrameKind::Structured
            } else {
                FrameKind::Garbage
            });
        }

        let complete = match self.scan.kind {
            Some(FrameKind::Garbage) => self.scan_garbage(src),
            _ => self.scan_structured(src),
        };
        let size = complete.unwrap_or(src.len());
        if size > self.max_frame {
            self.reset();
            return Err(CodecError::FrameTooLarge {
                size,
                max: self.max_frame,
            });
        }

        Ok(complete.map(|len| {
            let kind = self.scan.kind;
            self.reset();
            let frame = src.split_to(len).freeze();
            if kind == Some(FrameKind::Garbage) {
                trim_trailing_whitespace(frame)
            } else {
                frame
            }
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.decode(src)?;
        if frame.is_none() {
            src.clear();
            self.reset();
        }
        Ok(frame)
    }
}

impl Encoder<Frame> for JsonObjectCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        serde_json::to_writer(dst.writer(), &item)?;
        Ok(())
    }
}
