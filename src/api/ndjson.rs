// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Newline-delimited JSON framing of upload bodies.
//!
//! Each line is one JSON-encoded [`WriteChunk`]. Blank lines are skipped and
//! the last line may omit its newline. A body error or an undecodable line
//! ends the stream with an error.

use axum::body::{Body, BodyDataStream};
use futures::{stream, Stream, StreamExt};

use crate::pipeline::WriteChunk;

pub const CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("body read failed: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid frame: {0}")]
    Decode(#[from] serde_json::Error),
}

struct FrameReader {
    body: BodyDataStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl FrameReader {
    async fn next_frame(&mut self) -> Result<Option<WriteChunk>, FrameError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                match decode_line(&line)? {
                    Some(chunk) => return Ok(Some(chunk)),
                    None => continue,
                }
            }

            if self.finished {
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.finished = true;
                    let rest = std::mem::take(&mut self.buffer);
                    return decode_line(&rest);
                }
            }
        }
    }
}

fn decode_line(line: &[u8]) -> Result<Option<WriteChunk>, FrameError> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(line)?))
}

/// Decode an HTTP body into a stream of upload frames.
pub fn frames(body: Body) -> impl Stream<Item = Result<WriteChunk, FrameError>> + Send {
    let reader = FrameReader {
        body: body.into_data_stream(),
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        match reader.next_frame().await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Encode one frame as a single NDJSON line.
pub fn encode_frame(chunk: &WriteChunk) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(chunk)?;
    line.push(b'\n');
    Ok(line)
}
