//! Table change feed over a long-lived newline-delimited JSON stream.
//!
//! Each line carries one database-webhook style payload:
//! `{"type":"UPDATE","table":"reports","record":{..},"old_record":{..}}`.
//! Blank lines are keep-alives.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use report_core::{ChangeEvent, Report, ReportId};
use serde::Deserialize;

use crate::client::{authorize, decode_error, map_reqwest_error, send};
use crate::{FailureKind, RemoteError, RemoteSettings};

/// Longest payload line accepted; a longer one ends the stream.
const MAX_LINE_BYTES: usize = 1 << 20;

/// Events in delivery order. `FailureKind::Decode` items are per-line and
/// the stream continues after them; any other error ends the stream.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, RemoteError>>;

#[async_trait::async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self) -> Result<ChangeStream, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestChangeFeed {
    client: reqwest::Client,
    settings: Arc<RemoteSettings>,
}

impl ReqwestChangeFeed {
    pub fn new(client: reqwest::Client, settings: Arc<RemoteSettings>) -> Self {
        Self { client, settings }
    }
}

#[async_trait::async_trait]
impl ChangeFeed for ReqwestChangeFeed {
    async fn subscribe(&self) -> Result<ChangeStream, RemoteError> {
        let url = self
            .settings
            .endpoint(&["realtime", "v1", self.settings.table.as_str()])?;
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/x-ndjson");
        let response = send(authorize(request, &self.settings.api_key)).await?;
        Ok(decode_stream(
            response.bytes_stream(),
            self.settings.table.clone(),
            MAX_LINE_BYTES,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    record: Option<Report>,
    #[serde(default)]
    old_record: Option<WireKey>,
}

#[derive(Debug, Deserialize)]
struct WireKey {
    id: ReportId,
}

/// Decodes one payload line. `Ok(None)` for keep-alives and other tables.
pub fn decode_change(line: &[u8], table: &str) -> Result<Option<ChangeEvent>, RemoteError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let payload: WirePayload = serde_json::from_slice(line).map_err(decode_error)?;
    if payload.table.as_deref().is_some_and(|name| name != table) {
        return Ok(None);
    }

    let missing = |field: &str| {
        RemoteError::new(
            FailureKind::Decode,
            format!("{} event without {field}", payload.kind),
        )
    };
    let event = match payload.kind.to_ascii_uppercase().as_str() {
        "INSERT" => ChangeEvent::Insert(payload.record.ok_or_else(|| missing("record"))?),
        "UPDATE" => ChangeEvent::Update(payload.record.ok_or_else(|| missing("record"))?),
        "DELETE" => {
            let id = match (payload.old_record, payload.record) {
                (Some(old), _) => old.id,
                (None, Some(record)) => record.id,
                (None, None) => return Err(missing("old_record")),
            };
            ChangeEvent::Delete { id }
        }
        other => {
            return Err(RemoteError::new(
                FailureKind::Decode,
                format!("unknown change type {other:?}"),
            ))
        }
    };
    Ok(Some(event))
}

/// Splits a byte stream into lines without assuming chunk boundaries.
#[derive(Debug)]
pub(crate) struct LineDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    limit: usize,
}

impl LineDecoder {
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            limit,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    pub(crate) fn next_line(&mut self) -> Option<Vec<u8>> {
        let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        else {
            self.scanned = self.buffer.len();
            return None;
        };
        let end = self.scanned + offset;
        self.scanned = 0;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// The unterminated tail is longer than any accepted line.
    pub(crate) fn is_overflowing(&self) -> bool {
        self.buffer.len() > self.limit
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Whatever trails the last newline once the body has ended.
    pub(crate) fn finish(&mut self) -> Option<Vec<u8>> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

struct FeedState<S> {
    body: Pin<Box<S>>,
    decoder: LineDecoder,
    table: String,
    ended: bool,
}

fn decode_stream<S>(body: S, table: String, max_line: usize) -> ChangeStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = FeedState {
        body: Box::pin(body),
        decoder: LineDecoder::with_limit(max_line),
        table,
        ended: false,
    };
    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            let line = match state.decoder.next_line() {
                Some(line) => Some(line),
                None if state.ended => Some(state.decoder.finish()?),
                None if state.decoder.is_overflowing() => {
                    state.decoder.clear();
                    state.ended = true;
                    let err = RemoteError::new(
                        FailureKind::Oversized,
                        format!("change payload longer than {} bytes", state.decoder.limit),
                    );
                    return Some((Err(err), state));
                }
                None => None,
            };
            if let Some(line) = line {
                match decode_change(&line, &state.table) {
                    Ok(Some(event)) => return Some((Ok(event), state)),
                    Ok(None) => continue,
                    Err(err) => return Some((Err(err), state)),
                }
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.decoder.push(&chunk),
                Some(Err(err)) => {
                    // Drop the partial line; the transport error ends the feed.
                    state.decoder.clear();
                    state.ended = true;
                    return Some((Err(map_reqwest_error(err)), state));
                }
                None => state.ended = true,
            }
        }
    })
    .boxed()
}
