//! Single-pass chunked reads.

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::Result;

/// Read size used by the local backend when streaming a file.
pub const LOCAL_CHUNK_SIZE: usize = 4096;

enum State {
    Open(BoxStream<'static, Result<Bytes>>),
    Exhausted,
    Failed,
}

/// A lazy, finite, single-pass sequence of byte chunks.
///
/// Once the underlying source reports its end or yields an error the stream
/// moves to a terminal state and every further poll returns `None`. There is
/// no way to rewind; callers must drain it once.
pub struct ChunkStream {
    key: String,
    state: State,
}

impl ChunkStream {
    /// Wrap a backend chunk source for `key`.
    pub fn new(key: impl Into<String>, inner: BoxStream<'static, Result<Bytes>>) -> Self {
        Self {
            key: key.into(),
            state: State::Open(inner),
        }
    }

    /// Storage key this stream reads
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once the stream has ended or failed.
    pub fn is_consumed(&self) -> bool {
        !matches!(self.state, State::Open(_))
    }

    /// True if the stream stopped because of an error.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed)
    }

    /// Next chunk, or `None` when consumed.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        self.next().await
    }

    /// Drain the remaining chunks into one buffer.
    pub async fn collect_bytes(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ChunkStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let inner = match &mut this.state {
            State::Open(inner) => inner,
            State::Exhausted | State::Failed => return Poll::Ready(None),
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                this.state = State::Exhausted;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::debug!(key = %this.key, "Chunk stream failed: {}", e);
                this.state = State::Failed;
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl FusedStream for ChunkStream {
    fn is_terminated(&self) -> bool {
        self.is_consumed()
    }
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Open(_) => "open",
            State::Exhausted => "exhausted",
            State::Failed => "failed",
        };
        f.debug_struct("ChunkStream")
            .field("key", &self.key)
            .field("state", &state)
            .finish()
    }
}
