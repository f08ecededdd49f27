//! Drives a [`PageRewriter`] over an origin body stream.
//!
//! lol_html's rewriter is not `Send`, so each document is rewritten by a task
//! pinned to one thread of a small [`RewritePool`]. Every pool thread runs its
//! own single-threaded runtime and multiplexes any number of documents: a
//! task waiting on the origin or on a slow client is parked, not holding a
//! thread. Rewritten output goes through a bounded channel the response body
//! reads from. When the client disconnects the channel closes and the origin
//! stream is dropped.

use std::cell::RefCell;
use std::io;
use std::num::NonZeroUsize;
use std::rc::Rc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::task::LocalPoolHandle;

use crate::rewrite::{PageRewriter, RewriteContext};
use crate::upstream::ByteStream;

type Chunk = io::Result<Bytes>;

/// Threads dedicated to HTML rewriting, shared by every request.
#[derive(Clone)]
pub struct RewritePool {
    pool: LocalPoolHandle,
    buffer_chunks: usize,
}

impl RewritePool {
    /// `workers` defaults to the available parallelism. At most
    /// `buffer_chunks` rewritten chunks are queued per document before its
    /// task waits for the client to catch up.
    pub fn new(workers: Option<usize>, buffer_chunks: usize) -> Self {
        let workers = workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get));
        tracing::debug!(workers, buffer_chunks, "Starting rewrite pool");
        Self {
            pool: LocalPoolHandle::new(workers),
            buffer_chunks: buffer_chunks.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.pool.num_threads()
    }

    /// Start rewriting `upstream` and return the rewritten body.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, ctx: RewriteContext, upstream: ByteStream) -> ReceiverStream<Chunk> {
        let (tx, rx) = mpsc::channel(self.buffer_chunks);
        // The handle is dropped; the task ends on its own when the document
        // is done or the client goes away.
        let _ = self.pool.spawn_pinned(move || drive(ctx, upstream, tx));
        ReceiverStream::new(rx)
    }
}

async fn drive(ctx: RewriteContext, mut upstream: ByteStream, tx: mpsc::Sender<Chunk>) {
    let pending = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&pending);
    let mut rewriter =
        PageRewriter::new(&ctx, move |c: &[u8]| sink.borrow_mut().extend_from_slice(c));

    loop {
        let next = tokio::select! {
            chunk = upstream.next() => Some(chunk),
            _ = tx.closed() => None,
        };

        let chunk = match next {
            None => {
                tracing::debug!(url = %ctx.page_url, "Client disconnected during rewrite");
                return;
            }
            Some(None) => break,
            Some(Some(Ok(chunk))) => chunk,
            Some(Some(Err(e))) => {
                tracing::warn!(url = %ctx.page_url, error = %e, "Origin body failed mid-stream");
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        if let Err(e) = rewriter.write(&chunk) {
            tracing::error!(url = %ctx.page_url, error = %e, "HTML rewriter failed");
            let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
            return;
        }
        if !flush(&pending, &tx).await {
            tracing::debug!(url = %ctx.page_url, "Client disconnected during rewrite");
            return;
        }
    }

    match rewriter.end() {
        Ok(summary) => {
            flush(&pending, &tx).await;
            tracing::debug!(
                url = %ctx.page_url,
                rewritten = summary.rewritten,
                faults = summary.faults,
                script_injected = summary.script_injected,
                "Rewrite complete"
            );
        }
        Err(e) => {
            tracing::error!(url = %ctx.page_url, error = %e, "HTML rewriter failed at end of document");
            let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
        }
    }
}

/// Send buffered output. Returns false once the client is gone.
async fn flush(pending: &RefCell<Vec<u8>>, tx: &mpsc::Sender<Chunk>) -> bool {
    let chunk = std::mem::take(&mut *pending.borrow_mut());
    if chunk.is_empty() {
        return true;
    }
    tx.send(Ok(Bytes::from(chunk))).await.is_ok()
}
