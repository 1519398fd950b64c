//! Lazy record stream over a chunked byte stream

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;

use super::ndjson::NdjsonDecoder;
use crate::error::Result;

pin_project! {
    /// Stream of decoded NDJSON records.
    ///
    /// The next chunk is only pulled from the inner stream once every record
    /// decoded from the previous chunk has been yielded. A transport error
    /// ends the stream after being yielded once.
    pub struct NdjsonStream<S, T> {
        #[pin]
        inner: S,
        decoder: NdjsonDecoder<T>,
        pending: VecDeque<Result<T>>,
        finished: bool,
    }
}

impl<S, T> NdjsonStream<S, T>
where
    S: Stream<Item = Result<Bytes>>,
    T: DeserializeOwned,
{
    pub fn new(inner: S) -> Self {
        Self::with_decoder(inner, NdjsonDecoder::new())
    }

    pub fn with_decoder(inner: S, decoder: NdjsonDecoder<T>) -> Self {
        Self {
            inner,
            decoder,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Decoder statistics for the records pulled so far
    pub fn decoder(&self) -> &NdjsonDecoder<T> {
        &self.decoder
    }
}

impl<S, T> Stream for NdjsonStream<S, T>
where
    S: Stream<Item = Result<Bytes>>,
    T: DeserializeOwned,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.pending.extend(this.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    *this.finished = true;
                    this.decoder.finish();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    *this.finished = true;
                    this.pending.extend(this.decoder.finish());
                }
            }
        }
    }
}
