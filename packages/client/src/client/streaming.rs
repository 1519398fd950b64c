//! Callback-driven NDJSON streaming over the request executor

use futures::StreamExt;
use http_body_util::BodyDataStream;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::core::RequestExecutor;
use crate::decoder::NdjsonDecoder;
use crate::error::{self, Error, Result};
use crate::http::Request;

/// Totals for one completed streaming response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub records: u64,
    pub parse_errors: u64,
    pub bytes: u64,
}

impl RequestExecutor {
    /// Issue `request` and decode its body as NDJSON regardless of the
    /// declared content type.
    ///
    /// Every record decoded from a chunk is passed to `on_record`, in arrival
    /// order, before the next chunk is read. Malformed lines go to `on_error`
    /// and decoding continues. `on_complete` runs once at end of data; an
    /// unterminated trailing line is dropped.
    ///
    /// Dropping the returned future aborts the transfer; no callback runs
    /// after that.
    ///
    /// # Errors
    ///
    /// `Timeout` and `Status` are returned without invoking any callback. A
    /// transport failure mid-body is passed to `on_error` and returned as
    /// `TransportClosed`; `on_complete` does not run in that case.
    pub async fn execute_streaming<T, R, E, C>(
        &self,
        request: &Request,
        mut on_record: R,
        mut on_error: E,
        on_complete: C,
    ) -> Result<StreamSummary>
    where
        T: DeserializeOwned,
        R: FnMut(T),
        E: FnMut(Error),
        C: FnOnce(&StreamSummary),
    {
        let (url, _parts, body) = self.send(request).await?;
        let stats = self.stats();
        let mut chunks = BodyDataStream::new(body);
        let mut decoder = NdjsonDecoder::<T>::new();
        let mut summary = StreamSummary::default();

        let mut dispatch = |item: Result<T>, summary: &mut StreamSummary| match item {
            Ok(record) => {
                summary.records += 1;
                stats.record_decoded();
                on_record(record);
            }
            Err(e) => {
                summary.parse_errors += 1;
                stats.record_parse_error();
                on_error(e);
            }
        };

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    decoder.finish();
                    let err = error::transport_closed(e).with_url(url);
                    tracing::warn!(error = %err, records = summary.records, "stream ended abnormally");
                    drop(dispatch);
                    on_error(err.clone());
                    return Err(err);
                }
            };

            summary.bytes += chunk.len() as u64;
            stats.record_bytes_received(chunk.len() as u64);
            for item in decoder.feed(&chunk) {
                dispatch(item, &mut summary);
            }
        }

        for item in decoder.finish() {
            dispatch(item, &mut summary);
        }

        tracing::debug!(
            %url,
            records = summary.records,
            parse_errors = summary.parse_errors,
            "stream complete"
        );
        on_complete(&summary);
        Ok(summary)
    }
}
