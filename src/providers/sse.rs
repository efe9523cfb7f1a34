//! Server-sent event decoding
//!
//! Reads a response body line by line as it arrives and decodes every
//! `data:` payload; `[DONE]` ends the stream.

use super::BoxStream;
use crate::utils::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental event stream decoder
pub struct EventStreamDecoder<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R> EventStreamDecoder<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }

    /// Next decoded event, or `None` once the sentinel was seen or the
    /// connection closed
    pub async fn next_event<T: DeserializeOwned>(&mut self) -> AppResult<Option<T>> {
        while !self.finished {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).await.map_err(read_error)?;
            if read == 0 {
                debug!("Event stream closed");
                self.finished = true;
                break;
            }

            let line = self.line.trim();
            let Some(data) = line.strip_prefix(DATA_PREFIX) else {
                // comments, keep-alives, event/id fields
                trace!("Skipping non-data line: {:?}", line);
                continue;
            };

            let data = data.trim_start();
            if data.starts_with(DONE_SENTINEL) {
                debug!("Received streaming response end marker");
                self.finished = true;
                break;
            }

            return serde_json::from_str(data)
                .map(Some)
                .map_err(|e| AppError::StreamDecode(format!("invalid json stream data: {}", e)));
        }

        Ok(None)
    }

    /// Turn the decoder into a lazy, forward-only stream
    ///
    /// The stream ends after the first error.
    pub fn into_stream<T>(self, cancel: CancellationToken) -> BoxStream<'static, T>
    where
        R: Send + 'static,
        T: DeserializeOwned + Send + 'static,
    {
        let stream = futures::stream::unfold(Some((self, cancel)), |state| async move {
            let (mut decoder, cancel) = state?;

            let next = tokio::select! {
                _ = cancel.cancelled() => Err(AppError::Cancelled),
                event = decoder.next_event::<T>() => event,
            };

            match next {
                Ok(Some(event)) => Some((Ok(event), Some((decoder, cancel)))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        });

        Box::pin(stream)
    }
}

fn read_error(err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::InvalidData {
        return AppError::StreamDecode(format!("invalid utf-8 in event stream: {}", err));
    }

    let timed_out = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout);

    if timed_out {
        AppError::Timeout
    } else {
        AppError::Transport(format!("failed to read event stream: {}", err))
    }
}
