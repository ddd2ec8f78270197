use futures::Stream;

use super::condition::Condition;
use super::types::{QueryParams, ScanResponse};
use crate::App;
use crate::decoder::Decoder;
use crate::errors::{QueryError, TransportError};
use crate::http::{AuthOptions, HttpRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    /// No request made yet.
    Start,
    /// Server handed out a cursor for the next page.
    At(String),
    /// Server returned the terminal (null) cursor.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage<T> {
    pub value: Vec<T>,
    pub done: bool,
}

/// Cursor-driven walk over a collection via the scan endpoint.
///
/// Limit and condition are copied from the query at construction. A page that
/// arrives with the terminal cursor is still returned with `done == false`; the
/// following call reports `done` without touching the network, as does every
/// call after that. A failed request leaves the cursor where it was.
/// Calls to [`ScanIterator::next`] must not overlap.
#[derive(Debug)]
pub struct ScanIterator<D: Decoder> {
    app: App,
    class_name: String,
    decoder: D,
    limit: Option<i64>,
    condition: Option<Condition>,
    options: AuthOptions,
    cursor: CursorState,
}

impl<D: Decoder> ScanIterator<D> {
    pub(crate) fn new(
        app: App,
        class_name: String,
        decoder: D,
        limit: Option<i64>,
        condition: Option<Condition>,
        options: AuthOptions,
    ) -> Self {
        Self { app, class_name, decoder, limit, condition, options, cursor: CursorState::Start }
    }

    #[must_use]
    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Cursor to be sent with the next request.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        match &self.cursor {
            CursorState::At(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor == CursorState::End
    }

    /// Fetch the next page.
    ///
    /// # Errors
    /// Transport and decode failures; the cursor is not advanced in either case.
    pub async fn next(&mut self) -> Result<ScanPage<D::Output>, QueryError> {
        if self.cursor == CursorState::End {
            return Ok(ScanPage { value: Vec::new(), done: true });
        }

        let params = QueryParams {
            cursor: self.cursor().map(str::to_string),
            limit: self.limit,
            condition: self.condition.clone(),
            ..QueryParams::default()
        };
        let path = format!("/1.1/scan/classes/{}", self.class_name);
        let body = self.app.request(HttpRequest::get(path, params), &self.options).await?;
        let resp: ScanResponse = serde_json::from_value(body)
            .map_err(|e| QueryError::from(TransportError::InvalidResponse(e.to_string())))?;

        let value = resp
            .results
            .into_iter()
            .map(|r| self.decoder.decode(&self.app, r, &self.class_name))
            .collect::<Result<Vec<_>, _>>()?;

        self.cursor = match resp.cursor {
            Some(c) => CursorState::At(c),
            None => CursorState::End,
        };
        let done = self.is_exhausted() && value.is_empty();
        log::debug!(
            "scan {}: {} record(s), cursor={:?}, done={done}",
            self.class_name,
            value.len(),
            self.cursor()
        );
        Ok(ScanPage { value, done })
    }

    /// Pages as a stream, ending at `done` or after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<D::Output>, QueryError>> {
        futures::stream::try_unfold(self, |mut it| async move {
            let page = it.next().await?;
            Ok(if page.done { None } else { Some((page.value, it)) })
        })
    }
}
