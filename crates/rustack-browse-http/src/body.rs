//! Response body types supporting buffered, streaming, and empty modes.
//!
//! [`BrowseResponseBody`] is the HTTP response body used by every route:
//!
//! - **Buffered**: rendered HTML pages, health JSON, error pages.
//! - **Streaming**: object downloads, passed through chunk by chunk from the
//!   storage gateway without buffering the whole object.
//! - **Empty**: the favicon 404 and other body-less answers.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use http_body::{Frame, SizeHint};
use http_body_util::Full;
use rustack_browse_core::ObjectBody;

/// Browse response body.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Default)]
pub enum BrowseResponseBody {
    /// Fully rendered content.
    Buffered(Full<Bytes>),
    /// Chunks pulled from the storage gateway as the client reads.
    Streaming {
        /// The remaining chunks.
        stream: BoxStream<'static, std::io::Result<Bytes>>,
        /// Total length, when the store reported it.
        length: Option<u64>,
    },
    /// No content.
    #[default]
    Empty,
}

impl fmt::Debug for BrowseResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Streaming { length, .. } => f
                .debug_struct("Streaming")
                .field("length", length)
                .finish_non_exhaustive(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl BrowseResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Stream an object body fetched from storage.
    #[must_use]
    pub fn from_object(body: ObjectBody) -> Self {
        Self::Streaming {
            stream: body.stream,
            length: body.content_length.and_then(|len| u64::try_from(len).ok()),
        }
    }
}

impl http_body::Body for BrowseResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming { stream, .. } => stream
                .poll_next_unpin(cx)
                .map(|chunk| chunk.map(|result| result.map(Frame::data))),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming { .. } => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming {
                length: Some(len), ..
            } => SizeHint::with_exact(*len),
            Self::Streaming { length: None, .. } => SizeHint::default(),
            Self::Empty => SizeHint::with_exact(0),
        }
    }
}
