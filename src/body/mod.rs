use hyper::body::{Bytes, HttpBody, SizeHint};

use futures_util::Stream;
use std::{
    io::Error,
    pin::Pin,
    task::{Context, Poll},
};

pub use self::bytes_stream::FileBytesStream;
pub use self::range_bytes_stream::{MultiRangeBytesStream, RangeBytesStream};

mod bytes_stream;
mod range_bytes_stream;

/// The response body of the file service.
pub enum Body {
    Empty,
    /// a small in-memory body: error messages, redirects and listings.
    Full(Option<Bytes>),
    File(FileBytesStream),
    Range(RangeBytesStream),
    MultiRange(MultiRangeBytesStream),
}

impl Body {
    pub fn full(data: impl Into<Bytes>) -> Self {
        Body::Full(Some(data.into()))
    }
}

impl HttpBody for Body {
    type Data = Bytes;

    type Error = Error;

    fn poll_data(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Self::Data, Self::Error>>> {
        match *self {
            Body::Empty => Poll::Ready(None),
            Body::Full(ref mut data) => Poll::Ready(data.take().map(Ok)),
            Body::File(ref mut f) => Pin::new(f).poll_next(cx),
            Body::Range(ref mut r) => Pin::new(r).poll_next(cx),
            Body::MultiRange(ref mut mr) => Pin::new(mr).poll_next(cx),
        }
    }

    fn poll_trailers(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<hyper::HeaderMap>, Self::Error>> {
        Poll::Ready(Ok(None))
    }

    fn is_end_stream(&self) -> bool {
        match *self {
            Body::Empty => true,
            Body::Full(ref data) => data.is_none(),
            _ => false,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match *self {
            Body::Empty => SizeHint::with_exact(0),
            Body::Full(Some(ref data)) => SizeHint::with_exact(data.len() as u64),
            Body::Full(None) => SizeHint::with_exact(0),
            _ => SizeHint::default(),
        }
    }
}
