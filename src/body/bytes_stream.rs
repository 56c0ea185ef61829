use futures_util::Stream;
use hyper::body::Bytes;
use std::{
    io::Result,
    pin::Pin,
    task::{Context, Poll},
};

use crate::file::{FileReader, TokioFileReader};

/// Streams at most `remaining` bytes from the reader's current position.
pub struct FileBytesStream<T = TokioFileReader> {
    pub(crate) reader: T,
    pub(crate) remaining: u64,
}

impl<T> FileBytesStream<T> {
    pub fn new_with_limit(reader: T, limit: u64) -> Self {
        Self {
            reader,
            remaining: limit,
        }
    }
}

impl<T: FileReader> Stream for FileBytesStream<T> {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Self {
            ref mut reader,
            ref mut remaining,
        } = *self;
        if *remaining == 0 {
            return Poll::Ready(None);
        }
        match Pin::new(reader).poll_read(cx, *remaining) {
            Poll::Ready(Ok(b)) if b.is_empty() => {
                *remaining = 0;
                Poll::Ready(None)
            }
            Poll::Ready(Ok(b)) => {
                *remaining -= b.len() as u64;
                Poll::Ready(Some(Ok(b)))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}
