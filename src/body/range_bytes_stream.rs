use std::fmt::Write;
use std::io::{Result, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::vec;

use futures_util::Stream;
use hyper::body::Bytes;
use tokio::io::AsyncSeek;

use crate::file::TokioFileReader;
use crate::range::HttpRange;

use super::bytes_stream::FileBytesStream;

#[derive(Debug, Clone, Copy)]
enum SeekState {
    Initial,
    Seeking,
    Reading,
}

/// Streams one range of a file: seek to the start, then read `length` bytes.
pub struct RangeBytesStream {
    state: SeekState,
    start: u64,
    stream: FileBytesStream,
}

impl RangeBytesStream {
    pub fn new(reader: TokioFileReader, range: &HttpRange) -> Self {
        Self {
            stream: FileBytesStream::new_with_limit(reader, range.length),
            start: range.start,
            state: SeekState::Initial,
        }
    }

    /// point the stream at another range of the same file.
    fn reset(&mut self, range: &HttpRange) {
        self.state = SeekState::Initial;
        self.start = range.start;
        self.stream.remaining = range.length;
    }

    fn is_done(&self) -> bool {
        self.stream.remaining == 0
    }
}

impl Stream for RangeBytesStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Self {
            ref mut stream,
            ref mut state,
            start,
        } = *self;
        if let SeekState::Initial = *state {
            if let Err(e) = Pin::new(&mut stream.reader).start_seek(SeekFrom::Start(start)) {
                return Poll::Ready(Some(Err(e)));
            }
            *state = SeekState::Seeking;
        }
        if let SeekState::Seeking = *state {
            match Pin::new(&mut stream.reader).poll_complete(cx) {
                Poll::Ready(Ok(_)) => *state = SeekState::Reading,
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Pending => return Poll::Pending,
            }
        }
        Pin::new(stream).poll_next(cx)
    }
}

/// Streams several ranges of a file as a `multipart/byteranges` body.
pub struct MultiRangeBytesStream {
    ranges: vec::IntoIter<HttpRange>,
    current: RangeBytesStream,
    is_first: bool,
    completed: bool,
    boundary: String,
    content_type: String,
    file_size: u64,
}

impl MultiRangeBytesStream {
    pub fn new(
        reader: TokioFileReader,
        ranges: Vec<HttpRange>,
        boundary: &str,
        content_type: &str,
        file_size: u64,
    ) -> Self {
        let empty = HttpRange {
            start: 0,
            length: 0,
        };
        Self {
            ranges: ranges.into_iter(),
            current: RangeBytesStream::new(reader, &empty),
            is_first: true,
            completed: false,
            boundary: boundary.to_owned(),
            content_type: content_type.to_owned(),
            file_size,
        }
    }

    /// the exact body length, for the `Content-Length` header.
    pub fn body_len(&self) -> u64 {
        let parts: u64 = self
            .ranges
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, range)| {
                let header = self.part_header(i == 0, range);
                header.len() as u64 + range.length
            })
            .sum();
        parts + self.closing_delimiter().len() as u64
    }

    fn part_header(&self, is_first: bool, range: &HttpRange) -> String {
        let mut buf = String::with_capacity(128);
        if !is_first {
            buf.push_str("\r\n");
        }
        // writing into a String can't fail
        let _ = write!(
            buf,
            "--{}\r\nContent-Type: {}\r\nContent-Range: {}\r\n\r\n",
            self.boundary,
            self.content_type,
            range.content_range(self.file_size),
        );
        buf
    }

    fn closing_delimiter(&self) -> String {
        format!("\r\n--{}--\r\n", self.boundary)
    }
}

impl Stream for MultiRangeBytesStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.completed {
            return Poll::Ready(None);
        }
        if this.current.is_done() {
            let range = match this.ranges.next() {
                Some(range) => range,
                None => {
                    this.completed = true;
                    return Poll::Ready(Some(Ok(this.closing_delimiter().into())));
                }
            };
            let header = this.part_header(this.is_first, &range);
            this.is_first = false;
            this.current.reset(&range);
            return Poll::Ready(Some(Ok(header.into())));
        }
        match Pin::new(&mut this.current).poll_next(cx) {
            // the file ended before the range did
            Poll::Ready(None) => {
                this.completed = true;
                Poll::Ready(None)
            }
            p => p,
        }
    }
}
