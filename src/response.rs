use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hyper::{
    header::{self, HeaderValue},
    http::Result,
    HeaderMap, Method, Request, Response, StatusCode,
};

use crate::{
    body::{Body, FileBytesStream, MultiRangeBytesStream, RangeBytesStream},
    file::FileWithMeta,
    listing::{self, DirEntry},
    mime,
    range::HttpRange,
};

// mtimes this close to the epoch are treated as unknown
const VALID_MTIME: Duration = Duration::from_secs(2);
const BOUNDARY: &str = "devserve-byteranges-3d6b6a416f9b5c87";

#[derive(Default, Debug, Clone)]
pub struct ResponseBuilder {
    // `Range` request header.
    range: Option<String>,
    // `If-Modified-Since` request header.
    if_modified_since: Option<SystemTime>,
    // `If-Range` request header.
    if_range: Option<String>,

    is_head_method: bool,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn request<B>(&mut self, req: &Request<B>) -> &mut Self {
        self.request_headers(req.headers());
        self.is_head_method(req.method());
        self
    }

    pub fn request_headers(&mut self, headers: &HeaderMap) -> &mut Self {
        self.range_header(headers.get(header::RANGE));
        self.if_modified_since_header(headers.get(header::IF_MODIFIED_SINCE));
        self.if_range_header(headers.get(header::IF_RANGE));
        self
    }

    pub fn range_header(&mut self, value: Option<&HeaderValue>) -> &mut Self {
        self.range = value.and_then(|v| v.to_str().ok()).map(String::from);
        self
    }

    pub fn if_modified_since_header(&mut self, value: Option<&HeaderValue>) -> &mut Self {
        self.if_modified_since = value
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok());
        self
    }

    pub fn if_range_header(&mut self, value: Option<&HeaderValue>) -> &mut Self {
        self.if_range = value.and_then(|v| v.to_str().ok()).map(String::from);
        self
    }

    pub fn is_head_method(&mut self, method: &Method) -> &mut Self {
        self.is_head_method = method == Method::HEAD;
        self
    }

    /// the response serving `file`.
    pub fn build(&self, file: FileWithMeta) -> Result<Response<Body>> {
        let file_size = file.size;
        let content_type = mime::content_type(&file.path);
        let modified = file.modified.filter(|m| {
            m.duration_since(UNIX_EPOCH)
                .map(|d| d >= VALID_MTIME)
                .unwrap_or(false)
        });

        let mut resp_builder = Response::builder();
        if let Some(modified) = modified {
            let last_modified = httpdate::fmt_http_date(modified);
            if self.is_not_modified(modified) {
                return resp_builder
                    .status(StatusCode::NOT_MODIFIED)
                    .header(header::LAST_MODIFIED, last_modified)
                    .body(Body::Empty);
            }
            resp_builder = resp_builder.header(header::LAST_MODIFIED, last_modified);
        }
        resp_builder = resp_builder.header(header::ACCEPT_RANGES, "bytes");

        let ranges = match self.range {
            Some(ref range) if self.range_applies(modified) => {
                match HttpRange::parse(range, file_size) {
                    Ok(ranges) => ranges,
                    Err(_) => {
                        return resp_builder
                            .status(StatusCode::RANGE_NOT_SATISFIABLE)
                            .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
                            .body(Body::Empty);
                    }
                }
            }
            _ => Vec::new(),
        };
        // ranges adding up to more than the file are served as the whole file
        let ranges_len: u64 = ranges.iter().map(|r| r.length).sum();
        let ranges = if ranges_len > file_size {
            Vec::new()
        } else {
            ranges
        };

        match ranges.len() {
            0 => {
                let body = if self.is_head_method {
                    Body::Empty
                } else {
                    Body::File(FileBytesStream::new_with_limit(file.into(), file_size))
                };
                resp_builder
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, file_size)
                    .body(body)
            }
            1 => {
                let range = &ranges[0];
                let body = if self.is_head_method {
                    Body::Empty
                } else {
                    Body::Range(RangeBytesStream::new(file.into(), range))
                };
                resp_builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_RANGE, range.content_range(file_size))
                    .header(header::CONTENT_LENGTH, range.length)
                    .body(body)
            }
            _ => {
                let stream = MultiRangeBytesStream::new(
                    file.into(),
                    ranges,
                    BOUNDARY,
                    content_type,
                    file_size,
                );
                let body_len = stream.body_len();
                let body = if self.is_head_method {
                    Body::Empty
                } else {
                    Body::MultiRange(stream)
                };
                resp_builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/byteranges; boundary={BOUNDARY}"),
                    )
                    .header(header::CONTENT_LENGTH, body_len)
                    .body(body)
            }
        }
    }

    /// the html listing of a directory without an index file.
    pub fn build_listing(&self, url: &str, entries: &[DirEntry]) -> Response<Body> {
        let html = listing::render(url, entries);
        let len = html.len();
        let mut resp = if self.is_head_method {
            Response::new(Body::Empty)
        } else {
            Response::new(Body::full(html))
        };
        let headers = resp.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        resp
    }

    fn is_not_modified(&self, modified: SystemTime) -> bool {
        // http dates have second precision
        match (self.if_modified_since, unix_secs(modified)) {
            (Some(ims), Some(modified)) => unix_secs(ims).map_or(false, |ims| modified <= ims),
            _ => false,
        }
    }

    /// `If-Range` only carries a date here, there are no etags.
    fn range_applies(&self, modified: Option<SystemTime>) -> bool {
        let if_range = match self.if_range {
            Some(ref if_range) => if_range,
            None => return true,
        };
        match (httpdate::parse_http_date(if_range), modified) {
            (Ok(date), Some(modified)) => unix_secs(date) == unix_secs(modified),
            _ => false,
        }
    }
}

fn unix_secs(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// A short plain text response for `status`.
pub fn status_response(status: StatusCode) -> Response<Body> {
    let message = match status {
        StatusCode::NOT_FOUND => "404 page not found\n".to_string(),
        status => format!("{status}\n"),
    };
    let len = message.len();
    let mut resp = Response::new(Body::full(message));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    resp
}

pub fn method_not_allowed() -> Response<Body> {
    let mut resp = status_response(StatusCode::METHOD_NOT_ALLOWED);
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    resp
}

pub fn redirect(location: &str) -> Response<Body> {
    let location = match HeaderValue::from_str(location) {
        Ok(location) => location,
        Err(_) => return status_response(StatusCode::BAD_REQUEST),
    };
    let mut resp = Response::new(Body::Empty);
    *resp.status_mut() = StatusCode::MOVED_PERMANENTLY;
    resp.headers_mut().insert(header::LOCATION, location);
    resp
}

#[cfg(test)]
mod test {
    use std::{fs, path::Path};

    use hyper::body::to_bytes;

    use super::*;
    use crate::file::{FileOpener, TokioFileOpener};

    async fn open(root: &Path, name: &str) -> FileWithMeta {
        TokioFileOpener::new(root)
            .open(Path::new(name))
            .await
            .unwrap()
    }

    fn setup() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), b"<html>ok</html>").unwrap();
        fs::write(root.path().join("digits.txt"), b"0123456789").unwrap();
        root
    }

    fn header<'a>(resp: &'a Response<Body>, name: header::HeaderName) -> &'a str {
        resp.headers().get(name).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_full_file() {
        let root = setup();
        let file = open(root.path(), "index.html").await;
        let resp = ResponseBuilder::new().build(file).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, header::CONTENT_TYPE), "text/html; charset=utf-8");
        assert_eq!(header(&resp, header::CONTENT_LENGTH), "15");
        assert!(resp.headers().contains_key(header::LAST_MODIFIED));
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"<html>ok</html>");
    }

    #[tokio::test]
    async fn test_head() {
        let root = setup();
        let file = open(root.path(), "index.html").await;
        let resp = ResponseBuilder::new()
            .is_head_method(&Method::HEAD)
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, header::CONTENT_LENGTH), "15");
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_not_modified() {
        let root = setup();
        let file = open(root.path(), "index.html").await;
        let modified = file.modified.unwrap();
        let ims = HeaderValue::from_str(&httpdate::fmt_http_date(modified)).unwrap();
        let resp = ResponseBuilder::new()
            .if_modified_since_header(Some(&ims))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());

        let file = open(root.path(), "index.html").await;
        let old = HeaderValue::from_static("Thu, 01 Jan 1970 00:00:10 GMT");
        let resp = ResponseBuilder::new()
            .if_modified_since_header(Some(&old))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_single_range() {
        let root = setup();
        let file = open(root.path(), "digits.txt").await;
        let range = HeaderValue::from_static("bytes=2-5");
        let resp = ResponseBuilder::new()
            .range_header(Some(&range))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header(&resp, header::CONTENT_RANGE), "bytes 2-5/10");
        assert_eq!(header(&resp, header::CONTENT_LENGTH), "4");
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"2345");
    }

    #[tokio::test]
    async fn test_multi_range() {
        let root = setup();
        let file = open(root.path(), "digits.txt").await;
        let range = HeaderValue::from_static("bytes=0-1,-2");
        let resp = ResponseBuilder::new()
            .range_header(Some(&range))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        let content_length: usize = header(&resp, header::CONTENT_LENGTH).parse().unwrap();
        assert_eq!(
            header(&resp, header::CONTENT_TYPE),
            format!("multipart/byteranges; boundary={BOUNDARY}")
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body.len(), content_length);
        let expected = format!(
            "--{b}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Range: bytes 0-1/10\r\n\r\n01\
             \r\n--{b}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Range: bytes 8-9/10\r\n\r\n89\
             \r\n--{b}--\r\n",
            b = BOUNDARY
        );
        assert_eq!(std::str::from_utf8(&body).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let root = setup();
        let file = open(root.path(), "digits.txt").await;
        let range = HeaderValue::from_static("bytes=20-");
        let resp = ResponseBuilder::new()
            .range_header(Some(&range))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&resp, header::CONTENT_RANGE), "bytes */10");
    }

    #[tokio::test]
    async fn test_range_on_empty_file() {
        let root = setup();
        fs::write(root.path().join("empty.txt"), b"").unwrap();
        let file = open(root.path(), "empty.txt").await;
        let range = HeaderValue::from_static("bytes=0-");
        let resp = ResponseBuilder::new()
            .range_header(Some(&range))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header(&resp, header::CONTENT_RANGE), "bytes */0");
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_if_range_mismatch() {
        let root = setup();
        let file = open(root.path(), "digits.txt").await;
        let range = HeaderValue::from_static("bytes=2-5");
        let if_range = HeaderValue::from_static("\"some-etag\"");
        let resp = ResponseBuilder::new()
            .range_header(Some(&range))
            .if_range_header(Some(&if_range))
            .build(file)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_status_response() {
        let resp = status_response(StatusCode::NOT_FOUND);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"404 page not found\n");

        let resp = method_not_allowed();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&resp, header::ALLOW), "GET, HEAD");
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"405 Method Not Allowed\n");

        let resp = redirect("/site/");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(header(&resp, header::LOCATION), "/site/");
    }
}
