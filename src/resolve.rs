use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

use hyper::{Method, Request};

use crate::file::{FileOpener, FileWithMeta, TokioFileOpener};
use crate::listing::{self, DirEntry};
use crate::path::RequestPath;

/// The file served for a request naming a directory.
pub const INDEX_FILE: &str = "index.html";

/// What a request resolves to on disk.
#[derive(Debug)]
pub enum Resolved {
    MethodNotAllowed,
    BadRequest,
    NotFound,
    PermissionDenied,
    /// the canonical url of the entry differs from the request.
    Redirect(String),
    /// a directory without an index file.
    Listing { url: String, entries: Vec<DirEntry> },
    Found(FileWithMeta),
}

pub struct RequestResolve<'a, B, T = TokioFileOpener> {
    opener: &'a T,
    request: &'a Request<B>,
}

impl<'a, B, T: FileOpener> RequestResolve<'a, B, T> {
    pub fn new(opener: &'a T, request: &'a Request<B>) -> Self {
        Self { opener, request }
    }

    pub async fn resolve(&self) -> Result<Resolved> {
        let Self { opener, request } = *self;
        match *request.method() {
            Method::GET | Method::HEAD => {}
            _ => return Ok(Resolved::MethodNotAllowed),
        }
        let path = match RequestPath::parse(request.uri().path()) {
            Ok(path) => path,
            Err(_) => return Ok(Resolved::BadRequest),
        };
        let relative: PathBuf = path.segments().iter().collect();
        let file = match opener.open(&relative).await {
            Ok(file) => file,
            Err(e) => return classify(e),
        };
        if !file.is_dir {
            if path.has_trailing_slash() {
                return Ok(Resolved::Redirect(self.location(path.to_url())));
            }
            return Ok(Resolved::Found(file));
        }

        let mut url = path.to_url();
        if !path.has_trailing_slash() {
            url.push('/');
            return Ok(Resolved::Redirect(self.location(url)));
        }
        if !path.is_root() {
            url.push('/');
        }
        if let Some(index) = self.open_index(&relative).await {
            return Ok(Resolved::Found(index));
        }
        match listing::read_entries(&file.path).await {
            Ok(entries) => Ok(Resolved::Listing { url, entries }),
            Err(e) => classify(e),
        }
    }

    async fn open_index(&self, dir: &Path) -> Option<FileWithMeta> {
        match self.opener.open(&dir.join(INDEX_FILE)).await {
            Ok(index) if !index.is_dir => Some(index),
            _ => None,
        }
    }

    /// keep the query string when redirecting.
    fn location(&self, mut url: String) -> String {
        if let Some(query) = self.request.uri().query() {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn classify(e: Error) -> Result<Resolved> {
    match e.kind() {
        ErrorKind::NotFound => Ok(Resolved::NotFound),
        ErrorKind::PermissionDenied => Ok(Resolved::PermissionDenied),
        _ => Err(e),
    }
}
