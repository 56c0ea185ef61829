use std::{
    cmp::min,
    fs::OpenOptions,
    future::Future,
    io::{Error, ErrorKind, Result, SeekFrom},
    mem::MaybeUninit,
    path::{Path, PathBuf},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::SystemTime,
};

use hyper::body::Bytes;
use log::warn;
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncSeek, ReadBuf},
    task::JoinHandle,
};

const READ_BUF_SIZE: usize = 10240;

/// An opened file (or directory) below the root with the metadata the
/// response needs.
#[derive(Debug)]
pub struct FileWithMeta {
    pub file: File,
    pub path: PathBuf,
    pub size: u64,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
}

/// The file reader which reads the bytes from file to fill the body.
pub trait FileReader: AsyncSeek + Unpin + Send + 'static {
    /// read at most `limit` bytes. An empty `Bytes` means end of file.
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, limit: u64) -> Poll<Result<Bytes>>;
}

/// Opens paths relative to a root directory.
pub trait FileOpener: Send + Sync + 'static {
    type Future: Future<Output = Result<FileWithMeta>> + Unpin + Send + 'static;

    fn open(&self, relative: &Path) -> Self::Future;
}

/// Reads a tokio file through a fixed size buffer.
pub struct TokioFileReader {
    file: File,
    buf: Box<[MaybeUninit<u8>; READ_BUF_SIZE]>,
}

impl TokioFileReader {
    pub fn new(file: File) -> Self {
        Self {
            file,
            buf: Box::new([MaybeUninit::uninit(); READ_BUF_SIZE]),
        }
    }
}

impl From<FileWithMeta> for TokioFileReader {
    fn from(meta: FileWithMeta) -> Self {
        TokioFileReader::new(meta.file)
    }
}

impl FileReader for TokioFileReader {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, limit: u64) -> Poll<Result<Bytes>> {
        let this = self.get_mut();
        let len = min(limit, READ_BUF_SIZE as u64) as usize;
        let mut buf = ReadBuf::uninit(&mut this.buf[..len]);
        match Pin::new(&mut this.file).poll_read(cx, &mut buf) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(Bytes::copy_from_slice(buf.filled()))),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl AsyncSeek for TokioFileReader {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> Result<()> {
        Pin::new(&mut self.get_mut().file).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<u64>> {
        Pin::new(&mut self.get_mut().file).poll_complete(cx)
    }
}

/// The future of a file and its meta info, opened on the blocking pool.
pub struct FileWithMetaFuture {
    inner: JoinHandle<Result<FileWithMeta>>,
}

impl FileWithMetaFuture {
    fn new(root: Arc<PathBuf>, relative: PathBuf) -> Self {
        let inner = tokio::task::spawn_blocking(move || open_below(&root, &relative));
        Self { inner }
    }
}

impl Future for FileWithMetaFuture {
    type Output = Result<FileWithMeta>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(r)) => Poll::Ready(r),
            // only a JoinHandle error
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::new(
                ErrorKind::Other,
                "error execute in background.",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// open `relative` below `root`, refusing anything whose real path leaves it.
fn open_below(root: &Path, relative: &Path) -> Result<FileWithMeta> {
    let root = root.canonicalize()?;
    let path = root
        .join(relative)
        .canonicalize()
        .map_err(|e| map_open_error(e, &root, relative))?;
    if !path.starts_with(&root) {
        warn!(
            "path escapes the root: {} -> {}",
            relative.display(),
            path.display()
        );
        return Err(Error::new(ErrorKind::NotFound, "path escapes the root"));
    }
    let file = OpenOptions::new().read(true).open(&path)?;
    let meta = file.metadata()?;
    Ok(FileWithMeta {
        file: File::from_std(file),
        path,
        size: meta.len(),
        is_dir: meta.is_dir(),
        modified: meta.modified().ok(),
    })
}

/// a path through a regular file, like `a.txt/b`, fails with an os specific
/// error; report it as not found.
fn map_open_error(err: Error, root: &Path, relative: &Path) -> Error {
    if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) {
        return err;
    }
    let mut path = root.to_path_buf();
    for component in relative.components() {
        path.push(component);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Error::new(ErrorKind::NotFound, err),
            Err(_) => break,
        }
    }
    err
}

/// The opener used by the server: the tokio blocking pool over the real
/// filesystem.
#[derive(Debug, Clone)]
pub struct TokioFileOpener {
    root: Arc<PathBuf>,
}

impl TokioFileOpener {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }
}

impl FileOpener for TokioFileOpener {
    type Future = FileWithMetaFuture;

    fn open(&self, relative: &Path) -> Self::Future {
        FileWithMetaFuture::new(self.root.clone(), relative.to_path_buf())
    }
}
