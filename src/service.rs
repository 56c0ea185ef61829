use std::{
    io::Error as IoError,
    path::PathBuf,
    task::{Context, Poll},
};

use futures_util::future::BoxFuture;
use hyper::{service::Service, Request, Response, StatusCode};
use log::{debug, error};

use crate::{
    body::Body,
    file::{FileOpener, TokioFileOpener},
    resolve::{RequestResolve, Resolved},
    response::{self, ResponseBuilder},
};

/// Serves the files below a root directory.
///
/// Every request is resolved on its own; failures become an error status for
/// that request and never an `Err` of the service.
#[derive(Debug, Clone)]
pub struct FileService<T = TokioFileOpener> {
    opener: T,
}

impl FileService<TokioFileOpener> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_opener(TokioFileOpener::new(root))
    }
}

impl<T: FileOpener + Clone> FileService<T> {
    pub fn with_opener(opener: T) -> Self {
        Self { opener }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<Body> {
        let resolved = RequestResolve::new(&self.opener, &req).resolve().await;
        let mut builder = ResponseBuilder::new();
        builder.request(&req);
        let resp = match resolved {
            Ok(Resolved::Found(file)) => builder.build(file).unwrap_or_else(|e| {
                error!("failed to build response for {}: {}", req.uri().path(), e);
                response::status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }),
            Ok(Resolved::Listing { url, entries }) => builder.build_listing(&url, &entries),
            Ok(Resolved::Redirect(location)) => response::redirect(&location),
            Ok(Resolved::MethodNotAllowed) => response::method_not_allowed(),
            Ok(Resolved::BadRequest) => response::status_response(StatusCode::BAD_REQUEST),
            Ok(Resolved::NotFound) => response::status_response(StatusCode::NOT_FOUND),
            Ok(Resolved::PermissionDenied) => response::status_response(StatusCode::FORBIDDEN),
            Err(e) => {
                error!("failed to serve {}: {}", req.uri().path(), e);
                response::status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        debug!("{} {} {}", req.method(), req.uri(), resp.status().as_u16());
        resp
    }
}

impl<B, T> Service<Request<B>> for FileService<T>
where
    T: FileOpener + Clone,
{
    type Response = Response<Body>;

    type Error = IoError;

    type Future = BoxFuture<'static, Result<Response<Body>, IoError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // only GET and HEAD are served, the request body is never read
        let (parts, _) = req.into_parts();
        let req = Request::from_parts(parts, ());
        let svc = self.clone();
        Box::pin(async move { Ok(svc.handle(req).await) })
    }
}
