use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    net::SocketAddr,
};

#[derive(Debug, PartialEq)]
pub enum ParseError {
    // the invalid range
    InvalidRange,
    // no range overlaps the file
    NoOverlap,
    // the request path can't be mapped to the filesystem
    InvalidPath,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::InvalidRange => write!(f, "invalid range"),
            ParseError::NoOverlap => write!(f, "no overlap"),
            ParseError::InvalidPath => write!(f, "invalid url path"),
        }
    }
}

impl Error for ParseError {}

/// Fatal errors raised while starting the server.
#[derive(Debug)]
pub enum ServeError {
    /// the listener can't bind the configured address.
    Bind { addr: SocketAddr, source: io::Error },
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ServeError::Bind { ref addr, ref source } => {
                write!(f, "failed to bind {addr}: {source}")
            }
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            ServeError::Bind { ref source, .. } => Some(source),
        }
    }
}
