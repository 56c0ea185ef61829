//! A static file server for local development.
//!
//! Request paths map straight onto the files below a root directory:
//!
//! ```no_run
//! use devserve::{server, ServerConfig};
//!
//! # async fn run() -> Result<(), devserve::ServeError> {
//! server::serve(&ServerConfig::with_port("./public", 8080)).await
//! # }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod file;
pub mod listing;
pub mod mime;
pub mod path;
pub mod range;
pub mod resolve;
pub mod response;
pub mod server;
pub mod service;

pub use config::ServerConfig;
pub use error::{ParseError, ServeError};
pub use service::FileService;
