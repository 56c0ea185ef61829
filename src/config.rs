use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ROOT: &str = "../";

/// The server configuration, built once at startup and never changed after.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub root: PathBuf,
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn new(root: impl Into<PathBuf>, addr: impl Into<SocketAddr>) -> Self {
        Self {
            root: root.into(),
            addr: addr.into(),
        }
    }

    /// listen on all interfaces with the given port.
    pub fn with_port(root: impl Into<PathBuf>, port: u16) -> Self {
        Self::new(root, (Ipv4Addr::UNSPECIFIED, port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_ROOT, DEFAULT_PORT)
    }
}
