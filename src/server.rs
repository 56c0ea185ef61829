use std::{io, net::SocketAddr, time::Duration};

use hyper::server::conn::Http;
use log::{debug, error, info};
use tokio::net::TcpListener;

use crate::{config::ServerConfig, error::ServeError, service::FileService};

// back off after a failed accept, e.g. out of file descriptors
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// A bound listener and the service it dispatches to.
pub struct Server {
    listener: TcpListener,
    service: FileService,
}

/// bind the listener of `config`. No retry, no other port.
pub async fn bind(config: &ServerConfig) -> Result<Server, ServeError> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.addr,
            source,
        })?;
    Ok(Server {
        listener,
        service: FileService::new(config.root.clone()),
    })
}

/// bind and serve `config` until the process is killed.
pub async fn serve(config: &ServerConfig) -> Result<(), ServeError> {
    let server = bind(config).await?;
    let addr = server.local_addr().unwrap_or(config.addr);
    info!(
        "Serving files from {} on http://{}",
        config.root.display(),
        addr
    );
    server.run().await;
    Ok(())
}

impl Server {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// accept connections forever, each one served by its own task.
    pub async fn run(self) {
        let Self { listener, service } = self;
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("failed to accept connection: {e}");
                    tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                    continue;
                }
            };
            let service = service.clone();
            tokio::spawn(async move {
                let conn = Http::new()
                    .http1_only(true)
                    .http1_keep_alive(true)
                    .serve_connection(stream, service);
                if let Err(e) = conn.await {
                    debug!("connection from {peer} failed: {e}");
                }
            });
        }
    }
}
