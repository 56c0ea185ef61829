use std::process;

use devserve::{server, ServerConfig};
use env_logger::Env;
use log::error;
use tokio::runtime::Builder;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::default();
    let rt = match Builder::new_multi_thread().enable_io().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start the runtime: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(server::serve(&config)) {
        error!("{e}");
        process::exit(1);
    }
}
