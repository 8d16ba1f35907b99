//! resource-server binary.
//!
//! Run with:
//!   RUST_LOG=info cargo run -- --backend sqlite --database ./resources.db
//!
//! Try:
//!   curl -X POST -H 'content-type: application/json' -d '{"name":"Widget"}' \
//!        http://localhost:8080/resources/add
//!   curl http://localhost:8080/resources
//!   curl -X PUT -d '{"name":"Gadget"}' 'http://localhost:8080/resources/update?id=1'
//!   curl -X DELETE 'http://localhost:8080/resources/delete?id=1'

use clap::Parser;
use resource_server::{Config, Error, Server, app};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!(backend = ?config.backend, addr = %config.addr(), "starting resource-server");

    // Any failure to open the store is fatal.
    let store = config.open_storage()?;
    let router = app(&config, store);

    Server::bind(config.addr()).serve(router).await
}
