//! # resource-server
//!
//! A small JSON-over-HTTP service that performs CRUD operations on a single
//! `resource` entity (`{id, name}`), stored either in a SQLite table or in
//! process memory.
//!
//! ## HTTP surface
//!
//! | Method | Path | Body | Success | Failure |
//! |---|---|---|---|---|
//! | GET | `/resources` | | 200, `[{id, name}]` | 500 |
//! | POST | `/resources/add` | `{"name": ..}` | 201, `{id, name}` | 400 invalid JSON, 500 |
//! | PUT | `/resources/update?id=N` | `{"name": ..}` | 200 | 400 invalid JSON/id, 500 |
//! | DELETE | `/resources/delete?id=N` | | 204 | 400 invalid id, 500 |
//!
//! ## Layout
//!
//! - [`storage`]: the [`Storage`](storage::Storage) trait and its SQLite and
//!   in-memory backends.
//! - [`handlers`]: the resource routes.
//! - [`demo`]: optional hello/echo/static routes.
//! - [`Router`], [`Server`]: radix-tree routing via [`matchit`] and a hyper
//!   server with graceful shutdown.
//! - [`Config`]: command line and environment.
//!
//! Building an app by hand:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use resource_server::{Router, Server, handlers, storage::MemoryStorage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = handlers::mount(Router::new(), Arc::new(MemoryStorage::new()));
//!     Server::bind("127.0.0.1:8080".parse().unwrap()).serve(app).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod status;

pub mod config;
pub mod demo;
pub mod handlers;
pub mod model;
pub mod server;
pub mod storage;

pub use config::{Backend, Config};
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use model::{Resource, ResourcePayload};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;

/// Builds the full application router for `config` around `store`.
pub fn app(config: &Config, store: handlers::SharedStorage) -> Router {
    let router = handlers::mount(Router::new(), store);
    if config.demo_routes {
        demo::mount(router, &config.static_dir)
    } else {
        router
    }
}
