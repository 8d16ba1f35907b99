//! Resource CRUD handlers.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | `/resources` | 200, JSON array |
//! | POST | `/resources/add` | 201, created resource |
//! | PUT | `/resources/update?id=N` | 200, empty body |
//! | DELETE | `/resources/delete?id=N` | 204, empty body |
//!
//! Handlers hold no state of their own; the storage handle is captured by the
//! closures built in [`mount`].

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::method::Method;
use crate::model::ResourcePayload;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::storage::{Storage, StorageError, StorageResult};

/// Shared handle to the resource collection.
pub type SharedStorage = Arc<dyn Storage>;

/// Failure of a resource request, converted to a plain-text response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("resource {0} does not exist")]
    NotFound(i64),

    #[error("{context}")]
    Persistence {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    /// The blocking task running the store call panicked or was cancelled.
    #[error("{context}")]
    Task {
        context: &'static str,
        #[source]
        source: JoinError,
    },
}

impl ApiError {
    fn from_storage(context: &'static str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            source => Self::Persistence { context, source },
        }
    }

    pub fn status(&self) -> Status {
        match self {
            // An id with no matching resource is out of range for the
            // collection, which clients see as a bad request.
            Self::BadRequest(_) | Self::NotFound(_) => Status::BadRequest,
            Self::Persistence { .. } | Self::Task { .. } => Status::InternalServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Persistence { context, source } => error!("{context}: {source}"),
            Self::Task { context, source } => error!("{context}: {source}"),
            Self::BadRequest(_) | Self::NotFound(_) => {}
        }
        Response::builder().status(self.status()).text(self.to_string())
    }
}

/// Registers the four resource routes on `router`, all sharing `store`.
pub fn mount(router: Router, store: SharedStorage) -> Router {
    let (s1, s2, s3, s4) = (store.clone(), store.clone(), store.clone(), store);
    router
        .on(Method::Get,    "/resources",        move |req| list(Arc::clone(&s1), req))
        .on(Method::Post,   "/resources/add",    move |req| add(Arc::clone(&s2), req))
        .on(Method::Put,    "/resources/update", move |req| update(Arc::clone(&s3), req))
        .on(Method::Delete, "/resources/delete", move |req| delete(Arc::clone(&s4), req))
}

/// `GET /resources`
pub async fn list(store: SharedStorage, _req: Request) -> Result<Response, ApiError> {
    let resources = with_store(store, "Failed to fetch resources", |s| s.list()).await?;
    Ok(Json::new(resources).into_response())
}

/// `POST /resources/add` with body `{"name": "..."}`
pub async fn add(store: SharedStorage, req: Request) -> Result<Response, ApiError> {
    let payload = decode_payload(&req)?;
    let resource = with_store(store, "Failed to add resource", move |s| s.add(&payload.name)).await?;
    Ok(Json::with_status(Status::Created, resource).into_response())
}

/// `PUT /resources/update?id=N` with body `{"name": "..."}`
pub async fn update(store: SharedStorage, req: Request) -> Result<Status, ApiError> {
    let id = resource_id(&req)?;
    let payload = decode_payload(&req)?;
    with_store(store, "Failed to update resource", move |s| s.update(id, &payload.name)).await?;
    Ok(Status::Ok)
}

/// `DELETE /resources/delete?id=N`
pub async fn delete(store: SharedStorage, req: Request) -> Result<Status, ApiError> {
    let id = resource_id(&req)?;
    with_store(store, "Failed to delete resource", move |s| s.delete(id)).await?;
    Ok(Status::NoContent)
}

/// Runs a synchronous store call on tokio's blocking pool so SQLite I/O and
/// lock waits never stall the connection tasks.
async fn with_store<T, F>(store: SharedStorage, context: &'static str, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Storage) -> StorageResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&*store))
        .await
        .map_err(|source| ApiError::Task { context, source })?
        .map_err(|e| ApiError::from_storage(context, e))
}

fn decode_payload(req: &Request) -> Result<ResourcePayload, ApiError> {
    req.json().map_err(|_| ApiError::BadRequest("Invalid JSON"))
}

/// Reads the `id` query parameter. Missing, non-numeric or non-positive ids
/// are rejected.
fn resource_id(req: &Request) -> Result<i64, ApiError> {
    req.query("id")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id >= 1)
        .ok_or(ApiError::BadRequest("Invalid resource ID"))
}
