//! The resource entity and its request payload.

use serde::{Deserialize, Serialize};

/// The single persisted entity.
///
/// `id` is assigned by the storage backend on creation and never reused.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub name: String,
}

/// Body of `POST /resources/add` and `PUT /resources/update`.
///
/// `name` is required and must be a string; any other fields are ignored.
/// Empty names are accepted.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct ResourcePayload {
    pub name: String,
}
