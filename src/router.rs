//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A path that is known
//! under some other method answers `405` with an `allow` header; a path that
//! is unknown everywhere answers `404`.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

/// Outcome of looking a request up in the routing table.
pub(crate) enum Route {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and catch-alls `{*name}`;
    /// `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an existing route for
    /// the same method. Routes are fixed at startup, so this is a programming
    /// error rather than a runtime condition.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    pub(crate) fn lookup(&self, method: &http::Method, path: &str) -> Route {
        if let Ok(method) = Method::try_from(method) {
            if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
                let handler = Arc::clone(matched.value);
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Route::Found(handler, params);
            }
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();
        if allowed.is_empty() {
            return Route::NotFound;
        }
        allowed.sort_by_key(|m| Method::ALL.iter().position(|a| a == m));
        Route::MethodNotAllowed(allowed)
    }

    /// Routes one fully buffered request and produces its response.
    ///
    /// The server calls this for every request; tests can call it directly
    /// without opening a socket.
    pub async fn call(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        let response = match self.lookup(&method, &path) {
            Route::Found(handler, params) => handler.call(Request::new(parts, body, params)).await,
            Route::MethodNotAllowed(allowed) => {
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", &allow)
                    .text("Invalid request method")
            }
            Route::NotFound => Response::builder().status(Status::NotFound).text("404 page not found"),
        };

        debug!(%method, %path, status = response.status_code().as_u16(), "request handled");
        response
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(_req: Request) -> &'static str { "ok" }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn dispatches_by_method_and_path() {
        let router = Router::new().on(Method::Get, "/a", ok);
        let res = router.call(get("/a")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.body(), b"ok");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let router = Router::new().on(Method::Get, "/a", ok);
        assert_eq!(router.call(get("/b")).await.status_code(), Status::NotFound);
    }

    #[tokio::test]
    async fn known_path_wrong_method_lists_allowed_methods() {
        let router = Router::new()
            .on(Method::Post, "/a", ok)
            .on(Method::Get, "/a", ok);
        let req = http::Request::builder()
            .method(http::Method::DELETE)
            .uri("/a")
            .body(Bytes::new())
            .unwrap();
        let res = router.call(req).await;
        assert_eq!(res.status_code(), Status::MethodNotAllowed);
        assert_eq!(res.header("allow"), Some("GET, POST"));
    }

    #[tokio::test]
    async fn catch_all_params_reach_the_handler() {
        async fn echo(req: Request) -> String { req.param("path").unwrap_or_default().to_owned() }
        let router = Router::new().on(Method::Get, "/static/{*path}", echo);
        let res = router.call(get("/static/css/site.css")).await;
        assert_eq!(res.body(), b"css/site.css");
    }
}
