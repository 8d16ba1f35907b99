//! Demo endpoints: hello world, request echo, a static JSON payload and
//! static file serving. Mounted only with `--demo-routes`.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::method::Method;
use crate::request::{Request, parse_form};
use crate::response::{ContentType, IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;

/// Registers the demo routes. The static route is only mounted when
/// `static_dir` exists.
pub fn mount(router: Router, static_dir: &Path) -> Router {
    let router = router
        .on(Method::Get,  "/",              hello)
        .on(Method::Get,  "/customHandler", custom_handler)
        .on(Method::Get,  "/req-info",      request_info)
        .on(Method::Post, "/req-info",      request_info)
        .on(Method::Get,  "/res-info",      response_info);

    if !static_dir.is_dir() {
        warn!(dir = %static_dir.display(), "static directory does not exist, not serving /static");
        return router;
    }
    let root = Arc::new(static_dir.to_path_buf());
    router.on(Method::Get, "/static/{*path}", move |req| static_file(Arc::clone(&root), req))
}

pub async fn hello(_req: Request) -> &'static str {
    "Hello World!"
}

pub async fn custom_handler(_req: Request) -> &'static str {
    "This is a custom handler called MyHandler!"
}

/// Echoes the request line, headers, body and parsed form back as text.
///
/// The form merges query-string pairs with an urlencoded body, query first.
pub async fn request_info(req: Request) -> Response {
    let mut form = req.query_pairs();
    let urlencoded = req
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if urlencoded {
        match std::str::from_utf8(req.body()) {
            Ok(body) => form.extend(parse_form(body)),
            Err(_) => {
                return Response::builder()
                    .status(Status::BadRequest)
                    .text("Failed to parse form data");
            }
        }
    }

    let headers: Vec<String> = req
        .headers()
        .iter()
        .map(|(k, v)| format!("{k}: {}", String::from_utf8_lossy(v.as_bytes())))
        .collect();
    let form_name = form.iter().find(|(k, _)| k == "name").map(|(_, v)| v.as_str()).unwrap_or("");

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Method: {}", req.method());
    let _ = writeln!(out, "URL: {}", req.uri());
    let _ = writeln!(out, "Header: [{}]", headers.join(", "));
    let _ = writeln!(out, "Content-Type: {}", req.header("content-type").unwrap_or(""));
    let _ = writeln!(out, "Body: {}", String::from_utf8_lossy(req.body()));
    let _ = writeln!(out, "Form: {form:?}");
    let _ = writeln!(out, "Form value 'name': {form_name}");
    Response::text(out)
}

pub async fn response_info(_req: Request) -> Response {
    Json::new(json!({ "status": "success", "message": "Hello, world!" })).into_response()
}

/// Serves a file below `root`. Paths that try to leave `root` are 404s.
pub async fn static_file(root: Arc<PathBuf>, req: Request) -> Response {
    let Some(relative) = req.param("path").and_then(safe_relative_path) else {
        return Status::NotFound.into_response();
    };
    let full = root.join(&relative);

    match tokio::fs::read(&full).await {
        Ok(bytes) => {
            let content_type = full
                .extension()
                .and_then(|e| e.to_str())
                .map(ContentType::from_extension)
                .unwrap_or(ContentType::OctetStream);
            Response::builder().bytes(content_type, bytes)
        }
        Err(e) => {
            debug!(path = %full.display(), "static file unavailable: {e}");
            Status::NotFound.into_response()
        }
    }
}

/// Accepts only plain, non-empty relative paths made of normal components.
fn safe_relative_path(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}
