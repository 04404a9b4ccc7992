// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static file serving with client-side-routing fallback.
//!
//! The web client owns many routes that are not files (`/dashboard`,
//! `/account`, ...). Those must get the entry document so the client router
//! can take over, while real files (`/assets/app.js`) are served by exact
//! path with their own content type.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;

use super::tree::{Asset, AssetTree};

/// Document served for paths that are not assets.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Outcome of resolving a request path against the tree.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// The path names a file in the tree.
    Asset(&'a Asset),
    /// The path is unknown; serve the entry document.
    EntryDocument(&'a Asset),
    /// Neither the path nor the entry document exists.
    NotFound,
}

/// Resolve `path` (as found in the request URI) against `tree`.
///
/// The path is percent-decoded first, then one leading `/` is dropped
/// because tree keys carry none. A path that does not decode to UTF-8 names
/// no asset.
pub fn resolve<'a>(tree: &'a AssetTree, path: &str) -> Resolution<'a> {
    if let Ok(decoded) = percent_decode_str(path).decode_utf8() {
        let key = decoded.strip_prefix('/').unwrap_or(&*decoded);
        if let Some(asset) = tree.get(key) {
            return Resolution::Asset(asset);
        }
    }

    match tree.get(ENTRY_DOCUMENT) {
        Some(entry) => Resolution::EntryDocument(entry),
        None => Resolution::NotFound,
    }
}

/// Catch-all handler for everything outside `/api`.
pub async fn serve_spa(
    State(assets): State<Arc<AssetTree>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }

    let response = match resolve(&assets, uri.path()) {
        Resolution::Asset(asset) => asset_response(asset, &headers),
        Resolution::EntryDocument(entry) => {
            tracing::trace!(path = %uri.path(), "Serving entry document");
            asset_response(entry, &headers)
        }
        Resolution::NotFound => (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
    };

    if method == Method::HEAD {
        let (parts, _) = response.into_parts();
        return Response::from_parts(parts, Body::empty());
    }
    response
}

fn asset_response(asset: &Asset, request_headers: &HeaderMap) -> Response {
    let last_modified = asset.modified().and_then(unix_seconds);

    if let (Some(modified), Some(since)) = (last_modified, if_modified_since(request_headers)) {
        if modified <= since {
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let mut response = asset.content().clone().into_response();
    let response_headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(asset.content_type()) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(value) = last_modified.and_then(http_date) {
        response_headers.insert(header::LAST_MODIFIED, value);
    }
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(asset.content().len()));
    response
}

fn unix_seconds(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(secs: i64) -> Option<HeaderValue> {
    let date = DateTime::<Utc>::from_timestamp(secs, 0)?;
    HeaderValue::from_str(&date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()).ok()
}

fn if_modified_since(headers: &HeaderMap) -> Option<i64> {
    let value = headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::Request, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    fn tree() -> AssetTree {
        AssetTree::from_entries([
            ("index.html", "<!doctype html><div id=root></div>"),
            ("assets/app.js", "console.log('app')"),
            ("assets/app.css", "body{}"),
            ("assets/my file.js", "console.log(1)"),
            ("assets/café.css", "p{}"),
        ])
    }

    fn app(tree: AssetTree) -> Router {
        Router::new()
            .fallback(serve_spa)
            .with_state(Arc::new(tree))
    }

    async fn get(app: Router, path: &str) -> Response {
        app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn resolve_prefers_exact_asset() {
        let tree = tree();
        assert!(matches!(resolve(&tree, "/assets/app.js"), Resolution::Asset(_)));
        assert!(matches!(resolve(&tree, "/dashboard"), Resolution::EntryDocument(_)));
        assert!(matches!(resolve(&tree, "/"), Resolution::EntryDocument(_)));
    }

    #[test]
    fn resolve_strips_a_single_slash() {
        let tree = tree();
        assert!(matches!(resolve(&tree, "assets/app.js"), Resolution::Asset(_)));
        assert!(matches!(resolve(&tree, "//assets/app.js"), Resolution::EntryDocument(_)));
    }

    #[test]
    fn resolve_decodes_percent_escapes() {
        let tree = tree();
        assert!(matches!(resolve(&tree, "/assets/my%20file.js"), Resolution::Asset(_)));
        assert!(matches!(resolve(&tree, "/assets/caf%C3%A9.css"), Resolution::Asset(_)));
        assert!(matches!(resolve(&tree, "/assets/app%2Ejs"), Resolution::Asset(_)));
        assert!(matches!(resolve(&tree, "/assets/%FF.js"), Resolution::EntryDocument(_)));
    }

    #[test]
    fn directory_paths_fall_back() {
        let tree = tree();
        assert!(matches!(resolve(&tree, "/assets"), Resolution::EntryDocument(_)));
        assert!(matches!(resolve(&tree, "/assets/"), Resolution::EntryDocument(_)));
    }

    #[test]
    fn missing_entry_document_is_not_found() {
        let tree = AssetTree::from_entries([("assets/app.js", "x")]);
        assert!(matches!(resolve(&tree, "/dashboard"), Resolution::NotFound));
        assert!(matches!(resolve(&tree, "/assets/app.js"), Resolution::Asset(_)));
    }

    #[tokio::test]
    async fn serves_existing_asset_unchanged() {
        let response = get(app(tree()), "/assets/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"), "{content_type}");
        assert_eq!(body(response).await, "console.log('app')");
    }

    #[tokio::test]
    async fn escaped_asset_name_is_served_with_its_type() {
        let response = get(app(tree()), "/assets/my%20file.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"), "{content_type}");
        assert_eq!(body(response).await, "console.log(1)");
    }

    #[tokio::test]
    async fn head_matches_get_without_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>home</html>").unwrap();
        let tree = AssetTree::load(dir.path()).unwrap();

        let get_response = get(app(tree.clone()), "/dashboard").await;
        let head_response = app(tree)
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(head_response.status(), StatusCode::OK);
        for name in [header::CONTENT_TYPE, header::CONTENT_LENGTH, header::LAST_MODIFIED] {
            assert_eq!(
                head_response.headers().get(&name),
                get_response.headers().get(&name),
                "{name}"
            );
        }
        assert_eq!(head_response.headers()[header::CONTENT_LENGTH], "17");
        assert!(head_response.headers().contains_key(header::LAST_MODIFIED));
        assert_eq!(body(head_response).await, "");
        assert_eq!(body(get_response).await, "<html>home</html>");
    }

    #[tokio::test]
    async fn client_route_gets_entry_document() {
        let response = get(app(tree()), "/dashboard/settings").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(body(response).await, "<!doctype html><div id=root></div>");
    }

    #[tokio::test]
    async fn unknown_path_without_entry_document_is_404() {
        let tree = AssetTree::from_entries([("assets/app.js", "x")]);
        let response = get(app(tree), "/dashboard").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let response = app(tree())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn last_modified_and_conditional_get() {
        let modified = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let asset = Asset::new("index.html", "home", Some(modified));
        let response = asset_response(&asset, &HeaderMap::new());
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"),
        );
        assert_eq!(asset_response(&asset, &headers).status(), StatusCode::NOT_MODIFIED);

        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_static("Sat, 05 Nov 1994 08:49:37 GMT"),
        );
        assert_eq!(asset_response(&asset, &headers).status(), StatusCode::OK);
    }
}
