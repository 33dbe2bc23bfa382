//! HTTP routing for the comments endpoint.
//!
//! The lookup key is the `search` query parameter when present, otherwise
//! the request path with a trailing `comments.json` dropped.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Response},
    routing::get,
};
use fedicomments_core::{Aggregator, strip_marker};
use serde::Deserialize;

use crate::error::WebError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

/// Build the application router.
pub fn build_router(aggregator: Aggregator) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/", get(root_comments))
        .route("/{*path}", get(path_comments))
        .with_state(AppState { aggregator })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    search: Option<String>,
}

impl SearchQuery {
    /// The explicit search term, or `path` when none was given.
    fn key_or(self, path: String) -> String {
        self.search.filter(|s| !s.is_empty()).unwrap_or(path)
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn root_comments(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Result<Response, WebError> {
    respond(&state, &query.key_or("/".to_string())).await
}

async fn path_comments(
    State(state): State<AppState>, Path(path): Path<String>, Query(query): Query<SearchQuery>,
) -> Result<Response, WebError> {
    let path = format!("/{path}");
    respond(&state, &query.key_or(strip_marker(&path).to_string())).await
}

async fn respond(state: &AppState, key: &str) -> Result<Response, WebError> {
    let result = state.aggregator.get_result(key).await?;
    let lifetime = result.cache_lifetime();

    Ok(([(CACHE_CONTROL, lifetime.header_value())], Json(result)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use fedicomments_core::{Account, RemoteApi, RemoteError, RootCache, SearchResults, Status};
    use http_body_util::BodyExt;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    };
    use tower::ServiceExt;

    /// Remote API that records searched queries.
    #[derive(Default)]
    struct StubRemote {
        searched: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    fn status(id: &str, reply_to: Option<&str>) -> Status {
        Status {
            id: id.to_string(),
            created_at: "2024-03-01T12:00:00Z".parse().unwrap(),
            in_reply_to_id: reply_to.map(str::to_string),
            uri: format!("https://social.example/statuses/{id}"),
            url: Some(format!("https://social.example/@alice/{id}")),
            content: "<p>hi</p>".to_string(),
            replies_count: 9,
            reblogs_count: 1,
            favourites_count: 2,
            account: Account {
                id: "7".into(),
                username: "alice".into(),
                display_name: "Alice".into(),
                url: "https://social.example/@alice".into(),
                avatar_static: "https://social.example/a.png".into(),
            },
        }
    }

    #[async_trait::async_trait]
    impl RemoteApi for StubRemote {
        async fn search(&self, query: &str) -> Result<SearchResults, RemoteError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RemoteError::new("network error"));
            }
            self.searched.lock().unwrap().push(query.to_string());
            let statuses = if query.contains("unposted") { vec![] } else { vec![status("1", None)] };
            Ok(SearchResults { statuses })
        }

        async fn fetch_status(&self, id: &str) -> Result<Status, RemoteError> {
            Ok(status(id, None))
        }

        async fn fetch_descendants(&self, id: &str) -> Result<Vec<Status>, RemoteError> {
            Ok(vec![status("2", Some(id)), status("3", Some("2"))])
        }
    }

    fn app() -> (tempfile::TempDir, Arc<StubRemote>, Router) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(RootCache::new(dir.path().join("roots.json")));
        let remote = Arc::new(StubRemote::default());
        let aggregator = Aggregator::new(cache, remote.clone(), None);
        (dir, remote, build_router(aggregator))
    }

    async fn fetch(router: &Router, uri: &str) -> (StatusCode, Option<String>, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, cache_control, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_path_lookup_assembles_thread() {
        let (_dir, remote, router) = app();

        let (status, cache_control, body) = fetch(&router, "/blog/hello/comments.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("max-age=600"));
        assert_eq!(body["stats"]["replies"], 2);
        assert_eq!(body["stats"]["root"], "1");
        assert_eq!(body["comments"]["3"]["reply_to"], "2");
        assert_eq!(body["comments"]["2"]["author"]["display_name"], "Alice");
        assert_eq!(*remote.searched.lock().unwrap(), vec!["/blog/hello".to_string()]);
    }

    #[tokio::test]
    async fn test_search_parameter_wins_over_path() {
        let (_dir, remote, router) = app();

        let (status, _, _) = fetch(&router, "/ignored/comments.json?search=/blog/other/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*remote.searched.lock().unwrap(), vec!["/blog/other".to_string()]);
    }

    #[tokio::test]
    async fn test_search_parameter_keeps_marker() {
        let (_dir, remote, router) = app();

        let (status, _, _) = fetch(&router, "/x?search=/docs/comments.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*remote.searched.lock().unwrap(), vec!["/docs/comments.json".to_string()]);
    }

    #[tokio::test]
    async fn test_root_path_lookup() {
        let (_dir, remote, router) = app();

        let (status, _, _) = fetch(&router, "/comments.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*remote.searched.lock().unwrap(), vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn test_no_root_has_short_lifetime() {
        let (_dir, _remote, router) = app();

        let (status, cache_control, body) = fetch(&router, "/unposted/comments.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(body["comments"], serde_json::json!({}));
        assert_eq!(body["stats"]["replies"], 0);
        assert_eq!(body["stats"]["root"], "");
    }

    #[tokio::test]
    async fn test_remote_failure_is_500() {
        let (_dir, remote, router) = app();
        remote.fail.store(true, Ordering::SeqCst);

        let (status, cache_control, body) = fetch(&router, "/blog/hello/comments.json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(cache_control.is_none());
        assert_eq!(body["error"], "try again later");
    }

    #[tokio::test]
    async fn test_json_content_type() {
        let (_dir, _remote, router) = app();
        let request = Request::builder().uri("/blog/hello/comments.json").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, _remote, router) = app();
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
