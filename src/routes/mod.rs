//! Router assembly.

pub mod common;
pub mod table;

pub use common::common_routes;
pub use table::table_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Full application: common routes plus one GET route per allow-listed table.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(table_routes(state))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::ExecutionError;
    use crate::sql::{BindValue, StatementSet};
    use crate::store::tests::cars_store;
    use crate::store::{Record, SnapshotRows, Store};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn settings() -> Settings {
        Settings {
            tables: vec!["cars".into()],
            ..Settings::default()
        }
    }

    async fn cars_app() -> Router {
        let state = AppState::new(Arc::new(cars_store().await), &settings()).unwrap();
        app(state)
    }

    fn encode(s: &str) -> String {
        s.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
                _ => format!("%{:02X}", b),
            })
            .collect()
    }

    fn uri(path: &str, pairs: &[(&str, &str)]) -> String {
        let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", encode(k), encode(v))).collect();
        format!("{}?{}", path, query.join("&"))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn filtered_sorted_page() {
        let (status, body) = get(
            cars_app().await,
            &uri(
                "/cars",
                &[
                    ("fields[0][name]", "topSpeed"),
                    ("filters[0][name]", "topSpeed"),
                    ("filters[0][operation]", ">"),
                    ("filters[0][value]", "200"),
                    ("order[0][name]", "topSpeed"),
                    ("order[0][direction]", "desc"),
                    ("limit", "2"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"data": [{"topSpeed": 340}, {"topSpeed": 310}], "count": 5, "filteredCount": 3})
        );
    }

    #[tokio::test]
    async fn bare_request_returns_everything() {
        let (status, body) = get(cars_app().await, "/cars").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(5));
        assert_eq!(body["filteredCount"], json!(5));
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert!(body["data"][0].get("modelYear").is_some());
    }

    #[tokio::test]
    async fn json_encoded_filters() {
        let (status, body) = get(
            cars_app().await,
            &uri("/cars", &[("filters", r#"[{"name":"make","operation":"like","value":"F%"}]"#)]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filteredCount"], json!(3));
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let (status, body) = get(cars_app().await, "/planes").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], json!("not_found"));
    }

    #[tokio::test]
    async fn rejected_operator_reports_rule() {
        let (status, body) = get(
            cars_app().await,
            &uri(
                "/cars",
                &[
                    ("filters[0][name]", "make"),
                    ("filters[0][operation]", "; DROP TABLE"),
                    ("filters[0][value]", "x"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("invalid_operator"));
    }

    #[tokio::test]
    async fn store_failure_hides_detail() {
        let (status, body) = get(cars_app().await, &uri("/cars", &[("fields[0][name]", "wheelCount")])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], json!("execution_error"));
        assert_eq!(body["error"]["message"], json!("query execution failed"));
    }

    /// Counts every store call.
    #[derive(Default)]
    struct CountingStore {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Store for CountingStore {
        async fn run_query(&self, _sql: &str, _params: &[BindValue]) -> Result<Vec<Record>, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn run_scalar_query(&self, _sql: &str, _params: &[BindValue]) -> Result<Record, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut r = Record::new();
            r.insert("count".into(), json!(0));
            Ok(r)
        }

        async fn run_snapshot(&self, _statements: &StatementSet) -> Result<SnapshotRows, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ExecutionError::MissingCount(String::new()))
        }
    }

    #[tokio::test]
    async fn invalid_limit_never_reaches_store() {
        let store = CountingStore::default();
        let calls = store.calls.clone();
        let state = AppState::new(Arc::new(store), &settings()).unwrap();
        let (status, body) = get(app(state), "/cars?limit=-5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("invalid_limit"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn health_and_readiness() {
        let (status, body) = get(cars_app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
        let (status, body) = get(cars_app().await, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], json!("ok"));
    }
}
