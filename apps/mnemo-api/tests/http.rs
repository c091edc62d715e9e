use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use mnemo_api::{
	routes::{self, HEADER_API_KEY},
	state::AppState,
};
use mnemo_service::MnemoService;
use mnemo_testkit::TestDatabase;

const API_KEY: &str = "test-key";

async fn test_app(api_key: Option<&str>) -> (Router, TestDatabase) {
	let test_db = TestDatabase::new().expect("Failed to create test database.");
	let service = MnemoService::open(test_db.config()).await.expect("Failed to open service.");
	let state = AppState::from_service(Arc::new(service), api_key.map(Arc::from));

	(routes::router(state), test_db)
}

async fn call(
	app: &Router,
	method: &str,
	uri: &str,
	payload: Option<Value>,
) -> (StatusCode, Value) {
	let builder = Request::builder().method(method).uri(uri).header(HEADER_API_KEY, API_KEY);
	let request = match payload {
		Some(payload) => builder
			.header("content-type", "application/json")
			.body(Body::from(payload.to_string())),
		None => builder.body(Body::empty()),
	}
	.expect("Failed to build request.");
	let response = app.clone().oneshot(request).await.expect("Failed to call route.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

#[tokio::test]
async fn health_needs_no_key() {
	let (app, _test_db) = test_app(Some(API_KEY)).await;
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn memory_routes_require_api_key() {
	let (app, _test_db) = test_app(Some(API_KEY)).await;
	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/v1/memory/tags")
				.header(HEADER_API_KEY, "wrong")
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("Failed to call /v1/memory/tags.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	for presented in ["test-ke", "test-key2", ""] {
		let response = app
			.clone()
			.oneshot(
				Request::builder()
					.uri("/v1/memory/tags")
					.header(HEADER_API_KEY, presented)
					.body(Body::empty())
					.expect("request"),
			)
			.await
			.expect("Failed to call /v1/memory/tags.");

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "accepted {presented:?}");
	}

	let (status, json) = call(&app, "GET", "/v1/memory/tags", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["tags"], serde_json::json!([]));
}

#[tokio::test]
async fn keyless_state_leaves_routes_open() {
	let (app, _test_db) = test_app(None).await;
	let response = app
		.oneshot(Request::builder().uri("/v1/memory/list").body(Body::empty()).expect("request"))
		.await
		.expect("Failed to call /v1/memory/list.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn save_list_update_delete_over_http() {
	let (app, _test_db) = test_app(Some(API_KEY)).await;
	let (status, saved) = call(
		&app,
		"POST",
		"/v1/memory/save",
		Some(serde_json::json!({
			"text": "Fixed the auth bug by switching to OAuth2",
			"project": "api",
			"type": "fix",
			"tags": ["Auth", "bug"],
		})),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(saved["type"], "fix");
	assert_eq!(saved["tags"], serde_json::json!(["auth", "bug"]));

	let id = saved["id"].as_i64().expect("Saved id.");
	let (status, listed) =
		call(&app, "GET", "/v1/memory/list?project=api&tag=bug&limit=5", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(listed["count"], 1);
	assert_eq!(listed["items"][0]["id"], id);
	assert!(listed["items"][0]["created_at"]["iso"].is_string());

	let (status, searched) = call(
		&app,
		"POST",
		"/v1/memory/search",
		Some(serde_json::json!({ "query": "oauth2", "mode": "fts" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(searched["label"], "Keyword");
	assert_eq!(searched["items"][0]["id"], id);

	let (status, updated) = call(
		&app,
		"POST",
		"/v1/memory/update",
		Some(serde_json::json!({ "id": id, "text": "Switched to OAuth2 with PKCE" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert!(updated["updated_at"]["epoch_ms"].is_i64());

	let (status, fetched) =
		call(&app, "POST", "/v1/memory/get", Some(serde_json::json!({ "ids": [id] }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(fetched["items"][0]["content"], "Switched to OAuth2 with PKCE");

	let (status, deleted) =
		call(&app, "POST", "/v1/memory/delete", Some(serde_json::json!({ "ids": [id] }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(deleted["deleted"], 1);
}

#[tokio::test]
async fn service_errors_map_to_status_codes() {
	let (app, _test_db) = test_app(Some(API_KEY)).await;
	let (status, json) =
		call(&app, "POST", "/v1/memory/save", Some(serde_json::json!({ "text": "  " }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert_eq!(json["fields"], serde_json::json!(["text"]));

	let (status, json) =
		call(&app, "POST", "/v1/memory/update", Some(serde_json::json!({ "id": 7 }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "NO_UPDATES");
	assert!(json.get("fields").is_none());

	let (status, json) = call(
		&app,
		"POST",
		"/v1/memory/update",
		Some(serde_json::json!({ "id": 7, "title": "x" })),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");

	let (status, json) =
		call(&app, "POST", "/v1/memory/delete", Some(serde_json::json!({ "ids": [7] }))).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_json_is_an_invalid_request() {
	let (app, _test_db) = test_app(Some(API_KEY)).await;
	let (status, json) =
		call(&app, "POST", "/v1/memory/get", Some(serde_json::json!({ "ids": "1" }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}
