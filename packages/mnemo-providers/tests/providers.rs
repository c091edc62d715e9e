use std::future::IntoFuture;

use axum::{
	Json, Router,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	routing,
};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use mnemo_config::EmbeddingProviderConfig;

async fn start_embed_server() -> (String, Sender<()>) {
	let app = Router::new()
		.route("/v1/embeddings", routing::post(embed_handler))
		.route("/broken/embeddings", routing::post(|| async { StatusCode::BAD_GATEWAY }));
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind embed server.");
	let addr = listener.local_addr().expect("Failed to read embed server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn embed_handler(headers: HeaderMap, Json(payload): Json<Value>) -> impl IntoResponse {
	if headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) != Some("Bearer secret") {
		return StatusCode::UNAUTHORIZED.into_response();
	}

	let inputs =
		payload.get("input").and_then(|value| value.as_array()).cloned().unwrap_or_default();
	let dimensions = payload.get("dimensions").and_then(Value::as_u64).unwrap_or(2) as usize;
	// Reverse order exercises index-based reassembly.
	let data: Vec<_> = inputs
		.iter()
		.enumerate()
		.rev()
		.map(|(index, _)| {
			serde_json::json!({
				"index": index,
				"embedding": vec![index as f32; dimensions],
			})
		})
		.collect();

	(StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
}

fn provider_config(api_base: &str, path: &str) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base: api_base.to_string(),
		api_key: Some("secret".to_string()),
		path: path.to_string(),
		model: "test-embed".to_string(),
		dimensions: Some(3),
		timeout_ms: 5_000,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers = mnemo_providers::auth_headers(Some("secret"), &Map::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn omits_auth_header_without_key() {
	let mut extra = Map::new();

	extra.insert("X-Trace".to_string(), Value::String("on".to_string()));

	let headers = mnemo_providers::auth_headers(None, &extra).expect("Failed to build headers.");

	assert!(headers.get(AUTHORIZATION).is_none());
	assert_eq!(headers.get("x-trace").expect("Missing extra header."), "on");
}

#[test]
fn rejects_non_string_default_header() {
	let mut extra = Map::new();

	extra.insert("X-Count".to_string(), Value::from(3));

	let err = mnemo_providers::auth_headers(None, &extra).expect_err("Expected header error.");

	assert!(err.to_string().contains("X-Count"), "Unexpected error: {err}");
}

#[tokio::test]
async fn embeds_inputs_in_request_order() {
	let (api_base, shutdown) = start_embed_server().await;
	let cfg = provider_config(&api_base, "/v1/embeddings");
	let texts = vec!["first".to_string(), "second".to_string()];
	let vectors =
		mnemo_providers::embedding::embed(&cfg, &texts).await.expect("Failed to embed texts.");

	let _ = shutdown.send(());

	assert_eq!(vectors, vec![vec![0.0; 3], vec![1.0; 3]]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
	let (api_base, shutdown) = start_embed_server().await;
	let cfg = provider_config(&api_base, "/broken/embeddings");
	let result = mnemo_providers::embedding::embed(&cfg, &["x".to_string()]).await;

	let _ = shutdown.send(());

	assert!(matches!(result, Err(mnemo_providers::Error::Reqwest(_))), "Unexpected: {result:?}");
}
