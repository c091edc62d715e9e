use std::{net::SocketAddr, sync::Arc};

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request, StatusCode},
	middleware::{self, Next},
	response::IntoResponse,
};
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler, ServiceExt,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::McpAuthState;
use mnemo_service::{
	DeleteRequest, GetRequest, ListRequest, MnemoService, SaveRequest, SearchRequest, TagsRequest,
	UpdateRequest,
};

const HEADER_AUTHORIZATION: &str = "Authorization";

#[derive(Clone)]
pub struct MnemoMcp {
	service: Arc<MnemoService>,
	tool_router: ToolRouter<Self>,
}
impl MnemoMcp {
	pub fn new(service: Arc<MnemoService>) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}
}

#[rmcp::tool_router]
impl MnemoMcp {
	#[rmcp::tool(
		name = "mem_save",
		description = "Save a memory. The title defaults to the first 80 characters of the text.",
		input_schema = save_schema()
	)]
	async fn mem_save(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: SaveRequest = parse_params(params)?;

		tool_result(self.service.save(req).await)
	}

	#[rmcp::tool(
		name = "mem_search",
		description = "Search memories by keyword and meaning. Without a query, lists the newest memories matching the filters.",
		input_schema = search_schema()
	)]
	async fn mem_search(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: SearchRequest = parse_params(params)?;

		tool_result(self.service.search(req).await)
	}

	#[rmcp::tool(
		name = "mem_get",
		description = "Fetch full memories, including content, by id.",
		input_schema = get_schema()
	)]
	async fn mem_get(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: GetRequest = parse_params(params)?;

		tool_result(self.service.get(req).await)
	}

	#[rmcp::tool(
		name = "mem_list",
		description = "List the newest memories with optional project, type, and tag filters.",
		input_schema = list_schema()
	)]
	async fn mem_list(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: ListRequest = parse_params(params)?;

		tool_result(self.service.list(req).await)
	}

	#[rmcp::tool(
		name = "mem_update",
		description = "Update a memory by id. Only provided fields change; tags replace the existing set.",
		input_schema = update_schema()
	)]
	async fn mem_update(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: UpdateRequest = parse_params(params)?;

		tool_result(self.service.update(req).await)
	}

	#[rmcp::tool(
		name = "mem_delete",
		description = "Delete memories by id, together with their tags and embeddings.",
		input_schema = delete_schema()
	)]
	async fn mem_delete(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: DeleteRequest = parse_params(params)?;

		tool_result(self.service.delete(req).await)
	}

	#[rmcp::tool(
		name = "mem_tags",
		description = "List tags with the number of memories carrying each, most used first.",
		input_schema = tags_schema()
	)]
	async fn mem_tags(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req: TagsRequest = parse_params(params)?;

		tool_result(self.service.tags(req).await)
	}
}

#[rmcp::tool_handler]
impl ServerHandler for MnemoMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Persistent memory store. Save notes, then find them again with mem_search."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_stdio(service: Arc<MnemoService>) -> Result<()> {
	tracing::info!("MCP server listening on stdio.");

	let running = MnemoMcp::new(service).serve(rmcp::transport::stdio()).await?;

	running.waiting().await?;

	Ok(())
}

pub async fn serve_http(
	bind_addr: &str,
	auth_state: McpAuthState,
	service: Arc<MnemoService>,
) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let mcp_service = StreamableHttpService::new(
		move || Ok(MnemoMcp::new(service.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new()
		.fallback_service(mcp_service)
		.layer(middleware::from_fn_with_state(auth_state, mcp_auth_middleware));
	let listener = TcpListener::bind(bind_addr).await?;

	tracing::info!(%bind_addr, "MCP server listening.");

	axum::serve(listener, router).await?;

	Ok(())
}

/// Malformed parameters are protocol errors; missing required values are left to the service so
/// they come back as tool failures.
fn parse_params<T>(params: JsonObject) -> Result<T, ErrorData>
where
	T: DeserializeOwned,
{
	serde_json::from_value(Value::Object(params))
		.map_err(|err| ErrorData::invalid_params(format!("Invalid parameters: {err}"), None))
}

fn tool_result<T>(result: mnemo_service::Result<T>) -> Result<CallToolResult, ErrorData>
where
	T: Serialize,
{
	match result {
		Ok(response) => {
			let value = serde_json::to_value(response).map_err(|err| {
				ErrorData::internal_error(format!("Failed to encode tool result: {err}"), None)
			})?;

			Ok(CallToolResult::structured(value))
		},
		Err(err) => {
			tracing::debug!(error_code = err.code(), message = err.message(), "Tool call failed.");

			Ok(CallToolResult::structured_error(serde_json::json!({
				"error_code": err.code(),
				"message": err.message(),
			})))
		},
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn is_authorized(headers: &HeaderMap, auth_state: &McpAuthState) -> bool {
	match auth_state {
		McpAuthState::Off => true,
		McpAuthState::Bearer { token } => read_bearer_token(headers)
			.is_some_and(|presented| mnemo_cli::secret_matches(token, presented)),
	}
}

async fn mcp_auth_middleware(
	State(auth_state): State<McpAuthState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &auth_state) {
		return (StatusCode::UNAUTHORIZED, "A Bearer token matching security.api_key is required.")
			.into_response();
	}

	next.run(req).await
}

fn save_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["text"],
		"properties": {
			"text": { "type": "string" },
			"title": { "type": ["string", "null"] },
			"project": { "type": ["string", "null"] },
			"type": { "type": ["string", "null"] },
			"tags": { "type": "array", "items": { "type": "string" } }
		}
	}))
}

fn search_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"query": { "type": ["string", "null"] },
			"limit": { "type": ["integer", "null"], "minimum": 0 },
			"project": { "type": ["string", "null"] },
			"type": { "type": ["string", "null"] },
			"tag": { "type": ["string", "null"] },
			"mode": {
				"type": ["string", "null"],
				"description": "auto (default), keyword, fts, or vector."
			}
		}
	}))
}

fn get_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["ids"],
		"properties": {
			"ids": { "type": "array", "items": { "type": "integer" } }
		}
	}))
}

fn list_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"limit": { "type": ["integer", "null"], "minimum": 0 },
			"project": { "type": ["string", "null"] },
			"type": { "type": ["string", "null"] },
			"tag": { "type": ["string", "null"] }
		}
	}))
}

fn update_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["id"],
		"properties": {
			"id": { "type": "integer" },
			"text": { "type": ["string", "null"] },
			"title": { "type": ["string", "null"] },
			"type": { "type": ["string", "null"] },
			"project": { "type": ["string", "null"] },
			"tags": { "type": ["array", "null"], "items": { "type": "string" } }
		}
	}))
}

fn delete_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["ids"],
		"properties": {
			"ids": { "type": "array", "items": { "type": "integer" } }
		}
	}))
}

fn tags_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"project": { "type": ["string", "null"] }
		}
	}))
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use axum::http::HeaderMap;
	use rmcp::model::{CallToolResult, JsonObject};
	use serde_json::{Value, json};

	use crate::{McpAuthState, server::MnemoMcp};
	use mnemo_service::MnemoService;
	use mnemo_testkit::TestDatabase;

	fn params(value: Value) -> JsonObject {
		match value {
			Value::Object(map) => map,
			other => panic!("Expected a JSON object, got {other}."),
		}
	}

	fn structured(result: &CallToolResult) -> &Value {
		result.structured_content.as_ref().expect("Expected structured content.")
	}

	fn is_error(result: &CallToolResult) -> bool {
		result.is_error.unwrap_or(false)
	}

	async fn open_server() -> (MnemoMcp, TestDatabase) {
		let test_db = TestDatabase::new().expect("Failed to create test database.");
		let service = MnemoService::open(test_db.config()).await.expect("Failed to open service.");

		(MnemoMcp::new(Arc::new(service)), test_db)
	}

	#[test]
	fn registers_all_tools() {
		let tools = MnemoMcp::tool_router().list_all();
		let mut names: Vec<String> = tools.iter().map(|tool| tool.name.to_string()).collect();

		names.sort();

		assert_eq!(
			names,
			vec![
				"mem_delete",
				"mem_get",
				"mem_list",
				"mem_save",
				"mem_search",
				"mem_tags",
				"mem_update",
			]
		);
	}

	#[tokio::test]
	async fn save_search_delete_round_trip() {
		let (mcp, _test_db) = open_server().await;
		let saved = mcp
			.mem_save(params(json!({
				"text": "Fixed the auth bug by switching to OAuth2",
				"tags": ["auth", "bug"],
			})))
			.await
			.expect("mem_save");
		let id = structured(&saved)["id"].as_i64().expect("Saved id.");

		assert!(!is_error(&saved));
		assert_eq!(structured(&saved)["tags"], json!(["auth", "bug"]));

		let by_query =
			mcp.mem_search(params(json!({ "query": "OAuth2" }))).await.expect("mem_search");

		assert_eq!(structured(&by_query)["label"], json!("Keyword"));
		assert_eq!(structured(&by_query)["items"][0]["id"], json!(id));

		let by_tag = mcp.mem_search(params(json!({ "tag": "bug" }))).await.expect("mem_search");

		assert_eq!(structured(&by_tag)["items"][0]["id"], json!(id));

		let deleted = mcp.mem_delete(params(json!({ "ids": [id] }))).await.expect("mem_delete");

		assert_eq!(structured(&deleted)["deleted"], json!(1));

		let fetched = mcp.mem_get(params(json!({ "ids": [id] }))).await.expect("mem_get");

		assert_eq!(structured(&fetched)["items"], json!([]));

		let tags = mcp.mem_tags(JsonObject::new()).await.expect("mem_tags");

		assert_eq!(structured(&tags)["tags"], json!([]));
	}

	#[tokio::test]
	async fn service_errors_become_tool_failures() {
		let (mcp, _test_db) = open_server().await;
		let missing_text = mcp.mem_save(JsonObject::new()).await.expect("mem_save");

		assert!(is_error(&missing_text));
		assert_eq!(structured(&missing_text)["error_code"], json!("INVALID_REQUEST"));

		let nothing_deleted =
			mcp.mem_delete(params(json!({ "ids": [404] }))).await.expect("mem_delete");

		assert!(is_error(&nothing_deleted));
		assert_eq!(structured(&nothing_deleted)["error_code"], json!("NOT_FOUND"));

		let no_fields = mcp.mem_update(params(json!({ "id": 1 }))).await.expect("mem_update");

		assert_eq!(structured(&no_fields)["error_code"], json!("NO_UPDATES"));
	}

	#[tokio::test]
	async fn malformed_params_are_protocol_errors() {
		let (mcp, _test_db) = open_server().await;

		assert!(mcp.mem_get(params(json!({ "ids": "1,2" }))).await.is_err());
	}

	#[test]
	fn bearer_auth_requires_exact_token() {
		let auth_state = McpAuthState::Bearer { token: "token-a".to_string() };
		let mut headers = HeaderMap::new();

		assert!(!super::is_authorized(&headers, &auth_state));
		assert!(super::is_authorized(&headers, &McpAuthState::Off));

		headers
			.insert(super::HEADER_AUTHORIZATION, "Bearer token-a".parse().expect("valid header"));

		assert!(super::is_authorized(&headers, &auth_state));

		headers
			.insert(super::HEADER_AUTHORIZATION, "bearer token-a".parse().expect("valid header"));

		assert!(!super::is_authorized(&headers, &auth_state));

		for near_miss in ["Bearer token-", "Bearer token-ab"] {
			headers.insert(super::HEADER_AUTHORIZATION, near_miss.parse().expect("valid header"));

			assert!(!super::is_authorized(&headers, &auth_state), "accepted {near_miss}");
		}
	}
}
