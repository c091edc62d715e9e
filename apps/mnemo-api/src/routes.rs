use axum::{
	Json, Router,
	body::Body,
	extract::{Query, State, rejection::JsonRejection},
	http::{Request, StatusCode},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use mnemo_service::{
	DeleteRequest, DeleteResponse, Error as ServiceError, GetRequest, GetResponse, ListRequest,
	ListResponse, SaveRequest, SaveResponse, SearchRequest, SearchResponse, TagsRequest,
	TagsResponse, UpdateRequest, UpdateResponse,
};

pub const HEADER_API_KEY: &str = "X-API-Key";

pub fn router(state: AppState) -> Router {
	let memory = Router::new()
		.route("/v1/memory/save", post(save))
		.route("/v1/memory/search", post(search))
		.route("/v1/memory/get", post(get_memories))
		.route("/v1/memory/list", get(list))
		.route("/v1/memory/update", post(update))
		.route("/v1/memory/delete", post(delete))
		.route("/v1/memory/tags", get(tags))
		.route_layer(middleware::from_fn_with_state(state.clone(), api_key_middleware));

	Router::new().route("/health", get(health)).merge(memory).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn save(
	State(state): State<AppState>,
	payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
	let response = state.service.save(json_body(payload)?).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(json_body(payload)?).await?;

	Ok(Json(response))
}

async fn get_memories(
	State(state): State<AppState>,
	payload: Result<Json<GetRequest>, JsonRejection>,
) -> Result<Json<GetResponse>, ApiError> {
	let response = state.service.get(json_body(payload)?).await?;

	Ok(Json(response))
}

async fn list(
	State(state): State<AppState>,
	Query(query): Query<ListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
	let response = state.service.list(query).await?;

	Ok(Json(response))
}

async fn update(
	State(state): State<AppState>,
	payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
	let response = state.service.update(json_body(payload)?).await?;

	Ok(Json(response))
}

async fn delete(
	State(state): State<AppState>,
	payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete(json_body(payload)?).await?;

	Ok(Json(response))
}

async fn tags(
	State(state): State<AppState>,
	Query(query): Query<TagsRequest>,
) -> Result<Json<TagsResponse>, ApiError> {
	let response = state.service.tags(query).await?;

	Ok(Json(response))
}

async fn api_key_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> Response {
	if let Some(expected) = state.api_key.as_deref() {
		let provided = req.headers().get(HEADER_API_KEY).and_then(|value| value.to_str().ok());

		if !provided.is_some_and(|key| mnemo_cli::secret_matches(expected, key.trim())) {
			return json_error(
				StatusCode::UNAUTHORIZED,
				"UNAUTHORIZED",
				format!("A valid {HEADER_API_KEY} header is required."),
				None,
			)
			.into_response();
		}
	}

	next.run(req).await
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
	payload.map(|Json(body)| body).map_err(|rejection| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text(), None)
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match &err {
			ServiceError::InvalidRequest { .. } | ServiceError::NoUpdates { .. } =>
				StatusCode::BAD_REQUEST,
			ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
			ServiceError::Provider { .. } => StatusCode::SERVICE_UNAVAILABLE,
			ServiceError::Storage { .. } => {
				tracing::error!(error = %err, "Storage failure while serving request.");

				StatusCode::INTERNAL_SERVER_ERROR
			},
		};

		let fields = err.field().map(|field| vec![field.to_string()]);

		json_error(status, err.code(), err.message(), fields)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
