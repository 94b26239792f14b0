// SPDX-License-Identifier: MIT

//! HTTP adapter exposing processes, collections, process graphs and jobs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::DriverError;
use crate::openeo::collections::CollectionCatalog;
use crate::openeo::graph::ProcessGraph;
use crate::openeo::graphs::GraphService;
use crate::openeo::jobs::{JobManager, JobRequest};

/// Shared services behind the routes
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobManager>,
    pub collections: Arc<CollectionCatalog>,
    pub graphs: Arc<GraphService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/processes", get(list_processes))
        .route("/processes/{id}", get(get_process))
        .route("/collections", get(list_collections))
        .route("/process_graphs", get(list_graphs))
        .route(
            "/process_graphs/{id}",
            get(get_graph).put(put_graph).delete(delete_graph),
        )
        .route(
            "/jobs",
            get(list_jobs).post(create_job).delete(delete_all_jobs),
        )
        .route(
            "/jobs/{id}",
            get(get_job).patch(patch_job).delete(delete_job),
        )
        .route("/jobs/{id}/results", get(job_results).post(start_job))
        .route("/preview", post(preview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> crate::error::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error response carrying a [`DriverError`]
pub struct ApiError(DriverError);

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DriverError::NotFound(_) => StatusCode::NOT_FOUND,
            DriverError::Engine { .. } | DriverError::Transport(_) => StatusCode::BAD_GATEWAY,
            DriverError::TransportTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DriverError::Config(_) | DriverError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("Request failed: {}", self.0);
        }
        let body = json!({
            "id": Uuid::new_v4().to_string(),
            "code": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_processes(State(state): State<AppState>) -> Json<Value> {
    let processes = state.jobs.registry().descriptions();
    Json(json!({ "processes": processes, "links": [] }))
}

async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let description = state.jobs.registry().describe(&id).map_err(|e| match e {
        DriverError::UnknownProcess(id) => DriverError::NotFound(format!("Process {}", id)),
        other => other,
    })?;
    Ok(Json(json!(description)))
}

#[derive(Deserialize)]
struct CollectionsQuery {
    cache: Option<bool>,
}

async fn list_collections(
    State(state): State<AppState>,
    Query(query): Query<CollectionsQuery>,
) -> ApiResult<Json<Value>> {
    let collections = if query.cache == Some(false) {
        state.collections.refresh().await?
    } else {
        state.collections.list().await?
    };
    Ok(Json(json!({ "collections": collections.as_slice(), "links": [] })))
}

async fn list_graphs(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let graphs = state.graphs.list().await?;
    Ok(Json(json!({ "process_graphs": graphs, "links": [] })))
}

async fn get_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProcessGraph>> {
    Ok(Json(state.graphs.get(&id).await?))
}

async fn put_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(graph): Json<ProcessGraph>,
) -> ApiResult<Json<ProcessGraph>> {
    Ok(Json(state.graphs.put(&id, graph).await?))
}

async fn delete_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.graphs.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let jobs = state.jobs.list().await?;
    Ok(Json(json!({ "jobs": jobs, "links": [] })))
}

async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job = state.jobs.create(request).await?;
    Ok((StatusCode::CREATED, Json(json!(job))))
}

async fn delete_all_jobs(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let deleted = state.jobs.delete_all().await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    Ok(Json(json!(state.jobs.get(&id).await?)))
}

async fn patch_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<JobRequest>,
) -> ApiResult<Json<Value>> {
    Ok(Json(json!(state.jobs.patch(&id, request).await?)))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.jobs.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job = state.jobs.start(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(json!(job))))
}

async fn job_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let job = state.jobs.poll(&id).await?;
    Ok(Json(json!({
        "id": job.id,
        "status": job.status,
        "message": job.message,
        "links": job.results.iter().map(|href| json!({ "href": href })).collect::<Vec<_>>(),
    })))
}

#[derive(Deserialize)]
struct PreviewRequest {
    process: ProcessGraph,
}

async fn preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<Value>> {
    let compilation = state.jobs.compile(&request.process)?;
    let location = compilation.location();
    let output_names = compilation.output_names.clone();
    Ok(Json(json!({
        "output_names": output_names,
        "location": location,
        "process_chain": compilation.into_chain(),
    })))
}
