pub mod error;
pub mod jobs;
pub mod scheduler;

use crate::core::config::{QueryConfig, ServiceConfig};
use crate::core::connectors::CsvConnector;
use crate::core::dataset::{Record, SchemaInfo};
use crate::core::store::DatasetStore;
use crate::query::Filter;
use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use error::{ApiError, ErrorResponse};
use jobs::{Job, JobRegistry};
use scheduler::JobScheduler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::OpenApi;

pub const SERVICE_NAME: &str = "Nigeria Health Data Analysis API";
pub const SEX_COLUMN: &str = "SEX (DISPLAY)";
pub const YEAR_COLUMN: &str = "YEAR (DISPLAY)";

/// Everything a request handler can reach. Built once at startup.
pub struct AppState {
    pub store: Arc<DatasetStore>,
    pub registry: Arc<JobRegistry>,
    pub scheduler: JobScheduler,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let store = Arc::new(DatasetStore::new(config.dataset.sample_rows));
        let registry = Arc::new(JobRegistry::new());
        let scheduler = JobScheduler::new(store.clone(), registry.clone(), config.summary);
        Self {
            store,
            registry,
            scheduler,
            config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: Vec<Record>,
    pub count: usize,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct SexParams {
    /// Sex filter (Male, Female, Both sexes)
    sex: String,
    /// Maximum records to return (1..=1000)
    limit: Option<i64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct YearParams {
    /// Year to filter by
    year: String,
    /// Maximum records to return (1..=1000)
    limit: Option<i64>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        upload_dataset,
        get_dataset_schema,
        query_by_sex,
        query_by_year,
        create_summary_job,
        get_job_status
    ),
    components(schemas(UploadResponse, ErrorResponse)),
    tags(
        (name = "health-data", description = "Asynchronous API for analyzing public health indicators")
    )
)]
struct ApiDoc;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    let api = Router::new()
        .route("/upload", post(upload_dataset))
        .route("/schema", get(get_dataset_schema))
        .route("/query/sex", get(query_by_sex))
        .route("/query/year", get(query_by_year))
        .route("/summarize", post(create_summary_job))
        .route("/jobs/:job_id", get(get_job_status));

    Router::new()
        .route("/", get(root))
        .route("/openapi.json", get(openapi_json))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C / SIGTERM.
pub async fn start_server(config: ServiceConfig) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, starting graceful shutdown");
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service liveness message"))
)]
async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": SERVICE_NAME })),
    )
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "health-data",
    responses(
        (status = 200, description = "Dataset loaded", body = UploadResponse),
        (status = 400, description = "Not a CSV upload", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Payload could not be parsed", body = ErrorResponse)
    )
)]
async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !CsvConnector::new().can_handle(&filename) {
            return Err(ApiError::BadRequest("Only CSV files are allowed".to_string()));
        }
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' form field".to_string()))?;

    // Parsing can take a while on large files; keep it off the request workers.
    let store = state.store.clone();
    let (rows, columns) = tokio::task::spawn_blocking(move || store.load(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?;

    tracing::info!(%filename, rows, columns, "upload accepted");
    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
        rows,
        columns,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/schema",
    tag = "health-data",
    responses(
        (status = 200, description = "Columns, dtypes, shape and sample rows"),
        (status = 400, description = "No dataset loaded", body = ErrorResponse)
    )
)]
async fn get_dataset_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaInfo>, ApiError> {
    Ok(Json(state.store.schema()?))
}

#[utoipa::path(
    get,
    path = "/api/v1/query/sex",
    tag = "health-data",
    params(SexParams),
    responses(
        (status = 200, description = "Matching rows and their count"),
        (status = 400, description = "No dataset loaded", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse)
    )
)]
async fn query_by_sex(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SexParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let limit = validate_limit(params.limit, &state.config.query)?;
    run_query(&state, Filter::new(SEX_COLUMN, params.sex), limit).await
}

#[utoipa::path(
    get,
    path = "/api/v1/query/year",
    tag = "health-data",
    params(YearParams),
    responses(
        (status = 200, description = "Matching rows and their count"),
        (status = 400, description = "No dataset loaded", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse)
    )
)]
async fn query_by_year(
    State(state): State<Arc<AppState>>,
    params: Result<Query<YearParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let limit = validate_limit(params.limit, &state.config.query)?;
    run_query(&state, Filter::new(YEAR_COLUMN, params.year), limit).await
}

fn validate_limit(limit: Option<i64>, config: &QueryConfig) -> Result<usize, ApiError> {
    let Some(limit) = limit else {
        return Ok(config.default_limit);
    };
    match usize::try_from(limit) {
        Ok(n) if (1..=config.max_limit).contains(&n) => Ok(n),
        _ => Err(ApiError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            config.max_limit, limit
        ))),
    }
}

async fn run_query(
    state: &AppState,
    filter: Filter,
    limit: usize,
) -> Result<Json<QueryResponse>, ApiError> {
    let store = state.store.clone();
    let data = tokio::task::spawn_blocking(move || store.query(&[filter], limit))
        .await
        .map_err(|e| ApiError::Internal(format!("Query failed: {}", e)))??;
    let count = data.len();
    Ok(Json(QueryResponse { data, count }))
}

#[utoipa::path(
    post,
    path = "/api/v1/summarize",
    tag = "health-data",
    responses(
        (status = 200, description = "Job created; poll /api/v1/jobs/{job_id}"),
        (status = 500, description = "Job could not be created", body = ErrorResponse)
    )
)]
async fn create_summary_job(State(state): State<Arc<AppState>>) -> Result<Json<Job>, ApiError> {
    let job = state.scheduler.create_summary_job().map_err(|e| {
        tracing::error!(error = %e, "job creation failed");
        ApiError::Internal("Failed to create job".to_string())
    })?;
    tracing::info!(job_id = %job.id, "summary job created");
    Ok(Json(job))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{job_id}",
    tag = "health-data",
    params(("job_id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Current job record"),
        (status = 404, description = "Unknown job", body = ErrorResponse)
    )
)]
async fn get_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.registry.get(&job_id)?))
}
