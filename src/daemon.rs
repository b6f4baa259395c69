use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::error::{PlannerError, Result};
use crate::planning::{NewPlan, PlanStore};
use crate::tasks::{self, NewTask, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub plans: Arc<PlanStore>,
    pub tasks: Arc<TaskStore>,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Opens the database named in `config` and shares one pool between both stores.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::open_pool(&config.db_path).await?;
        Ok(Self {
            plans: Arc::new(PlanStore::new(pool.clone())),
            tasks: Arc::new(TaskStore::new(pool)),
            static_dir: PathBuf::from(&config.static_dir),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPlanRequest {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<AddPlanRequest> for NewPlan {
    fn from(request: AddPlanRequest) -> Self {
        NewPlan {
            title: request.title,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub name: Option<String>,
    pub due_date: Option<String>,
    pub plan_id: Option<i64>,
    pub description: Option<String>,
    pub date_added: Option<String>,
}

impl AddTaskRequest {
    pub fn validate(self) -> Result<NewTask> {
        let (Some(name), Some(due_date), Some(plan_id)) = (self.name, self.due_date, self.plan_id)
        else {
            return Err(PlannerError::Validation(
                r#"Invalid input: "name", "due_date", and "plan_id" are required"#.to_string(),
            ));
        };
        Ok(NewTask {
            name,
            description: self.description.unwrap_or_default(),
            date_added: self.date_added.unwrap_or_else(tasks::now_iso),
            due_date,
            plan_id,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let index = ServeFile::new(state.static_dir.join("index.html"));
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route_service("/", index)
        .nest_service("/static", assets)
        .route("/health", get(health))
        .route("/api/plans", get(list_plans).post(add_plan))
        .route("/api/plans/{id}/done", put(mark_plan_done))
        .route("/api/done-plans", get(list_done_plans))
        .route("/api/cleanup", post(cleanup_old_done_plans))
        .route("/api/tasks", post(add_task))
        .route("/api/tasks/{id}", get(list_tasks))
        .route("/api/tasks/{id}/done", put(mark_task_done))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn add_plan(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddPlanRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request("add_plan", rejection),
    };

    match state.plans.create_plan(&request.into()).await {
        Ok(()) => message(StatusCode::CREATED, "Plan added successfully!"),
        Err(err) => failure("add_plan", err),
    }
}

async fn list_plans(State(state): State<AppState>) -> Response {
    match state.plans.list_plans().await {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => failure("list_plans", err),
    }
}

async fn list_done_plans(State(state): State<AppState>) -> Response {
    match state
        .plans
        .list_recent_completed(Local::now().naive_local())
        .await
    {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => failure("list_done_plans", err),
    }
}

async fn cleanup_old_done_plans(State(state): State<AppState>) -> Response {
    match state
        .plans
        .cleanup_completed(Local::now().naive_local())
        .await
    {
        Ok(deleted) => {
            tracing::info!(deleted, "cleanup removed old completed plans");
            message(StatusCode::OK, "Old completed plans removed.")
        }
        Err(err) => failure("cleanup_old_done_plans", err),
    }
}

async fn mark_plan_done(
    State(state): State<AppState>,
    plan_id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let plan_id = match path_id("mark_plan_done", plan_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.plans.mark_done(plan_id).await {
        Ok(true) => {
            tracing::info!(plan_id, "plan marked as done");
            message(StatusCode::OK, "Plan marked as done")
        }
        Ok(false) => {
            tracing::warn!(plan_id, "mark_plan_done rejected: plan not found");
            message(StatusCode::NOT_FOUND, "Plan not found")
        }
        Err(err) => failure("mark_plan_done", err),
    }
}

async fn add_task(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddTaskRequest>, JsonRejection>,
) -> Response {
    let new = match payload {
        Ok(Json(request)) => request.validate(),
        Err(rejection) => return bad_request("add_task", rejection),
    };
    let new = match new {
        Ok(new) => new,
        Err(err) => return failure("add_task", err),
    };

    match state.tasks.create_task(&new).await {
        Ok(()) => message(StatusCode::CREATED, "Task added successfully!"),
        Err(err) => failure("add_task", err),
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    plan_id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let plan_id = match path_id("list_tasks", plan_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.tasks.list_for_plan(plan_id).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(err) => failure("list_tasks", err),
    }
}

async fn mark_task_done(
    State(state): State<AppState>,
    task_id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let task_id = match path_id("mark_task_done", task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.tasks.mark_done(task_id).await {
        Ok(true) => {
            tracing::info!(task_id, "task marked as done");
            message(StatusCode::OK, "Task marked as done!")
        }
        Ok(false) => failure(
            "mark_task_done",
            PlannerError::NotFound("Task not found".to_string()),
        ),
        Err(err) => failure("mark_task_done", err),
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: text.to_string(),
        }),
    )
        .into_response()
}

/// Ids that are not 64-bit integers name no row, so they are reported as 404.
fn path_id(
    operation: &str,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> std::result::Result<i64, Response> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => Err(failure(
            operation,
            PlannerError::NotFound(rejection.body_text()),
        )),
    }
}

fn bad_request(operation: &str, rejection: JsonRejection) -> Response {
    failure(operation, PlannerError::Validation(rejection.body_text()))
}

fn failure(operation: &str, err: PlannerError) -> Response {
    let status = match &err {
        PlannerError::Validation(_) => StatusCode::BAD_REQUEST,
        PlannerError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("{} failed: {}", operation, err);
    } else {
        tracing::warn!("{} rejected: {}", operation, err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub async fn run_with_shutdown<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let state = AppState::open(config).await?;
    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PlannerError::Runtime(e.to_string()))?;
    tracing::info!(
        addr = %addr,
        db_path = %config.db_path,
        static_dir = %config.static_dir,
        "taskplanner daemon listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PlannerError::Runtime(e.to_string()))?;

    tracing::info!("taskplanner daemon stopped");
    Ok(())
}
