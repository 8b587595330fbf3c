use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{codes, ApiError},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, TaskFilter, TaskResponse, UpdateTaskRequest},
        repo::Task,
    },
    validation::{is_valid_description, parse_date, MAX_DESCRIPTION_LEN},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id", get(get_task))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/:id", axum::routing::patch(update_task).delete(delete_task))
}

/// Ownership check applied to every read, update and delete of a task.
fn ensure_owner(task: &Task, user_id: Uuid) -> Result<(), ApiError> {
    if task.user_id != user_id {
        warn!(task_id = %task.id, owner = %task.user_id, caller = %user_id, "ownership mismatch");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if !is_valid_description(description) {
        return Err(ApiError::validation(
            codes::INVALID_DESCRIPTION,
            format!("Description must be between 1 and {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_deadline(deadline: &str) -> Result<Date, ApiError> {
    parse_date(deadline).ok_or_else(|| {
        ApiError::validation(codes::INVALID_DATE, "Invalid date format. Try YYYY-MM-DD")
    })
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    validate_description(&payload.description)?;
    let deadline = validate_deadline(&payload.deadline)?;

    let task = Task::create(&state.db, user_id, &payload.description, deadline).await?;
    info!(task_id = %task.id, user_id = %user_id, "task created");
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    ensure_owner(&task, user_id)?;
    Ok(Json(task.into()))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let start_date = filter.start_date.as_deref().map(validate_deadline).transpose()?;
    let end_date = filter.end_date.as_deref().map(validate_deadline).transpose()?;

    let tasks = Task::list_by_owner(
        &state.db,
        user_id,
        filter.keyword_pattern.as_deref(),
        start_date,
        end_date,
    )
    .await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    ensure_owner(&task, user_id)?;

    let description = match payload.description {
        Some(description) => {
            validate_description(&description)?;
            description
        }
        None => task.description,
    };
    let deadline = match payload.deadline.as_deref() {
        Some(deadline) => validate_deadline(deadline)?,
        None => task.deadline,
    };

    let updated = Task::update(&state.db, id, &description, deadline).await?;
    info!(task_id = %updated.id, user_id = %user_id, "task updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    ensure_owner(&task, user_id)?;

    Task::delete(&state.db, id).await?;
    info!(task_id = %id, user_id = %user_id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, OffsetDateTime};

    fn task_owned_by(user_id: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id,
            description: "Finish report".into(),
            deadline: date!(2025 - 03 - 01),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owner_passes_ownership_check() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(&task_owned_by(owner), owner).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let task = task_owned_by(Uuid::new_v4());
        let stranger = Uuid::new_v4();
        let err = ensure_owner(&task, stranger).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn oversized_description_is_rejected() {
        let err = validate_description(&"x".repeat(501)).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_DESCRIPTION);
        assert!(validate_description(&"x".repeat(500)).is_ok());
    }

    #[test]
    fn malformed_deadline_is_rejected() {
        let err = validate_deadline("01-03-2025").unwrap_err();
        assert_eq!(err.code(), codes::INVALID_DATE);
        assert_eq!(
            validate_deadline("2025-03-01").unwrap(),
            date!(2025 - 03 - 01)
        );
    }
}
