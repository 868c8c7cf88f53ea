use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use application::{CreateUserRequest, UpdateUserRequest, UserDto, UserSummaryDto};
use domain::UserId;

use crate::{error::ApiError, state::AppState};

/// 缺失的字段按空字符串处理，交给校验规则报错
#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateUserPayload {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(payload) = payload?;
    let user = state
        .user_service
        .create(CreateUserRequest {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserDto::from_user(user, state.expose_password_hash)),
    ))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(UserSummaryDto::from).collect()))
}

async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserDto>, ApiError> {
    let Path(id) = id?;
    let user = state.user_service.get(UserId::from(id)).await?;
    Ok(Json(UserDto::from_user(user, state.expose_password_hash)))
}

async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserPayload>, JsonRejection>,
) -> Result<Json<UserDto>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let user = state
        .user_service
        .update(
            UserId::from(id),
            UpdateUserRequest {
                username: payload.username,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(UserDto::from_user(user, state.expose_password_hash)))
}

async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.user_service.delete(UserId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
