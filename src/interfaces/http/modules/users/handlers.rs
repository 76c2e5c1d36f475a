//! User management API handlers
//!
//! Listing, lookup and admin creation are admin-only; update and delete
//! are open to the account owner as well. Access rules live in
//! `UserService`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{ListUsersParams, UpdateUserRequest, UserDto};
use crate::application::UserService;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{
    ApiError, ApiResponse, EmptyData, PaginatedResponse, ValidatedJson, ValidatedQuery,
};
use crate::interfaces::http::middleware::{AdminUser, AuthenticatedUser};
use crate::interfaces::http::modules::auth::SignUpRequest;

/// User handler state, concrete over `UserRepository` for Axum compatibility.
#[derive(Clone)]
pub struct UserHandlerState {
    pub user_service: Arc<UserService<UserRepository>>,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Administrator created", body = ApiResponse<UserDto>),
        (status = 403, description = "Administrator role required"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.user_service.create_admin(request.into()).await?;
    tracing::info!(user_id = %user.id, actor_id = %admin.id, "Administrator created via API");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            UserDto::from(user),
            "Administrator created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "User list", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    AdminUser(_admin): AdminUser,
    ValidatedQuery(params): ValidatedQuery<ListUsersParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserDto>>>, ApiError> {
    let result = state.user_service.list_users(params.into()).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service.get_user(&id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 403, description = "Not the owner, or non-admin changing role/status"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service
        .update_user(&actor, &id, request.into())
        .await?;
    Ok(Json(ApiResponse::with_message(
        UserDto::from(user),
        "User updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    state.user_service.delete_user(&actor, &id).await?;
    Ok(Json(ApiResponse::with_message(
        EmptyData {},
        "User deleted successfully",
    )))
}
