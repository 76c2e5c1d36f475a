//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::dto::{LoginResponse, SignInRequest, SignUpRequest, UpdateCredentialsRequest};
use crate::application::UserService;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub user_service: Arc<UserService<UserRepository>>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Authentication",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserDto>),
        (status = 400, description = "Malformed JSON"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn sign_up(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.user_service.sign_up(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            UserDto::from(user),
            "User registered successfully",
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    tag = "Authentication",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn sign_in(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let result = state
        .user_service
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(ApiResponse::success(LoginResponse::from(result))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/auth/credentials",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = UpdateCredentialsRequest,
    responses(
        (status = 200, description = "Credentials updated", body = ApiResponse<UserDto>),
        (status = 401, description = "Not authenticated or wrong current password"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn change_credentials(
    State(state): State<AuthHandlerState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateCredentialsRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let updated = state
        .user_service
        .change_credentials(
            &user.id,
            &request.current_password,
            &request.email,
            &request.password,
        )
        .await?;
    Ok(Json(ApiResponse::with_message(
        UserDto::from(updated),
        "Credentials updated successfully",
    )))
}
