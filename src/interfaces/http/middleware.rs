//! Authentication middleware and extractors for Axum

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::application::UserService;
use crate::domain::User;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::ApiError;

/// State required by `auth_middleware`
#[derive(Clone)]
pub struct AuthState {
    pub user_service: Arc<UserService<UserRepository>>,
}

/// The user behind a verified bearer token.
///
/// Inserted into request extensions by [`auth_middleware`]; handlers
/// extract it directly.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

/// An authenticated user holding the admin role. Rejects with 403 otherwise.
#[derive(Clone, Debug)]
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Administrator role required"));
        }
        Ok(AdminUser(user))
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer-token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return ApiError::unauthorized("Missing authentication token").into_response();
    };

    let Some(token) = extract_token(&auth_header) else {
        return ApiError::unauthorized("Invalid authentication token").into_response();
    };

    match auth_state.user_service.authenticate(token).await {
        Ok(user) => {
            debug!(user_id = %user.id, "Request authenticated");
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
