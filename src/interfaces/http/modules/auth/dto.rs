//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{AuthResult, NewAccount};
use crate::interfaces::http::modules::users::UserDto;

/// Registration payload, also used by admins creating another admin
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(
        email(message = "invalid email format"),
        length(max = 200, message = "email must be at most 200 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    #[serde(alias = "passwordConfirmation")]
    #[validate(length(min = 1, message = "password confirmation is required"))]
    pub password_confirmation: String,
}

impl From<SignUpRequest> for NewAccount {
    fn from(r: SignUpRequest) -> Self {
        NewAccount {
            name: r.name,
            email: r.email,
            password: r.password,
            password_confirmation: r.password_confirmation,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserDto,
}

impl From<AuthResult> for LoginResponse {
    fn from(r: AuthResult) -> Self {
        Self {
            token: r.token,
            token_type: r.token_type,
            expires_in: r.expires_in,
            user: r.user.into(),
        }
    }
}

/// New email and password for the authenticated user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCredentialsRequest {
    #[validate(
        email(message = "invalid email format"),
        length(max = 200, message = "email must be at most 200 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    #[serde(alias = "currentPassword")]
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_rules() {
        let ok: SignUpRequest = serde_json::from_str(
            r#"{"name":"Bob","email":"bob@email.com","password":"secret1","passwordConfirmation":"secret1"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());

        let short = SignUpRequest {
            password: "123".into(),
            ..ok
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn credentials_require_current_password() {
        let req = UpdateCredentialsRequest {
            email: "bob@email.com".into(),
            password: "secret2".into(),
            current_password: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
