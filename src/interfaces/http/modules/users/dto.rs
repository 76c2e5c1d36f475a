//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{GetUserDto, SortOrder, UpdateUserDto, User, UserRole};

/// Role as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Admin,
    User,
}

impl From<UserRole> for RoleDto {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => RoleDto::Admin,
            UserRole::User => RoleDto::User,
        }
    }
}

impl From<RoleDto> for UserRole {
    fn from(role: RoleDto) -> Self {
        match role {
            RoleDto::Admin => UserRole::Admin,
            RoleDto::User => UserRole::User,
        }
    }
}

/// User API representation. The password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: RoleDto,
    /// `true` when the account is active
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.into(),
            status: u.status,
            created_at: u.created_at,
            updated_at: u.updated_at,
            last_login_at: u.last_login_at,
        }
    }
}

/// Update user request. Omitted fields are left unchanged; `role` and
/// `status` require the admin role.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "invalid email format"),
        length(max = 200, message = "email must be at most 200 characters")
    )]
    pub email: Option<String>,
    pub role: Option<RoleDto>,
    pub status: Option<bool>,
}

impl From<UpdateUserRequest> for UpdateUserDto {
    fn from(r: UpdateUserRequest) -> Self {
        UpdateUserDto {
            name: r.name,
            email: r.email,
            role: r.role.map(Into::into),
            status: r.status,
        }
    }
}

/// List users query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// Case-insensitive match on name or email
    #[serde(alias = "email")]
    pub search: Option<String>,
    /// Filter by role
    pub role: Option<RoleDto>,
    /// Filter by account status; only active users are listed when omitted
    pub status: Option<bool>,
    /// Page number, starting at 1
    #[serde(alias = "pageNumber")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    /// Items per page (1-100, default 10)
    #[serde(alias = "pageSize")]
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: Option<u32>,
    /// Sort by creation date, `ASC` or `DESC` (default)
    pub sort: Option<SortOrder>,
}

impl From<ListUsersParams> for GetUserDto {
    fn from(p: ListUsersParams) -> Self {
        GetUserDto {
            search: p.search.filter(|s| !s.trim().is_empty()),
            role: p.role.map(Into::into),
            status: p.status,
            page: p.page,
            page_size: p.page_size,
            sort: p.sort.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_accept_legacy_aliases() {
        let params: ListUsersParams =
            serde_json::from_str(r#"{"pageNumber": 2, "pageSize": 5, "email": "bob"}"#).unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.page_size, Some(5));

        let dto = GetUserDto::from(params);
        assert_eq!(dto.search.as_deref(), Some("bob"));
        assert_eq!(dto.sort, SortOrder::Desc);
    }

    #[test]
    fn list_params_bounds() {
        let params = ListUsersParams {
            page_size: Some(101),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = ListUsersParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn update_request_validates_present_fields_only() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let req = UpdateUserRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RoleDto::Admin).unwrap(), "\"admin\"");
    }
}
