use async_trait::async_trait;

use super::{CreateUserDto, GetUserDto, UpdateCredentialsDto, UpdateUserDto, User};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

/// Persistence port for users. Soft-deleted rows are invisible to every
/// lookup; email uniqueness violations surface as `DomainError::Conflict`.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User>;

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>>;
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>>;
    async fn update_credentials(
        &self,
        id: &str,
        dto: UpdateCredentialsDto,
    ) -> DomainResult<Option<User>>;
    async fn record_login(&self, id: &str) -> DomainResult<()>;
    async fn soft_delete_user(&self, id: &str) -> DomainResult<()>;
}
