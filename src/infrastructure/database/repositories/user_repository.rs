use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use tracing::debug;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, SortOrder, UpdateCredentialsDto,
    UpdateUserDto, User, UserRepositoryInterface, UserRole,
};
use crate::infrastructure::database::entities::user;
use crate::shared::{search_key, validate_pagination, PaginatedResult};

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rows that have not been soft-deleted.
    fn live() -> Select<user::Entity> {
        user::Entity::find().filter(user::Column::DeletedAt.is_null())
    }

    async fn find_live(&self, id: &str) -> DomainResult<Option<user::Model>> {
        Self::live()
            .filter(user::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::User => UserRole::User,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::User => user::UserRole::User,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
        deleted_at: model.deleted_at,
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}

/// `%term%` with LIKE wildcards in `term` matched literally (escape `\`).
fn contains_pattern(term: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

/// Unique violations on `users.email` become `Conflict`.
fn write_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict("Email address is already in use".to_string())
        }
        _ => db_err(e),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();

        let new_user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(dto.email),
            search_name: Set(search_key(&dto.name)),
            name: Set(dto.name),
            role: Set(domain_role_to_entity(dto.role)),
            status: Set(true),
            password_hash: Set(dto.password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
            deleted_at: Set(None),
        };

        let model = new_user.insert(&self.db).await.map_err(write_err)?;
        Ok(user_model_to_domain(model))
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let (page, page_size) = validate_pagination(dto.page, dto.page_size);

        let mut query = Self::live();

        // Without an explicit filter only active accounts are listed
        query = query.filter(user::Column::Status.eq(dto.status.unwrap_or(true)));

        if let Some(role) = dto.role {
            query = query.filter(user::Column::Role.eq(domain_role_to_entity(role)));
        }

        // Both columns are stored case-folded, so only the term needs folding
        let term = dto.search.as_deref().map(search_key).filter(|s| !s.is_empty());
        if let Some(term) = term {
            query = query.filter(
                Condition::any()
                    .add(Expr::col(user::Column::SearchName).like(contains_pattern(&term)))
                    .add(Expr::col(user::Column::Email).like(contains_pattern(&term))),
            );
        }

        query = match dto.sort {
            SortOrder::Asc => query.order_by_asc(user::Column::CreatedAt),
            SortOrder::Desc => query.order_by_desc(user::Column::CreatedAt),
        };
        // Stable order for rows created within the same instant
        query = query.order_by_asc(user::Column::Id);

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let offset = ((page - 1) as u64) * page_size as u64;
        let models = query
            .offset(offset)
            .limit(page_size as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        debug!(total, page, page_size, "Listed users");

        let items: Vec<User> = models.into_iter().map(user_model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = Self::live()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.find_live(id).await?.map(user_model_to_domain))
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(existing) = self.find_live(id).await? else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = dto.name {
            active.search_name = Set(search_key(&name));
            active.name = Set(name);
        }
        if let Some(email) = dto.email {
            active.email = Set(email);
        }
        if let Some(role) = dto.role {
            active.role = Set(domain_role_to_entity(role));
        }
        if let Some(status) = dto.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(write_err)?;
        Ok(Some(user_model_to_domain(model)))
    }

    async fn update_credentials(
        &self,
        id: &str,
        dto: UpdateCredentialsDto,
    ) -> DomainResult<Option<User>> {
        let Some(existing) = self.find_live(id).await? else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        active.email = Set(dto.email);
        active.password_hash = Set(dto.password_hash);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(write_err)?;
        Ok(Some(user_model_to_domain(model)))
    }

    async fn record_login(&self, id: &str) -> DomainResult<()> {
        user::Entity::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn soft_delete_user(&self, id: &str) -> DomainResult<()> {
        let now = Utc::now();
        let result = user::Entity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::user_not_found(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use sea_orm_migration::MigratorTrait;

    async fn repo() -> UserRepository {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        UserRepository::new(db)
    }

    fn new_user(name: &str, email: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderpla".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let repo = repo().await;
        let created = repo
            .create_user(new_user("João Silva", "joao@email.com", UserRole::User))
            .await
            .unwrap();

        assert!(created.status);
        assert_eq!(created.role, UserRole::User);

        let by_id = repo.get_user_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "joao@email.com");

        let by_email = repo.get_user_by_email("joao@email.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = repo().await;
        repo.create_user(new_user("A", "dup@email.com", UserRole::User))
            .await
            .unwrap();

        let err = repo
            .create_user(new_user("B", "dup@email.com", UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn soft_deleted_users_are_invisible() {
        let repo = repo().await;
        let user = repo
            .create_user(new_user("Gone", "gone@email.com", UserRole::User))
            .await
            .unwrap();

        repo.soft_delete_user(&user.id).await.unwrap();

        assert!(repo.get_user_by_id(&user.id).await.unwrap().is_none());
        assert!(repo.get_user_by_email("gone@email.com").await.unwrap().is_none());
        assert_eq!(repo.list_users(GetUserDto::default()).await.unwrap().total, 0);

        let err = repo.soft_delete_user(&user.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        // The email stays reserved by the deleted row
        let err = repo
            .create_user(new_user("Again", "gone@email.com", UserRole::User))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let repo = repo().await;
        let user = repo
            .create_user(new_user("Maria", "maria@email.com", UserRole::User))
            .await
            .unwrap();

        let updated = repo
            .update_user(
                &user.id,
                UpdateUserDto {
                    status: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Maria");
        assert_eq!(updated.email, "maria@email.com");
        assert!(!updated.status);
        assert!(updated.updated_at >= user.updated_at);

        assert!(repo
            .update_user("missing", UpdateUserDto::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_filters_searches_and_paginates() {
        let repo = repo().await;
        for i in 0..12 {
            repo.create_user(new_user(
                &format!("Member {}", i),
                &format!("member{}@email.com", i),
                UserRole::User,
            ))
            .await
            .unwrap();
        }
        let admin = repo
            .create_user(new_user("Boss", "boss@corp.com", UserRole::Admin))
            .await
            .unwrap();
        let inactive = repo
            .create_user(new_user("Sleeper", "sleeper@email.com", UserRole::User))
            .await
            .unwrap();
        repo.update_user(
            &inactive.id,
            UpdateUserDto {
                status: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let first = repo.list_users(GetUserDto::default()).await.unwrap();
        assert_eq!(first.total, 13);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);

        let second = repo
            .list_users(GetUserDto {
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second.items.len(), 3);

        let admins = repo
            .list_users(GetUserDto {
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.total, 1);
        assert_eq!(admins.items[0].id, admin.id);

        let searched = repo
            .list_users(GetUserDto {
                search: Some("BOSS".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.total, 1);

        let by_email = repo
            .list_users(GetUserDto {
                search: Some("corp.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.total, 1);

        let inactive_only = repo
            .list_users(GetUserDto {
                status: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(inactive_only.total, 1);
        assert_eq!(inactive_only.items[0].id, inactive.id);
    }

    #[tokio::test]
    async fn record_login_stamps_timestamp() {
        let repo = repo().await;
        let user = repo
            .create_user(new_user("Ana", "ana@email.com", UserRole::User))
            .await
            .unwrap();
        assert!(user.last_login_at.is_none());

        repo.record_login(&user.id).await.unwrap();

        let reloaded = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login_at.is_some());
    }

    async fn search_total(repo: &UserRepository, term: &str) -> u64 {
        repo.list_users(GetUserDto {
            search: Some(term.into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .total
    }

    #[tokio::test]
    async fn search_treats_like_wildcards_literally() {
        let repo = repo().await;
        repo.create_user(new_user("John X", "johnxdoe@email.com", UserRole::User))
            .await
            .unwrap();
        repo.create_user(new_user("John U", "john_doe@email.com", UserRole::User))
            .await
            .unwrap();

        assert_eq!(search_total(&repo, "john_doe").await, 1);
        assert_eq!(search_total(&repo, "%").await, 0);
        assert_eq!(search_total(&repo, "_").await, 1);
        assert_eq!(search_total(&repo, "john").await, 2);
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let repo = repo().await;
        let user = repo
            .create_user(new_user("ÉLODIE", "elodie@email.com", UserRole::User))
            .await
            .unwrap();

        assert_eq!(search_total(&repo, "élodie").await, 1);
        assert_eq!(search_total(&repo, "ÉLO").await, 1);

        repo.update_user(
            &user.id,
            UpdateUserDto {
                name: Some("João".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(search_total(&repo, "JOÃO").await, 1);
        assert_eq!(search_total(&repo, "élodie").await, 0);
    }
}
