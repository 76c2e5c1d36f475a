//! User management service
//!
//! All user-related business logic lives here, including the access rules
//! (admin vs. self). HTTP handlers are thin wrappers that delegate to this
//! service.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AdminConfig;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateCredentialsDto, UpdateUserDto,
    User, UserRepositoryInterface, UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::{normalize_email, PaginatedResult};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authentication result returned after a successful sign-in
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Registration input, shared by public sign-up and admin creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Orchestrates the identity and user-management use cases.
///
/// Generic over `R: UserRepositoryInterface` so it stays decoupled from
/// the concrete persistence layer.
pub struct UserService<R: UserRepositoryInterface> {
    repo: Arc<R>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
}

impl<R: UserRepositoryInterface> UserService<R> {
    pub fn new(repo: Arc<R>, jwt_config: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            jwt_config,
            bcrypt_cost,
        }
    }

    // ── Registration ────────────────────────────────────────────

    /// Public registration. New accounts get the `User` role.
    pub async fn sign_up(&self, account: NewAccount) -> DomainResult<User> {
        let user = self.create_account(account, UserRole::User).await?;
        metrics::counter!("users_registered_total", "role" => "user").increment(1);
        info!(user_id = %user.id, "New user registered");
        Ok(user)
    }

    /// Create another administrator. Callers must already be admins.
    pub async fn create_admin(&self, account: NewAccount) -> DomainResult<User> {
        let user = self.create_account(account, UserRole::Admin).await?;
        metrics::counter!("users_registered_total", "role" => "admin").increment(1);
        info!(user_id = %user.id, "Administrator created");
        Ok(user)
    }

    async fn create_account(&self, account: NewAccount, role: UserRole) -> DomainResult<User> {
        if account.password != account.password_confirmation {
            return Err(DomainError::Validation("Passwords do not match".into()));
        }

        let name = clean_name(&account.name)?;
        let password_hash = self.hash(&account.password)?;

        self.repo
            .create_user(CreateUserDto {
                name,
                email: normalize_email(&account.email),
                password_hash,
                role,
            })
            .await
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by email + password and issue a JWT.
    ///
    /// Unknown emails, wrong passwords and deactivated accounts all yield the
    /// same `Unauthorized` error.
    pub async fn sign_in(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let email = normalize_email(email);

        let Some(user) = self.repo.get_user_by_email(&email).await? else {
            debug!("Sign-in rejected: unknown email");
            return Err(self.rejected_sign_in());
        };

        if !user.can_authenticate() {
            debug!(user_id = %user.id, "Sign-in rejected: account disabled");
            return Err(self.rejected_sign_in());
        }

        let valid = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            warn!(user_id = %user.id, "Stored password hash is unreadable: {}", e);
            false
        });
        if !valid {
            debug!(user_id = %user.id, "Sign-in rejected: wrong password");
            return Err(self.rejected_sign_in());
        }

        let token = create_token(&user.id, &user.email, user.role.as_str(), &self.jwt_config)
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))?;

        if let Err(e) = self.repo.record_login(&user.id).await {
            warn!(user_id = %user.id, "Failed to record login time: {}", e);
        }

        metrics::counter!("auth_sign_in_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "User signed in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expires_in(),
            user,
        })
    }

    fn rejected_sign_in(&self) -> DomainError {
        metrics::counter!("auth_sign_in_total", "outcome" => "rejected").increment(1);
        DomainError::Unauthorized(INVALID_CREDENTIALS.into())
    }

    /// Resolve a bearer token to the live account it was issued for.
    pub async fn authenticate(&self, token: &str) -> DomainResult<User> {
        let claims = verify_token(token, &self.jwt_config)
            .map_err(|_| DomainError::Unauthorized("Invalid or expired token".into()))?;

        let user = self
            .repo
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("User not found".into()))?;

        if !user.can_authenticate() {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        Ok(user)
    }

    // ── Queries ─────────────────────────────────────────────────

    /// List users with search, filtering, sorting and pagination.
    pub async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        self.repo.list_users(dto).await
    }

    /// Get a single user by ID.
    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Update profile fields. Admins may update anyone and change role or
    /// status; regular users may only edit their own name and email.
    pub async fn update_user(
        &self,
        actor: &User,
        id: &str,
        mut dto: UpdateUserDto,
    ) -> DomainResult<User> {
        ensure_self_or_admin(actor, id)?;

        if dto.changes_privileges() && !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "Only administrators can change role or status".into(),
            ));
        }

        dto.name = dto.name.as_deref().map(clean_name).transpose()?;
        dto.email = dto.email.as_deref().map(normalize_email);

        let user = self
            .repo
            .update_user(id, dto)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!(user_id = %user.id, actor_id = %actor.id, "User updated");
        Ok(user)
    }

    /// Change the caller's email and password after re-checking the
    /// current password.
    pub async fn change_credentials(
        &self,
        user_id: &str,
        current_password: &str,
        email: &str,
        new_password: &str,
    ) -> DomainResult<User> {
        let user = self.get_user(user_id).await?;

        let valid = verify_password(current_password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Invalid current password".into()));
        }

        let password_hash = self.hash(new_password)?;

        let user = self
            .repo
            .update_credentials(
                user_id,
                UpdateCredentialsDto {
                    email: normalize_email(email),
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;

        info!(user_id, "Credentials changed");
        Ok(user)
    }

    /// Soft-delete a user. Admins may delete anyone, users only themselves.
    pub async fn delete_user(&self, actor: &User, id: &str) -> DomainResult<()> {
        ensure_self_or_admin(actor, id)?;
        self.repo.soft_delete_user(id).await?;
        info!(user_id = id, actor_id = %actor.id, "User soft-deleted");
        Ok(())
    }

    /// Create the configured administrator unless an account with that
    /// email already exists. Returns whether a user was created.
    pub async fn ensure_default_admin(&self, admin: &AdminConfig) -> DomainResult<bool> {
        let email = normalize_email(&admin.email);
        if self.repo.get_user_by_email(&email).await?.is_some() {
            debug!("Default administrator already exists");
            return Ok(false);
        }

        let account = NewAccount {
            name: admin.name.clone(),
            email,
            password: admin.password.clone(),
            password_confirmation: admin.password.clone(),
        };

        match self.create_account(account, UserRole::Admin).await {
            Ok(user) => {
                info!(user_id = %user.id, "Default administrator created");
                Ok(true)
            }
            // A soft-deleted row still holds the address
            Err(DomainError::Conflict(_)) => {
                warn!("Default administrator email belongs to a deleted account; skipping seed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn hash(&self, password: &str) -> DomainResult<String> {
        hash_password(password, self.bcrypt_cost)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn clean_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("name: must not be blank".into()));
    }
    Ok(name.to_string())
}

fn ensure_self_or_admin(actor: &User, target_id: &str) -> DomainResult<()> {
    if actor.is_admin() || actor.id == target_id {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "You are not allowed to access this resource".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::repositories::UserRepository;
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use sea_orm_migration::MigratorTrait;

    async fn service() -> UserService<UserRepository> {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        UserService::new(
            Arc::new(UserRepository::new(db)),
            JwtConfig::new("test-secret", 1),
            4,
        )
    }

    fn account(name: &str, email: &str, password: &str) -> NewAccount {
        NewAccount {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password_confirmation: password.into(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let svc = service().await;
        let user = svc
            .sign_up(account(" João Silva ", "Joao@Email.com", "senha123"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.name, "João Silva");
        assert_eq!(user.email, "joao@email.com");
        assert_ne!(user.password_hash, "senha123");

        let auth = svc.sign_in("JOAO@email.com ", "senha123").await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);
        assert_eq!(auth.user.id, user.id);

        let resolved = svc.authenticate(&auth.token).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(resolved.last_login_at.is_some());
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let svc = service().await;
        let mut acc = account("Ana", "ana@email.com", "senha123");
        acc.password_confirmation = "other123".into();

        let err = svc.sign_up(acc).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let svc = service().await;
        let err = svc
            .sign_up(account("   ", "blank@email.com", "senha123"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let user = svc
            .sign_up(account("  Ana  ", "ana@email.com", "senha123"))
            .await
            .unwrap();
        assert_eq!(user.name, "Ana");

        let err = svc
            .update_user(
                &user,
                &user.id,
                UpdateUserDto {
                    name: Some(" \t ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let svc = service().await;
        svc.sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();
        let err = svc
            .sign_up(account("Ana 2", "ANA@email.com", "senha123"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn sign_in_failures_are_indistinguishable() {
        let svc = service().await;
        let admin = svc
            .create_admin(account("Root", "root@email.com", "rootpass"))
            .await
            .unwrap();
        let user = svc
            .sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();
        svc.update_user(
            &admin,
            &user.id,
            UpdateUserDto {
                status: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        for (email, password) in [
            ("nobody@email.com", "senha123"),
            ("root@email.com", "wrong-password"),
            ("ana@email.com", "senha123"),
        ] {
            let err = svc.sign_in(email, password).await.unwrap_err();
            match err {
                DomainError::Unauthorized(msg) => assert_eq!(msg, INVALID_CREDENTIALS),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn tokens_stop_working_after_deactivation_or_deletion() {
        let svc = service().await;
        let admin = svc
            .create_admin(account("Root", "root@email.com", "rootpass"))
            .await
            .unwrap();
        svc.sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();
        svc.sign_up(account("Bia", "bia@email.com", "senha123"))
            .await
            .unwrap();

        let ana = svc.sign_in("ana@email.com", "senha123").await.unwrap();
        let bia = svc.sign_in("bia@email.com", "senha123").await.unwrap();

        svc.update_user(
            &admin,
            &ana.user.id,
            UpdateUserDto {
                status: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.delete_user(&admin, &bia.user.id).await.unwrap();

        assert!(matches!(
            svc.authenticate(&ana.token).await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.authenticate(&bia.token).await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.authenticate("garbage").await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn regular_users_only_edit_themselves() {
        let svc = service().await;
        let ana = svc
            .sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();
        let bia = svc
            .sign_up(account("Bia", "bia@email.com", "senha123"))
            .await
            .unwrap();

        let renamed = svc
            .update_user(
                &ana,
                &ana.id,
                UpdateUserDto {
                    name: Some("Ana Maria".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Ana Maria");

        let err = svc
            .update_user(
                &ana,
                &bia.id,
                UpdateUserDto {
                    name: Some("Hacked".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = svc
            .update_user(
                &ana,
                &ana.id,
                UpdateUserDto {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = svc.delete_user(&ana, &bia.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        svc.delete_user(&ana, &ana.id).await.unwrap();
        assert!(matches!(
            svc.get_user(&ana.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn admins_can_promote_and_update_missing_is_not_found() {
        let svc = service().await;
        let admin = svc
            .create_admin(account("Root", "root@email.com", "rootpass"))
            .await
            .unwrap();
        let ana = svc
            .sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();

        let promoted = svc
            .update_user(
                &admin,
                &ana.id,
                UpdateUserDto {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_admin());

        let err = svc
            .update_user(&admin, "missing-id", UpdateUserDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn change_credentials_requires_current_password() {
        let svc = service().await;
        let ana = svc
            .sign_up(account("Ana", "ana@email.com", "senha123"))
            .await
            .unwrap();

        let err = svc
            .change_credentials(&ana.id, "wrong", "ana@new.com", "nova1234")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let updated = svc
            .change_credentials(&ana.id, "senha123", "Ana@New.com", "nova1234")
            .await
            .unwrap();
        assert_eq!(updated.email, "ana@new.com");

        assert!(svc.sign_in("ana@email.com", "senha123").await.is_err());
        assert!(svc.sign_in("ana@new.com", "senha123").await.is_err());
        svc.sign_in("ana@new.com", "nova1234").await.unwrap();
    }

    #[tokio::test]
    async fn default_admin_is_seeded_once() {
        let svc = service().await;
        let admin = AdminConfig::default();

        assert!(svc.ensure_default_admin(&admin).await.unwrap());
        assert!(!svc.ensure_default_admin(&admin).await.unwrap());

        let auth = svc.sign_in(&admin.email, &admin.password).await.unwrap();
        assert!(auth.user.is_admin());
    }
}
