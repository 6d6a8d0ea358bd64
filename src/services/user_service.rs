use crate::database::DbPool;
use crate::entities::{Role, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SharedTokenStore;
use crate::utils::{hash_password, normalize_email, validate_email, validate_password};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};

pub(crate) const EMAIL_IN_USE: &str = "Email already in use";

fn validated_name(nama: &str) -> AppResult<String> {
    let nama = nama.trim();
    if nama.is_empty() || nama.chars().count() > 100 {
        return Err(AppError::ValidationError(
            "nama must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(nama.to_string())
}

/// Validates and stores a new account. Shared by sign-up, admin creation and
/// the startup admin bootstrap.
pub(crate) async fn insert_account(
    pool: &DatabaseConnection,
    nama: &str,
    email: &str,
    password: &str,
    role: Role,
) -> AppResult<users::Model> {
    let nama = validated_name(nama)?;
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_password(password)?;

    let now = Utc::now();
    users::ActiveModel {
        nama: Set(nama),
        email: Set(email),
        password: Set(hash_password(password)?),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(pool)
    .await
    .map_err(|e| AppError::unique_violation_or(e, EMAIL_IN_USE))
}

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
    tokens: SharedTokenStore,
}

impl UserService {
    pub fn new(pool: DbPool, tokens: SharedTokenStore) -> Self {
        Self { pool, tokens }
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserResponse>> {
        let rows = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<UserResponse> {
        users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<UserResponse> {
        let role = request.role.unwrap_or(Role::Pelanggan);
        let user = insert_account(
            self.pool.as_ref(),
            &request.nama,
            &request.email,
            &request.password,
            role,
        )
        .await?;
        log::info!("User {} created with role {}", user.id, user.role);
        Ok(UserResponse::from(user))
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        if request.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
            .into_active_model();

        if let Some(nama) = &request.nama {
            model.nama = Set(validated_name(nama)?);
        }
        if let Some(email) = &request.email {
            let email = normalize_email(email);
            validate_email(&email)?;
            model.email = Set(email);
        }
        if let Some(password) = &request.password {
            validate_password(password)?;
            model.password = Set(hash_password(password)?);
        }
        if let Some(role) = request.role {
            model.role = Set(role);
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model
            .update(self.pool.as_ref())
            .await
            .map_err(|e| AppError::unique_violation_or(e, EMAIL_IN_USE))?;

        if request.revokes_sessions() {
            self.tokens.revoke_all(user_id).await?;
        }

        Ok(UserResponse::from(updated))
    }

    pub async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let res = users::Entity::delete_by_id(user_id).exec(self.pool.as_ref()).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.tokens.revoke_all(user_id).await?;
        log::info!("User {} deleted", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token_store::TokenStore;
    use crate::services::MemoryTokenStore;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn user(id: i64, is_active: bool) -> users::Model {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        users::Model {
            id,
            nama: "Sari".to_string(),
            email: "sari@mail.com".to_string(),
            password: "$2b$12$hash".to_string(),
            role: Role::Kasir,
            is_active,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_deactivation_revokes_sessions() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user(3, true)]])
                .append_query_results([vec![user(3, false)]])
                .into_connection(),
        );
        let tokens = Arc::new(MemoryTokenStore::new());
        tokens
            .issue(3, "refresh", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        let service = UserService::new(db, tokens.clone());

        let updated = service
            .update_user(
                3,
                UpdateUserRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(tokens.owner_of("refresh").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_without_queries() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = UserService::new(db, Arc::new(MemoryTokenStore::new()));

        let err = service
            .update_user(1, UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = UserService::new(db, Arc::new(MemoryTokenStore::new()));

        let err = service.delete_user(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
