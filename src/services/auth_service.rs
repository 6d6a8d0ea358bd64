use crate::config::BootstrapConfig;
use crate::database::DbPool;
use crate::entities::{Role, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SharedTokenStore;
use crate::services::user_service::insert_account;
use crate::utils::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
    tokens: SharedTokenStore,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService, tokens: SharedTokenStore) -> Self {
        Self {
            pool,
            jwt_service,
            tokens,
        }
    }

    /// Self-service sign-up. The account is always a customer.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        let user = insert_account(
            self.pool.as_ref(),
            &request.nama,
            &request.email,
            &request.password,
            Role::Pelanggan,
        )
        .await?;
        log::info!("User {} registered", user.id);
        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(self.pool.as_ref())
            .await?;

        let user = match user {
            Some(user) if verify_password(&request.password, &user.password)? => user,
            _ => {
                log::warn!("Failed login attempt for {email}");
                return Err(AppError::AuthError("Invalid email or password".to_string()));
            }
        };

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, user.role, &user.nama)?;
        let refresh = self
            .jwt_service
            .generate_refresh_token(user.id, user.role, &user.nama)?;
        self.tokens
            .issue(user.id, &refresh.token, refresh.expires_at)
            .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token: refresh.token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::from(user),
        })
    }

    /// Trades a live refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> AppResult<RefreshResponse> {
        let token = refresh_token
            .ok_or_else(|| AppError::AuthError("Refresh token is required".to_string()))?;
        let invalid = || AppError::Forbidden("Invalid refresh token".to_string());

        let claims = self
            .jwt_service
            .verify_refresh_token(token)
            .map_err(|_| invalid())?;
        let user_id = claims.user_id().map_err(|_| invalid())?;

        if self.tokens.owner_of(token).await? != Some(user_id) {
            return Err(invalid());
        }

        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(invalid)?;

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, user.role, &user.nama)?;

        Ok(RefreshResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn logout(&self, refresh_token: Option<&str>) -> AppResult<()> {
        let token = refresh_token
            .ok_or_else(|| AppError::ValidationError("Refresh token is required".to_string()))?;
        self.tokens.revoke(token).await
    }

    /// Creates the configured admin account unless one with that email
    /// already exists. Returns whether an account was created.
    pub async fn ensure_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<bool> {
        let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password)
        else {
            return Ok(false);
        };

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(self.pool.as_ref())
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let nama = bootstrap.admin_name.as_deref().unwrap_or("Administrator");
        let admin = insert_account(self.pool.as_ref(), nama, email, password, Role::Admin).await?;
        log::info!("Bootstrap admin account {} created", admin.id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::executed_statements;
    use crate::services::{MemoryTokenStore, TokenStore};
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 604_800)
    }

    fn stored_user(id: i64, password: &str, role: Role, is_active: bool) -> users::Model {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        users::Model {
            id,
            nama: "Dewi".to_string(),
            email: "dewi@mail.com".to_string(),
            password: bcrypt::hash(password, 4).unwrap(),
            role,
            is_active,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_register_always_creates_customer() {
        let mut inserted = stored_user(10, "secret1", Role::Pelanggan, true);
        inserted.email = "new@mail.com".to_string();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![inserted]])
                .into_connection(),
        );
        let service = AuthService::new(db.clone(), jwt(), Arc::new(MemoryTokenStore::new()));

        let request: RegisterRequest = serde_json::from_str(
            r#"{"nama":"New","email":"New@Mail.com","password":"secret1","role":"admin"}"#,
        )
        .unwrap();
        service.register(request).await.unwrap();
        drop(service);

        let statements = executed_statements(db);
        assert_eq!(statements.len(), 1);
        let insert = &statements[0];
        assert!(insert.starts_with(r#"INSERT INTO "users""#), "{insert}");
        assert!(insert.contains(r#"String(Some("pelanggan"))"#), "{insert}");
        assert!(!insert.contains(r#"String(Some("admin"))"#), "{insert}");
        assert!(insert.contains(r#"String(Some("new@mail.com"))"#), "{insert}");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_without_queries() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(db, jwt(), Arc::new(MemoryTokenStore::new()));

        let err = service
            .register(RegisterRequest {
                nama: "X".into(),
                email: "not-an-email".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_login_refresh_logout_cycle() {
        let user = stored_user(7, "secret1", Role::Kasir, true);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user.clone()]])
                .append_query_results([vec![user]])
                .into_connection(),
        );
        let tokens = Arc::new(MemoryTokenStore::new());
        let service = AuthService::new(db, jwt(), tokens.clone());

        let auth = service
            .login(LoginRequest {
                email: "dewi@mail.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(tokens.owner_of(&auth.refresh_token).await.unwrap(), Some(7));

        let refreshed = service.refresh(Some(&auth.refresh_token)).await.unwrap();
        let claims = jwt().verify_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.role, Role::Kasir);

        service.logout(Some(&auth.refresh_token)).await.unwrap();
        let err = service.refresh(Some(&auth.refresh_token)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![stored_user(1, "secret1", Role::Kasir, true)]])
                .append_query_results([vec![stored_user(2, "secret1", Role::Kasir, false)]])
                .append_query_results([Vec::<users::Model>::new()])
                .into_connection(),
        );
        let service = AuthService::new(db, jwt(), Arc::new(MemoryTokenStore::new()));

        let login = |password: &str| LoginRequest {
            email: "dewi@mail.com".into(),
            password: password.into(),
        };

        let wrong = service.login(login("wrong-pass")).await.unwrap_err();
        assert!(matches!(wrong, AppError::AuthError(_)));

        let inactive = service.login(login("secret1")).await.unwrap_err();
        assert!(matches!(inactive, AppError::Forbidden(_)));

        let unknown = service.login(login("secret1")).await.unwrap_err();
        assert!(matches!(unknown, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_refresh_and_logout_require_a_token() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(db, jwt(), Arc::new(MemoryTokenStore::new()));

        assert!(matches!(
            service.refresh(None).await.unwrap_err(),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            service.logout(None).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(db, jwt(), Arc::new(MemoryTokenStore::new()));

        let access = jwt().generate_access_token(1, Role::Admin, "A").unwrap();
        let err = service.refresh(Some(&access)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_without_credentials() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(db, jwt(), Arc::new(MemoryTokenStore::new()));
        assert!(!service.ensure_admin(&BootstrapConfig::default()).await.unwrap());
    }
}
