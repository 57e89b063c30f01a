//! Authentication use cases: login, refresh-token rotation and logout

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::auth::{RefreshToken, RefreshTokenRepository};
use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_auth_event, AuthEvent, Outcome};
use crate::infrastructure::user::PasswordHasher;

use super::jwt::TokenIssuer;
use super::token_hash::{hash_token, verify_token_hash};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Access and refresh token handed to a client
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn RefreshTokenRepository>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            issuer,
        }
    }

    /// Authenticate with email and password and start a session
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        let result = self.try_login(email, password).await;
        record_auth_event(AuthEvent::Login, Outcome::of(&result));
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        let Some(mut user) = self.users.get_by_email(email).await? else {
            debug!("Login attempt for unknown email");
            return Err(DomainError::authentication(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(password, user.password_hash()) {
            debug!(user_id = %user.id(), "Login attempt with wrong password");
            return Err(DomainError::authentication(INVALID_CREDENTIALS));
        }

        let tokens = self.issue_pair(&user).await?;

        if let Err(e) = self.users.record_login(user.id()).await {
            warn!(user_id = %user.id(), error = %e, "Failed to record last login");
        }
        user.record_login();

        info!(user_id = %user.id(), "User logged in");

        Ok(LoginResult { user, tokens })
    }

    /// Exchange a refresh token for a new pair, invalidating the old one
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let result = self.rotate(refresh_token).await;
        record_auth_event(AuthEvent::Refresh, Outcome::of(&result));
        result
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;

        let Some(stored) = self.tokens.get(&claims.jti).await? else {
            warn!(jti = %claims.jti, "Refresh token not found, revoked or already used");
            return Err(DomainError::authentication(INVALID_REFRESH_TOKEN));
        };

        let user_id = claims.user_id()?;
        if !verify_token_hash(refresh_token, stored.token_hash()) || stored.user_id() != &user_id {
            warn!(jti = %claims.jti, "Refresh token does not match its stored record");
            return Err(DomainError::authentication(INVALID_REFRESH_TOKEN));
        }

        if stored.is_expired() {
            self.tokens.delete(stored.id()).await?;
            return Err(DomainError::authentication("Refresh token has expired"));
        }

        let Some(user) = self.users.get(&user_id).await? else {
            return Err(DomainError::authentication(INVALID_REFRESH_TOKEN));
        };

        let tokens = self.issue_pair(&user).await?;

        if let Err(e) = self.tokens.delete(stored.id()).await {
            warn!(jti = %stored.id(), error = %e, "Failed to delete rotated refresh token");
        }

        debug!(user_id = %user.id(), "Refresh token rotated");

        Ok(tokens)
    }

    /// End the session that owns the refresh token; repeated calls succeed
    pub async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        let result = self.revoke(refresh_token).await;
        record_auth_event(AuthEvent::Logout, Outcome::of(&result));
        result
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), DomainError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;

        if self.tokens.delete(&claims.jti).await? {
            info!(user_id = %claims.sub, "User logged out");
        } else {
            debug!(jti = %claims.jti, "Logout for an already revoked refresh token");
        }

        Ok(())
    }

    /// Resolve the user behind an access token
    pub async fn authenticate_access(&self, access_token: &str) -> Result<User, DomainError> {
        let claims = self.issuer.verify_access(access_token)?;
        let user_id = claims.user_id()?;

        self.users
            .get(&user_id)
            .await?
            .ok_or_else(|| DomainError::authentication("User no longer exists"))
    }

    /// Current user profile
    pub async fn me(&self, user_id: &UserId) -> Result<User, DomainError> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))
    }

    /// Remove expired refresh token records
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let purged = self.tokens.delete_expired(Utc::now()).await?;

        if purged > 0 {
            info!(purged, "Purged expired refresh tokens");
        }

        Ok(purged)
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, DomainError> {
        let access = self.issuer.issue_access(user)?;
        let refresh = self.issuer.issue_refresh(user)?;

        self.tokens
            .create(RefreshToken::new(
                refresh.claims.jti,
                *user.id(),
                hash_token(&refresh.token),
                refresh.claims.expires_at(),
            ))
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.issuer.access_ttl_secs(),
            refresh_expires_in: self.issuer.refresh_ttl_secs(),
        })
    }
}

/// Periodically purge expired refresh tokens until shutdown is signalled
pub async fn run_purge_task(
    service: Arc<AuthService>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = service.purge_expired().await {
                    warn!(error = %e, "Refresh token purge failed");
                }
            }
            _ = shutdown.changed() => {
                debug!("Stopping refresh token purge task");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::MockRefreshTokenRepository;
    use crate::domain::user::{DisplayName, Email, MockUserRepository, Role, UserId};
    use crate::infrastructure::auth::{
        InMemoryRefreshTokenRepository, JwtConfig, JwtService, MockTokenIssuer,
    };
    use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository};
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    const PASSWORD: &str = "password123";

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserRepository>,
        tokens: Arc<InMemoryRefreshTokenRepository>,
        user: User,
    }

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_ttl: ChronoDuration::minutes(15),
            refresh_ttl: ChronoDuration::days(7),
            issuer: "teampulse".to_string(),
        }))
    }

    async fn fixture() -> Fixture {
        let hasher = Arc::new(Argon2Hasher::low_cost());
        let user = User::new(
            Email::new("coach@club.com").unwrap(),
            DisplayName::new("Coach").unwrap(),
            hasher.hash(PASSWORD).unwrap(),
            Role::Manager,
            None,
        );
        let users = Arc::new(InMemoryUserRepository::with_users(vec![user.clone()]));
        let tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let service = AuthService::new(users.clone(), tokens.clone(), hasher, jwt());

        Fixture {
            service,
            users,
            tokens,
            user,
        }
    }

    fn assert_authentication_error<T: std::fmt::Debug>(result: Result<T, DomainError>) {
        assert!(
            matches!(result, Err(DomainError::Authentication { .. })),
            "expected authentication error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_login_success() {
        let f = fixture().await;

        let result = f.service.login("Coach@Club.com", PASSWORD).await.unwrap();

        assert_eq!(result.user.id(), f.user.id());
        assert!(result.user.last_login_at().is_some());
        assert_eq!(result.tokens.token_type, "Bearer");
        assert_eq!(result.tokens.expires_in, 900);
        assert_eq!(result.tokens.refresh_expires_in, 604_800);
        assert_eq!(f.tokens.len().await, 1);

        let stored = f.users.get(f.user.id()).await.unwrap().unwrap();
        assert!(stored.last_login_at().is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture().await;

        let unknown = f.service.login("nobody@club.com", PASSWORD).await;
        let wrong = f.service.login("coach@club.com", "wrong-password").await;

        let message = |r: Result<LoginResult, DomainError>| match r {
            Err(DomainError::Authentication { message }) => message,
            other => panic!("unexpected result: {other:?}"),
        };

        assert_eq!(message(unknown), message(wrong));
        assert_eq!(f.tokens.len().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();

        let rotated = f.service.refresh(&login.tokens.refresh_token).await.unwrap();

        assert_ne!(rotated.refresh_token, login.tokens.refresh_token);
        assert_eq!(f.tokens.len().await, 1);

        // The old refresh token cannot be used again
        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);

        // The new one works
        assert!(f.service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();

        assert_authentication_error(f.service.refresh(&login.tokens.access_token).await);
        assert_authentication_error(f.service.refresh("garbage").await);
    }

    #[tokio::test]
    async fn test_refresh_rejects_hash_mismatch() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();
        let claims = jwt().verify_refresh(&login.tokens.refresh_token).unwrap();

        // Replace the stored record with one whose hash differs
        f.tokens.delete(&claims.jti).await.unwrap();
        f.tokens
            .create(RefreshToken::new(
                claims.jti,
                *f.user.id(),
                hash_token("some-other-token"),
                claims.expires_at(),
            ))
            .await
            .unwrap();

        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);
    }

    #[tokio::test]
    async fn test_refresh_rejects_record_owned_by_another_user() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();
        let claims = jwt().verify_refresh(&login.tokens.refresh_token).unwrap();

        f.tokens.delete(&claims.jti).await.unwrap();
        f.tokens
            .create(RefreshToken::new(
                claims.jti,
                UserId::generate(),
                hash_token(&login.tokens.refresh_token),
                claims.expires_at(),
            ))
            .await
            .unwrap();

        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);
        assert!(f.tokens.get(&claims.jti).await.unwrap().is_some());
        assert_eq!(f.tokens.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_record() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();
        let claims = jwt().verify_refresh(&login.tokens.refresh_token).unwrap();

        f.tokens.delete(&claims.jti).await.unwrap();
        f.tokens
            .create(RefreshToken::new(
                claims.jti,
                *f.user.id(),
                hash_token(&login.tokens.refresh_token),
                Utc::now() - ChronoDuration::minutes(1),
            ))
            .await
            .unwrap();

        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);
        assert!(f.tokens.get(&claims.jti).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();

        f.users.delete(f.user.id()).await.unwrap();

        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);
    }

    #[tokio::test]
    async fn test_refresh_survives_failed_cleanup() {
        let hasher = Arc::new(Argon2Hasher::low_cost());
        let user = User::new(
            Email::new("coach@club.com").unwrap(),
            DisplayName::new("Coach").unwrap(),
            "unused",
            Role::Viewer,
            None,
        );
        let users = Arc::new(InMemoryUserRepository::with_users(vec![user.clone()]));
        let issuer = jwt();
        let presented = issuer.issue_refresh(&user).unwrap();
        let record = RefreshToken::new(
            presented.claims.jti,
            *user.id(),
            hash_token(&presented.token),
            presented.claims.expires_at(),
        );

        let mut tokens = MockRefreshTokenRepository::new();
        tokens
            .expect_get()
            .returning(move |_| Ok(Some(record.clone())));
        tokens.expect_create().times(1).returning(|t| Ok(t));
        tokens
            .expect_delete()
            .times(1)
            .returning(|_| Err(DomainError::repository("connection reset")));

        let service = AuthService::new(users, Arc::new(tokens), hasher, issuer);

        assert!(service.refresh(&presented.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_survives_last_login_write_failure() {
        let hasher = Arc::new(Argon2Hasher::low_cost());
        let user = User::new(
            Email::new("coach@club.com").unwrap(),
            DisplayName::new("Coach").unwrap(),
            hasher.hash(PASSWORD).unwrap(),
            Role::Viewer,
            None,
        );

        let mut users = MockUserRepository::new();
        users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_record_login()
            .times(1)
            .returning(|_| Err(DomainError::repository("connection reset")));

        let tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let service = AuthService::new(Arc::new(users), tokens.clone(), hasher, jwt());

        let result = service.login("coach@club.com", PASSWORD).await.unwrap();

        assert!(result.user.last_login_at().is_some());
        assert_eq!(tokens.len().await, 1);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();

        f.service.logout(&login.tokens.refresh_token).await.unwrap();
        assert_eq!(f.tokens.len().await, 0);

        f.service.logout(&login.tokens.refresh_token).await.unwrap();
        assert_authentication_error(f.service.refresh(&login.tokens.refresh_token).await);
    }

    #[tokio::test]
    async fn test_logout_rejects_invalid_token() {
        let f = fixture().await;
        assert_authentication_error(f.service.logout("not-a-token").await);
    }

    #[tokio::test]
    async fn test_authenticate_access() {
        let f = fixture().await;
        let login = f.service.login("coach@club.com", PASSWORD).await.unwrap();

        let user = f
            .service
            .authenticate_access(&login.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(user.id(), f.user.id());

        assert_authentication_error(
            f.service
                .authenticate_access(&login.tokens.refresh_token)
                .await,
        );

        f.users.delete(f.user.id()).await.unwrap();
        assert_authentication_error(
            f.service
                .authenticate_access(&login.tokens.access_token)
                .await,
        );
    }

    #[tokio::test]
    async fn test_me() {
        let f = fixture().await;

        assert_eq!(f.service.me(f.user.id()).await.unwrap().id(), f.user.id());
        assert!(matches!(
            f.service.me(&UserId::generate()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let f = fixture().await;
        f.service.login("coach@club.com", PASSWORD).await.unwrap();
        f.tokens
            .create(RefreshToken::new(
                Uuid::new_v4(),
                *f.user.id(),
                "sha256$old",
                Utc::now() - ChronoDuration::hours(1),
            ))
            .await
            .unwrap();

        assert_eq!(f.service.purge_expired().await.unwrap(), 1);
        assert_eq!(f.tokens.len().await, 1);
    }

    #[tokio::test]
    async fn test_signing_failure_stores_nothing() {
        let f = fixture().await;
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue_access()
            .returning(|_| Err(DomainError::internal("signing failed")));

        let service = AuthService::new(
            f.users.clone(),
            f.tokens.clone(),
            Arc::new(Argon2Hasher::low_cost()),
            Arc::new(issuer),
        );

        let result = service.login("coach@club.com", PASSWORD).await;
        assert!(matches!(result, Err(DomainError::Internal { .. })));
        assert_eq!(f.tokens.len().await, 0);
    }

    #[tokio::test]
    async fn test_purge_task_stops_on_shutdown() {
        let f = fixture().await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run_purge_task(
            Arc::new(f.service),
            Duration::from_secs(3600),
            rx,
        ));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("purge task should stop")
            .unwrap();
    }
}
