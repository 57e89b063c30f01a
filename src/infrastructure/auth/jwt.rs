//! JWT issuance and verification for access and refresh tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::domain::user::{Role, User, UserId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Length of generated signing secrets in bytes
const GENERATED_SECRET_BYTES: usize = 64;

/// Kind of token, carried in the `typ` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub typ: TokenType,
    /// Unique token ID
    pub jti: Uuid,
    pub iss: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl Claims {
    fn new(user: &User, typ: TokenType, ttl: Duration, issuer: &str) -> Self {
        let now = Utc::now();

        Self {
            sub: user.id().to_string(),
            email: user.email().as_str().to_string(),
            role: user.role(),
            typ,
            jti: Uuid::new_v4(),
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Parse the subject as a user ID
    pub fn user_id(&self) -> Result<UserId, DomainError> {
        self.sub
            .parse()
            .map_err(|_| DomainError::authentication("Invalid token subject"))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A signed token together with its claims
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[hidden]")
            .field("refresh_secret", &"[hidden]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// Build from settings, generating per-process secrets when unset
    pub fn from_settings(auth: &AuthConfig) -> Result<Self, DomainError> {
        Ok(Self {
            access_secret: secret_or_generated(auth.access_secret.as_deref(), "access"),
            refresh_secret: secret_or_generated(auth.refresh_secret.as_deref(), "refresh"),
            access_ttl: ttl_from_secs(auth.access_ttl_secs, "auth.access_ttl_secs")?,
            refresh_ttl: ttl_from_secs(auth.refresh_ttl_secs, "auth.refresh_ttl_secs")?,
            issuer: auth.issuer.clone(),
        })
    }
}

fn ttl_from_secs(secs: u64, key: &str) -> Result<Duration, DomainError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| {
            DomainError::configuration(format!("{} must be a positive number of seconds, got {}", key, secs))
        })
}

fn secret_or_generated(secret: Option<&str>, kind: &str) -> String {
    match secret.map(str::trim).filter(|s| !s.is_empty()) {
        Some(secret) => secret.to_string(),
        None => {
            tracing::warn!(
                kind,
                "No {} token secret configured, generated a random one; tokens will not survive a restart",
                kind
            );
            generate_secret()
        }
    }
}

/// Random URL-safe signing secret
pub fn generate_secret() -> String {
    let mut bytes = [0u8; GENERATED_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issues and verifies access and refresh tokens
#[cfg_attr(test, automock)]
pub trait TokenIssuer: Send + Sync + Debug {
    fn issue_access(&self, user: &User) -> Result<IssuedToken, DomainError>;

    fn issue_refresh(&self, user: &User) -> Result<IssuedToken, DomainError>;

    fn verify_access(&self, token: &str) -> Result<Claims, DomainError>;

    fn verify_refresh(&self, token: &str) -> Result<Claims, DomainError>;

    /// Access token lifetime in seconds
    fn access_ttl_secs(&self) -> i64;

    /// Refresh token lifetime in seconds
    fn refresh_ttl_secs(&self) -> i64;
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// HS256 JWT service with separate access and refresh secrets
pub struct JwtService {
    config: JwtConfig,
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            access_keys: SigningKeys::from_secret(&config.access_secret),
            refresh_keys: SigningKeys::from_secret(&config.refresh_secret),
            validation,
            config,
        }
    }

    fn keys(&self, typ: TokenType) -> &SigningKeys {
        match typ {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    fn issue(&self, user: &User, typ: TokenType) -> Result<IssuedToken, DomainError> {
        let ttl = match typ {
            TokenType::Access => self.config.access_ttl,
            TokenType::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims::new(user, typ, ttl, &self.config.issuer);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys(typ).encoding)
            .map_err(|e| DomainError::internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    fn verify(&self, token: &str, typ: TokenType) -> Result<Claims, DomainError> {
        let data = decode::<Claims>(token, &self.keys(typ).decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::authentication("Token has expired"),
                _ => DomainError::authentication("Invalid token"),
            },
        )?;

        if data.claims.typ != typ {
            return Err(DomainError::authentication("Invalid token type"));
        }

        Ok(data.claims)
    }
}

impl TokenIssuer for JwtService {
    fn issue_access(&self, user: &User) -> Result<IssuedToken, DomainError> {
        self.issue(user, TokenType::Access)
    }

    fn issue_refresh(&self, user: &User) -> Result<IssuedToken, DomainError> {
        self.issue(user, TokenType::Refresh)
    }

    fn verify_access(&self, token: &str) -> Result<Claims, DomainError> {
        self.verify(token, TokenType::Access)
    }

    fn verify_refresh(&self, token: &str) -> Result<Claims, DomainError> {
        self.verify(token, TokenType::Refresh)
    }

    fn access_ttl_secs(&self) -> i64 {
        self.config.access_ttl.num_seconds()
    }

    fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_ttl.num_seconds()
    }
}
