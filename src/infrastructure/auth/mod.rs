//! Authentication infrastructure module
//!
//! JWT issuance, refresh token storage and the authentication service.

mod jwt;
mod postgres_repository;
mod repository;
mod service;
mod token_hash;

pub use jwt::{generate_secret, Claims, IssuedToken, JwtConfig, JwtService, TokenIssuer, TokenType};
pub use postgres_repository::PostgresRefreshTokenRepository;
pub use repository::InMemoryRefreshTokenRepository;
pub use service::{run_purge_task, AuthService, LoginResult, TokenPair};
pub use token_hash::{hash_token, verify_token_hash};

#[cfg(test)]
pub use jwt::MockTokenIssuer;
