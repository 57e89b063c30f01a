//! Authentication domain: refresh token records and their storage port

mod entity;
mod repository;

pub use entity::RefreshToken;
pub use repository::RefreshTokenRepository;

#[cfg(test)]
pub use repository::MockRefreshTokenRepository;
