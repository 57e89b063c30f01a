//! Infrastructure layer - storage adapters, services and observability

pub mod auth;
pub mod logging;
pub mod observability;
pub mod storage;
pub mod team;
pub mod user;
