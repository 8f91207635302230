//! Middleware for the Stockroom backend

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
