//! Business logic services.

pub mod auth;
pub mod crud;
pub mod dashboard;
pub mod stories;
pub mod users;
