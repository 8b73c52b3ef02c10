//! Request extractors and the authorization policy.

pub mod auth;
pub mod rbac;
