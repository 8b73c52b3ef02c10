//! Domain records and request/response DTOs.

pub mod pagination;
pub mod role;
pub mod story;
pub mod user;
