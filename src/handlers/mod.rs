// src/handlers/mod.rs

pub mod auth;
pub mod comments;
pub mod posts;
pub mod reactions;
pub mod users;
