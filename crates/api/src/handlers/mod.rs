//! Request handlers.
//!
//! `auth` owns the credential lifecycle (send-OTP, login, refresh, logout);
//! `users` covers profile and admin listing. Handlers delegate to the
//! repositories in `sesame_db` and the cache store, and map errors via
//! [`crate::error::AppError`].

pub mod auth;
pub mod users;
