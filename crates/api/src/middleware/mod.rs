//! Request extractors that gate write access.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.

pub mod auth;
