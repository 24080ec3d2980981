//! `stockroom-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! token claims, verifies signatures, and defines the user record/contract.
//! Enforcing role policy per route is the API layer's job.

pub mod claims;
pub mod jwt;
pub mod roles;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use roles::Role;
pub use user::{User, UserStore};
