//! Common library for the Access Desk application
//!
//! This crate provides shared functionality used across the services of the
//! Access Desk application: database connectivity, error handling, and the
//! closed domain enumerations every service agrees on.

pub mod database;
pub mod error;
pub mod types;

pub use types::{AccessLevel, RequestStatus, UserRole};
