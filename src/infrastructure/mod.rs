//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database connection pool and transaction management (PostgreSQL)
//! - Repository implementations
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod repositories;
