//! # Platform Service Library
//!
//! The messaging and calling backend of the platform:
//! - RESTful HTTP API for chats, messages and calls
//! - Real-time fan-out of chat messages and call signalling over WebSocket
//! - PostgreSQL for persistent storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database, repositories and metrics
//! - **Realtime Layer**: Connection registry, broadcast and connection pumps
//! - **Presentation Layer**: HTTP handlers and WebSocket upgrades
//!
//! ## Module Structure
//!
//! ```text
//! platform_service/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, repositories and metrics
//! +-- realtime/       Topic registries, fan-out and frame routing
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Realtime layer - Connection fan-out
pub mod realtime;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
