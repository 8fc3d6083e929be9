//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **Page**: Limit/offset pagination with clamping rules

mod page;

pub use page::*;
