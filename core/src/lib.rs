//! # Shelf Core
//!
//! Request gatekeeping logic for the Shelf backend: token buckets, the
//! visitor registry and its sweeper, and the session credential codec.
//! Nothing here knows about HTTP; the api crate adapts these types to
//! actix-web middleware.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
