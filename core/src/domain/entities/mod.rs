//! Domain entities.

pub mod client_key;
pub mod session;

pub use client_key::ClientKey;
pub use session::{SessionClaims, SubjectId, TokenClaims};
