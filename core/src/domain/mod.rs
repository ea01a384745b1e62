//! Domain layer: value types shared by the gatekeeping services.

pub mod entities;

pub use entities::{ClientKey, SessionClaims, SubjectId, TokenClaims};
