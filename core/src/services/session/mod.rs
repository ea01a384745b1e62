//! Session credential codec
//!
//! Credentials are compact JWTs carrying the subject id and expiry, signed
//! with HMAC-SHA256 under the process-wide secret.

mod codec;
mod config;


pub use codec::SessionCodec;
pub use config::SessionCodecConfig;
