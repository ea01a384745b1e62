//! Route handlers
//!
//! - `health` - liveness probe, rate limited only
//! - `account` - current subject, profile page and logout
//! - `catalog` - book listing that works with or without a session

pub mod account;
pub mod catalog;
pub mod health;
