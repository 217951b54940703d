//! Data models for the ServiceNow Table API.
//!
//! This module contains the response envelope, candidate records used by the
//! application matcher, and the user/role/group models used by identity checks.

mod common;
mod record;
mod user;

pub use common::*;
pub use record::*;
pub use user::*;
