//! Application services: query construction, read-through resolution and cache
//! invalidation.

pub mod assemble;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod flush;
pub mod query;
pub mod search;
