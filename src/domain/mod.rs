//! Domain layer: entity kinds and backend document shapes.

pub mod entities;
pub mod error;
pub mod types;
