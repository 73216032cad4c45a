//! Core domain types and logic.

pub mod error;
pub mod measure;
pub mod resolver;
pub mod settings;
pub mod stock;
