//! Core types and trait definitions for the Kahal community registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod catalog;
pub mod error;
pub mod notification;
pub mod person;
pub mod reciprocal;
pub mod relation;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
