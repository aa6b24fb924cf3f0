//! DBH Common Library
//!
//! Shared types and utilities for the DBH workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all DBH workspace members:
//!
//! - **Logging**: Centralized `tracing` subscriber initialization
//! - **Types**: Shared domain types, most importantly [`Hostname`]
//!
//! # Example
//!
//! ```
//! use dbh_common::Hostname;
//!
//! let host = Hostname::parse("EXAMPLE.COM.\tNS\tns1.example.net.").unwrap();
//! assert_eq!(host.as_str(), "example.com");
//! ```

pub mod logging;
pub mod types;

// Re-export commonly used types
pub use types::Hostname;
