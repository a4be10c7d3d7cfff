//! vstage Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared helpers used by every vstage workspace member.
//!
//! # Overview
//!
//! - **Error Handling**: [`VstageError`] and the [`Result`] alias
//! - **Identifiers**: lenient UUID parsing for operator-supplied filters
//! - **Storage keys**: object-key extraction from stored image URLs
//! - **Logging**: `tracing` subscriber bootstrap shared by the server and CLI
//!
//! # Example
//!
//! ```
//! use vstage_common::{ids::parse_uuid, keys::extract_key};
//!
//! let id = parse_uuid("550e8400-e29b-41d4-a716-446655440000").unwrap();
//! assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
//!
//! let key = extract_key("http://localhost:9000/bucket/uploads/test.jpg").unwrap();
//! assert_eq!(key, "uploads/test.jpg");
//! ```

pub mod error;
pub mod ids;
pub mod keys;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, VstageError};
