//! Lens module
//!
//! Lenses combine business logic with output formatting so the same
//! operation can back the CLI or be called as a library.
//!
//! # Architecture
//!
//! Each lens module exports:
//! - A **Lens struct** (e.g., `VerifyLens`) - the main entry point for all operations
//! - **Options/Args structs** - input arguments for lens methods
//! - **Output types** - return types and format enums
//!
//! # Usage
//!
//! ```rust,ignore
//! use geofeed_verifier::lens::verify::{VerifyLens, VerifyOptions};
//! use geofeed_verifier::lens::utils::OutputFormat;
//! ```

pub mod utils;

// VerifyLens - geofeed verification against an authoritative database
pub mod verify;
