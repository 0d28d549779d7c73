//! Wheel handling: location, extraction, packaging, and filename parsing.
//!
//! # Sub-modules
//!
//! - [`locator`] - Unique wheel lookup by name and version pattern.
//! - [`extraction`] - ZIP extraction with path traversal protection.
//! - [`packaging`] - Deterministic, atomically written wheel archives.
//! - [`packaging_error`] - Error types for packaging operations.
//! - [`record`] - `*.dist-info/RECORD` digest refresh.
//! - [`wheel_filename`] - Wheel filename and compatibility tag parsing.

pub mod extraction;
pub mod locator;
pub mod packaging;
pub mod packaging_error;
pub mod record;
pub mod wheel_filename;

/// File extension shared by every wheel.
pub const WHEEL_EXTENSION: &str = "whl";
