//! Common utilities for the Amphora pipeline.
//!
//! This crate provides shared infrastructure used by all pipeline components:
//! - **Warning System** - deduplicated colored terminal output for degraded
//!   behavior (skipped sanitizers, remote-config fallback, cache misses)
//! - **URL Helpers** - scheme extraction and protocol checks for URL-valued
//!   attributes

pub mod url;
pub mod warning;
