//! Utility modules for posttime.
//!
//! # Available Utilities
//!
//! - [`datetime`] - Parsing post timestamps and rendering long-form dates

pub mod datetime;
