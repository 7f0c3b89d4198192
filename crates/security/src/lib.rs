//! Safety policies for Parlor.
//!
//! Provides:
//! - **Content filter**: detects and redacts off-platform references and
//!   in-person meeting suggestions in generated replies

pub mod filter;

pub use filter::{ContentFilter, FilterError, FilterReport, Violation, ViolationKind};
