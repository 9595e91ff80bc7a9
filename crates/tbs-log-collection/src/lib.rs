//! # TBS Log Collection
//!
//! Captured process output for the supervisor.
//!
//! Each role's combined stdout/stderr goes to one plain-text file that is
//! truncated at every launch. This crate owns:
//! - Creating and truncating the per-role log file
//! - Reading it back for readiness scanning
//! - Tailing it for failure reports
//! - Stripping terminal colour codes from captured lines

pub mod ansi;
pub mod role_log;

// Re-export main types
pub use ansi::AnsiFilter;
pub use role_log::RoleLog;
