//! # TBS Process
//!
//! Low-level process operations for the supervisor.
//!
//! This crate provides Unix primitives for:
//! - Process existence verification (zombie-aware on Linux)
//! - Graceful and forced termination
//! - Background launch with output captured to a file
//! - Mapping listening TCP ports to their owning processes
//! - The [`ProcessHandle`] seam shared by tear-down and port reclamation

pub mod check;
pub mod execute;
pub mod handle;
pub mod ports;
pub mod stop;
pub mod terminate;

// Re-export main types
pub use check::*;
pub use execute::*;
pub use handle::*;
pub use ports::*;
pub use stop::*;
pub use terminate::*;
