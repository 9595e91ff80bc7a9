//! # TBS Common
//!
//! Types shared by every crate of the trading bot supervisor: the error
//! taxonomy, the two supervised roles, and TCP port ranges.

pub mod errors;
pub mod types;

pub use errors::{SupervisorError, SupervisorResult};
pub use types::{PortRange, Role};
