//! Core domain types used throughout the supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a supervised process.
///
/// The supervisor manages exactly one process per role. Bring-up order is
/// `Backend` then `Frontend`; [`Role::ALL`] preserves that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// API server on a fixed port with an HTTP health endpoint.
    Backend,
    /// Dev server on the first free port of a small range.
    Frontend,
}

impl Role {
    /// Both roles in bring-up order.
    pub const ALL: [Role; 2] = [Role::Backend, Role::Frontend];

    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Backend => "backend",
            Role::Frontend => "frontend",
        }
    }

    /// Key under which this role's pid is persisted.
    pub fn state_key(&self) -> &'static str {
        match self {
            Role::Backend => "BACKEND_PID",
            Role::Frontend => "FRONTEND_PID",
        }
    }

    /// Inverse of [`Role::state_key`].
    pub fn from_state_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.state_key() == key)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive, contiguous range of TCP ports.
///
/// # Example
/// ```
/// use tbs_common::PortRange;
///
/// let range = PortRange::new(5173, 5179);
/// assert_eq!(range.len(), 7);
/// assert!(range.contains(5174));
/// assert_eq!(range.first(), 5173);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one port.
    pub fn single(port: u16) -> Self {
        Self { start: port, end: port }
    }

    /// The default port of the range (first port wins).
    pub fn first(&self) -> u16 {
        self.start
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            usize::from(self.end - self.start) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
