//! Readiness detection from captured output.
//!
//! A dev server does not know its port until it binds, so readiness is read
//! from its log: a marker line such as `ready in 500 ms` and a line like
//! `Local:   http://localhost:5174/` carrying the bound port.

use regex::Regex;
use tbs_log_collection::AnsiFilter;

/// What the log says once the marker has appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSignal {
    /// Port from the local-address line, if one could be parsed.
    pub port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct ReadinessScanner {
    ready_marker: String,
    local_marker: String,
    local_url: Regex,
    ansi: AnsiFilter,
}

impl ReadinessScanner {
    pub fn new(
        ready_marker: impl Into<String>,
        local_marker: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            ready_marker: ready_marker.into(),
            local_marker: local_marker.into(),
            local_url: Regex::new(r"https?://(?:localhost|127\.0\.0\.1|\[::1\]):(\d+)")?,
            ansi: AnsiFilter::new()?,
        })
    }

    /// `None` until a line contains the ready marker.
    ///
    /// Once ready, the port comes from the first line containing the local
    /// marker followed by a loopback URL. Lines are compared with colour
    /// codes removed.
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> Option<ReadinessSignal> {
        let clean: Vec<_> = lines.iter().map(|l| self.ansi.strip(l.as_ref())).collect();

        if !clean.iter().any(|line| line.contains(&self.ready_marker)) {
            return None;
        }

        Some(ReadinessSignal {
            port: clean.iter().find_map(|line| self.extract_port(line)),
        })
    }

    fn extract_port(&self, line: &str) -> Option<u16> {
        let (_, after) = line.split_once(&self.local_marker)?;
        self.local_url
            .captures(after)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }
}
