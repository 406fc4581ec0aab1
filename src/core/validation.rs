//! Validation for object names
//!
//! Names are stored in the head cluster's reserved header region, so their
//! length is bounded, and they are compared against slash-separated path
//! components, so they can never contain the separator.

use crate::core::error::{ClusterError, Result};
use crate::core::header::MAX_NAME_LEN;
use regex::Regex;
use std::sync::OnceLock;

/// A validated object name
///
/// # Rules
/// - At least one byte, at most [`MAX_NAME_LEN`] bytes
/// - No `/` and no NUL (a single trailing NUL is accepted and dropped)
/// - Not `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName(String);

impl NodeName {
    /// Any run of bytes other than the separator and NUL
    const PATTERN: &'static str = r"^[^/\x00]+$";

    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut name = name.into();
        if name.ends_with('\0') {
            name.pop();
        }
        Self::validate_name(&name)?;
        Ok(NodeName(name))
    }

    fn pattern() -> Result<&'static Regex> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        if let Some(re) = PATTERN.get() {
            return Ok(re);
        }
        let re = Regex::new(Self::PATTERN).map_err(|e| ClusterError::InvalidName(e.to_string()))?;
        Ok(PATTERN.get_or_init(|| re))
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ClusterError::InvalidName(
                "name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_NAME_LEN {
            return Err(ClusterError::InvalidName(format!(
                "name too long ({} bytes, max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }

        if !Self::pattern()?.is_match(name) {
            return Err(ClusterError::InvalidName(format!(
                "'{}' must not contain '/' or NUL",
                name.escape_debug()
            )));
        }

        if name == "." || name == ".." {
            return Err(ClusterError::InvalidName(format!(
                "'{}' is reserved",
                name
            )));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for NodeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
