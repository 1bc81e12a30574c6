//! Decoding limits and configuration

use crate::error::{PageError, Result};

/// Limits applied while decoding a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum structural nesting depth (default: 128, hard: 1,024)
    pub max_nesting_depth: usize,
    /// Maximum encoded size of a single scanned element (default: 16 MiB, hard: 256 MiB)
    pub max_element_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
            max_element_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Hard maximum limits that cannot be exceeded
    pub fn hard_maximums() -> Self {
        Self {
            max_nesting_depth: 1_024,
            max_element_bytes: 256 * 1024 * 1024,
        }
    }

    /// Validate limits against hard maximums
    pub fn validate(&self) -> Result<()> {
        let hard = Self::hard_maximums();

        if self.max_nesting_depth == 0 || self.max_nesting_depth > hard.max_nesting_depth {
            return Err(PageError::InvalidConfig(format!(
                "max_nesting_depth {} must be within 1..={}",
                self.max_nesting_depth, hard.max_nesting_depth
            )));
        }

        if self.max_element_bytes == 0 || self.max_element_bytes > hard.max_element_bytes {
            return Err(PageError::InvalidConfig(format!(
                "max_element_bytes {} must be within 1..={}",
                self.max_element_bytes, hard.max_element_bytes
            )));
        }

        Ok(())
    }
}
