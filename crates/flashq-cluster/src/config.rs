//! Controller-tunable configuration.
//!
//! Loading this from a file is out of scope; callers own that. This
//! struct only carries the one knob the controller itself needs.

use serde::{Deserialize, Serialize};

/// Tunables for the partition controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Upper bound on iterations of the elect-leader retry loop. Without
    /// a cap the loop could spin forever under sustained write
    /// contention; once exhausted, the attempt surfaces
    /// `StateChangeFailed` instead.
    pub max_election_retries: u32,
}

impl ControllerConfig {
    pub fn new(max_election_retries: u32) -> Self {
        Self { max_election_retries }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_election_retries: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.max_election_retries, 10);
    }

    #[test]
    fn test_custom_config() {
        let config = ControllerConfig::new(3);
        assert_eq!(config.max_election_retries, 3);
    }
}
