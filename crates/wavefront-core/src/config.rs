//! Engine tuning.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locate::DEFAULT_TOLERANCE;
use crate::transform::TrimPolicy;
use crate::types::VisualY;

/// Tunables for a [`WavefrontEngine`](crate::WavefrontEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// How close a projected row must be to the remembered frontier to count
    /// as a hit.
    pub tolerance: VisualY,
    /// Floor for a placeholder's reserved height.
    pub min_line_height: VisualY,
    /// Marker standing in for block boundaries in the transform payload.
    /// Must not be empty.
    pub line_break: String,
    pub trim: TrimPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            min_line_height: 21.0,
            line_break: "\n".to_string(),
            trim: TrimPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if !(self.min_line_height.is_finite() && self.min_line_height > 0.0) {
            return Err(ConfigError::LineHeight(self.min_line_height));
        }
        if self.line_break.is_empty() {
            return Err(ConfigError::LineBreak);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance, 5.0);
        assert_eq!(config.min_line_height, 21.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let config = EngineConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Tolerance(0.0)));

        let config = EngineConfig {
            min_line_height: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::LineHeight(_))));
    }

    #[test]
    fn test_rejects_empty_line_break() {
        let config = EngineConfig {
            line_break: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LineBreak));
    }
}
