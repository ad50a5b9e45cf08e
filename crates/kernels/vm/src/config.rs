//! Compiler limits.
//!
//! ```yaml
//! max_nesting_depth: 128
//! max_program_size: 65536
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Default bound on instructions per program.
pub const DEFAULT_MAX_PROGRAM_SIZE: usize = 1 << 20;

/// Limits applied while compiling a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Deepest node nesting the compiler accepts.
    ///
    /// Compilation recurses once per level, so this also bounds compiler
    /// stack use. Evaluation is iterative and unaffected.
    pub max_nesting_depth: usize,
    /// Most instructions a single program may hold.
    pub max_program_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_program_size: DEFAULT_MAX_PROGRAM_SIZE,
        }
    }
}

impl VmConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: VmConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_nesting_depth",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_program_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_program_size",
                message: "must be at least 1".to_string(),
            });
        }
        if u32::try_from(self.max_program_size).is_err() {
            return Err(ConfigError::Invalid {
                field: "max_program_size",
                message: format!("must not exceed {}", u32::MAX),
            });
        }
        Ok(())
    }
}
