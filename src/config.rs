//! Runtime configuration
//!
//! Settings are owned by the runtime root context and read by every context in
//! the tree through [`ExecutionContext::config`](crate::context::ExecutionContext::config).

use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// Behavioural switches for resolution and binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Treat keys holding `null` as absent during unqualified lookups
    pub null_is_undefined: bool,

    /// Store the coerced value of a typed argument instead of the raw one
    pub strict_argument_types: bool,

    /// Seed the key interner with well-known names at runtime creation
    pub preintern_common_keys: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            null_is_undefined: false,
            strict_argument_types: true,
            preintern_common_keys: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from a JSON document; missing fields keep defaults
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        serde_json::from_str(json).map_err(|e| RuntimeError::Config {
            message: e.to_string(),
        })
    }

    /// Render configuration as pretty JSON
    pub fn to_json(&self) -> RuntimeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RuntimeError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "nullIsUndefined": true }"#).unwrap();

        assert!(config.null_is_undefined);
        assert!(config.strict_argument_types);
        assert!(config.preintern_common_keys);
    }

    #[test]
    fn test_round_trip_and_rejection() {
        let config = RuntimeConfig {
            strict_argument_types: false,
            ..RuntimeConfig::default()
        };
        let parsed = RuntimeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);

        assert!(matches!(
            RuntimeConfig::from_json("{ not json"),
            Err(RuntimeError::Config { .. })
        ));
    }
}
