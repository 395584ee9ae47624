// crates/autonomy-kernel-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for autonomy-kernel-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use autonomy_kernel_config::ConfigError;
use autonomy_kernel_config::KernelConfig;

/// Result type for tests that report failures as strings.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `KernelConfig` without validation.
pub fn config_from_toml(toml_str: &str) -> Result<KernelConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<KernelConfig, toml::de::Error> {
    config_from_toml("")
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

/// Describes a load outcome for failure messages.
pub fn describe(result: Result<KernelConfig, ConfigError>) -> String {
    match result {
        Ok(_) => "a valid config".to_string(),
        Err(error) => error.to_string(),
    }
}
