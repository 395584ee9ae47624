// crates/autonomy-kernel-config/src/config.rs
// ============================================================================
// Module: Autonomy Kernel Configuration
// Description: Configuration loading and validation for the autonomy kernel.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: autonomy-kernel-core, autonomy-kernel-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `AUTONOMY_KERNEL_CONFIG`, then
//! `autonomy-kernel.toml` in the working directory. Every section has
//! defaults, so an empty file is a valid in-memory configuration. Missing or
//! invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use autonomy_kernel_core::HashDigest;
use autonomy_kernel_core::SigningAlgorithm;
use autonomy_kernel_core::ToolName;
use autonomy_kernel_core::runtime::Ed25519Verifier;
use autonomy_kernel_store_sqlite::SqliteStoreConfig;
use autonomy_kernel_store_sqlite::SqliteStoreMode;
use autonomy_kernel_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "autonomy-kernel.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AUTONOMY_KERNEL_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of prohibited tool entries.
pub(crate) const MAX_PROHIBITED_TOOLS: usize = 256;
/// Maximum length of a tool name, tenant, or key identifier.
pub(crate) const MAX_NAME_LENGTH: usize = 128;
/// Default tenant charged when a decision names none.
pub(crate) const DEFAULT_TENANT: &str = "system";
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Autonomy kernel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelConfig {
    /// Envelope validator configuration.
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Gated executor configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Receipt and outbox store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Artifact store configuration.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Trusted signer configuration.
    #[serde(default)]
    pub signer: SignerConfig,
    /// Path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl KernelConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validator.validate()?;
        self.executor.validate()?;
        self.store.validate()?;
        self.artifacts.validate()?;
        self.audit.validate()?;
        self.signer.validate()?;
        Ok(())
    }
}

/// Envelope validator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    /// Signing algorithms accepted on envelope attestations.
    #[serde(default = "default_allowed_algorithms")]
    pub allowed_algorithms: Vec<SigningAlgorithm>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_algorithms: default_allowed_algorithms(),
        }
    }
}

impl ValidatorConfig {
    /// Validates the accepted algorithm list.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::Invalid(
                "validator.allowed_algorithms must not be empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for algorithm in &self.allowed_algorithms {
            if !seen.insert(*algorithm) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate validator.allowed_algorithms entry: {}",
                    algorithm.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Gated executor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// Phenotype hash every decision must declare, when set.
    #[serde(default)]
    pub active_phenotype_hash: Option<String>,
    /// Tools refused regardless of authorization.
    #[serde(default)]
    pub prohibited_tools: Vec<String>,
    /// Tenant charged when a decision does not name one.
    #[serde(default = "default_tenant")]
    pub default_tenant: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            active_phenotype_hash: None,
            prohibited_tools: Vec::new(),
            default_tenant: default_tenant(),
        }
    }
}

impl ExecutorConfig {
    /// Returns the prohibited tools as typed names.
    #[must_use]
    pub fn prohibited_tool_names(&self) -> Vec<ToolName> {
        self.prohibited_tools.iter().map(|tool| ToolName::new(tool.as_str())).collect()
    }

    /// Validates executor policy settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hash) = &self.active_phenotype_hash {
            HashDigest::parse_prefixed(hash).map_err(|_| {
                ConfigError::Invalid(
                    "executor.active_phenotype_hash must be sha256:<64 hex>".to_string(),
                )
            })?;
        }
        if self.prohibited_tools.len() > MAX_PROHIBITED_TOOLS {
            return Err(ConfigError::Invalid("executor.prohibited_tools exceeds limit".to_string()));
        }
        let mut seen = BTreeSet::new();
        for tool in &self.prohibited_tools {
            validate_name("executor.prohibited_tools", tool)?;
            if !seen.insert(tool.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate executor.prohibited_tools entry: {tool}"
                )));
            }
        }
        validate_name("executor.default_tenant", &self.default_tenant)
    }
}

/// Receipt and outbox store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` store config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store backend settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_field("store.path", path)?;
                if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
                    return Err(ConfigError::Invalid(format!(
                        "store.busy_timeout_ms must be between 1 and {MAX_BUSY_TIMEOUT_MS}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Receipt and outbox store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory stores.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Artifact store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactsConfig {
    /// Artifact backend type.
    #[serde(rename = "type", default)]
    pub artifact_type: ArtifactStoreType,
    /// Root directory when using the file backend.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl ArtifactsConfig {
    /// Validates artifact backend settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.artifact_type, &self.root) {
            (ArtifactStoreType::Memory, Some(_)) => {
                Err(ConfigError::Invalid("memory artifacts must not set root".to_string()))
            }
            (ArtifactStoreType::Memory, None) => Ok(()),
            (ArtifactStoreType::File, Some(root)) => validate_path_field("artifacts.root", root),
            (ArtifactStoreType::File, None) => {
                Err(ConfigError::Invalid("file artifacts require root".to_string()))
            }
        }
    }
}

/// Artifact store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStoreType {
    /// Keep artifacts in memory.
    #[default]
    Memory,
    /// Content-addressed files under a root directory.
    File,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: AuditSinkType,
    /// Log file path when using the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::File, Some(path)) => validate_path_field("audit.path", path),
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

/// Audit sink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON lines file.
    File,
    /// Discard audit events.
    #[serde(rename = "none")]
    Disabled,
}

/// Trusted signer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignerConfig {
    /// Key identifier recorded in signature types.
    #[serde(default)]
    pub key_id: Option<String>,
    /// Hex-encoded Ed25519 public key used to verify signed records.
    #[serde(default)]
    pub public_key_hex: Option<String>,
}

impl SignerConfig {
    /// Builds a verifier from the configured public key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the key does not decode to a
    /// valid Ed25519 point.
    pub fn verifier(&self) -> Result<Option<Ed25519Verifier>, ConfigError> {
        self.public_key_hex
            .as_deref()
            .map(|hex| {
                Ed25519Verifier::from_public_key_hex(hex).map_err(|err| {
                    ConfigError::Invalid(format!("signer.public_key_hex is invalid: {err}"))
                })
            })
            .transpose()
    }

    /// Validates signer settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(key_id) = &self.key_id {
            validate_name("signer.key_id", key_id)?;
        }
        if let Some(hex) = &self.public_key_hex {
            let well_formed = hex.len() == 64
                && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
            if !well_formed {
                return Err(ConfigError::Invalid(
                    "signer.public_key_hex must be 64 lowercase hex characters".to_string(),
                ));
            }
            self.verifier()?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns every recognized signing algorithm.
fn default_allowed_algorithms() -> Vec<SigningAlgorithm> {
    SigningAlgorithm::ALL.to_vec()
}

/// Returns the default tenant.
fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

/// Returns the default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit path, the environment, or the default.
fn resolve_path(path: Option<&Path>, env_path: Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path field against length limits.
fn validate_path_field(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a short identifier: non-empty, trimmed, and bounded.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.trim() != value {
        return Err(ConfigError::Invalid(format!("{field} must be trimmed")));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let resolved =
            resolve_path(Some(Path::new("cli.toml")), Some("env.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("cli.toml"));
    }

    #[test]
    fn environment_wins_over_default() {
        let resolved = resolve_path(None, Some("env.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("env.toml"));
    }

    #[test]
    fn default_name_is_used_last() {
        assert_eq!(resolve_path(None, None).unwrap(), PathBuf::from(DEFAULT_CONFIG_NAME));
    }

    #[test]
    fn overlong_environment_path_is_rejected() {
        let long = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
        assert!(matches!(resolve_path(None, Some(long)), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn overlong_path_component_is_rejected() {
        let path = PathBuf::from("dir").join("b".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(validate_path(&path).is_err());
        assert!(validate_path_field("store.path", &path).is_err());
    }

    #[test]
    fn names_must_be_trimmed_and_bounded() {
        assert!(validate_name("field", "ok").is_ok());
        assert!(validate_name("field", " padded").is_err());
        assert!(validate_name("field", "").is_err());
        assert!(validate_name("field", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
