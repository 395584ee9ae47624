//! Config defaults and section validation tests for autonomy-kernel-config.
// crates/autonomy-kernel-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults and Section Validation Tests
// Description: Validate default behavior and per-section invariants.
// Purpose: Ensure an empty config is valid and each section fails closed.
// =============================================================================

use autonomy_kernel_config::ArtifactStoreType;
use autonomy_kernel_config::AuditSinkType;
use autonomy_kernel_config::ConfigError;
use autonomy_kernel_config::KernelConfig;
use autonomy_kernel_config::StoreType;
use autonomy_kernel_core::SigningAlgorithm;
use autonomy_kernel_core::ToolName;
use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_store_sqlite::SqliteStoreMode;
use autonomy_kernel_store_sqlite::SqliteSyncMode;

mod common;

use common::TestResult;
use common::describe;
use common::assert_invalid;
use common::config_from_toml;
use common::minimal_config;

/// Tests that an empty file yields valid in-memory defaults.
#[test]
fn empty_config_is_valid_with_defaults() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.validator.allowed_algorithms != SigningAlgorithm::ALL.to_vec() {
        return Err("all algorithms should be accepted by default".to_string());
    }
    if config.executor.default_tenant != "system" {
        return Err("default tenant should be system".to_string());
    }
    if config.store.store_type != StoreType::Memory || config.store.busy_timeout_ms != 5_000 {
        return Err("store should default to memory with a 5000ms busy timeout".to_string());
    }
    if config.artifacts.artifact_type != ArtifactStoreType::Memory {
        return Err("artifacts should default to memory".to_string());
    }
    if config.audit.sink != AuditSinkType::Stderr {
        return Err("audit should default to stderr".to_string());
    }
    if config.store.sqlite_config().is_some() {
        return Err("memory store has no sqlite config".to_string());
    }
    Ok(())
}

/// Tests a fully populated config.
#[test]
fn full_config_parses_and_validates() -> TestResult {
    let signer = Ed25519Signer::from_secret_bytes("ops", &[3; 32]);
    let content = format!(
        r#"
[validator]
allowed_algorithms = ["ED25519"]

[executor]
active_phenotype_hash = "sha256:{phenotype}"
prohibited_tools = ["shell.exec", "net.raw"]
default_tenant = "acme"

[store]
type = "sqlite"
path = "state/kernel.db"
busy_timeout_ms = 2500
journal_mode = "delete"
sync_mode = "normal"

[artifacts]
type = "file"
root = "state/blobs"

[audit]
sink = "file"
path = "state/audit.jsonl"

[signer]
key_id = "ops"
public_key_hex = "{public_key}"
"#,
        phenotype = "ab".repeat(32),
        public_key = signer.public_key_hex(),
    );
    let config = KernelConfig::from_toml_str(&content).map_err(|err| err.to_string())?;
    if config.validator.allowed_algorithms != vec![SigningAlgorithm::Ed25519] {
        return Err("allowed algorithms not parsed".to_string());
    }
    if config.executor.prohibited_tool_names()
        != vec![ToolName::new("shell.exec"), ToolName::new("net.raw")]
    {
        return Err("prohibited tools not parsed".to_string());
    }
    let sqlite = config.store.sqlite_config().ok_or("sqlite config missing")?;
    if sqlite.journal_mode != SqliteStoreMode::Delete
        || sqlite.sync_mode != SqliteSyncMode::Normal
        || sqlite.busy_timeout_ms != 2_500
    {
        return Err("sqlite pragmas not carried into store config".to_string());
    }
    if config.audit.sink != AuditSinkType::File {
        return Err("audit sink not parsed".to_string());
    }
    let verifier = config.signer.verifier().map_err(|err| err.to_string())?;
    if verifier.is_none() {
        return Err("signer verifier missing".to_string());
    }
    Ok(())
}

/// Tests that unknown algorithm tokens fail at parse time.
#[test]
fn unknown_algorithm_is_a_parse_error() -> TestResult {
    match KernelConfig::from_toml_str("[validator]\nallowed_algorithms = [\"MD5-RSA\"]\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {}", describe(other))),
    }
}

/// Tests that the algorithm list may not be empty or repeat entries.
#[test]
fn algorithm_list_must_be_non_empty_and_unique() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.validator.allowed_algorithms = Vec::new();
    assert_invalid(config.validate(), "allowed_algorithms must not be empty")?;
    config.validator.allowed_algorithms = vec![SigningAlgorithm::Ed25519, SigningAlgorithm::Ed25519];
    assert_invalid(config.validate(), "duplicate validator.allowed_algorithms entry: ED25519")?;
    Ok(())
}

/// Tests phenotype hash format checks.
#[test]
fn phenotype_hash_must_be_prefixed_sha256() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.executor.active_phenotype_hash = Some("abc123".to_string());
    assert_invalid(config.validate(), "active_phenotype_hash")?;
    config.executor.active_phenotype_hash = Some(format!("sha256:{}", "AB".repeat(32)));
    assert_invalid(config.validate(), "active_phenotype_hash")?;
    config.executor.active_phenotype_hash = Some(format!("sha256:{}", "0f".repeat(32)));
    config.validate().map_err(|err| err.to_string())
}

/// Tests prohibited tool entry rules.
#[test]
fn prohibited_tools_must_be_trimmed_and_unique() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.executor.prohibited_tools = vec![" shell.exec".to_string()];
    assert_invalid(config.validate(), "executor.prohibited_tools must be trimmed")?;
    config.executor.prohibited_tools = vec!["shell.exec".to_string(), "shell.exec".to_string()];
    assert_invalid(config.validate(), "duplicate executor.prohibited_tools entry: shell.exec")?;
    config.executor.prohibited_tools = vec![String::new()];
    assert_invalid(config.validate(), "executor.prohibited_tools must be non-empty")?;
    Ok(())
}

/// Tests that the default tenant may not be blank.
#[test]
fn default_tenant_must_be_non_empty() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.executor.default_tenant = "  ".to_string();
    assert_invalid(config.validate(), "executor.default_tenant must be non-empty")
}

/// Tests store backend path requirements.
#[test]
fn store_backend_path_rules() -> TestResult {
    let config = config_from_toml("[store]\ntype = \"sqlite\"\n").map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "sqlite store requires path")?;
    let config = config_from_toml("[store]\npath = \"kernel.db\"\n").map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "memory store must not set path")?;
    let config = config_from_toml("[store]\ntype = \"sqlite\"\npath = \"kernel.db\"\nbusy_timeout_ms = 0\n")
        .map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "store.busy_timeout_ms")?;
    Ok(())
}

/// Tests artifact backend root requirements.
#[test]
fn artifact_backend_root_rules() -> TestResult {
    let config = config_from_toml("[artifacts]\ntype = \"file\"\n").map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "file artifacts require root")?;
    let config = config_from_toml("[artifacts]\nroot = \"blobs\"\n").map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "memory artifacts must not set root")?;
    Ok(())
}

/// Tests audit sink path requirements, including the `none` sink.
#[test]
fn audit_sink_path_rules() -> TestResult {
    let config = config_from_toml("[audit]\nsink = \"file\"\n").map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "file audit sink requires path")?;
    let config = config_from_toml("[audit]\nsink = \"none\"\npath = \"audit.jsonl\"\n")
        .map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "audit.path is only valid for the file sink")?;
    let config = config_from_toml("[audit]\nsink = \"none\"\n").map_err(|err| err.to_string())?;
    if config.audit.sink != AuditSinkType::Disabled {
        return Err("none should parse as the disabled sink".to_string());
    }
    config.validate().map_err(|err| err.to_string())
}

/// Tests signer public key format and point validity.
#[test]
fn signer_public_key_rules() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.signer.public_key_hex = Some("abcd".to_string());
    assert_invalid(config.validate(), "64 lowercase hex characters")?;
    config.signer.public_key_hex = Some("AB".repeat(32));
    assert_invalid(config.validate(), "64 lowercase hex characters")?;
    config.signer.public_key_hex = None;
    config.signer.key_id = Some(String::new());
    assert_invalid(config.validate(), "signer.key_id must be non-empty")?;
    Ok(())
}
