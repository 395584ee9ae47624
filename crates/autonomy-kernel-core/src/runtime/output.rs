// crates/autonomy-kernel-core/src/runtime/output.rs
// ============================================================================
// Module: Tool Output Contracts
// Description: Drift detection and canonicalization of raw tool output.
// Purpose: Reject connector output that no longer matches its pinned contract.
// Dependencies: crate::{core, interfaces}, jsonschema, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`validate_and_canonicalize`] checks raw tool output against an optional
//! pinned [`OutputSchema`] and returns its RFC 8785 canonical bytes and
//! `sha256:` digest. Output must be a JSON object. Every failure carries a
//! stable `ERR_CONNECTOR_*` code so callers can classify drift.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;

use jsonschema::Draft;
use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::ToolName;
use crate::core::output_schema::FieldType;
use crate::core::output_schema::OutputSchema;
use crate::core::output_schema::ToolOutputSchema;
use crate::interfaces::OutputSchemaRegistry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Stable connector output failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputErrorCode {
    /// Output has fields or structure outside the contract.
    ContractDrift,
    /// Output is not an object or could not be canonicalized.
    CanonicalizationFailed,
    /// A required field is missing.
    MissingField,
    /// A field has the wrong JSON type.
    TypeMismatch,
}

impl OutputErrorCode {
    /// Returns the stable wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContractDrift => "ERR_CONNECTOR_CONTRACT_DRIFT",
            Self::CanonicalizationFailed => "ERR_CONNECTOR_OUTPUT_CANONICALIZATION_FAILED",
            Self::MissingField => "ERR_CONNECTOR_OUTPUT_MISSING_FIELD",
            Self::TypeMismatch => "ERR_CONNECTOR_OUTPUT_TYPE_MISMATCH",
        }
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connector output contract failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct OutputContractError {
    /// Failure code.
    pub code: OutputErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Offending field, when known.
    pub field: Option<String>,
}

impl OutputContractError {
    /// Builds an error.
    fn new(code: OutputErrorCode, message: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            code,
            message: message.into(),
            field: field.map(ToString::to_string),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Canonical form of validated tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalOutput {
    /// RFC 8785 canonical JSON bytes.
    pub canonical_bytes: Vec<u8>,
    /// `sha256:` digest of the canonical bytes.
    pub output_hash: String,
}

/// Validates output against an optional contract and canonicalizes it.
///
/// # Errors
///
/// Returns [`OutputContractError`] when the output is not an object, drifts
/// from the contract, or cannot be canonicalized.
pub fn validate_and_canonicalize(
    schema: Option<&OutputSchema>,
    output: &Value,
) -> Result<CanonicalOutput, OutputContractError> {
    let Some(object) = output.as_object() else {
        return Err(OutputContractError::new(
            OutputErrorCode::CanonicalizationFailed,
            format!("output must be a JSON object, got {}", FieldType::name_of(output)),
            None,
        ));
    };
    match schema {
        Some(OutputSchema::Fields(fields)) => check_fields(fields, object)?,
        Some(OutputSchema::JsonSchema(document)) => check_json_schema(document, output)?,
        None => {}
    }
    let canonical_bytes = canonical_json_bytes(output).map_err(|err| {
        OutputContractError::new(
            OutputErrorCode::CanonicalizationFailed,
            format!("canonicalization failed: {err}"),
            None,
        )
    })?;
    let output_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_bytes).prefixed();
    Ok(CanonicalOutput {
        canonical_bytes,
        output_hash,
    })
}

/// Checks a field-list contract.
fn check_fields(
    schema: &ToolOutputSchema,
    output: &serde_json::Map<String, Value>,
) -> Result<(), OutputContractError> {
    for (name, spec) in &schema.fields {
        match output.get(name) {
            None if spec.required => {
                return Err(OutputContractError::new(
                    OutputErrorCode::MissingField,
                    format!("required output field '{name}' is missing"),
                    Some(name),
                ));
            }
            Some(value) if !spec.field_type.matches(value) => {
                return Err(OutputContractError::new(
                    OutputErrorCode::TypeMismatch,
                    format!(
                        "output field '{name}' expected a different type, got {}",
                        FieldType::name_of(value)
                    ),
                    Some(name),
                ));
            }
            _ => {}
        }
    }
    if !schema.allow_extra
        && let Some(extra) = output.keys().find(|name| !schema.fields.contains_key(*name))
    {
        return Err(OutputContractError::new(
            OutputErrorCode::ContractDrift,
            format!("unexpected output field '{extra}'"),
            Some(extra),
        ));
    }
    Ok(())
}

/// Checks a JSON Schema contract.
fn check_json_schema(document: &Value, output: &Value) -> Result<(), OutputContractError> {
    let validator = jsonschema::options().with_draft(Draft::Draft202012).build(document).map_err(
        |err| {
            OutputContractError::new(
                OutputErrorCode::ContractDrift,
                format!("pinned output schema does not compile: {err}"),
                None,
            )
        },
    )?;
    let messages: Vec<String> = validator.iter_errors(output).map(|err| err.to_string()).collect();
    if messages.is_empty() {
        return Ok(());
    }
    Err(OutputContractError::new(
        OutputErrorCode::ContractDrift,
        format!("output does not match pinned schema: {}", messages.join("; ")),
        None,
    ))
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// In-memory output contract registry.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutputSchemaRegistry {
    /// Contracts keyed by tool.
    schemas: Arc<RwLock<BTreeMap<ToolName, OutputSchema>>>,
}

impl InMemoryOutputSchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins a contract for a tool, replacing any previous one.
    pub fn register(&self, tool: ToolName, schema: OutputSchema) {
        let mut guard = self.schemas.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.insert(tool, schema);
    }
}

impl OutputSchemaRegistry for InMemoryOutputSchemaRegistry {
    fn lookup_output(&self, tool: &ToolName) -> Option<OutputSchema> {
        let guard = self.schemas.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.get(tool).cloned()
    }
}
