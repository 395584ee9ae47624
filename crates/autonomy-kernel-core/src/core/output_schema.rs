// crates/autonomy-kernel-core/src/core/output_schema.rs
// ============================================================================
// Module: Tool Output Schemas
// Description: Pinned output contracts for tool drivers.
// Purpose: Describe the shape a connector must return so drift is detectable.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A tool's output contract is pinned either as a compact field list
//! ([`ToolOutputSchema`]) or as a full JSON Schema document. The executor
//! checks raw driver output against the pinned contract before the output is
//! canonicalized and stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Field Contracts
// ============================================================================

/// JSON type expected for an output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// Any JSON value.
    Any,
}

impl FieldType {
    /// Returns true when `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }

    /// Returns the JSON type name of a value.
    #[must_use]
    pub const fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Contract for one output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Expected type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
}

/// Compact field-list contract for a tool's output object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolOutputSchema {
    /// Field contracts by name.
    pub fields: BTreeMap<String, FieldSpec>,
    /// Whether fields outside `fields` are tolerated.
    #[serde(default)]
    pub allow_extra: bool,
}

// ============================================================================
// SECTION: Pinned Schema
// ============================================================================

/// Output contract pinned for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "schema", rename_all = "snake_case")]
pub enum OutputSchema {
    /// Compact field-list contract.
    Fields(ToolOutputSchema),
    /// JSON Schema (Draft 2020-12) document.
    JsonSchema(Value),
}
