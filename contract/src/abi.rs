//! The contract interface descriptor.
//!
//! A JSON ABI loaded at startup from a file next to the page. Both a bare ABI
//! array and a build artifact object carrying an `abi` field are accepted.

use alloy_json_abi::{Function, JsonAbi};
use std::path::Path;

use crate::error::ContractError;

/// Machine-readable description of the contract's callable operations.
///
/// The default descriptor is empty: every operation is reported missing.
#[derive(Clone, Debug, Default)]
pub struct InterfaceDescriptor {
    abi: JsonAbi,
}

impl InterfaceDescriptor {
    pub fn from_json_str(s: &str) -> Result<Self, ContractError> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| ContractError::InvalidDescriptor(e.to_string()))?;
        let abi_value = match value {
            serde_json::Value::Object(mut artifact) => artifact.remove("abi").ok_or_else(|| {
                ContractError::InvalidDescriptor("object without 'abi' field".into())
            })?,
            other => other,
        };
        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| ContractError::InvalidDescriptor(e.to_string()))?;
        Ok(Self { abi })
    }

    pub fn from_file(path: &Path) -> Result<Self, ContractError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContractError::InvalidDescriptor(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Look up a function by name. Overloads resolve to the first declaration.
    pub fn function(&self, name: &str) -> Result<&Function, ContractError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ContractError::MissingMethod(name.to_string()))
    }

    /// Whether the interface exposes a function with this name.
    pub fn supports(&self, name: &str) -> bool {
        self.function(name).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.abi.functions().next().is_none()
    }
}
