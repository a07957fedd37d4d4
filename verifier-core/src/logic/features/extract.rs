//! Feature Extractor - values.yaml → FeatureTable
//!
//! Every field has a declared path and default. Missing keys and explicit
//! nulls take the default; anything present must normalize cleanly or the
//! whole extraction fails with the offending field named.

use serde_yaml::Value;

use super::quantity::{check_magnitude, parse_quantity, to_bytes};
use super::table::{FeatureRow, FeatureTable, NetworkFunction};
use crate::logic::locator::kind_of;

// ============================================================================
// FIELD PATHS
// ============================================================================

const REPLICA_COUNT: &[&str] = &["replicaCount"];
const CPU_LIMIT: &[&str] = &["resources", "limits", "cpu"];
const MEMORY_LIMIT: &[&str] = &["resources", "limits", "memory"];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        network_function: NetworkFunction,
        field: String,
        reason: String,
    },
}

impl FeatureError {
    fn invalid(network_function: NetworkFunction, path: &[&str], reason: impl Into<String>) -> Self {
        FeatureError::InvalidField {
            network_function,
            field: field_name(network_function, path),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FeatureError::InvalidField { field, .. } => field,
        }
    }
}

fn field_name(network_function: NetworkFunction, path: &[&str]) -> String {
    let mut name = network_function.key().to_string();
    for key in path {
        name.push('.');
        name.push_str(key);
    }
    name
}

// ============================================================================
// EXTRACTOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// One row per network function, defaults for absent components
    pub fn extract(&self, manifest: &Value) -> Result<FeatureTable, FeatureError> {
        let mut table = FeatureTable::empty();
        for network_function in NetworkFunction::ALL {
            let row = self.extract_row(manifest, network_function)?;
            table = table.with_row(row);
        }
        Ok(table)
    }

    pub fn extract_row(
        &self,
        manifest: &Value,
        network_function: NetworkFunction,
    ) -> Result<FeatureRow, FeatureError> {
        let component = match lookup(manifest, network_function, &[network_function.key()])? {
            Some(component) => component,
            None => return Ok(FeatureRow::empty(network_function)),
        };
        if !component.is_mapping() {
            return Err(FeatureError::invalid(
                network_function,
                &[],
                format!("expected a mapping, found {}", kind_of(component)),
            ));
        }

        let replica_count = match lookup(component, network_function, REPLICA_COUNT)? {
            Some(value) => normalize_replicas(value)
                .map_err(|reason| FeatureError::invalid(network_function, REPLICA_COUNT, reason))?,
            None => 0,
        };

        let cpu_limit = match lookup(component, network_function, CPU_LIMIT)? {
            Some(value) => normalize_cpu(value)
                .map_err(|reason| FeatureError::invalid(network_function, CPU_LIMIT, reason))?,
            None => 0.0,
        };

        let memory_limit = match lookup(component, network_function, MEMORY_LIMIT)? {
            Some(value) => normalize_memory(value)
                .map_err(|reason| FeatureError::invalid(network_function, MEMORY_LIMIT, reason))?,
            None => 0,
        };

        Ok(FeatureRow {
            replica_count,
            cpu_limit,
            memory_limit,
            network_function,
        })
    }
}

/// Follow `path` below `node`. `Ok(None)` for a missing key or null at any
/// step; an error when an intermediate value is not a mapping.
fn lookup<'a>(
    node: &'a Value,
    network_function: NetworkFunction,
    path: &[&str],
) -> Result<Option<&'a Value>, FeatureError> {
    let mut current = node;
    for (depth, key) in path.iter().enumerate() {
        let mapping = match current.as_mapping() {
            Some(mapping) => mapping,
            None => {
                return Err(FeatureError::invalid(
                    network_function,
                    &path[..depth],
                    format!("expected a mapping, found {}", kind_of(current)),
                ));
            }
        };
        match mapping.get(*key) {
            None | Some(Value::Null) => return Ok(None),
            Some(next) => current = next,
        }
    }
    Ok(Some(current))
}

// ============================================================================
// NORMALIZATION
// ============================================================================

fn normalize_replicas(value: &Value) -> Result<u32, String> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return u32::try_from(v).map_err(|_| format!("{} is out of range", v));
            }
            if let Some(v) = n.as_i64() {
                return Err(format!("{} must not be negative", v));
            }
            let v = n.as_f64().unwrap_or(f64::NAN);
            if v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else if v < 0.0 {
                Err(format!("{} must not be negative", v))
            } else {
                Err(format!("{} is not a whole number of replicas", v))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a whole number of replicas", s)),
        other => Err(format!("expected a number, found {}", kind_of(other))),
    }
}

/// Cores
fn normalize_cpu(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64().unwrap_or(f64::NAN);
            check_magnitude(v, &n.to_string()).map_err(|e| e.to_string())
        }
        Value::String(s) => parse_quantity(s).map_err(|e| e.to_string()),
        other => Err(format!("expected a CPU quantity, found {}", kind_of(other))),
    }
}

/// Bytes
fn normalize_memory(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            let original = n.to_string();
            let v = check_magnitude(n.as_f64().unwrap_or(f64::NAN), &original).map_err(|e| e.to_string())?;
            to_bytes(v, &original).map_err(|e| e.to_string())
        }
        Value::String(s) => {
            let v = parse_quantity(s).map_err(|e| e.to_string())?;
            to_bytes(v, s.trim()).map_err(|e| e.to_string())
        }
        other => Err(format!("expected a memory quantity, found {}", kind_of(other))),
    }
}
