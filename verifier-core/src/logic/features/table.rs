//! Feature Table - Core data structure for model input
//!
//! Always exactly one row per network function, in the order
//! [AMF, SMF, PCF]. The array type makes any other length unrepresentable.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::layout::FEATURE_COUNT;

// ============================================================================
// NETWORK FUNCTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkFunction {
    Amf,
    Smf,
    Pcf,
}

impl NetworkFunction {
    /// Fixed row order of every feature table
    pub const ALL: [NetworkFunction; 3] = [NetworkFunction::Amf, NetworkFunction::Smf, NetworkFunction::Pcf];

    /// Key of the component's block in values.yaml
    pub fn key(&self) -> &'static str {
        match self {
            NetworkFunction::Amf => "amf",
            NetworkFunction::Smf => "smf",
            NetworkFunction::Pcf => "pcf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkFunction::Amf => "AMF",
            NetworkFunction::Smf => "SMF",
            NetworkFunction::Pcf => "PCF",
        }
    }

    /// Ordinal code used in the `network_function` feature column
    pub fn code(&self) -> usize {
        match self {
            NetworkFunction::Amf => 0,
            NetworkFunction::Smf => 1,
            NetworkFunction::Pcf => 2,
        }
    }

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }
}

impl std::fmt::Display for NetworkFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FEATURE ROW
// ============================================================================

/// One component's normalized resource settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub replica_count: u32,
    /// Cores
    pub cpu_limit: f64,
    /// Bytes
    pub memory_limit: u64,
    pub network_function: NetworkFunction,
}

impl FeatureRow {
    /// Row emitted for a component missing from the manifest
    pub fn empty(network_function: NetworkFunction) -> Self {
        Self {
            replica_count: 0,
            cpu_limit: 0.0,
            memory_limit: 0,
            network_function,
        }
    }

    /// Values in FEATURE_LAYOUT order
    pub fn to_values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.replica_count as f64,
            self.cpu_limit,
            self.memory_limit as f64,
            self.network_function.code() as f64,
        ]
    }
}

// ============================================================================
// FEATURE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: [FeatureRow; 3],
}

impl FeatureTable {
    /// All three components at their defaults
    pub fn empty() -> Self {
        Self {
            rows: NetworkFunction::ALL.map(FeatureRow::empty),
        }
    }

    /// Replace the row for `row.network_function`, keeping the fixed order
    pub fn with_row(mut self, row: FeatureRow) -> Self {
        let index = row.network_function.code();
        self.rows[index] = row;
        self
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn get(&self, network_function: NetworkFunction) -> &FeatureRow {
        &self.rows[network_function.code()]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureRow> {
        self.rows.iter()
    }

    /// 3 x FEATURE_COUNT matrix in FEATURE_LAYOUT column order
    pub fn to_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows.len(), FEATURE_COUNT), |(i, j)| self.rows[i].to_values()[j])
    }

    pub fn into_rows(self) -> [FeatureRow; 3] {
        self.rows
    }
}

impl Default for FeatureTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a FeatureRow;
    type IntoIter = std::slice::Iter<'a, FeatureRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
