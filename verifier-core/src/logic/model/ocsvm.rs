//! One-Class SVM - kernel decision function over support vectors
//!
//! decision(x) = Σ dual_coef[i] · K(sv[i], x) + intercept
//! label = +1 when decision > 0, otherwise -1

use std::path::Path;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::inference::{Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

impl Kernel {
    fn as_str(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Poly => "poly",
            Kernel::Rbf => "rbf",
            Kernel::Sigmoid => "sigmoid",
        }
    }
}

fn default_degree() -> i32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvm {
    pub kernel: Kernel,
    #[serde(default)]
    pub gamma: f64,
    #[serde(default)]
    pub coef0: f64,
    #[serde(default = "default_degree")]
    pub degree: i32,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
}

impl OneClassSvm {
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let model: OneClassSvm = serde_json::from_str(text).map_err(|e| ModelError::Parse {
            path: "<inline>".into(),
            source: e,
        })?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let model: OneClassSvm = serde_json::from_str(&text).map_err(|e| ModelError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let width = match self.support_vectors.first() {
            Some(sv) if !sv.is_empty() => sv.len(),
            _ => return Err(ModelError::InvalidArtifact("no support vectors".into())),
        };
        if self.support_vectors.iter().any(|sv| sv.len() != width) {
            return Err(ModelError::InvalidArtifact("support vectors differ in width".into()));
        }
        if self.dual_coef.len() != self.support_vectors.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "{} dual coefficients for {} support vectors",
                self.dual_coef.len(),
                self.support_vectors.len()
            )));
        }

        let all_finite = self
            .support_vectors
            .iter()
            .flatten()
            .chain(self.dual_coef.iter())
            .chain([self.intercept, self.gamma, self.coef0].iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelError::InvalidArtifact("non-finite model parameter".into()));
        }

        if self.kernel != Kernel::Linear && self.gamma <= 0.0 {
            return Err(ModelError::InvalidArtifact(format!(
                "{} kernel needs a positive gamma",
                self.kernel.as_str()
            )));
        }
        if self.kernel == Kernel::Poly && self.degree < 0 {
            return Err(ModelError::InvalidArtifact("negative polynomial degree".into()));
        }

        Ok(())
    }

    fn kernel_value(&self, sv: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> f64 {
        match self.kernel {
            Kernel::Linear => sv.dot(&x),
            Kernel::Poly => (self.gamma * sv.dot(&x) + self.coef0).powi(self.degree),
            Kernel::Rbf => {
                let distance: f64 = sv.iter().zip(x.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                (-self.gamma * distance).exp()
            }
            Kernel::Sigmoid => (self.gamma * sv.dot(&x) + self.coef0).tanh(),
        }
    }

    /// Signed distance to the boundary; positive is inside
    pub fn decision(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.support_vectors
            .iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, alpha)| alpha * self.kernel_value(ArrayView1::from(sv.as_slice()), x))
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for OneClassSvm {
    fn input_width(&self) -> usize {
        self.support_vectors.first().map(|sv| sv.len()).unwrap_or(0)
    }

    fn describe(&self) -> String {
        format!("ocsvm({}, {} support vectors)", self.kernel.as_str(), self.support_vectors.len())
    }

    fn predict(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<i8>, ModelError> {
        if matrix.ncols() != self.input_width() {
            return Err(ModelError::Schema(format!(
                "classifier expects {} columns, got {}",
                self.input_width(),
                matrix.ncols()
            )));
        }

        matrix
            .rows()
            .into_iter()
            .map(|row| {
                let decision = self.decision(row);
                if !decision.is_finite() {
                    return Err(ModelError::InvalidOutput(format!("decision value {}", decision)));
                }
                Ok(if decision > 0.0 { 1 } else { -1 })
            })
            .collect()
    }
}
