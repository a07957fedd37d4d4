//! Pipeline errors
//!
//! One enum per stage, folded here. `Display` is what a client may see;
//! `detail()` carries anything that belongs in logs only.

use crate::logic::archive::ExtractionError;
use crate::logic::features::FeatureError;
use crate::logic::locator::LocateError;
use crate::logic::model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("values.yaml not found in the Helm chart.")]
    ManifestNotFound,

    #[error("values.yaml is malformed: {0}")]
    MalformedManifest(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Model evaluation failed")]
    Model(#[from] ModelError),

    #[error("Workspace I/O failure")]
    Workspace(#[source] std::io::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

impl VerifyError {
    /// Problems with the upload itself, as opposed to server-side failures
    pub fn is_client_error(&self) -> bool {
        match self {
            VerifyError::Extraction(e) => e.is_client_error(),
            VerifyError::ManifestNotFound
            | VerifyError::MalformedManifest(_)
            | VerifyError::Feature(_) => true,
            VerifyError::Model(_) | VerifyError::Workspace(_) => false,
        }
    }

    /// Diagnostic detail for logs
    pub fn detail(&self) -> Option<String> {
        match self {
            VerifyError::Extraction(e) => e.detail(),
            VerifyError::Model(e) => Some(e.to_string()),
            VerifyError::Workspace(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl From<LocateError> for VerifyError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::NotFound => VerifyError::ManifestNotFound,
            LocateError::Malformed(detail) => VerifyError::MalformedManifest(detail),
            LocateError::Io(e) => VerifyError::Workspace(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_client_classification() {
        let client: Vec<VerifyError> = vec![
            ExtractionError::InvalidExtension { filename: "a.zip".into() }.into(),
            ExtractionError::SizeLimitExceeded { limit: 1 }.into(),
            LocateError::NotFound.into(),
            LocateError::Malformed("bad".into()).into(),
        ];
        for err in &client {
            assert!(err.is_client_error(), "{:?}", err);
        }

        let internal: Vec<VerifyError> = vec![
            ExtractionError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied")).into(),
            LocateError::Io(io::Error::new(io::ErrorKind::Other, "gone")).into(),
            ModelError::Schema("3 != 4".into()).into(),
        ];
        for err in &internal {
            assert!(!err.is_client_error(), "{:?}", err);
        }
    }

    #[test]
    fn test_model_detail_stays_out_of_message() {
        let err = VerifyError::from(ModelError::Read {
            path: "/srv/models/ocsvm.json".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        });

        assert_eq!(err.to_string(), "Model evaluation failed");
        assert!(err.detail().unwrap().contains("/srv/models"));
    }

    #[test]
    fn test_not_found_message() {
        let err = VerifyError::from(LocateError::NotFound);
        assert_eq!(err.to_string(), "values.yaml not found in the Helm chart.");
    }
}
