//! In-memory chart fixtures for tests

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};

pub struct TgzBuilder {
    builder: Builder<GzEncoder<Vec<u8>>>,
}

impl TgzBuilder {
    pub fn new() -> Self {
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        Self {
            builder: Builder::new(gz),
        }
    }

    pub fn file(self, path: &str, contents: &str) -> Self {
        self.file_with_mode(path, contents, 0o644)
    }

    pub fn file_with_mode(mut self, path: &str, contents: &str, mode: u32) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(mode);
        self.builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.dir_with_mode(path, 0o755)
    }

    pub fn dir_with_mode(mut self, path: &str, mode: u32) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(mode);
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Writes name and link bytes straight into the header, bypassing the
    /// path checks `tar::Builder` applies, to model hostile archives.
    pub fn raw(mut self, name: &str, entry_type: EntryType, link: Option<&str>, data: &[u8]) -> Self {
        let mut header = Header::new_old();
        {
            let old = header.as_old_mut();
            old.name[..name.len()].copy_from_slice(name.as_bytes());
            if let Some(link) = link {
                old.linkname[..link.len()].copy_from_slice(link.as_bytes());
            }
        }
        header.set_entry_type(entry_type);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let gz = self.builder.into_inner().unwrap();
        gz.finish().unwrap()
    }
}

/// Chart with a single values.yaml at `<name>/values.yaml`
pub fn chart_tgz(name: &str, values: &str) -> Vec<u8> {
    TgzBuilder::new()
        .file(&format!("{}/Chart.yaml", name), &format!("apiVersion: v2\nname: {}\nversion: 1.0.0\n", name))
        .file(&format!("{}/values.yaml", name), values)
        .file(&format!("{}/templates/deployment.yaml", name), "kind: Deployment\n")
        .finish()
}

/// Gzip arbitrary bytes (for "valid gzip, not a tar" cases)
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(bytes).unwrap();
    gz.finish().unwrap()
}

/// Scaler: replicas unscaled, memory in GiB, one-hot over all three functions
pub fn preprocessor_json() -> String {
    use crate::logic::features::layout::{layout_hash, FEATURE_VERSION};
    format!(
        r#"{{
  "feature_version": {},
  "layout_hash": {},
  "feature_names": ["replica_count", "cpu_limit", "memory_limit", "network_function"],
  "numeric": {{
    "columns": ["replica_count", "cpu_limit", "memory_limit"],
    "mean": [0.0, 0.0, 0.0],
    "scale": [1.0, 1.0, 1073741824.0]
  }},
  "categorical": {{ "column": "network_function", "categories": ["AMF", "SMF", "PCF"] }}
}}"#,
        FEATURE_VERSION,
        layout_hash()
    )
}

/// Linear OC-SVM: inlier while replica_count < 5
pub fn classifier_json() -> String {
    r#"{
  "kernel": "linear",
  "support_vectors": [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
  "dual_coef": [-1.0],
  "intercept": 5.0
}"#
    .to_string()
}

pub fn test_pipeline() -> crate::logic::model::InferencePipeline {
    use crate::logic::model::{InferencePipeline, OneClassSvm, ScalerEncoder};
    InferencePipeline::new(
        ScalerEncoder::from_json(&preprocessor_json()).unwrap(),
        OneClassSvm::from_json(&classifier_json()).unwrap(),
    )
    .unwrap()
}
