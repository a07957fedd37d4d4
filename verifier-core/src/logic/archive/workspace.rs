//! Request Workspace
//!
//! One directory per request, named from the request id so concurrent
//! requests never share extraction state. The directory is removed by
//! `release()` or, failing that, when the value is dropped (panic unwind,
//! cancelled task).

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::constants::WORKSPACE_PREFIX;

pub struct Workspace {
    request_id: Uuid,
    path: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `root`
    pub fn allocate(root: &Path, request_id: Uuid) -> std::io::Result<Self> {
        fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}-", WORKSPACE_PREFIX, request_id))
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();

        log::debug!("Workspace allocated for request {}", request_id);

        Ok(Self {
            request_id,
            path,
            dir: Some(dir),
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory tree now and report the outcome
    pub fn release(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                dir.close()?;
                log::debug!("Workspace released for request {}", self.request_id);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            log::warn!(
                "Workspace for request {} released on drop (pipeline did not finish)",
                self.request_id
            );
            if let Err(e) = dir.close() {
                log::error!("Failed to remove workspace for request {}: {}", self.request_id, e);
            }
        }
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("request_id", &self.request_id)
            .field("released", &self.dir.is_none())
            .finish()
    }
}
