//! Archive Extractor - Safe .tgz unpacking
//!
//! Every entry is vetted before anything touches the disk:
//! - no absolute paths, no `..` components
//! - link targets must be relative and stay below the link's directory
//! - only regular files, directories and links are written
//! - entry count and total size are capped
//!
//! Writes go through `tar::Entry::unpack_in`, which also refuses to write
//! through a symlinked parent that leaves the destination.
//!
//! The decompressed stream itself is capped below the tar reader: PAX and
//! GNU long-name bodies are buffered whole by `tar` and never show up as
//! regular file sizes.

use std::cell::Cell;
use std::io::{self, ErrorKind, Read};
use std::path::{Component, Path};
use std::rc::Rc;

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use super::types::{ExtractionError, ExtractionLimits, ExtractionSummary, UploadedArchive};

pub struct ArchiveExtractor {
    limits: ExtractionLimits,
}

impl ArchiveExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ExtractionLimits {
        &self.limits
    }

    /// Reject anything that is not a `.tgz` before the payload is read
    pub fn validate(&self, upload: &UploadedArchive) -> Result<(), ExtractionError> {
        if upload.has_archive_extension() {
            Ok(())
        } else {
            Err(ExtractionError::InvalidExtension {
                filename: upload.filename.clone(),
            })
        }
    }

    /// Validate and unpack `upload` into `root`
    pub fn extract(
        &self,
        upload: &UploadedArchive,
        root: &Path,
    ) -> Result<ExtractionSummary, ExtractionError> {
        self.validate(upload)?;
        unpack_tgz(&upload.bytes, root, &self.limits)
    }
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new(ExtractionLimits::default())
    }
}

// ============================================================================
// UNPACKING
// ============================================================================

pub fn unpack_tgz(
    bytes: &[u8],
    root: &Path,
    limits: &ExtractionLimits,
) -> Result<ExtractionSummary, ExtractionError> {
    let exhausted = Rc::new(Cell::new(false));
    let reader = BoundedReader {
        inner: GzDecoder::new(bytes),
        remaining: stream_cap(limits),
        exhausted: Rc::clone(&exhausted),
    };

    let mut archive = Archive::new(reader);
    // tar still applies `mode & 0o777` with this off; see `normalize_mode`
    archive.set_preserve_permissions(false);
    archive.set_preserve_mtime(false);
    archive.set_unpack_xattrs(false);
    archive.set_overwrite(true);

    unpack_entries(&mut archive, root, limits).map_err(|err| {
        if exhausted.get() {
            ExtractionError::SizeLimitExceeded {
                limit: limits.max_total_bytes,
            }
        } else {
            err
        }
    })
}

/// Largest decompressed stream a conforming archive within `limits` needs:
/// file data plus under 1 KiB of header and padding per entry, plus the
/// two end-of-archive blocks.
fn stream_cap(limits: &ExtractionLimits) -> u64 {
    let overhead = (limits.max_entries as u64).saturating_add(2).saturating_mul(1024);
    limits.max_total_bytes.saturating_add(overhead)
}

struct BoundedReader<R> {
    inner: R,
    remaining: u64,
    exhausted: Rc<Cell<bool>>,
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.remaining == 0 {
            // Exactly at the cap is fine as long as the stream ends here
            let mut peek = [0u8; 1];
            return match self.inner.read(&mut peek)? {
                0 => Ok(0),
                _ => {
                    self.exhausted.set(true);
                    Err(io::Error::new(ErrorKind::Other, "decompressed size limit reached"))
                }
            };
        }

        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

fn unpack_entries<R: Read>(
    archive: &mut Archive<R>,
    root: &Path,
    limits: &ExtractionLimits,
) -> Result<ExtractionSummary, ExtractionError> {
    let mut summary = ExtractionSummary::default();

    let entries = archive.entries().map_err(ExtractionError::malformed)?;
    for entry in entries {
        let mut entry = entry.map_err(ExtractionError::malformed)?;

        summary.entries += 1;
        if summary.entries > limits.max_entries {
            return Err(ExtractionError::TooManyEntries {
                limit: limits.max_entries,
            });
        }

        let path = entry.path().map_err(ExtractionError::malformed)?.into_owned();
        let display = path.to_string_lossy().into_owned();
        let entry_type = entry.header().entry_type();

        match entry_type {
            EntryType::XGlobalHeader
            | EntryType::XHeader
            | EntryType::GNULongName
            | EntryType::GNULongLink => continue,
            _ => {}
        }

        let depth = check_entry_path(&path).map_err(|reason| ExtractionError::disallowed(&display, reason))?;

        match entry_type {
            EntryType::Directory => {
                if depth == 0 {
                    // "./" - the workspace itself
                    continue;
                }
                summary.directories += 1;
            }
            EntryType::Regular => {
                if depth == 0 {
                    return Err(ExtractionError::disallowed(&display, "empty file path"));
                }
                summary.total_bytes = summary.total_bytes.saturating_add(entry.size());
                if summary.total_bytes > limits.max_total_bytes {
                    return Err(ExtractionError::SizeLimitExceeded {
                        limit: limits.max_total_bytes,
                    });
                }
                summary.files += 1;
            }
            EntryType::Symlink | EntryType::Link => {
                if depth == 0 {
                    return Err(ExtractionError::disallowed(&display, "empty link path"));
                }
                let target = entry
                    .link_name()
                    .map_err(ExtractionError::malformed)?
                    .ok_or_else(|| ExtractionError::disallowed(&display, "link without a target"))?;
                check_link_target(&target).map_err(|reason| ExtractionError::disallowed(&display, reason))?;
                summary.links += 1;
            }
            other => {
                return Err(ExtractionError::disallowed(
                    &display,
                    format!("unsupported entry type {:?}", other),
                ));
            }
        }

        match entry.unpack_in(root) {
            Ok(true) => {}
            Ok(false) => {
                return Err(ExtractionError::disallowed(&display, "path escapes the workspace"));
            }
            Err(e) => return Err(classify_unpack_error(e)),
        }

        match entry_type {
            EntryType::Directory => normalize_mode(&root.join(&path), 0o755)?,
            EntryType::Regular => normalize_mode(&root.join(&path), 0o644)?,
            _ => {}
        }
    }

    log::debug!(
        "Unpacked {} entries ({} files, {} bytes)",
        summary.entries,
        summary.files,
        summary.total_bytes
    );

    Ok(summary)
}

/// Owner keeps full access to everything it unpacked, whatever the header
/// said, so the tree stays readable and removable.
#[cfg(unix)]
fn normalize_mode(path: &Path, mode: u32) -> Result<(), ExtractionError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn normalize_mode(_path: &Path, _mode: u32) -> Result<(), ExtractionError> {
    Ok(())
}

/// Returns the number of normal components, or why the path is refused
fn check_entry_path(path: &Path) -> Result<usize, &'static str> {
    let mut depth = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => return Err("path traversal ('..') is not allowed"),
            Component::RootDir | Component::Prefix(_) => return Err("absolute paths are not allowed"),
        }
    }
    Ok(depth)
}

/// Link targets may only point downwards. If every link in the tree points
/// below its own directory, no chain of links can resolve outside the root.
fn check_link_target(target: &Path) -> Result<(), &'static str> {
    if target.as_os_str().is_empty() {
        return Err("link without a target");
    }
    for component in target.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("link target points outside the workspace"),
            Component::RootDir | Component::Prefix(_) => return Err("link target is absolute"),
        }
    }
    Ok(())
}

/// Truncated or corrupt streams are the client's problem; anything that
/// looks like the server's own filesystem failing is not.
fn classify_unpack_error(err: std::io::Error) -> ExtractionError {
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::OutOfMemory => ExtractionError::Workspace { source: err },
        _ => ExtractionError::malformed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_entry_path() {
        assert_eq!(check_entry_path(Path::new("chart/values.yaml")), Ok(2));
        assert_eq!(check_entry_path(Path::new("./chart/values.yaml")), Ok(2));
        assert_eq!(check_entry_path(Path::new("./")), Ok(0));
        assert!(check_entry_path(Path::new("../values.yaml")).is_err());
        assert!(check_entry_path(Path::new("chart/../../etc/passwd")).is_err());
        assert!(check_entry_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_check_link_target() {
        assert!(check_link_target(Path::new("templates/deployment.yaml")).is_ok());
        assert!(check_link_target(Path::new("./values.yaml")).is_ok());
        assert!(check_link_target(Path::new("../values.yaml")).is_err());
        assert!(check_link_target(Path::new("/etc/shadow")).is_err());
        assert!(check_link_target(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_extension() {
        let extractor = ArchiveExtractor::default();

        assert!(extractor.validate(&UploadedArchive::new("chart-1.0.0.tgz", vec![])).is_ok());
        assert!(extractor.validate(&UploadedArchive::new("CHART.TGZ", vec![])).is_ok());

        for name in ["chart.zip", "chart.tar.gz", "chart.tgz.zip", "chart", ".tgz", ""] {
            let err = extractor.validate(&UploadedArchive::new(name, vec![])).unwrap_err();
            assert!(matches!(err, ExtractionError::InvalidExtension { .. }), "{}", name);
        }
    }

    #[test]
    fn test_stream_cap() {
        let limits = ExtractionLimits {
            max_total_bytes: 1000,
            max_entries: 1,
        };
        assert_eq!(stream_cap(&limits), 1000 + 3 * 1024);

        let unbounded = ExtractionLimits {
            max_total_bytes: u64::MAX,
            max_entries: usize::MAX,
        };
        assert_eq!(stream_cap(&unbounded), u64::MAX);
    }

    #[test]
    fn test_bounded_reader_stops_past_cap() {
        let exhausted = Rc::new(Cell::new(false));
        let mut reader = BoundedReader {
            inner: &[7u8; 10][..],
            remaining: 4,
            exhausted: Rc::clone(&exhausted),
        };

        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).is_err());
        assert_eq!(out.len(), 4);
        assert!(exhausted.get());

        let exact = Rc::new(Cell::new(false));
        let mut reader = BoundedReader {
            inner: &[7u8; 4][..],
            remaining: 4,
            exhausted: Rc::clone(&exact),
        };
        let mut out = Vec::new();
        assert_eq!(reader.read_to_end(&mut out).unwrap(), 4);
        assert!(!exact.get());
    }

    #[test]
    fn test_classify_unpack_error() {
        let eof = std::io::Error::new(ErrorKind::UnexpectedEof, "truncated");
        assert!(classify_unpack_error(eof).is_client_error());

        let denied = std::io::Error::new(ErrorKind::PermissionDenied, "denied");
        assert!(!classify_unpack_error(denied).is_client_error());
    }
}
