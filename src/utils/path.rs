//! Path validation utilities

use std::path::{Path, PathBuf};

use crate::error::{FrameGrabError, FrameGrabResult};

/// Resolve and validate an input file path.
///
/// Canonicalization both normalizes the path and proves the file exists,
/// so downstream stages never schedule work against a missing source.
pub fn sanitize_input_path(path: &Path) -> FrameGrabResult<PathBuf> {
    path.canonicalize()
        .map_err(|_| FrameGrabError::InputFileNotFound {
            path: path.display().to_string(),
        })
}
