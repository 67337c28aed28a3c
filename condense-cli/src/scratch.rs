// Scoped resource cleanup. The original tool's scratch directory is
// torn down no matter how the pipeline function exits, with any close
// failure surfaced as its own error instead of masking the primary
// result.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::*;

/// Either a user-supplied scratch directory (kept on disk after the
/// run) or a fresh temporary one (removed when the guard drops).
pub enum ScratchGuard {
    UserSupplied(PathBuf),
    Temporary(TempDir),
}

impl ScratchGuard {
    pub fn user_supplied(path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&path)?;
        Ok(ScratchGuard::UserSupplied(path))
    }

    pub fn temporary() -> Result<Self> {
        Ok(ScratchGuard::Temporary(TempDir::new()?))
    }

    pub fn path(&self) -> &Path {
        match self {
            ScratchGuard::UserSupplied(p) => p.as_path(),
            ScratchGuard::Temporary(dir) => dir.path(),
        }
    }

    /// Release the scratch resource, surfacing any failure instead of
    /// swallowing it the way `Drop` must. A user-supplied directory is
    /// left untouched; a temporary one is removed. Callers run this
    /// after the primary pipeline result and report a failure here as
    /// `ErrorKind::Cleanup`, never in place of the primary outcome.
    pub fn close(self) -> std::io::Result<()> {
        match self {
            ScratchGuard::UserSupplied(_) => Ok(()),
            ScratchGuard::Temporary(dir) => dir.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_guard_user_supplied_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("scratch");
        let guard = ScratchGuard::user_supplied(nested.clone()).unwrap();
        assert!(nested.exists());
        assert_eq!(guard.path(), nested.as_path());
    }
}
