//! Format dispatch. The original tool recognizes several subtitle
//! container formats and picks a codec by file extension; this crate
//! implements exactly one codec (ASS), so the dispatcher's only job is
//! to give callers a clear "not supported" error instead of silently
//! misparsing an unrelated format.

use std::path::Path;

use crate::error::{ErrorKind, Result};

/// Extensions this crate knows how to parse. `.ssa` is SubStation
/// Alpha's predecessor format and shares ASS's `Format:`/`Dialogue:`
/// grammar closely enough to reuse the same codec.
const SUPPORTED_EXTENSIONS: &[&str] = &["ass", "ssa"];

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(ext))
}

/// Validate that `path`'s extension is one this crate can parse.
pub fn require_supported(path: &Path) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if is_supported_extension(ext) {
        Ok(())
    } else {
        Err(ErrorKind::Malformed(format!(
            "unsupported subtitle format {:?} (supported: {})",
            path,
            SUPPORTED_EXTENSIONS.join(", ")
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn ass_and_ssa_are_supported_case_insensitively() {
        assert!(is_supported_extension("ass"));
        assert!(is_supported_extension("ASS"));
        assert!(is_supported_extension("ssa"));
    }

    #[test]
    fn srt_is_not_supported() {
        assert!(!is_supported_extension("srt"));
    }

    #[test]
    fn require_supported_rejects_unknown_extension() {
        let path = PathBuf::from("movie.srt");
        assert!(require_supported(&path).is_err());
    }

    #[test]
    fn require_supported_accepts_ass() {
        let path = PathBuf::from("movie.ass");
        assert!(require_supported(&path).is_ok());
    }
}
