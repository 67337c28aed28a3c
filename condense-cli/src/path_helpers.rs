use std::path::{Path, PathBuf};

/// Replace `path`'s extension with `new_ext` (which should include the
/// leading dot, e.g. `.ass`).
pub fn swap_ext(path: &Path, new_ext: &str) -> PathBuf {
    let stem = path.with_extension("");
    PathBuf::from(format!("{}{}", stem.display(), new_ext))
}

pub fn ext_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_ext_replaces_suffix() {
        assert_eq!(
            swap_ext(Path::new("/tmp/movie.mkv"), ".condensed.mp3"),
            PathBuf::from("/tmp/movie.condensed.mp3")
        );
    }

    #[test]
    fn ext_of_strips_leading_dot() {
        assert_eq!(ext_of(Path::new("movie.ASS")), "ASS");
    }
}
