// Decode a subtitle file under a user-specified charset before handing
// it to the UTF-8-only `condense-core` ASS codec, mirroring
// `subtitles.parse_at_path`'s `encoding=` parameter in the original
// tool (which opens the file with Python's own codec machinery).

use std::fs;
use std::path::Path;

use encoding_rs::Encoding;

use crate::error::*;

/// Read `path` and decode it from `encoding_label` (a WHATWG encoding
/// name, e.g. `"utf-8"`, `"shift_jis"`, `"windows-1252"`) into a Rust
/// `String`. Malformed byte sequences are replaced rather than
/// rejected, matching `encoding_rs`'s standard decode behavior; a
/// warning is printed if that happened so a bad `--input-subs-encoding`
/// is visible instead of silently corrupting text.
pub fn read_to_string_with_encoding(path: &Path, encoding_label: &str) -> Result<String> {
    let bytes = fs::read(path)?;

    let encoding = Encoding::for_label(encoding_label.as_bytes()).ok_or_else(|| {
        ErrorKind::Usage(format!("unrecognized subtitle encoding {:?}", encoding_label))
    })?;

    let (decoded, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        crate::pwarning(format!(
            "{}: some bytes were not valid {}; replacement characters were substituted",
            path.display(),
            encoding_label
        ));
    }

    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn decodes_utf8_by_default() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all("héllo".as_bytes()).unwrap();
        let text = read_to_string_with_encoding(f.path(), "utf-8").unwrap();
        assert_eq!(text, "héllo");
    }

    #[test]
    fn decodes_windows_1252() {
        let mut f = NamedTempFile::new().unwrap();
        // 0xE9 is 'é' in windows-1252, invalid as a lone UTF-8 byte.
        f.write_all(&[b'h', 0xE9]).unwrap();
        let text = read_to_string_with_encoding(f.path(), "windows-1252").unwrap();
        assert_eq!(text, "hé");
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        let f = NamedTempFile::new().unwrap();
        assert!(read_to_string_with_encoding(f.path(), "not-a-real-encoding").is_err());
    }
}
