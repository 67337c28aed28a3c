// A small extension -> MIME-class lookup, just enough to answer "is
// this output path an audio format" so the condense flow can silently
// drop the video input (see cli.py's use of `mimetypes.guess_type`).
// A general MIME-sniffing crate would be disproportionate for this one
// lookup, so this is a short static table instead.

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "flac", "ogg", "oga", "opus", "wav", "wma"];

pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_audio_extensions() {
        assert!(is_audio_extension("mp3"));
        assert!(is_audio_extension("MP3"));
        assert!(is_audio_extension("flac"));
    }

    #[test]
    fn rejects_video_extensions() {
        assert!(!is_audio_extension("mp4"));
        assert!(!is_audio_extension("mkv"));
    }
}
